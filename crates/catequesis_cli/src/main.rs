//! Interactive enrollee registry.
//!
//! Reads `config.json` (or `$CATEQUESIS_CONFIG`), starts file logging, then
//! runs the menu loop. A terminal gets `inquire` prompts; piped input is read
//! line by line.

use catequesis_cli::{Console, InteractionController, Prompter, TerminalConsole};
use catequesis_core::{
    config_path, core_version, init_logging, load_config, resolve_logging, EnrolleeService,
    SqliteConnectionProvider,
};
use log::{error, info};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

fn main() -> ExitCode {
    let path = config_path();
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    match std::env::current_dir() {
        Ok(working_dir) => {
            let (level, log_dir) = resolve_logging(&config.logging, &working_dir);
            if let Err(err) = init_logging(&level, &log_dir) {
                eprintln!("File logging disabled: {err}");
            }
        }
        Err(err) => eprintln!("File logging disabled: cannot resolve working directory: {err}"),
    }
    info!(
        "event=cli_start module=cli status=ok config={} database={}",
        path.display(),
        config.sql_server.database
    );

    println!("catequesis {}", core_version());
    let service = EnrolleeService::new(SqliteConnectionProvider::new(config.sql_server));
    let outcome = if io::stdin().is_terminal() && io::stdout().is_terminal() {
        run_menu(&service, TerminalConsole::new())
    } else {
        run_menu(&service, Console::new(io::stdin().lock(), io::stdout().lock()))
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={}", err);
            eprintln!("Console error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_menu(
    service: &EnrolleeService<SqliteConnectionProvider>,
    console: impl Prompter,
) -> io::Result<()> {
    InteractionController::new(service, console).run()
}
