//! Status-message protocol of the enrollee procedures.
//!
//! Mutating procedures answer with one advisory string. A string that starts
//! with the literal `OK:` is success; anything else is a rejection that must be
//! rolled back. No string at all is handled by the caller as a missing result.

/// Literal prefix marking a successful procedure call.
pub const OK_PREFIX: &str = "OK:";

/// Discriminated form of a procedure status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcedureStatus {
    /// Message started with `OK:`. Holds the full message.
    Ok(String),
    /// Any other message, kept verbatim.
    Rejected(String),
}

impl ProcedureStatus {
    /// Classifies a raw status message. Prefix match is exact and case-sensitive.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.starts_with(OK_PREFIX) {
            Self::Ok(message)
        } else {
            Self::Rejected(message)
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The message exactly as received.
    pub fn message(&self) -> &str {
        match self {
            Self::Ok(message) | Self::Rejected(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProcedureStatus;

    #[test]
    fn ok_prefix_is_success() {
        let status = ProcedureStatus::from_message("OK: inserted");
        assert!(status.is_ok());
        assert_eq!(status.message(), "OK: inserted");
    }

    #[test]
    fn anything_else_is_rejected_verbatim() {
        for message in ["ERROR: duplicate national id", "ok: lowercase", " OK: padded", ""] {
            let status = ProcedureStatus::from_message(message);
            assert_eq!(status, ProcedureStatus::Rejected(message.to_string()));
        }
    }
}
