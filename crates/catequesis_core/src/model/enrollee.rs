//! Enrollee domain model and input validation.
//!
//! # Responsibility
//! - Define the named-field shape of one catechism enrollee.
//! - Turn raw operator input (`EnrolleeDraft`) into a checked `EnrolleeRecord`.
//!
//! # Invariants
//! - Every field of an `EnrolleeRecord` is non-empty after trimming.
//! - `parish_id` is an integer and both dates are strict `YYYY-MM-DD`.
//! - `baptism_date >= birth_date`.
//!
//! # See also
//! - crate::service::enrollee_service

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wire format for both enrollee dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static STRICT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// One enrollee attribute, in procedure parameter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ParishId,
    FirstNames,
    LastNames,
    NationalId,
    BirthDate,
    HomeAddress,
    GuardianName,
    GuardianPhone,
    GuardianEmail,
    BaptismDate,
    BaptismParish,
}

impl Field {
    /// All fields in the order the register procedure expects them.
    pub const ALL: [Field; 11] = [
        Field::ParishId,
        Field::FirstNames,
        Field::LastNames,
        Field::NationalId,
        Field::BirthDate,
        Field::HomeAddress,
        Field::GuardianName,
        Field::GuardianPhone,
        Field::GuardianEmail,
        Field::BaptismDate,
        Field::BaptismParish,
    ];

    /// Result-set column carrying this field.
    pub fn column(self) -> &'static str {
        match self {
            Self::ParishId => "parish_id",
            Self::FirstNames => "first_names",
            Self::LastNames => "last_names",
            Self::NationalId => "national_id",
            Self::BirthDate => "birth_date",
            Self::HomeAddress => "home_address",
            Self::GuardianName => "guardian_name",
            Self::GuardianPhone => "guardian_phone",
            Self::GuardianEmail => "guardian_email",
            Self::BaptismDate => "baptism_date",
            Self::BaptismParish => "baptism_parish",
        }
    }

    /// Human-readable label used in prompts and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::ParishId => "Parish ID",
            Self::FirstNames => "First names",
            Self::LastNames => "Last names",
            Self::NationalId => "National ID",
            Self::BirthDate => "Birth date (YYYY-MM-DD)",
            Self::HomeAddress => "Home address",
            Self::GuardianName => "Guardian name",
            Self::GuardianPhone => "Guardian phone",
            Self::GuardianEmail => "Guardian email",
            Self::BaptismDate => "Baptism date (YYYY-MM-DD)",
            Self::BaptismParish => "Baptism parish",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Client-side validation failure. Raised before any database call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A field is blank after trimming.
    EmptyField(Field),
    /// `parish_id` is not an integer.
    InvalidParishId(String),
    /// A date is not a real calendar date in strict `YYYY-MM-DD` form.
    InvalidDate { field: Field, value: String },
    /// Baptism happened before birth.
    BaptismBeforeBirth { birth: NaiveDate, baptism: NaiveDate },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "field `{field}` cannot be empty"),
            Self::InvalidParishId(value) => {
                write!(f, "parish id `{value}` is not an integer")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "field `{field}` has invalid date `{value}`; use YYYY-MM-DD")
            }
            Self::BaptismBeforeBirth { birth, baptism } => write!(
                f,
                "baptism date {baptism} cannot be earlier than birth date {birth}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Raw, unchecked enrollee input as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrolleeDraft {
    pub parish_id: String,
    pub first_names: String,
    pub last_names: String,
    pub national_id: String,
    pub birth_date: String,
    pub home_address: String,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub guardian_email: String,
    pub baptism_date: String,
    pub baptism_parish: String,
}

impl EnrolleeDraft {
    /// Returns the raw value held for `field`.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::ParishId => &self.parish_id,
            Field::FirstNames => &self.first_names,
            Field::LastNames => &self.last_names,
            Field::NationalId => &self.national_id,
            Field::BirthDate => &self.birth_date,
            Field::HomeAddress => &self.home_address,
            Field::GuardianName => &self.guardian_name,
            Field::GuardianPhone => &self.guardian_phone,
            Field::GuardianEmail => &self.guardian_email,
            Field::BaptismDate => &self.baptism_date,
            Field::BaptismParish => &self.baptism_parish,
        }
    }

    /// Replaces the raw value held for `field`.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::ParishId => self.parish_id = value,
            Field::FirstNames => self.first_names = value,
            Field::LastNames => self.last_names = value,
            Field::NationalId => self.national_id = value,
            Field::BirthDate => self.birth_date = value,
            Field::HomeAddress => self.home_address = value,
            Field::GuardianName => self.guardian_name = value,
            Field::GuardianPhone => self.guardian_phone = value,
            Field::GuardianEmail => self.guardian_email = value,
            Field::BaptismDate => self.baptism_date = value,
            Field::BaptismParish => self.baptism_parish = value,
        }
    }

    /// Checks the draft and produces a typed record.
    ///
    /// Checks run in a fixed order: blank fields (in `Field::ALL` order),
    /// parish id, birth date, baptism date, then date ordering. The first
    /// failure is returned.
    pub fn validate(&self) -> Result<EnrolleeRecord, ValidationError> {
        if let Some(field) = Field::ALL
            .into_iter()
            .find(|field| self.get(*field).trim().is_empty())
        {
            return Err(ValidationError::EmptyField(field));
        }

        let parish_text = self.parish_id.trim();
        let parish_id = parish_text
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidParishId(parish_text.to_string()))?;

        let birth_date = parse_strict_date(Field::BirthDate, &self.birth_date)?;
        let baptism_date = parse_strict_date(Field::BaptismDate, &self.baptism_date)?;
        if baptism_date < birth_date {
            return Err(ValidationError::BaptismBeforeBirth {
                birth: birth_date,
                baptism: baptism_date,
            });
        }

        Ok(EnrolleeRecord {
            parish_id,
            first_names: self.first_names.trim().to_string(),
            last_names: self.last_names.trim().to_string(),
            national_id: self.national_id.trim().to_string(),
            birth_date,
            home_address: self.home_address.trim().to_string(),
            guardian_name: self.guardian_name.trim().to_string(),
            guardian_phone: self.guardian_phone.trim().to_string(),
            guardian_email: self.guardian_email.trim().to_string(),
            baptism_date,
            baptism_parish: self.baptism_parish.trim().to_string(),
        })
    }
}

/// Validated enrollee, ready to be sent to the register/update procedures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolleeRecord {
    pub parish_id: i64,
    pub first_names: String,
    pub last_names: String,
    /// Business key used by find/update/delete.
    pub national_id: String,
    pub birth_date: NaiveDate,
    pub home_address: String,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub guardian_email: String,
    /// Never earlier than `birth_date`.
    pub baptism_date: NaiveDate,
    pub baptism_parish: String,
}

impl EnrolleeRecord {
    /// `"<first names> <last names>"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_names)
    }

    /// Display value of `field`, in the same text form the store keeps.
    pub fn value_of(&self, field: Field) -> String {
        match field {
            Field::ParishId => self.parish_id.to_string(),
            Field::FirstNames => self.first_names.clone(),
            Field::LastNames => self.last_names.clone(),
            Field::NationalId => self.national_id.clone(),
            Field::BirthDate => self.birth_date.format(DATE_FORMAT).to_string(),
            Field::HomeAddress => self.home_address.clone(),
            Field::GuardianName => self.guardian_name.clone(),
            Field::GuardianPhone => self.guardian_phone.clone(),
            Field::GuardianEmail => self.guardian_email.clone(),
            Field::BaptismDate => self.baptism_date.format(DATE_FORMAT).to_string(),
            Field::BaptismParish => self.baptism_parish.clone(),
        }
    }

    /// The 11 procedure parameters, in `Field::ALL` order.
    pub fn to_params(&self) -> Vec<Value> {
        Field::ALL
            .into_iter()
            .map(|field| match field {
                Field::ParishId => Value::Integer(self.parish_id),
                other => Value::Text(self.value_of(other)),
            })
            .collect()
    }

    /// Draft pre-filled with this record's values; used as update defaults.
    pub fn to_draft(&self) -> EnrolleeDraft {
        let mut draft = EnrolleeDraft::default();
        for field in Field::ALL {
            draft.set(field, self.value_of(field));
        }
        draft
    }
}

fn parse_strict_date(field: Field, raw: &str) -> Result<NaiveDate, ValidationError> {
    let value = raw.trim();
    let invalid = || ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    };
    // chrono alone accepts unpadded months/days; the regex pins the width.
    if !STRICT_DATE_RE.is_match(value) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}
