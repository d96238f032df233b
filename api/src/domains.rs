use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

pub const NAME_MIN_LEN: usize = 3;
pub const NUMBER_MIN_LEN: usize = 8;

// `[0-9]` instead of `\d`, which would also accept non-ASCII digits.
static NUMBER_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2,3}-[0-9]+$").expect("number pattern is valid"));

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize, sqlx::FromRow)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub number: String,
}

/// A name/number pair that passed [`validate`]. Only this type reaches a
/// repository write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub number: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("name or number is missing")]
    MissingField,
    #[error("name must be at least 3 characters long")]
    NameTooShort,
    #[error(
        "invalid phone number, it must be in the format XX-YYYYYY or XXX-YYYYYY \
         and have a minimum length of 8"
    )]
    NumberFormatInvalid,
}

/// Checks raw input fields, returning them untouched when they form a legal
/// person record.
///
/// Name length is counted in characters, number length in bytes (a valid
/// number is ASCII only).
pub fn validate(
    name: Option<String>,
    number: Option<String>,
) -> Result<NewPerson, ValidationFailure> {
    let (Some(name), Some(number)) = (name, number) else {
        return Err(ValidationFailure::MissingField);
    };

    check_fields(&name, &number)?;
    Ok(NewPerson { name, number })
}

fn check_fields(name: &str, number: &str) -> Result<(), ValidationFailure> {
    if name.is_empty() || number.is_empty() {
        return Err(ValidationFailure::MissingField);
    }

    if name.chars().count() < NAME_MIN_LEN {
        return Err(ValidationFailure::NameTooShort);
    }

    if !is_valid_number(number) {
        return Err(ValidationFailure::NumberFormatInvalid);
    }

    Ok(())
}

pub fn is_valid_number(number: &str) -> bool {
    number.len() >= NUMBER_MIN_LEN && NUMBER_FORMAT.is_match(number)
}

impl NewPerson {
    /// Re-runs [`validate`] on an already built record. Repositories call
    /// this before every write.
    pub fn revalidate(&self) -> Result<(), ValidationFailure> {
        check_fields(&self.name, &self.number)
    }
}
