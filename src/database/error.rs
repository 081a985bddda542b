// Copyright 2023 Remi Bernotavicius

use derive_more::Display;
use diesel::result::DatabaseErrorKind;

/// A value rejected by a field validator before it reached the database.
#[derive(Debug, Display, derive_more::Error, Clone, PartialEq, Eq)]
#[display("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum IntegrityKind {
    #[display("unique constraint")]
    Unique,
    #[display("check constraint")]
    Check,
    #[display("foreign key constraint")]
    ForeignKey,
    #[display("not null constraint")]
    NotNull,
}

#[derive(Debug, Display, derive_more::Error)]
pub enum Error {
    #[display("validation error: {_0}")]
    Validation(ValidationError),
    #[display("integrity error ({kind}): {message}")]
    Integrity {
        kind: IntegrityKind,
        message: String,
    },
    #[display("record not found")]
    NotFound,
    #[display("database error: {_0}")]
    Database(diesel::result::Error),
}

impl Error {
    pub fn integrity_kind(&self) -> Option<IntegrityKind> {
        match self {
            Self::Integrity { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::Error as DieselError;

        match e {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => {
                let kind = match kind {
                    DatabaseErrorKind::UniqueViolation => IntegrityKind::Unique,
                    DatabaseErrorKind::CheckViolation => IntegrityKind::Check,
                    DatabaseErrorKind::ForeignKeyViolation => IntegrityKind::ForeignKey,
                    DatabaseErrorKind::NotNullViolation => IntegrityKind::NotNull,
                    kind => {
                        return Self::Database(DieselError::DatabaseError(kind, info));
                    }
                };
                Self::Integrity {
                    kind,
                    message: info.message().to_owned(),
                }
            }
            e => Self::Database(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn not_found_maps_to_not_found() {
    let e = Error::from(diesel::result::Error::NotFound);
    assert!(matches!(e, Error::NotFound));
    assert_eq!(e.to_string(), "record not found");
    assert_eq!(e.integrity_kind(), None);
}

#[test]
fn validation_error_message() {
    let e = Error::from(ValidationError::new("cooking_time", "minimum 1 minute"));
    assert_eq!(
        e.to_string(),
        "validation error: cooking_time: minimum 1 minute"
    );
}
