//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use sea_orm::error::DbErr;

/// Errors while reading or writing academy records.
///  * Errors related to data. Ex DbErr::RecordNotFound
///  * Errors related to interactions with the database itself. Ex DbErr::Conn
///
/// Missing rows that callers expect to be optional are returned as `Ok(None)`,
/// not as `RecordNotFound`.
#[derive(Debug, PartialEq)]
pub struct Error {
    // Underlying error emitted from seaORM internals
    pub source: Option<DbErr>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    RecordNotFound,
    RecordNotUpdated,
    // Connection, pool and statement execution failures
    SystemError,
    Other,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Entity API Error ({:?}): {}", self.error_kind, source),
            None => write!(f, "Entity API Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        let error_kind = match err {
            DbErr::RecordNotFound(_) => EntityApiErrorKind::RecordNotFound,
            DbErr::RecordNotUpdated => EntityApiErrorKind::RecordNotUpdated,
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) | DbErr::Exec(_) | DbErr::Query(_) => {
                EntityApiErrorKind::SystemError
            }
            _ => EntityApiErrorKind::Other,
        };

        Error {
            source: Some(err),
            error_kind,
        }
    }
}
