//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use sea_orm::DbErr;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error.
///
/// Expected business outcomes (a session that cannot be joined, feedback that was
/// already given) are never errors; they are returned as values.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    Other(String),
}

/// Entity errors bubbling up from `entity_api`, reduced to what callers of the domain act on.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    NotUpdated,
    DbTransaction,
    Other(String),
}

#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Other(String),
}

impl Error {
    pub(crate) fn config(setting: &str) -> Self {
        log::warn!("Missing configuration value: {setting}");
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::RecordNotUpdated => EntityErrorKind::NotUpdated,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            EntityApiErrorKind::Other => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

// Transactions are opened and committed from the domain layer.
impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::DbTransaction,
            )),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "JWT encoding related error".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_not_found_maps_to_internal_entity_not_found() {
        let err: Error = EntityApiError {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
        .into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
    }

    #[test]
    fn db_errors_are_transaction_failures() {
        let err: Error = DbErr::Custom("deadlock".to_string()).into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::DbTransaction))
        );
        assert!(err.source().is_some());
    }
}
