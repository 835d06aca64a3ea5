use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three independent session tables. Ids are only unique within a kind, so
/// `(SessionKind, Id)` is the real key of a session.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    Deserialize,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "session_kind")]
pub enum SessionKind {
    #[sea_orm(string_value = "quran")]
    Quran,
    #[sea_orm(string_value = "academic")]
    Academic,
    #[sea_orm(string_value = "interactive")]
    Interactive,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Quran => "quran",
            SessionKind::Academic => "academic",
            SessionKind::Interactive => "interactive",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "quran" => Ok(SessionKind::Quran),
            "academic" => Ok(SessionKind::Academic),
            "interactive" => Ok(SessionKind::Interactive),
            other => Err(format!("unknown session kind: {other}")),
        }
    }
}
