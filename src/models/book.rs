//! Book model and related types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book cover binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Cover {
    #[default]
    Hard,
    Soft,
}

impl Cover {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cover::Hard => "HARD",
            Cover::Soft => "SOFT",
        }
    }
}

impl std::fmt::Display for Cover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Cover {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HARD" => Ok(Cover::Hard),
            "SOFT" => Ok(Cover::Soft),
            _ => Err(format!("Invalid cover type: {}", s)),
        }
    }
}

// SQLx conversion: covers are stored as text
impl sqlx::Type<Postgres> for Cover {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Cover {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Cover {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub cover: Cover,
    /// Lendable copies currently on the shelf, never negative
    pub inventory: i32,
    #[schema(value_type = String, example = "10.50")]
    pub daily_fee: Decimal,
}

/// Create book request (staff only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: String,
    #[serde(default)]
    pub cover: Cover,
    #[validate(range(min = 0, message = "Inventory must not be negative"))]
    pub inventory: i32,
    #[schema(value_type = String, example = "10.50")]
    pub daily_fee: Decimal,
}

/// Update book request (staff only); absent fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: Option<String>,
    pub cover: Option<Cover>,
    #[validate(range(min = 0, message = "Inventory must not be negative"))]
    pub inventory: Option<i32>,
    #[schema(value_type = Option<String>, example = "10.50")]
    pub daily_fee: Option<Decimal>,
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Search by title or author substring
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_parses_case_insensitive() {
        assert_eq!("hard".parse::<Cover>().unwrap(), Cover::Hard);
        assert_eq!("SOFT".parse::<Cover>().unwrap(), Cover::Soft);
        assert!("spiral".parse::<Cover>().is_err());
    }

    #[test]
    fn cover_defaults_to_hard() {
        assert_eq!(Cover::default(), Cover::Hard);
    }

    #[test]
    fn cover_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Cover::Hard).unwrap(), "\"HARD\"");
        assert_eq!(serde_json::to_string(&Cover::Soft).unwrap(), "\"SOFT\"");
    }
}
