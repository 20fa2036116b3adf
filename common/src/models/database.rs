//! Database configuration models.
//!
//! A database config names a target database owned by one user and bounds how
//! many pooled connections may be lent out for it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const DEFAULT_POOL_SIZE: i64 = 1;
/// Largest pool a database config may ask for; matches the range checks below.
pub const MAX_POOL_SIZE: i64 = 1000;

/// Owner of a resource, as exposed in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserOut {
    pub id: i64,
    pub username: String,
}

/// Database config as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseOut {
    pub id: i64,
    pub name: String,
    pub pool_size: i64,
    pub owner: UserOut,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for creating a database config.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDatabaseIn {
    /// Unique display name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Maximum concurrent connections, 1 to 1000 (default: 1).
    #[serde(default = "default_pool_size")]
    #[validate(range(min = 1, max = 1000, message = "Pool size must be between 1 and 1000"))]
    pub pool_size: i64,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_pool_size() -> i64 {
    DEFAULT_POOL_SIZE
}

/// Request body for updating a database config. At least one field is required.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "at_least_one_database_field"))]
pub struct UpdateDatabaseIn {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, max = 1000, message = "Pool size must be between 1 and 1000"))]
    pub pool_size: Option<i64>,

    #[serde(default)]
    pub description: Option<String>,
}

fn at_least_one_database_field(input: &UpdateDatabaseIn) -> Result<(), ValidationError> {
    if input.name.is_none() && input.pool_size.is_none() && input.description.is_none() {
        return Err(ValidationError::new("at_least_one")
            .with_message("At least one argument must be provided.".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults_pool_size() {
        let input: CreateDatabaseIn = serde_json::from_str(r#"{"name":"analytics"}"#).unwrap();
        assert_eq!(input.pool_size, 1);
        assert!(input.description.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_rejects_empty_name_and_zero_pool() {
        let input: CreateDatabaseIn =
            serde_json::from_str(r#"{"name":"","pool_size":0}"#).unwrap();
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("pool_size"));
    }

    #[test]
    fn test_pool_size_upper_bound() {
        let input: CreateDatabaseIn =
            serde_json::from_str(r#"{"name":"big","pool_size":1000}"#).unwrap();
        assert!(input.validate().is_ok());

        let input: CreateDatabaseIn =
            serde_json::from_str(r#"{"name":"big","pool_size":1001}"#).unwrap();
        assert!(input.validate().unwrap_err().field_errors().contains_key("pool_size"));

        let input = UpdateDatabaseIn {
            pool_size: Some(5_000_000_000),
            ..Default::default()
        };
        assert!(input.validate().unwrap_err().field_errors().contains_key("pool_size"));
    }

    #[test]
    fn test_create_requires_name() {
        assert!(serde_json::from_str::<CreateDatabaseIn>(r#"{"pool_size":2}"#).is_err());
    }

    #[test]
    fn test_update_requires_at_least_one_field() {
        let errors = UpdateDatabaseIn::default().validate().unwrap_err();
        assert!(errors.field_errors().contains_key("__all__"));
    }

    #[test]
    fn test_update_accepts_single_field() {
        let input = UpdateDatabaseIn {
            description: Some("nightly copy".into()),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_description_omitted_when_absent() {
        let out = DatabaseOut {
            id: 1,
            name: "main".into(),
            pool_size: 1,
            owner: UserOut { id: 1, username: "alice".into() },
            description: None,
        };
        let json = serde_json::to_value(out).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["owner"]["username"], "alice");
    }
}
