//! SQL query models.
//!
//! Contains models for SQL query execution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Classification of a SQL statement, deciding the response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    #[default]
    Unknown,
}

impl StatementType {
    /// Statements answered with rows, columns and a total count.
    pub fn is_row_returning(self) -> bool {
        matches!(self, Self::Select)
    }

    /// Statements answered with an affected-row count.
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paging and target options for a query run, taken from the query string.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RunQuery {
    /// Target database id; the default database when absent.
    #[validate(range(min = 1, message = "Database id must be at least 1"))]
    pub database_id: Option<i64>,

    /// First row of the page (default: 0).
    #[validate(range(min = 0, message = "Start row must not be negative"))]
    pub start_row: Option<i64>,

    /// Row after the last row of the page (default: configured page size).
    #[validate(range(min = 1, message = "End row must be at least 1"))]
    pub end_row: Option<i64>,

    /// Whether to compute the total row count (default: true).
    pub with_total_count: Option<bool>,
}

/// Request body carrying the statement to run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RunIn {
    #[validate(length(min = 1, message = "Query must not be empty"))]
    pub query: String,
}

/// Result of running a statement.
///
/// Row-returning statements fill `data`, `columns`, `total_count`, `start_row`
/// and `end_row`; mutating statements fill `affected_rows` only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RunOut {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,

    pub statement_type: StatementType,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub data: Option<Vec<Map<String, Value>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_row: Option<u64>,
}

impl RunOut {
    /// Result for a statement that reported an affected-row count.
    pub fn affected(
        query: impl Into<String>,
        database_id: Option<i64>,
        statement_type: StatementType,
        affected_rows: u64,
    ) -> Self {
        Self {
            query: query.into(),
            database_id,
            statement_type,
            affected_rows: Some(affected_rows),
            ..Default::default()
        }
    }
}
