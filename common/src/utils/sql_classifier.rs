//! SQL statement classifier.
//!
//! Labels a statement by its leading keyword so the executor knows whether to
//! answer with rows or with an affected-row count, and isolates the single
//! statement a request may run.

use sqlparser::dialect::SQLiteDialect;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer};

use crate::errors::AppError;
use crate::models::StatementType;

/// Classifies SQL statements.
pub struct SqlClassifier;

impl SqlClassifier {
    /// Returns the statement type of `sql`.
    ///
    /// Leading whitespace, `--` line comments, `/* */` block comments and
    /// opening parentheses are skipped; the first keyword is compared
    /// case-insensitively. Anything else is [`StatementType::Unknown`].
    pub fn classify(sql: &str) -> StatementType {
        let keyword = Self::leading_keyword(sql);
        if keyword.eq_ignore_ascii_case("select") {
            StatementType::Select
        } else if keyword.eq_ignore_ascii_case("insert") {
            StatementType::Insert
        } else if keyword.eq_ignore_ascii_case("update") {
            StatementType::Update
        } else if keyword.eq_ignore_ascii_case("delete") {
            StatementType::Delete
        } else {
            StatementType::Unknown
        }
    }

    /// Checks if the SQL is a SELECT query.
    pub fn is_select(sql: &str) -> bool {
        Self::classify(sql).is_row_returning()
    }

    /// Checks if the SQL is a modification query (INSERT/UPDATE/DELETE).
    pub fn is_modification(sql: &str) -> bool {
        Self::classify(sql).is_mutating()
    }

    /// First word of the statement after comments and parentheses.
    fn leading_keyword(sql: &str) -> &str {
        let mut rest = sql;
        loop {
            rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
            if let Some(comment) = rest.strip_prefix("--") {
                rest = comment.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
            } else if let Some(comment) = rest.strip_prefix("/*") {
                // unterminated block comment swallows the statement
                rest = comment.split_once("*/").map(|(_, tail)| tail).unwrap_or("");
            } else {
                break;
            }
        }
        let end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        &rest[..end]
    }
}

/// Returns the one statement in `sql`, without trailing semicolons and comments.
///
/// Input is tokenized with the SQLite dialect so semicolons inside strings,
/// quoted identifiers and comments are not mistaken for separators. Anything
/// but whitespace, comments or stray semicolons after the first statement is a
/// validation error, as is input with no statement at all.
pub fn single_statement(sql: &str) -> Result<&str, AppError> {
    let dialect = SQLiteDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize_with_location()
        .map_err(|e| AppError::field("query", format!("Could not parse statement: {e}")))?;

    let mut last_significant: Option<&TokenWithSpan> = None;
    let mut terminated = false;

    for token in &tokens {
        match &token.token {
            Token::Whitespace(_) | Token::EOF => {}
            Token::SemiColon => terminated = last_significant.is_some(),
            _ if terminated => {
                return Err(AppError::field(
                    "query",
                    "Only one statement can be executed per request",
                ));
            }
            _ => last_significant = Some(token),
        }
    }

    let last = last_significant
        .ok_or_else(|| AppError::field("query", "Query must contain a statement"))?;
    let end = byte_offset(sql, last.span.end);
    Ok(&sql[..end])
}

/// Byte offset of a 1-based line/column location reported by the tokenizer.
fn byte_offset(sql: &str, location: Location) -> usize {
    let (mut line, mut column) = (1u64, 1u64);
    for (offset, ch) in sql.char_indices() {
        if line == location.line && column == location.column {
            return offset;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    sql.len()
}
