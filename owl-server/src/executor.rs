//! SQL statement execution against a target database.
//!
//! The statement type decides the result shape:
//! - SELECT: a page of rows `[start_row, end_row)`, its columns and optionally
//!   the total row count
//! - INSERT / UPDATE / DELETE: the affected row count
//! - anything else: rows when the prepared statement describes result
//!   columns, the affected row count otherwise
//!
//! Only one statement runs per request; input with more than one is rejected
//! before anything executes. Rows are streamed and only the requested page is
//! kept; `end_row` never exceeds the configured hard limit. Every statement
//! runs under the configured timeout.

use std::future::Future;
use std::time::Duration;

use futures_util::TryStreamExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Executor, SqlitePool, Statement};
use tokio::time::timeout;

use common::config::QuerySettings;
use common::errors::{AppError, AppResult};
use common::models::{RunOut, RunQuery, StatementType};
use common::utils::{single_statement, SqlClassifier};

use crate::row::{column_names, row_to_json};

/// Half-open row range `[start, end)` applied to a row-returning statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u64,
    pub end: u64,
}

impl PageWindow {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Runs client statements with the paging limits it was built with.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    settings: QuerySettings,
}

impl QueryExecutor {
    pub fn new(settings: QuerySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> QuerySettings {
        self.settings
    }

    /// Applies defaults and the hard limit to the requested rows.
    pub fn window(&self, start_row: Option<i64>, end_row: Option<i64>) -> PageWindow {
        let hard_limit = u64::from(self.settings.result_set_hard_limit);
        let start = start_row.map_or(0, |s| u64::try_from(s).unwrap_or(0));
        let end = end_row
            .map_or(u64::from(self.settings.default_page_size), |e| {
                u64::try_from(e).unwrap_or(0)
            })
            .min(hard_limit);
        PageWindow { start, end }
    }

    /// Executes one statement and shapes the result by its type.
    pub async fn execute(
        &self,
        pool: &SqlitePool,
        database_id: Option<i64>,
        sql: &str,
        params: &RunQuery,
    ) -> AppResult<RunOut> {
        let statement = single_statement(sql)?;
        let statement_type = SqlClassifier::classify(statement);
        tracing::debug!(%statement_type, ?database_id, "Executing statement");

        let mut out = match statement_type {
            StatementType::Select => {
                let with_total_count = params.with_total_count.unwrap_or(true);
                self.fetch_page(pool, database_id, statement, statement_type, params, with_total_count)
                    .await?
            }
            StatementType::Insert | StatementType::Update | StatementType::Delete => {
                let affected = self.execute_write(pool, statement).await?;
                RunOut::affected(statement, database_id, statement_type, affected)
            }
            StatementType::Unknown => {
                if self.describe(pool, statement).await?.is_empty() {
                    let affected = self.execute_write(pool, statement).await?;
                    RunOut::affected(statement, database_id, statement_type, affected)
                } else {
                    self.fetch_page(pool, database_id, statement, statement_type, params, false)
                        .await?
                }
            }
        };

        // echo the request as sent, not the trimmed statement
        out.query = sql.to_string();
        Ok(out)
    }

    async fn fetch_page(
        &self,
        pool: &SqlitePool,
        database_id: Option<i64>,
        sql: &str,
        statement_type: StatementType,
        params: &RunQuery,
        with_total_count: bool,
    ) -> AppResult<RunOut> {
        let window = self.window(params.start_row, params.end_row);

        let rows = if window.is_empty() {
            Vec::new()
        } else {
            self.with_timeout(fetch_window(pool, sql, window)).await?
        };

        let columns = match rows.first() {
            Some(row) => column_names(row),
            None => self.describe(pool, sql).await?,
        };

        let total_count = if with_total_count {
            Some(self.count(pool, sql).await?)
        } else {
            None
        };

        tracing::debug!(
            rows = rows.len(),
            start = window.start,
            end = window.end,
            "Page fetched"
        );

        Ok(RunOut {
            query: sql.to_string(),
            database_id,
            statement_type,
            data: Some(rows.iter().map(row_to_json).collect()),
            columns: Some(columns),
            affected_rows: None,
            total_count,
            start_row: Some(window.start),
            end_row: Some(window.end),
        })
    }

    async fn execute_write(&self, pool: &SqlitePool, sql: &str) -> AppResult<u64> {
        let result = self.with_timeout(pool.execute(sql)).await?;
        Ok(result.rows_affected())
    }

    /// Result columns described by the prepared statement.
    async fn describe(&self, pool: &SqlitePool, sql: &str) -> AppResult<Vec<String>> {
        let statement = self.with_timeout(pool.prepare(sql)).await?;
        Ok(statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    async fn count(&self, pool: &SqlitePool, sql: &str) -> AppResult<u64> {
        let count_sql = format!("SELECT COUNT(*) FROM (\n{sql}\n)");
        let total: i64 = self
            .with_timeout(sqlx::query_scalar(&count_sql).fetch_one(pool))
            .await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn with_timeout<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let limit = Duration::from_secs(self.settings.query_timeout_secs);
        match timeout(limit, fut).await {
            Ok(result) => result.map_err(AppError::execution),
            Err(_) => Err(AppError::Execution(format!(
                "statement timed out after {}s",
                limit.as_secs()
            ))),
        }
    }
}

/// Streams the statement, keeping only the rows inside the window.
async fn fetch_window(
    pool: &SqlitePool,
    sql: &str,
    window: PageWindow,
) -> Result<Vec<SqliteRow>, sqlx::Error> {
    let mut stream = pool.fetch(sql);
    let mut rows = Vec::with_capacity(usize::try_from(window.len()).unwrap_or(0));
    let mut index = 0u64;

    while index < window.end {
        let Some(row) = stream.try_next().await? else {
            break;
        };
        if index >= window.start {
            rows.push(row);
        }
        index += 1;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, x INTEGER, label TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        for i in 1..=25 {
            sqlx::query("INSERT INTO t (x, label) VALUES (?, ?)")
                .bind(i)
                .bind(format!("row {i}"))
                .execute(&pool)
                .await
                .unwrap();
        }
        pool
    }

    fn executor() -> QueryExecutor {
        QueryExecutor::new(QuerySettings::new(10, 20, 5))
    }

    fn page(start: i64, end: i64) -> RunQuery {
        RunQuery {
            start_row: Some(start),
            end_row: Some(end),
            ..Default::default()
        }
    }

    #[test]
    fn test_window_defaults_and_clamping() {
        let exec = executor();
        assert_eq!(exec.window(None, None), PageWindow { start: 0, end: 10 });
        assert_eq!(exec.window(Some(5), Some(500)), PageWindow { start: 5, end: 20 });
        assert!(exec.window(Some(8), Some(3)).is_empty());
    }

    #[tokio::test]
    async fn test_select_literal() {
        let pool = pool().await;
        let out = executor()
            .execute(&pool, None, "SELECT 1", &page(0, 10))
            .await
            .unwrap();

        assert_eq!(out.statement_type, StatementType::Select);
        assert_eq!(out.data.as_ref().unwrap().len(), 1);
        assert_eq!(out.columns.as_ref().unwrap().len(), 1);
        assert_eq!(out.total_count, Some(1));
        assert!(out.affected_rows.is_none());
    }

    #[tokio::test]
    async fn test_select_pages_rows() {
        let pool = pool().await;
        let out = executor()
            .execute(&pool, Some(3), "select id, label from t order by id;", &page(5, 8))
            .await
            .unwrap();

        let data = out.data.unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0]["id"], 6);
        assert_eq!(data[2]["label"], "row 8");
        assert_eq!(out.columns.unwrap(), vec!["id", "label"]);
        assert_eq!(out.total_count, Some(25));
        assert_eq!(out.start_row, Some(5));
        assert_eq!(out.end_row, Some(8));
        assert_eq!(out.database_id, Some(3));
    }

    #[tokio::test]
    async fn test_end_row_clamped_to_hard_limit() {
        let pool = pool().await;
        let out = executor()
            .execute(&pool, None, "SELECT * FROM t", &page(0, 1000))
            .await
            .unwrap();
        assert_eq!(out.data.unwrap().len(), 20);
        assert_eq!(out.end_row, Some(20));
        assert_eq!(out.total_count, Some(25));
    }

    #[tokio::test]
    async fn test_empty_window_keeps_columns() {
        let pool = pool().await;
        let out = executor()
            .execute(&pool, None, "SELECT id, x FROM t", &page(7, 7))
            .await
            .unwrap();
        assert!(out.data.unwrap().is_empty());
        assert_eq!(out.columns.unwrap(), vec!["id", "x"]);
    }

    #[tokio::test]
    async fn test_start_beyond_rows_is_empty() {
        let pool = pool().await;
        let out = executor()
            .execute(&pool, None, "SELECT * FROM t", &page(15, 20))
            .await
            .unwrap();
        assert_eq!(out.data.unwrap().len(), 5);

        let out = executor()
            .execute(&pool, None, "SELECT * FROM t", &page(30, 40))
            .await
            .unwrap();
        assert!(out.data.unwrap().is_empty());
        assert_eq!(out.total_count, Some(25));

        let out = executor()
            .execute(&pool, None, "SELECT * FROM t WHERE x > 100", &page(0, 5))
            .await
            .unwrap();
        assert!(out.data.unwrap().is_empty());
        assert_eq!(out.total_count, Some(0));
    }

    #[tokio::test]
    async fn test_total_count_can_be_skipped() {
        let pool = pool().await;
        let params = RunQuery {
            with_total_count: Some(false),
            ..Default::default()
        };
        let out = executor()
            .execute(&pool, None, "SELECT * FROM t", &params)
            .await
            .unwrap();
        assert!(out.total_count.is_none());
        assert_eq!(out.data.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_update_reports_affected_rows() {
        let pool = pool().await;
        let out = executor()
            .execute(&pool, None, "UPDATE t SET x = 1 WHERE id <= 4", &RunQuery::default())
            .await
            .unwrap();
        assert_eq!(out.statement_type, StatementType::Update);
        assert_eq!(out.affected_rows, Some(4));
        assert!(out.data.is_none());
        assert!(out.columns.is_none());
        assert!(out.total_count.is_none());
        assert!(out.start_row.is_none());
    }

    #[tokio::test]
    async fn test_unknown_statements() {
        let pool = pool().await;
        let exec = executor();

        let out = exec
            .execute(&pool, None, "CREATE TABLE u (a TEXT)", &RunQuery::default())
            .await
            .unwrap();
        assert_eq!(out.statement_type, StatementType::Unknown);
        assert_eq!(out.affected_rows, Some(0));

        let out = exec
            .execute(&pool, None, "WITH c AS (SELECT 2 AS n) SELECT n FROM c", &RunQuery::default())
            .await
            .unwrap();
        assert_eq!(out.statement_type, StatementType::Unknown);
        assert_eq!(out.data.unwrap()[0]["n"], 2);
        assert!(out.total_count.is_none());
    }

    #[tokio::test]
    async fn test_engine_error_is_verbatim() {
        let pool = pool().await;
        let err = executor()
            .execute(&pool, None, "SELECT * FROM missing_table", &RunQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Execution(_)));
        assert!(err.to_string().contains("no such table: missing_table"));
    }

    async fn row_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_multiple_statements_rejected_before_running() {
        let pool = pool().await;
        let exec = executor();

        for sql in [
            "SELECT 1; DELETE FROM t",
            "UPDATE t SET x = 9 WHERE id = 1; DELETE FROM t",
        ] {
            let err = exec
                .execute(&pool, None, sql, &RunQuery::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }), "{sql}");
        }

        assert_eq!(row_count(&pool).await, 25);
        let x: i64 = sqlx::query_scalar("SELECT x FROM t WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(x, 1);
    }

    #[tokio::test]
    async fn test_trailing_comment_is_counted() {
        let pool = pool().await;
        let sql = "SELECT x FROM t; -- all rows";
        let out = executor()
            .execute(&pool, None, sql, &page(0, 5))
            .await
            .unwrap();

        assert_eq!(out.statement_type, StatementType::Select);
        assert_eq!(out.data.unwrap().len(), 5);
        assert_eq!(out.total_count, Some(25));
        assert_eq!(out.query, sql);

        let out = executor()
            .execute(&pool, None, "SELECT id FROM t /* first */", &page(0, 1))
            .await
            .unwrap();
        assert_eq!(out.total_count, Some(25));
    }
}
