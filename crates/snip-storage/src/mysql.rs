use async_trait::async_trait;
use jiff::Timestamp;
use snip_core::store::Result;
use snip_core::{NewUrlRecord, ReadStore, ShortCode, StorageError, UrlRecord, UrlStore};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, trace};

const SELECT_COLUMNS: &str =
    "SELECT id, short_code, original_url, click_count, created_at, expires_at FROM short_urls";

/// MySQL implementation of the store contract.
///
/// Uniqueness of `short_code` is enforced by a unique index, and click counts
/// are bumped with a single `UPDATE ... SET click_count = click_count + 1`, so
/// concurrent resolutions never lose an increment. Timestamps are stored as
/// microseconds since the Unix epoch.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_urls` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(include_str!("../ddl/mysql/short_urls.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_timestamp(column: &str, micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{micros}': {e}"))
    })
}

fn row_to_record(row: &MySqlRow) -> Result<UrlRecord> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let click_count: u64 = row.try_get("click_count").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;

    let short_code = ShortCode::new(short_code)
        .map_err(|e| StorageError::InvalidData(format!("stored short code is invalid: {e}")))?;

    Ok(UrlRecord {
        id,
        original_url,
        short_code,
        click_count,
        created_at: parse_timestamp("created_at", created_at)?,
        expires_at: expires_at
            .map(|value| parse_timestamp("expires_at", value))
            .transpose()?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadStore for MySqlStore {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        trace!(code = %code, "querying record by short code");

        let sql = format!("{SELECT_COLUMNS} WHERE short_code = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE original_url = ? ORDER BY id LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(original_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }
}

#[async_trait]
impl UrlStore for MySqlStore {
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, original_url, click_count, created_at, expires_at)
            VALUES (?, ?, 0, ?, ?)
            "#,
        )
        .bind(record.short_code.as_str())
        .bind(record.original_url.as_str())
        .bind(record.created_at.as_microsecond())
        .bind(record.expires_at.map(|ts| ts.as_microsecond()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_id();
                debug!(code = %record.short_code, id, "inserted record");
                Ok(record.into_record(id))
            }
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(record.short_code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn increment_click_count(&self, code: &ShortCode) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET click_count = click_count + 1
            WHERE short_code = ?
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(code.to_string()));
        }
        Ok(())
    }
}
