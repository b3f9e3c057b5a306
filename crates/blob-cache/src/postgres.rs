//! `sqlx`-backed `BlobCache`: a `PgPoolOptions` connection pool plus
//! `sqlx::migrate!("./migrations")`, storing the serialized [`BundleBlob`]
//! JSON document keyed by the bundle's mainnet end block.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::error;

use crate::blob::BundleBlob;
use crate::error::BlobCacheError;
use crate::BlobCache;

pub struct PostgresBlobCache {
    pool: PgPool,
}

impl PostgresBlobCache {
    pub async fn connect(database_url: &str) -> Result<Self, BlobCacheError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| BlobCacheError::BackendUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the migrations embedded under `./migrations` against the pool.
    pub async fn run_migrations(&self) -> Result<(), BlobCacheError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BlobCacheError::BackendUnavailable(e.to_string()))
    }
}

#[async_trait]
impl BlobCache for PostgresBlobCache {
    async fn get(&self, key: u64) -> Result<Option<BundleBlob>, BlobCacheError> {
        let row = sqlx::query(r#"SELECT document FROM bundle_blobs WHERE end_block = $1"#)
            .bind(key as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, key, "failed to read bundle blob");
                BlobCacheError::BackendUnavailable(e.to_string())
            })?;

        match row {
            Some(row) => {
                let raw: String = row.get("document");
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: u64, blob: &BundleBlob) -> Result<(), BlobCacheError> {
        let document = serde_json::to_string(blob)?;
        sqlx::query(
            r#"
            INSERT INTO bundle_blobs (end_block, document)
            VALUES ($1, $2)
            ON CONFLICT (end_block) DO UPDATE SET document = EXCLUDED.document
            "#,
        )
        .bind(key as i64)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, key, "failed to write bundle blob");
            BlobCacheError::BackendUnavailable(e.to_string())
        })?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), BlobCacheError> {
        sqlx::query(r#"TRUNCATE bundle_blobs"#)
            .execute(&self.pool)
            .await
            .map_err(|e| BlobCacheError::BackendUnavailable(e.to_string()))?;
        Ok(())
    }
}
