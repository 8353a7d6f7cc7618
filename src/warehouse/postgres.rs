//! PostgreSQL warehouse backed by a single-connection `sqlx` pool.
//!
//! The pool is opened once at startup, passed by reference to every loader
//! and closed by `main` on both the success and the error path.

use super::{qualified, Cell, ColumnType, TableRow, Warehouse, WriteMode, RAW_SCHEMA};
use crate::config::DbConfig;
use crate::dimensions::{next_key, UrlFeatures};
use crate::error::Result;
use crate::models::{DomainRow, FeatureRow};
use itertools::Itertools;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info, instrument};

/// Rows per INSERT statement. Keeps the bind count well under the
/// protocol limit of 65535 parameters.
const INSERT_CHUNK: usize = 1000;

#[derive(Debug, Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    /// Connect and make sure the staging schema exists.
    #[instrument(level = "info", skip_all, fields(host = %config.host, database = %config.database))]
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&config.connection_url())
            .await?;
        info!("Database pool created");

        let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {RAW_SCHEMA}");
        sqlx::query(&create_schema).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

pub(crate) fn create_table_sql<R: TableRow>() -> String {
    let columns = R::columns()
        .iter()
        .map(|c| format!("{} {}", c.name, c.ty.sql()))
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified(R::TABLE),
        columns
    )
}

pub(crate) fn drop_table_sql<R: TableRow>() -> String {
    format!("DROP TABLE IF EXISTS {}", qualified(R::TABLE))
}

pub(crate) fn insert_prefix<R: TableRow>() -> String {
    let columns = R::columns().iter().map(|c| c.name).join(", ");
    format!("INSERT INTO {} ({}) ", qualified(R::TABLE), columns)
}

/// Bind one cell. NULLs are bound with the column's type so Postgres can
/// infer the parameter type.
fn push_cell(b: &mut Separated<'_, '_, Postgres, &'static str>, cell: Cell, ty: ColumnType) {
    match cell {
        Cell::Text(v) => b.push_bind(v),
        Cell::Int(v) => b.push_bind(v),
        Cell::Float(v) => b.push_bind(v),
        Cell::Bool(v) => b.push_bind(v),
        Cell::Null => match ty {
            ColumnType::Text => b.push_bind(None::<String>),
            ColumnType::BigInt => b.push_bind(None::<i64>),
            ColumnType::Double => b.push_bind(None::<f64>),
            ColumnType::Boolean => b.push_bind(None::<bool>),
        },
    };
}

async fn ensure_table<R: TableRow>(conn: &mut PgConnection) -> Result<()> {
    let sql = create_table_sql::<R>();
    sqlx::query(&sql).execute(conn).await?;
    Ok(())
}

async fn next_id(conn: &mut PgConnection, table: &str, key_column: &str) -> Result<i64> {
    let sql = format!("SELECT MAX({key_column}) FROM {}", qualified(table));
    let max: Option<i64> = sqlx::query_scalar(&sql).fetch_one(conn).await?;
    Ok(next_key(max))
}

impl Warehouse for PgWarehouse {
    #[instrument(level = "info", skip_all, fields(table = R::TABLE, rows = rows.len(), ?mode))]
    async fn write<R: TableRow + Sync>(&self, rows: &[R], mode: WriteMode) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        if mode == WriteMode::Replace {
            let drop = drop_table_sql::<R>();
            sqlx::query(&drop).execute(&mut *tx).await?;
        }
        ensure_table::<R>(&mut *tx).await?;

        let mut written = 0u64;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb = QueryBuilder::<Postgres>::new(insert_prefix::<R>());
            qb.push_values(chunk, |mut b, row| {
                for (cell, column) in row.cells().into_iter().zip(R::columns()) {
                    push_cell(&mut b, cell, column.ty);
                }
            });
            written += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        info!(written, "Wrote rows");
        Ok(written)
    }

    #[instrument(level = "debug", skip(self))]
    async fn resolve_domain(&self, domain_name: &str) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        ensure_table::<DomainRow>(&mut *tx).await?;

        let lookup = format!(
            "SELECT domain_id FROM {} WHERE domain_name = $1 ORDER BY domain_id LIMIT 1",
            qualified(DomainRow::TABLE)
        );
        let existing: Option<i64> = sqlx::query_scalar(&lookup)
            .bind(domain_name)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(id) = existing {
            tx.commit().await?;
            debug!(id, "Reusing domain key");
            return Ok(id);
        }

        let id = next_id(&mut *tx, DomainRow::TABLE, "domain_id").await?;
        let insert = format!(
            "INSERT INTO {} (domain_id, domain_name) VALUES ($1, $2)",
            qualified(DomainRow::TABLE)
        );
        sqlx::query(&insert)
            .bind(id)
            .bind(domain_name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(id, domain_name, "Inserted domain");
        Ok(id)
    }

    #[instrument(level = "debug", skip(self))]
    async fn resolve_features(&self, features: &UrlFeatures) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        ensure_table::<FeatureRow>(&mut *tx).await?;

        let lookup = format!(
            "SELECT feature_id FROM {} \
             WHERE uses_https = $1 AND has_ip_address = $2 AND url_length = $3 \
             ORDER BY feature_id LIMIT 1",
            qualified(FeatureRow::TABLE)
        );
        let existing: Option<i64> = sqlx::query_scalar(&lookup)
            .bind(features.uses_https)
            .bind(features.has_ip_address)
            .bind(features.url_length)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(id) = existing {
            tx.commit().await?;
            debug!(id, "Reusing feature key");
            return Ok(id);
        }

        let id = next_id(&mut *tx, FeatureRow::TABLE, "feature_id").await?;
        let insert = format!(
            "INSERT INTO {} (feature_id, uses_https, has_ip_address, url_length) \
             VALUES ($1, $2, $3, $4)",
            qualified(FeatureRow::TABLE)
        );
        sqlx::query(&insert)
            .bind(id)
            .bind(features.uses_https)
            .bind(features.has_ip_address)
            .bind(features.url_length)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(id, ?features, "Inserted URL feature tuple");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FactPhishingUrl, PhishingTrend};

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            create_table_sql::<DomainRow>(),
            "CREATE TABLE IF NOT EXISTS raw.dim_domains (domain_id BIGINT, domain_name TEXT)"
        );
        assert_eq!(
            create_table_sql::<FeatureRow>(),
            "CREATE TABLE IF NOT EXISTS raw.dim_url_features \
             (feature_id BIGINT, uses_https BOOLEAN, has_ip_address BOOLEAN, url_length BIGINT)"
        );
    }

    #[test]
    fn test_drop_table_sql() {
        assert_eq!(
            drop_table_sql::<PhishingTrend>(),
            "DROP TABLE IF EXISTS raw.phishing_trends"
        );
    }

    #[test]
    fn test_insert_prefix() {
        assert_eq!(
            insert_prefix::<FactPhishingUrl>(),
            "INSERT INTO raw.fact_phishing_urls \
             (url, in_database, phishing_status, timestamp, domain_id, feature_id) "
        );
    }

    // Live-database tests. They use the `PG_*` variables and clean up the
    // rows they insert: `cargo test -- --ignored`.

    fn unique_suffix() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    }

    async fn live_warehouse() -> PgWarehouse {
        let config = DbConfig::from_env().unwrap();
        PgWarehouse::connect(&config).await.unwrap()
    }

    async fn max_key<R: TableRow>(wh: &PgWarehouse, key_column: &str) -> Option<i64> {
        let mut conn = wh.pool.acquire().await.unwrap();
        ensure_table::<R>(&mut *conn).await.unwrap();
        let sql = format!("SELECT MAX({key_column}) FROM {}", qualified(R::TABLE));
        sqlx::query_scalar(&sql).fetch_one(&mut *conn).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL database configured through PG_* variables"]
    async fn test_live_domain_key_is_max_plus_one_then_reused() {
        let wh = live_warehouse().await;
        let name = format!("loader-test-{}.example", unique_suffix());

        let before = max_key::<DomainRow>(&wh, "domain_id").await;

        let id = wh.resolve_domain(&name).await.unwrap();
        assert_eq!(id, next_key(before));

        let again = wh.resolve_domain(&name).await.unwrap();
        assert_eq!(again, id);

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE domain_name = $1",
            qualified(DomainRow::TABLE)
        ))
        .bind(&name)
        .fetch_one(&wh.pool)
        .await
        .unwrap();
        assert_eq!(count, 1);

        sqlx::query(&format!(
            "DELETE FROM {} WHERE domain_name = $1",
            qualified(DomainRow::TABLE)
        ))
        .bind(&name)
        .execute(&wh.pool)
        .await
        .unwrap();
        wh.close().await;
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL database configured through PG_* variables"]
    async fn test_live_feature_tuple_key_is_max_plus_one_then_reused() {
        let wh = live_warehouse().await;
        // A negative length never comes from a real URL.
        let features = UrlFeatures {
            uses_https: true,
            has_ip_address: true,
            url_length: -((unique_suffix() % 1_000_000_000) as i64) - 1,
        };

        let before = max_key::<FeatureRow>(&wh, "feature_id").await;

        let id = wh.resolve_features(&features).await.unwrap();
        assert_eq!(id, next_key(before));
        assert_eq!(wh.resolve_features(&features).await.unwrap(), id);

        sqlx::query(&format!(
            "DELETE FROM {} WHERE feature_id = $1",
            qualified(FeatureRow::TABLE)
        ))
        .bind(id)
        .execute(&wh.pool)
        .await
        .unwrap();
        wh.close().await;
    }
}
