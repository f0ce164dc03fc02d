//! SQLite store implementation.
//!
//! The durable backend: a single file that survives restarts, which is
//! what makes cross-run dedup possible at all. Uses a connection pool
//! and a transaction per `upsert` so the read-modify-write on one
//! record is atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Row};
use std::collections::HashMap;

use crate::error::{StoreError, StoreResult};
use crate::types::{
    Listing, ListingRecord, OutcomeTier, PriceDrop, PricePoint, StoreStats, UpsertOutcome,
};

use super::{count_drops, ListingStore};

/// SQLite-backed listing store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - in-memory database (tests)
    /// - `sqlite://homescout.db?mode=rwc` - file, created if missing
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StoreError::unavailable)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// In-memory database, for tests.
    ///
    /// Pinned to a single connection: every pooled connection to
    /// `sqlite::memory:` would otherwise get its own empty database.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(StoreError::unavailable)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                identity_key TEXT PRIMARY KEY,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                last_price INTEGER NOT NULL,
                last_outcome_tier TEXT NOT NULL,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                notified_at TEXT,
                notified_price INTEGER,
                notified_tier TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_listings_city ON listings(city);
            CREATE INDEX IF NOT EXISTS idx_listings_notified_at ON listings(notified_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identity_key TEXT NOT NULL REFERENCES listings(identity_key),
                price INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_price_history_key ON price_history(identity_key);
            CREATE INDEX IF NOT EXISTS idx_price_history_recorded ON price_history(recorded_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notification_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identity_key TEXT NOT NULL,
                sent_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_history(&self, identity_key: &str) -> StoreResult<Vec<PricePoint>> {
        let rows: Vec<PriceRow> = sqlx::query_as(
            "SELECT identity_key, price, recorded_at FROM price_history \
             WHERE identity_key = ? ORDER BY recorded_at ASC, id ASC",
        )
        .bind(identity_key)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        rows.into_iter().map(|r| r.into_price_point()).collect()
    }
}

// Row types for sqlx queries

#[derive(Debug, FromRow)]
struct ListingRow {
    identity_key: String,
    address: String,
    city: String,
    state: String,
    last_price: i64,
    last_outcome_tier: String,
    first_seen: String,
    last_seen: String,
    notified_at: Option<String>,
    notified_price: Option<i64>,
    notified_tier: Option<String>,
}

impl ListingRow {
    fn into_record(self, price_history: Vec<PricePoint>) -> StoreResult<ListingRecord> {
        let key = &self.identity_key;
        Ok(ListingRecord {
            last_outcome_tier: parse_tier(key, &self.last_outcome_tier)?,
            first_seen: parse_ts(key, &self.first_seen)?,
            last_seen: parse_ts(key, &self.last_seen)?,
            notified_at: self
                .notified_at
                .as_deref()
                .map(|ts| parse_ts(key, ts))
                .transpose()?,
            notified_price: self.notified_price.map(|p| p as u64),
            notified_tier: self
                .notified_tier
                .as_deref()
                .map(|t| parse_tier(key, t))
                .transpose()?,
            identity_key: self.identity_key,
            address: self.address,
            city: self.city,
            state: self.state,
            price_history,
        })
    }
}

#[derive(Debug, FromRow)]
struct PriceRow {
    identity_key: String,
    price: i64,
    recorded_at: String,
}

impl PriceRow {
    fn into_price_point(self) -> StoreResult<PricePoint> {
        Ok(PricePoint {
            at: parse_ts(&self.identity_key, &self.recorded_at)?,
            price: self.price as u64,
        })
    }
}

fn parse_ts(identity_key: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            identity_key: identity_key.to_string(),
            reason: format!("bad timestamp {value:?}: {e}"),
        })
}

fn parse_tier(identity_key: &str, value: &str) -> StoreResult<OutcomeTier> {
    value.parse().map_err(|_| StoreError::Corrupt {
        identity_key: identity_key.to_string(),
        reason: format!("bad outcome tier {value:?}"),
    })
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn get(&self, identity_key: &str) -> StoreResult<Option<ListingRecord>> {
        let row: Option<ListingRow> =
            sqlx::query_as("SELECT * FROM listings WHERE identity_key = ?")
                .bind(identity_key)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::unavailable)?;

        match row {
            Some(row) => {
                let history = self.load_history(identity_key).await?;
                Ok(Some(row.into_record(history)?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(
        &self,
        listing: &Listing,
        tier: OutcomeTier,
        at: DateTime<Utc>,
    ) -> StoreResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await.map_err(StoreError::unavailable)?;

        let existing: Option<ListingRow> =
            sqlx::query_as("SELECT * FROM listings WHERE identity_key = ?")
                .bind(&listing.identity_key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::unavailable)?;

        let outcome = match existing {
            None => {
                sqlx::query(
                    "INSERT INTO listings \
                     (identity_key, address, city, state, last_price, last_outcome_tier, \
                      first_seen, last_seen) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&listing.identity_key)
                .bind(&listing.address)
                .bind(&listing.city)
                .bind(&listing.state)
                .bind(listing.price as i64)
                .bind(tier.as_str())
                .bind(at.to_rfc3339())
                .bind(at.to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(StoreError::unavailable)?;

                sqlx::query(
                    "INSERT INTO price_history (identity_key, price, recorded_at) VALUES (?, ?, ?)",
                )
                .bind(&listing.identity_key)
                .bind(listing.price as i64)
                .bind(at.to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(StoreError::unavailable)?;

                UpsertOutcome {
                    is_new: true,
                    price_changed: false,
                    previous_tier: None,
                }
            }
            Some(row) => {
                let previous_tier = Some(parse_tier(&row.identity_key, &row.last_outcome_tier)?);

                // Same comparison as the in-memory transition: the guard
                // is the last *price point's* timestamp, not `last_seen`
                // (which advances on every observation).
                let last_point: Option<PriceRow> = sqlx::query_as(
                    "SELECT identity_key, price, recorded_at FROM price_history \
                     WHERE identity_key = ? ORDER BY recorded_at DESC, id DESC LIMIT 1",
                )
                .bind(&listing.identity_key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::unavailable)?;
                let price_changed = match last_point {
                    Some(point) => {
                        let point = point.into_price_point()?;
                        listing.price != point.price && at > point.at
                    }
                    None => false,
                };

                if price_changed {
                    sqlx::query(
                        "INSERT INTO price_history (identity_key, price, recorded_at) \
                         VALUES (?, ?, ?)",
                    )
                    .bind(&listing.identity_key)
                    .bind(listing.price as i64)
                    .bind(at.to_rfc3339())
                    .execute(&mut *tx)
                    .await
                    .map_err(StoreError::unavailable)?;
                }

                sqlx::query(
                    "UPDATE listings SET last_price = ?, last_outcome_tier = ?, last_seen = ? \
                     WHERE identity_key = ?",
                )
                .bind(if price_changed {
                    listing.price as i64
                } else {
                    row.last_price
                })
                .bind(tier.as_str())
                .bind(at.to_rfc3339())
                .bind(&listing.identity_key)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::unavailable)?;

                UpsertOutcome {
                    is_new: false,
                    price_changed,
                    previous_tier,
                }
            }
        };

        tx.commit().await.map_err(StoreError::unavailable)?;
        Ok(outcome)
    }

    async fn should_notify(&self, identity_key: &str, tier: OutcomeTier) -> StoreResult<bool> {
        Ok(self
            .get(identity_key)
            .await?
            .map(|record| record.wants_notification(tier))
            .unwrap_or(true))
    }

    async fn mark_notified(&self, identity_key: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::unavailable)?;

        sqlx::query(
            "UPDATE listings SET notified_at = ?, notified_price = last_price, \
             notified_tier = last_outcome_tier WHERE identity_key = ?",
        )
        .bind(at.to_rfc3339())
        .bind(identity_key)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::unavailable)?;

        sqlx::query("INSERT INTO notification_history (identity_key, sent_at) VALUES (?, ?)")
            .bind(identity_key)
            .bind(at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::unavailable)?;

        tx.commit().await.map_err(StoreError::unavailable)?;
        Ok(())
    }

    async fn city_average_price(&self, city: &str) -> StoreResult<Option<f64>> {
        let row = sqlx::query(
            "SELECT AVG(last_price) AS avg_price FROM listings \
             WHERE LOWER(city) = LOWER(?) AND last_price > 0",
        )
        .bind(city)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        Ok(row.get::<Option<f64>, _>("avg_price"))
    }

    async fn recent_price_drops(
        &self,
        min_drop_percent: f64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<PriceDrop>> {
        // Histories are tiny (a handful of points per listing), so pull
        // them and compare the last two points in process.
        let rows: Vec<PriceRow> = sqlx::query_as(
            "SELECT identity_key, price, recorded_at FROM price_history \
             ORDER BY identity_key ASC, recorded_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        let mut by_key: HashMap<String, Vec<PricePoint>> = HashMap::new();
        for row in rows {
            let key = row.identity_key.clone();
            by_key.entry(key).or_default().push(row.into_price_point()?);
        }

        let mut drops = Vec::new();
        for (key, history) in by_key {
            let [.., prev, last] = history.as_slice() else {
                continue;
            };
            if last.at < since || last.price >= prev.price {
                continue;
            }
            let drop_percent = (prev.price - last.price) as f64 * 100.0 / prev.price as f64;
            if drop_percent < min_drop_percent {
                continue;
            }
            let row = sqlx::query("SELECT address, city FROM listings WHERE identity_key = ?")
                .bind(&key)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::unavailable)?;
            let (address, city) = row
                .map(|r| (r.get::<String, _>("address"), r.get::<String, _>("city")))
                .unwrap_or_default();
            drops.push(PriceDrop {
                identity_key: key,
                address,
                city,
                old_price: prev.price,
                new_price: last.price,
                drop_percent,
                at: last.at,
            });
        }

        drops.sort_by(|a, b| {
            b.drop_percent
                .partial_cmp(&a.drop_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(drops)
    }

    async fn prune_stale(&self, older_than: DateTime<Utc>) -> StoreResult<usize> {
        let mut tx = self.pool.begin().await.map_err(StoreError::unavailable)?;

        sqlx::query(
            "DELETE FROM price_history WHERE identity_key IN \
             (SELECT identity_key FROM listings WHERE notified_at IS NULL AND first_seen < ?)",
        )
        .bind(older_than.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::unavailable)?;

        let deleted = sqlx::query("DELETE FROM listings WHERE notified_at IS NULL AND first_seen < ?")
            .bind(older_than.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::unavailable)?;

        tx.commit().await.map_err(StoreError::unavailable)?;
        Ok(deleted.rows_affected() as usize)
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let totals = sqlx::query(
            "SELECT COUNT(*) AS total, \
             SUM(CASE WHEN notified_at IS NOT NULL THEN 1 ELSE 0 END) AS notified \
             FROM listings",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        let city_rows = sqlx::query(
            "SELECT city, AVG(last_price) AS avg_price FROM listings \
             WHERE last_price > 0 GROUP BY city",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        let history: Vec<PriceRow> = sqlx::query_as(
            "SELECT identity_key, price, recorded_at FROM price_history \
             ORDER BY identity_key ASC, recorded_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        let mut by_key: HashMap<String, Vec<PricePoint>> = HashMap::new();
        for row in history {
            let key = row.identity_key.clone();
            by_key.entry(key).or_default().push(row.into_price_point()?);
        }
        let price_drops_observed = by_key.values().map(|h| count_drops(h)).sum();

        Ok(StoreStats {
            total_tracked: totals.get::<i64, _>("total") as usize,
            notified_count: totals.get::<Option<i64>, _>("notified").unwrap_or(0) as usize,
            price_drops_observed,
            avg_price_per_city: city_rows
                .into_iter()
                .map(|r| (r.get::<String, _>("city"), r.get::<f64, _>("avg_price")))
                .collect(),
        })
    }
}
