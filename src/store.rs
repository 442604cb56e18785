//! Persistent rate cache keyed on (currency, date).

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use sqlx::PgPool;

use crate::currency::Currency;
use crate::error::StoreError;
use crate::exchange_rate::{ExchangeRate, NewExchangeRate};

#[async_trait]
pub trait RateStore: Send + Sync {
    async fn find(&self, currency: Currency, date: NaiveDate) -> Result<Option<ExchangeRate>, StoreError>;

    /// Insert a rate. If a row for the same key already exists the existing
    /// row is returned instead.
    async fn save(&self, rate: NewExchangeRate) -> Result<ExchangeRate, StoreError>;
}

pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn find(&self, currency: Currency, date: NaiveDate) -> Result<Option<ExchangeRate>, StoreError> {
        let row = sqlx::query_as::<_, ExchangeRate>(
            "SELECT id, currency, rate, date, source FROM exchange_rates WHERE currency = $1 AND date = $2",
        )
        .bind(currency)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save(&self, rate: NewExchangeRate) -> Result<ExchangeRate, StoreError> {
        let record = rate.into_record();
        let inserted = sqlx::query_as::<_, ExchangeRate>(
            "INSERT INTO exchange_rates (id, currency, rate, date, source) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (currency, date) DO NOTHING \
             RETURNING id, currency, rate, date, source",
        )
        .bind(record.id)
        .bind(record.currency)
        .bind(record.rate)
        .bind(record.date)
        .bind(record.source)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            None => {
                debug!(
                    "Rate for {} on {} was stored concurrently, reading existing row",
                    record.currency, record.date
                );
                self.find(record.currency, record.date)
                    .await?
                    .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
            }
        }
    }
}
