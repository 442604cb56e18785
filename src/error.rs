use chrono::NaiveDate;
use thiserror::Error;

use crate::currency::Currency;

/// Failure of a single upstream provider call. Always absorbed by the resolver.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid endpoint: {0}")]
    Url(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum RateError {
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("{0} is the settlement currency and has no exchange rate")]
    SettlementCurrency(Currency),

    #[error("no exchange rate for {currency} on {date} after {attempts} attempts")]
    ResolutionExhausted {
        currency: Currency,
        date: NaiveDate,
        attempts: u32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RateResult<T> = Result<T, RateError>;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("could not fetch exchange rate for {currency} on {date}: {source}")]
    Rate {
        currency: Currency,
        date: NaiveDate,
        #[source]
        source: RateError,
    },

    #[error("exchange rate is required for non-UAH currencies")]
    MissingRate,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
