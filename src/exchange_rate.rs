use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::Currency;

/// Scale of the `rate` column.
pub const RATE_SCALE: u32 = 4;

/// Which upstream supplied a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "exchange_rate_source", rename_all = "UPPERCASE")]
pub enum RateSource {
    /// National Bank of Ukraine, the primary provider.
    Nbu,
    /// PrivatBank public API, the secondary provider.
    PrivatBank,
}

/// A cached rate. `date` is the day data was found for, which can be earlier
/// than the day that was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExchangeRate {
    pub id: Uuid,
    pub currency: Currency,
    pub rate: Decimal,
    pub date: NaiveDate,
    pub source: RateSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExchangeRate {
    pub currency: Currency,
    pub rate: Decimal,
    pub date: NaiveDate,
    pub source: RateSource,
}

impl NewExchangeRate {
    pub fn new(currency: Currency, date: NaiveDate, rate: Decimal, source: RateSource) -> Self {
        Self {
            currency,
            rate: rate.round_dp(RATE_SCALE),
            date,
            source,
        }
    }

    pub fn into_record(self) -> ExchangeRate {
        ExchangeRate {
            id: Uuid::new_v4(),
            currency: self.currency,
            rate: self.rate,
            date: self.date,
            source: self.source,
        }
    }
}
