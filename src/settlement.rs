//! Conversion of expense amounts into the settlement currency.
//!
//! A foreign-currency expense is settled by resolving one rate for its date.
//! The rate and the day it was published for are kept with the result so the
//! settled amount can be audited later.

use chrono::NaiveDate;
use log::{error, info};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::Currency;
use crate::error::SettlementError;
use crate::resolver::RateResolver;

/// Scale of expense amounts.
pub const AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub amount: Decimal,
    pub currency: Currency,
    pub date: NaiveDate,
    pub amount_uah: Decimal,
    pub exchange_rate: Option<Decimal>,
    pub rate_date: Option<NaiveDate>,
}

/// Fields of an expense update that affect its settled amount.
#[derive(Debug, Clone, Default)]
pub struct SettlementChange {
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub date: Option<NaiveDate>,
}

pub async fn settle(
    resolver: &RateResolver,
    amount: Decimal,
    currency: Currency,
    date: NaiveDate,
) -> Result<Settlement, SettlementError> {
    if currency.is_settlement() {
        info!("Settling UAH expense, amount_uah = {}", amount);
        return Ok(Settlement {
            amount,
            currency,
            date,
            amount_uah: amount,
            exchange_rate: None,
            rate_date: None,
        });
    }

    let rate = resolver.resolve(currency, date).await.map_err(|source| {
        error!("Failed to fetch exchange rate for {} on {}: {}", currency, date, source);
        SettlementError::Rate {
            currency,
            date,
            source,
        }
    })?;

    let amount_uah = (amount * rate.rate).round_dp(AMOUNT_SCALE);
    info!(
        "Exchange rate for {} on {}: {} (source: {:?}, rate date: {}), amount_uah = {}",
        currency, date, rate.rate, rate.source, rate.date, amount_uah
    );

    Ok(Settlement {
        amount,
        currency,
        date,
        amount_uah,
        exchange_rate: Some(rate.rate),
        rate_date: Some(rate.date),
    })
}

/// Re-settles an updated expense. A new rate is resolved only when the
/// currency or date changed; an amount-only change reuses the stored rate.
pub async fn resettle(
    resolver: &RateResolver,
    previous: &Settlement,
    change: SettlementChange,
) -> Result<Settlement, SettlementError> {
    let currency_changed = change.currency.is_some_and(|c| c != previous.currency);
    let date_changed = change.date.is_some_and(|d| d != previous.date);
    let amount_changed = change.amount.is_some();

    if !currency_changed && !date_changed && !amount_changed {
        return Ok(previous.clone());
    }

    let amount = change.amount.unwrap_or(previous.amount);
    let currency = change.currency.unwrap_or(previous.currency);
    let date = change.date.unwrap_or(previous.date);

    if currency.is_settlement() || currency_changed || date_changed {
        return settle(resolver, amount, currency, date).await;
    }

    let rate = previous.exchange_rate.ok_or(SettlementError::MissingRate)?;
    Ok(Settlement {
        amount,
        currency,
        date,
        amount_uah: (amount * rate).round_dp(AMOUNT_SCALE),
        exchange_rate: Some(rate),
        rate_date: previous.rate_date,
    })
}
