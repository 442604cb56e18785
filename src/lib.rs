//! UAH exchange rates for expense settlement.
//!
//! Rates are resolved per (currency, day) from a Postgres cache, falling back
//! to the NBU and then PrivatBank, and to earlier days when a day has no data.

pub mod api;
pub mod config;
pub mod currency;
pub mod error;
pub mod exchange_rate;
pub mod providers;
pub mod resolver;
pub mod settlement;
pub mod store;

pub use currency::Currency;
pub use error::{ProviderError, RateError, SettlementError, StoreError};
pub use exchange_rate::{ExchangeRate, RateSource};
pub use resolver::{MAX_FALLBACK_DEPTH, RateResolver};
pub use settlement::{Settlement, SettlementChange, resettle, settle};
