//! Upstream rate providers.
//!
//! Each provider answers one question: what was the UAH rate of a currency on
//! a given day. `Ok(None)` means the upstream had no data for that day, which
//! is normal on weekends and holidays.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use rust_decimal::Decimal;

use crate::currency::Currency;
use crate::error::ProviderError;
use crate::exchange_rate::{RATE_SCALE, RateSource};

pub mod nbu;
pub mod privatbank;

pub use nbu::NbuProvider;
pub use privatbank::PrivatBankProvider;

#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Provenance recorded on rates this provider supplies.
    fn source(&self) -> RateSource;

    async fn fetch(&self, currency: Currency, date: NaiveDate) -> Result<Option<Decimal>, ProviderError>;
}

/// Shared client for all providers. The timeout covers the whole request.
pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub(crate) fn build_url(base: &str, params: &[(&str, &str)]) -> Result<Url, ProviderError> {
    Url::parse_with_params(base, params).map_err(|e| ProviderError::Url(format!("{}: {}", base, e)))
}

pub(crate) async fn load_json(client: &Client, url: Url) -> Result<String, ProviderError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(ProviderError::Status(resp.status()));
    }

    let text = resp.text().await?;

    Ok(text)
}

/// Rates that round to zero or below at the stored scale carry no information.
pub(crate) fn positive(rate: Option<Decimal>) -> Option<Decimal> {
    rate.filter(|r| r.round_dp(RATE_SCALE) > Decimal::ZERO)
}
