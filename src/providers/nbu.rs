use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{RateProvider, build_url, load_json, positive};
use crate::currency::Currency;
use crate::error::ProviderError;
use crate::exchange_rate::RateSource;

pub const DEFAULT_URL: &str = "https://bank.gov.ua/NBUStatService/v1/statdirectory/exchange?json";

/// One element of the statdirectory response.
#[derive(Debug, Deserialize, PartialEq)]
pub struct NbuRate {
    #[serde(rename = "cc", default)]
    pub code: Option<String>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(rename = "exchangedate", default)]
    pub exchange_date: Option<String>,
}

/// Official rates from the National Bank of Ukraine.
pub struct NbuProvider {
    client: Client,
    base_url: String,
}

impl NbuProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for NbuProvider {
    fn name(&self) -> &str {
        "NBU"
    }

    fn source(&self) -> RateSource {
        RateSource::Nbu
    }

    async fn fetch(&self, currency: Currency, date: NaiveDate) -> Result<Option<Decimal>, ProviderError> {
        let formatted = date.format("%Y%m%d").to_string();
        let url = build_url(&self.base_url, &[("valcode", currency.code()), ("date", &formatted)])?;
        let text = load_json(&self.client, url).await?;
        parse_rate(&text)
    }
}

/// The rate is the first element's `rate`. The query already filters by
/// currency, so an empty array means no data for that day.
pub fn parse_rate(text: &str) -> Result<Option<Decimal>, ProviderError> {
    let rates: Vec<NbuRate> = serde_json::from_str(text)?;
    Ok(positive(rates.into_iter().next().and_then(|r| r.rate)))
}
