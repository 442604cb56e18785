use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{RateProvider, build_url, load_json, positive};
use crate::currency::Currency;
use crate::error::ProviderError;
use crate::exchange_rate::RateSource;

pub const DEFAULT_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates?json";

#[derive(Debug, Deserialize, PartialEq)]
pub struct PrivatRate {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "saleRateNB", default)]
    pub sale_rate_nb: Option<Decimal>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ExchangeRates {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "exchangeRate", default)]
    pub exchange_rate: Vec<PrivatRate>,
}

/// PrivatBank archive, which republishes the NBU rate per day.
pub struct PrivatBankProvider {
    client: Client,
    base_url: String,
}

impl PrivatBankProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for PrivatBankProvider {
    fn name(&self) -> &str {
        "PrivatBank"
    }

    fn source(&self) -> RateSource {
        RateSource::PrivatBank
    }

    async fn fetch(&self, currency: Currency, date: NaiveDate) -> Result<Option<Decimal>, ProviderError> {
        let formatted = date.format("%d.%m.%Y").to_string();
        let url = build_url(&self.base_url, &[("date", &formatted)])?;
        let text = load_json(&self.client, url).await?;
        parse_rate(&text, currency)
    }
}

/// The response lists every currency for the day; pick the requested one.
pub fn parse_rate(text: &str, currency: Currency) -> Result<Option<Decimal>, ProviderError> {
    let rates: ExchangeRates = serde_json::from_str(text)?;
    let rate = rates
        .exchange_rate
        .into_iter()
        .find(|r| r.currency.as_deref() == Some(currency.code()))
        .and_then(|r| r.sale_rate_nb);

    Ok(positive(rate))
}
