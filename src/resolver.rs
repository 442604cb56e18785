//! Resolution of a (currency, date) pair into a cached UAH rate.
//!
//! For each day, starting at the requested one and walking backwards, the
//! resolver checks the cache and then asks each provider in priority order.
//! The first rate found is stored under the day it was found for. Days with no
//! data at all (weekends, bank holidays) push the search one day earlier, at
//! most `max_depth` days in total.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::currency::Currency;
use crate::error::{RateError, RateResult};
use crate::exchange_rate::{ExchangeRate, NewExchangeRate};
use crate::providers::RateProvider;
use crate::store::RateStore;

/// Number of days tried before giving up.
pub const MAX_FALLBACK_DEPTH: u32 = 10;

pub struct RateResolver {
    store: Arc<dyn RateStore>,
    providers: Vec<Arc<dyn RateProvider>>,
    max_depth: u32,
}

impl RateResolver {
    /// `providers` are consulted in the order given.
    pub fn new(store: Arc<dyn RateStore>, providers: Vec<Arc<dyn RateProvider>>) -> Self {
        Self {
            store,
            providers,
            max_depth: MAX_FALLBACK_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Returns the rate for `date`, or for the closest earlier day that has
    /// one. The returned record's `date` is the day actually used.
    pub async fn resolve(&self, currency: Currency, date: NaiveDate) -> RateResult<ExchangeRate> {
        if currency.is_settlement() {
            return Err(RateError::SettlementCurrency(currency));
        }

        let mut current = date;
        let mut attempts = 0;

        while attempts < self.max_depth {
            attempts += 1;

            if let Some(rate) = self.resolve_day(currency, current).await? {
                return Ok(rate);
            }

            info!(
                "No rate available for {} on {}, trying previous day (depth: {})",
                currency, current, attempts
            );
            current = match current.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }

        Err(RateError::ResolutionExhausted {
            currency,
            date,
            attempts,
        })
    }

    /// Cache first, then providers in order. `None` means nobody had data.
    async fn resolve_day(&self, currency: Currency, date: NaiveDate) -> RateResult<Option<ExchangeRate>> {
        if let Some(cached) = self.store.find(currency, date).await? {
            info!(
                "Found cached rate for {} on {}: {} (source: {:?})",
                currency, date, cached.rate, cached.source
            );
            return Ok(Some(cached));
        }

        for provider in &self.providers {
            match provider.fetch(currency, date).await {
                Ok(Some(rate)) => {
                    let new = NewExchangeRate::new(currency, date, rate, provider.source());
                    if new.rate <= Decimal::ZERO {
                        warn!("{} returned unusable rate {} for {} on {}", provider.name(), rate, currency, date);
                        continue;
                    }
                    info!("Fetched rate from {} for {} on {}: {}", provider.name(), currency, date, new.rate);
                    let record = self.store.save(new).await?;
                    return Ok(Some(record));
                }
                Ok(None) => {
                    debug!("{} has no rate for {} on {}", provider.name(), currency, date);
                }
                Err(e) => {
                    warn!("{} failed for {} on {}: {}", provider.name(), currency, date, e);
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::exchange_rate::RateSource;
    use crate::providers::NbuProvider;
    use crate::providers::mock::MockProvider;
    use crate::providers::stub::{self, Reply};
    use crate::store::memory::MemoryRateStore;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        store: Arc<MemoryRateStore>,
        primary: Arc<MockProvider>,
        secondary: Arc<MockProvider>,
        resolver: RateResolver,
    }

    fn fixture(primary: MockProvider, secondary: MockProvider) -> Fixture {
        let store = Arc::new(MemoryRateStore::new());
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let resolver = RateResolver::new(
            store.clone(),
            vec![primary.clone() as Arc<dyn RateProvider>, secondary.clone()],
        );
        Fixture {
            store,
            primary,
            secondary,
            resolver,
        }
    }

    fn nbu() -> MockProvider {
        MockProvider::new("nbu", RateSource::Nbu)
    }

    fn privat() -> MockProvider {
        MockProvider::new("privat", RateSource::PrivatBank)
    }

    #[tokio::test]
    async fn cached_rate_is_returned_without_calling_providers() {
        let f = fixture(nbu().with_rate(Currency::Usd, day(2024, 1, 5), dec!(40)), privat());
        let cached = ExchangeRate {
            id: Uuid::new_v4(),
            currency: Currency::Usd,
            rate: dec!(38.0123),
            date: day(2024, 1, 5),
            source: RateSource::PrivatBank,
        };
        f.store.insert(cached.clone()).await;

        let rate = f.resolver.resolve(Currency::Usd, day(2024, 1, 5)).await.unwrap();

        assert_eq!(rate, cached);
        assert_eq!(f.primary.calls(), 0);
        assert_eq!(f.secondary.calls(), 0);
    }

    #[tokio::test]
    async fn second_resolve_hits_the_cache() {
        let f = fixture(nbu().with_rate(Currency::Eur, day(2024, 3, 1), dec!(41.5712)), privat());

        let first = f.resolver.resolve(Currency::Eur, day(2024, 3, 1)).await.unwrap();
        let second = f.resolver.resolve(Currency::Eur, day(2024, 3, 1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.primary.calls(), 1);
        assert_eq!(f.store.inserts(), 1);
    }

    #[tokio::test]
    async fn primary_wins_when_both_have_data() {
        let date = day(2024, 1, 5);
        let f = fixture(
            nbu().with_rate(Currency::Usd, date, dec!(38.0123)),
            privat().with_rate(Currency::Usd, date, dec!(38.5)),
        );

        let rate = f.resolver.resolve(Currency::Usd, date).await.unwrap();

        assert_eq!(rate.source, RateSource::Nbu);
        assert_eq!(rate.rate, dec!(38.0123));
        assert_eq!(f.secondary.calls(), 0);
    }

    #[tokio::test]
    async fn secondary_is_asked_before_falling_back_a_day() {
        let date = day(2024, 1, 5);
        let f = fixture(nbu().failing(), privat().with_rate(Currency::Usd, date, dec!(38.5)));

        let rate = f.resolver.resolve(Currency::Usd, date).await.unwrap();

        assert_eq!(rate.source, RateSource::PrivatBank);
        assert_eq!(rate.date, date);
        assert_eq!(f.primary.requested_dates(), vec![date]);
        assert_eq!(f.secondary.requested_dates(), vec![date]);
    }

    #[tokio::test]
    async fn rate_rounding_to_zero_falls_through_to_secondary() {
        let date = day(2024, 1, 5);
        let f = fixture(
            nbu().with_rate(Currency::Usd, date, dec!(0.00004)),
            privat().with_rate(Currency::Usd, date, dec!(38.5)),
        );

        let rate = f.resolver.resolve(Currency::Usd, date).await.unwrap();

        assert_eq!(rate.source, RateSource::PrivatBank);
        assert_eq!(rate.rate, dec!(38.5));
        assert_eq!(f.secondary.calls(), 1);
        assert_eq!(f.store.inserts(), 1);
    }

    #[tokio::test]
    async fn hung_primary_times_out_and_secondary_answers() {
        let date = day(2024, 1, 5);
        let (base, _request) = stub::serve_once(Reply::Hang).await;
        let primary = NbuProvider::new(stub::client(Duration::from_millis(200)), format!("{}/exchange?json", base));
        let secondary = Arc::new(privat().with_rate(Currency::Usd, date, dec!(38.5)));
        let store = Arc::new(MemoryRateStore::new());
        let resolver = RateResolver::new(
            store.clone(),
            vec![Arc::new(primary) as Arc<dyn RateProvider>, secondary.clone()],
        );

        let rate = resolver.resolve(Currency::Usd, date).await.unwrap();

        assert_eq!(rate.source, RateSource::PrivatBank);
        assert_eq!(secondary.requested_dates(), vec![date]);
        assert_eq!(store.inserts(), 1);
    }

    #[tokio::test]
    async fn saturday_falls_back_to_friday() {
        let friday = day(2024, 1, 5);
        let saturday = day(2024, 1, 6);
        let f = fixture(nbu().with_rate(Currency::Usd, friday, dec!(38.0123)), privat());

        let rate = f.resolver.resolve(Currency::Usd, saturday).await.unwrap();

        assert_eq!(rate.rate, dec!(38.0123));
        assert_eq!(rate.date, friday);
        assert_eq!(rate.source, RateSource::Nbu);
        assert_eq!(f.store.len().await, 1);
        assert!(f.store.contains(Currency::Usd, friday).await);
        assert!(!f.store.contains(Currency::Usd, saturday).await);
        assert_eq!(f.secondary.requested_dates(), vec![saturday]);
    }

    #[tokio::test]
    async fn fallback_stops_at_cached_earlier_day() {
        let f = fixture(nbu(), privat());
        let cached = ExchangeRate {
            id: Uuid::new_v4(),
            currency: Currency::Eur,
            rate: dec!(42.1),
            date: day(2024, 12, 31),
            source: RateSource::Nbu,
        };
        f.store.insert(cached.clone()).await;

        let rate = f.resolver.resolve(Currency::Eur, day(2025, 1, 1)).await.unwrap();

        assert_eq!(rate, cached);
        assert_eq!(f.primary.calls(), 1);
        assert_eq!(f.secondary.calls(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_depth() {
        let f = fixture(nbu(), privat().failing());

        let err = f.resolver.resolve(Currency::Usd, day(2024, 1, 6)).await.unwrap_err();

        assert!(matches!(
            err,
            RateError::ResolutionExhausted { currency: Currency::Usd, attempts: MAX_FALLBACK_DEPTH, .. }
        ));
        assert_eq!(f.primary.calls(), MAX_FALLBACK_DEPTH as usize);
        assert_eq!(f.secondary.calls(), MAX_FALLBACK_DEPTH as usize);
        assert_eq!(f.primary.requested_dates().last(), Some(&day(2023, 12, 28)));
        assert_eq!(f.store.len().await, 0);
    }

    #[tokio::test]
    async fn data_beyond_the_bound_is_not_reached() {
        let date = day(2024, 1, 20);
        let too_old = day(2024, 1, 10);
        let f = fixture(nbu().with_rate(Currency::Usd, too_old, dec!(38)), privat());

        assert!(f.resolver.resolve(Currency::Usd, date).await.is_err());

        let deeper = RateResolver::new(f.store.clone(), vec![f.primary.clone() as Arc<dyn RateProvider>])
            .with_max_depth(11);
        let rate = deeper.resolve(Currency::Usd, date).await.unwrap();
        assert_eq!(rate.date, too_old);
    }

    #[tokio::test]
    async fn settlement_currency_has_no_rate() {
        let f = fixture(nbu(), privat());

        let err = f.resolver.resolve(Currency::Uah, day(2024, 1, 5)).await.unwrap_err();

        assert!(matches!(err, RateError::SettlementCurrency(Currency::Uah)));
        assert_eq!(f.primary.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_store_one_row() {
        let date = day(2024, 2, 14);
        let f = fixture(
            nbu().failing(),
            privat().with_rate(Currency::Eur, date, dec!(41.3377)),
        );
        let resolver = Arc::new(f.resolver);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve(Currency::Eur, date).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(f.store.len().await, 1);
        assert_eq!(f.store.inserts(), 1);
        let stored = f.store.find(Currency::Eur, date).await.unwrap().unwrap();
        assert!(results.iter().all(|r| *r == stored));
    }
}
