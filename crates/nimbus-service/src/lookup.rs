//! The weather lookup service.
//!
//! Owns the cache policy: serve a fresh cached record without touching
//! the provider, refetch on miss or staleness, and reconcile writes by
//! city through the store's upsert. Fetch failures are absorbed here and
//! surface as "no data"; only store failures propagate.
//!
//! The store mutex is acquired for each read or write and released
//! before any upstream call, so a slow provider never blocks other
//! lookups against the store.

use std::sync::Arc;

use time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use nimbus_store::{Store, StoredWeather};
use nimbus_types::WeatherQuery;
use nimbus_upstream::FetchWeather;

/// Result alias: lookups only fail on store errors.
pub type LookupResult = Result<Option<StoredWeather>, nimbus_store::Error>;

/// Cache-aware weather lookup over a store and an upstream fetcher.
pub struct WeatherLookup {
    store: Arc<Mutex<Store>>,
    fetcher: Arc<dyn FetchWeather>,
    freshness: Duration,
}

impl WeatherLookup {
    /// Create a new lookup service.
    ///
    /// `freshness` is how long a cached record is trusted before the
    /// next access refetches it.
    pub fn new(store: Arc<Mutex<Store>>, fetcher: Arc<dyn FetchWeather>, freshness: Duration) -> Self {
        Self {
            store,
            fetcher,
            freshness,
        }
    }

    /// Look up current weather by city name.
    ///
    /// A fresh cached record is returned without an upstream call.
    /// Otherwise the provider is queried by city name; on success the
    /// result is upserted and returned. On fetch failure this returns
    /// `None` - a stale record is not used as a fallback.
    pub async fn by_city(&self, city: &str) -> LookupResult {
        let cached = {
            let store = self.store.lock().await;
            store.get_by_city(city)?
        };

        if let Some(record) = cached {
            if record.is_fresh(self.freshness) {
                debug!("Serving fresh cached weather for city '{}'", city);
                return Ok(Some(record));
            }
        }

        self.fetch_and_store(&WeatherQuery::City(city.to_string()))
            .await
    }

    /// Look up current weather by postal code.
    ///
    /// Same policy as [`by_city`](Self::by_city), with the cache keyed
    /// on `zip_code` and the provider queried by zip. Since the upsert
    /// reconciles by city, a cached record fetched via a different zip
    /// gets its zip silently overwritten by this lookup.
    pub async fn by_zip(&self, zip_code: &str) -> LookupResult {
        let cached = {
            let store = self.store.lock().await;
            store.get_by_zip(zip_code)?
        };

        if let Some(record) = cached {
            if record.is_fresh(self.freshness) {
                debug!("Serving fresh cached weather for zip '{}'", zip_code);
                return Ok(Some(record));
            }
        }

        self.fetch_and_store(&WeatherQuery::Zip(zip_code.to_string()))
            .await
    }

    /// Refetch every distinct cached city, unconditionally.
    ///
    /// Freshness is ignored; each city gets one provider call. A failed
    /// fetch skips that city and the loop continues - one city can never
    /// abort or roll back the others. An empty store is a no-op.
    pub async fn refresh_all(&self) {
        let cities = {
            let store = self.store.lock().await;
            store.distinct_cities()
        };

        let cities = match cities {
            Ok(cities) => cities,
            Err(e) => {
                warn!("Could not enumerate cached cities: {}", e);
                return;
            }
        };

        for city in cities {
            let query = WeatherQuery::City(city.clone());
            let observation = match self.fetcher.fetch(&query).await {
                Ok(observation) => observation,
                Err(e) => {
                    debug!("Skipping refresh for {}: {}", query, e);
                    continue;
                }
            };

            let result = {
                let store = self.store.lock().await;
                store.upsert(&observation)
            };
            if let Err(e) = result {
                warn!("Failed to persist refreshed weather for '{}': {}", city, e);
            }
        }
    }

    /// Fetch from the provider and upsert the result.
    ///
    /// Fetch failures of every kind collapse to `Ok(None)` here; only a
    /// store error propagates.
    async fn fetch_and_store(&self, query: &WeatherQuery) -> LookupResult {
        let observation = match self.fetcher.fetch(query).await {
            Ok(observation) => observation,
            Err(e) => {
                debug!("Upstream fetch failed for {}: {}", query, e);
                return Ok(None);
            }
        };

        let stored = {
            let store = self.store.lock().await;
            store.upsert(&observation)?
        };

        Ok(Some(stored))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use nimbus_types::WeatherObservation;

    /// Scripted fetcher that counts calls.
    pub(crate) struct MockFetcher {
        calls: AtomicUsize,
        response: MockResponse,
    }

    enum MockResponse {
        /// Answer with city = query value.
        Echo { temperature_c: f64, description: String },
        /// Answer with a fixed city name regardless of the query.
        Named { city: String, temperature_c: f64, description: String },
        /// Echo, but fail for one specific query value.
        EchoExcept { fail_value: String, temperature_c: f64, description: String },
        /// Fail every fetch.
        Fail,
    }

    impl MockFetcher {
        pub(crate) fn echo(temperature_c: f64, description: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: MockResponse::Echo {
                    temperature_c,
                    description: description.to_string(),
                },
            })
        }

        pub(crate) fn named(city: &str, temperature_c: f64, description: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: MockResponse::Named {
                    city: city.to_string(),
                    temperature_c,
                    description: description.to_string(),
                },
            })
        }

        pub(crate) fn echo_except(
            fail_value: &str,
            temperature_c: f64,
            description: &str,
        ) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: MockResponse::EchoExcept {
                    fail_value: fail_value.to_string(),
                    temperature_c,
                    description: description.to_string(),
                },
            })
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: MockResponse::Fail,
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn observation(
            city: &str,
            zip_code: Option<&str>,
            temperature_c: f64,
            description: &str,
        ) -> WeatherObservation {
            WeatherObservation {
                city: city.to_string(),
                zip_code: zip_code.map(str::to_string),
                temperature_c,
                description: description.to_string(),
                retrieved_at: OffsetDateTime::now_utc(),
            }
        }
    }

    #[async_trait]
    impl FetchWeather for MockFetcher {
        async fn fetch(
            &self,
            query: &WeatherQuery,
        ) -> nimbus_upstream::Result<WeatherObservation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                MockResponse::Fail => Err(nimbus_upstream::Error::IncompletePayload),
                MockResponse::Echo {
                    temperature_c,
                    description,
                } => Ok(Self::observation(
                    query.value(),
                    query.zip_code(),
                    *temperature_c,
                    description,
                )),
                MockResponse::Named {
                    city,
                    temperature_c,
                    description,
                } => Ok(Self::observation(
                    city,
                    query.zip_code(),
                    *temperature_c,
                    description,
                )),
                MockResponse::EchoExcept {
                    fail_value,
                    temperature_c,
                    description,
                } => {
                    if query.value() == fail_value {
                        Err(nimbus_upstream::Error::IncompletePayload)
                    } else {
                        Ok(Self::observation(
                            query.value(),
                            query.zip_code(),
                            *temperature_c,
                            description,
                        ))
                    }
                }
            }
        }
    }

    fn lookup_with(fetcher: Arc<MockFetcher>) -> (WeatherLookup, Arc<Mutex<Store>>) {
        let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));
        let lookup = WeatherLookup::new(Arc::clone(&store), fetcher, Duration::hours(1));
        (lookup, store)
    }

    async fn seed(
        store: &Arc<Mutex<Store>>,
        city: &str,
        zip_code: Option<&str>,
        temperature_c: f64,
        age: Duration,
    ) -> StoredWeather {
        let observation = WeatherObservation {
            city: city.to_string(),
            zip_code: zip_code.map(str::to_string),
            temperature_c,
            description: "seeded".to_string(),
            retrieved_at: OffsetDateTime::now_utc() - age,
        };
        store.lock().await.upsert(&observation).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_cache_hit_skips_upstream() {
        let fetcher = MockFetcher::echo(99.0, "should not be fetched");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        let seeded = seed(&store, "London", None, 12.0, Duration::minutes(10)).await;

        let result = lookup.by_city("London").await.unwrap().unwrap();
        assert_eq!(result, seeded);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_record_fetches_once_and_stores() {
        let fetcher = MockFetcher::echo(10.0, "clear sky");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        let result = lookup.by_city("TestCity").await.unwrap().unwrap();
        assert_eq!(result.city, "TestCity");
        assert_eq!(result.temperature_c, 10.0);
        assert_eq!(result.description, "clear sky");
        assert_eq!(fetcher.calls(), 1);

        // Exactly one row for the city, not two
        let store = store.lock().await;
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_record_refetched_in_place() {
        let fetcher = MockFetcher::echo(20.0, "new desc");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        let seeded = seed(&store, "OldCity", None, 1.0, Duration::hours(2)).await;

        let result = lookup.by_city("OldCity").await.unwrap().unwrap();
        assert_eq!(result.id, seeded.id);
        assert_eq!(result.temperature_c, 20.0);
        assert_eq!(result.description, "new desc");
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.lock().await.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeated_lookup_returns_same_id() {
        let fetcher = MockFetcher::echo(10.0, "clear sky");
        let (lookup, _store) = lookup_with(Arc::clone(&fetcher));

        let first = lookup.by_city("TestCity").await.unwrap().unwrap();
        let second = lookup.by_city("TestCity").await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        // The second call was served from cache
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_not_found() {
        let fetcher = MockFetcher::failing();
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        let result = lookup.by_city("Nowhere").await.unwrap();
        assert!(result.is_none());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_record_is_not_a_fallback_on_fetch_failure() {
        let fetcher = MockFetcher::failing();
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        seed(&store, "OldCity", None, 1.0, Duration::hours(2)).await;

        let result = lookup.by_city("OldCity").await.unwrap();
        assert!(result.is_none());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_zip_lookup_fetches_and_stores_zip() {
        let fetcher = MockFetcher::named("ZipCity", 15.0, "cloudy");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        let result = lookup.by_zip("12345").await.unwrap().unwrap();
        assert_eq!(result.city, "ZipCity");
        assert_eq!(result.zip_code.as_deref(), Some("12345"));
        assert_eq!(result.temperature_c, 15.0);
        assert_eq!(fetcher.calls(), 1);

        // A second lookup for the same zip is a cache hit
        let again = lookup.by_zip("12345").await.unwrap().unwrap();
        assert_eq!(again.id, result.id);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.lock().await.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zip_lookup_overwrites_existing_zip_for_city() {
        let fetcher = MockFetcher::named("ZipCity", 15.0, "cloudy");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        let seeded = seed(&store, "ZipCity", Some("11111"), 1.0, Duration::hours(2)).await;

        // The new zip is unknown, so the provider is queried; the result
        // reconciles onto the existing city row and replaces its zip.
        let result = lookup.by_zip("22222").await.unwrap().unwrap();
        assert_eq!(result.id, seeded.id);
        assert_eq!(result.zip_code.as_deref(), Some("22222"));
        assert_eq!(store.lock().await.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_all_on_empty_store_is_a_noop() {
        let fetcher = MockFetcher::echo(30.0, "sunny");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        lookup.refresh_all().await;

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(store.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_all_hits_every_city_once() {
        let fetcher = MockFetcher::echo(30.0, "sunny");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        // Freshness is ignored by refresh: one fresh, one stale
        let a = seed(&store, "Alpha", None, 1.0, Duration::minutes(5)).await;
        let b = seed(&store, "Beta", None, 2.0, Duration::hours(5)).await;

        lookup.refresh_all().await;

        assert_eq!(fetcher.calls(), 2);
        let store = store.lock().await;
        let refreshed_a = store.get_by_city("Alpha").unwrap().unwrap();
        let refreshed_b = store.get_by_city("Beta").unwrap().unwrap();
        assert_eq!(refreshed_a.id, a.id);
        assert_eq!(refreshed_b.id, b.id);
        assert_eq!(refreshed_a.temperature_c, 30.0);
        assert_eq!(refreshed_b.temperature_c, 30.0);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_refresh_all_skips_failed_city_and_continues() {
        let fetcher = MockFetcher::echo_except("Beta", 30.0, "sunny");
        let (lookup, store) = lookup_with(Arc::clone(&fetcher));

        seed(&store, "Alpha", None, 1.0, Duration::hours(2)).await;
        seed(&store, "Beta", None, 2.0, Duration::hours(2)).await;
        seed(&store, "Gamma", None, 3.0, Duration::hours(2)).await;

        lookup.refresh_all().await;

        // Every city was attempted; only the failing one kept its value
        assert_eq!(fetcher.calls(), 3);
        let store = store.lock().await;
        assert_eq!(
            store.get_by_city("Alpha").unwrap().unwrap().temperature_c,
            30.0
        );
        assert_eq!(
            store.get_by_city("Beta").unwrap().unwrap().temperature_c,
            2.0
        );
        assert_eq!(
            store.get_by_city("Gamma").unwrap().unwrap().temperature_c,
            30.0
        );
    }
}
