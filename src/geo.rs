use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};

const SERVICE: &str = "geo";

/// States and cities rarely change; countries effectively never do.
const STATE_CITY_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Geography service entry (partial, only fields we need)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    #[serde(rename = "isoCode", default)]
    pub iso_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryOption {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateOption {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityOption {
    pub name: String,
}

#[async_trait::async_trait]
pub trait GeoApi: Send + Sync {
    async fn countries(&self) -> Result<Vec<GeoPlace>>;
    async fn states(&self, country: &str) -> Result<Vec<GeoPlace>>;
    async fn cities(&self, country: &str, state: &str) -> Result<Vec<GeoPlace>>;
}

pub struct GeoClient {
    base_url: String,
    api_key: String,
    http_client: HttpClient,
}

impl GeoClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::transport(SERVICE, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.geo_url.trim_end_matches('/').to_string(),
            api_key: config.aggregator_api_key.clone(),
            http_client,
        })
    }

    async fn fetch(&self, url: String) -> Result<Vec<GeoPlace>> {
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("geo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(
                SERVICE,
                format!("geo query failed (status {}): {}", status, body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid geo response: {}", e)))
    }
}

#[async_trait::async_trait]
impl GeoApi for GeoClient {
    async fn countries(&self) -> Result<Vec<GeoPlace>> {
        self.fetch(format!("{}/countries", self.base_url)).await
    }

    async fn states(&self, country: &str) -> Result<Vec<GeoPlace>> {
        self.fetch(format!("{}/states?country={}", self.base_url, country))
            .await
    }

    async fn cities(&self, country: &str, state: &str) -> Result<Vec<GeoPlace>> {
        self.fetch(format!(
            "{}/cities?country={}&state={}",
            self.base_url, country, state
        ))
        .await
    }
}

struct CacheEntry {
    places: Vec<GeoPlace>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() < deadline,
            None => true,
        }
    }
}

/// Read-through cache over the geography service.
///
/// Countries are cached for the life of the process, states and cities for
/// 30 days, keyed by the request parameters. Transport errors come back as
/// empty lists so dependent dropdowns stay usable.
pub struct LocationResolver {
    api: Arc<dyn GeoApi>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    state_city_ttl: Duration,
}

impl LocationResolver {
    pub fn new(api: Arc<dyn GeoApi>) -> Self {
        Self::with_ttl(api, STATE_CITY_TTL)
    }

    pub fn with_ttl(api: Arc<dyn GeoApi>, state_city_ttl: Duration) -> Self {
        Self {
            api,
            cache: Mutex::new(HashMap::new()),
            state_city_ttl,
        }
    }

    pub async fn list_countries(&self) -> Vec<CountryOption> {
        let places = self
            .cached("countries", None, || self.api.countries())
            .await;

        places
            .into_iter()
            .filter_map(|p| {
                p.iso_code.map(|code| CountryOption {
                    code,
                    name: p.name,
                })
            })
            .collect()
    }

    pub async fn list_states(&self, country: &str) -> Vec<StateOption> {
        let key = format!("states:{}", country);
        let places = self
            .cached(&key, Some(self.state_city_ttl), || self.api.states(country))
            .await;

        places
            .into_iter()
            .filter_map(|p| {
                p.iso_code.map(|code| StateOption {
                    code,
                    name: p.name,
                })
            })
            .collect()
    }

    pub async fn list_cities(&self, country: &str, state: &str) -> Vec<CityOption> {
        let key = format!("cities:{}:{}", country, state);
        let places = self
            .cached(&key, Some(self.state_city_ttl), || {
                self.api.cities(country, state)
            })
            .await;

        places
            .into_iter()
            .map(|p| CityOption { name: p.name })
            .collect()
    }

    async fn cached<F, Fut>(&self, key: &str, ttl: Option<Duration>, fetch: F) -> Vec<GeoPlace>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<GeoPlace>>>,
    {
        {
            let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(entry) = cache.get(key) {
                if entry.is_fresh() {
                    return entry.places.clone();
                }
            }
        }

        match fetch().await {
            Ok(places) => {
                let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                cache.insert(
                    key.to_string(),
                    CacheEntry {
                        places: places.clone(),
                        expires_at: ttl.map(|t| Instant::now() + t),
                    },
                );
                places
            }
            Err(e) => {
                // Errors are not cached; the next call retries upstream.
                warn!(key, error = %e, "geo lookup failed, returning empty list");
                Vec::new()
            }
        }
    }
}

/// Static fallback for callers whose city lookup came back empty.
pub fn fallback_cities() -> Vec<CityOption> {
    ["Lagos", "Abuja", "Port Harcourt"]
        .iter()
        .map(|name| CityOption {
            name: (*name).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingGeo {
        calls: AtomicU32,
        fail: bool,
    }

    impl CountingGeo {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail,
            }
        }

        fn respond(&self) -> Result<Vec<GeoPlace>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::transport(SERVICE, "connection refused"));
            }
            Ok(vec![GeoPlace {
                name: "Lagos".to_string(),
                iso_code: Some("LA".to_string()),
            }])
        }
    }

    #[async_trait::async_trait]
    impl GeoApi for CountingGeo {
        async fn countries(&self) -> Result<Vec<GeoPlace>> {
            self.respond()
        }

        async fn states(&self, _country: &str) -> Result<Vec<GeoPlace>> {
            self.respond()
        }

        async fn cities(&self, _country: &str, _state: &str) -> Result<Vec<GeoPlace>> {
            self.respond()
        }
    }

    #[tokio::test]
    async fn repeated_lookups_hit_the_cache() {
        let api = Arc::new(CountingGeo::new(false));
        let resolver = LocationResolver::new(api.clone());

        let first = resolver.list_states("NG").await;
        let second = resolver.list_states("NG").await;

        assert_eq!(first, second);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_parameters_are_cached_separately() {
        let api = Arc::new(CountingGeo::new(false));
        let resolver = LocationResolver::new(api.clone());

        resolver.list_cities("NG", "LA").await;
        resolver.list_cities("NG", "FC").await;
        resolver.list_cities("NG", "LA").await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let api = Arc::new(CountingGeo::new(false));
        let resolver = LocationResolver::with_ttl(api.clone(), Duration::ZERO);

        resolver.list_states("NG").await;
        resolver.list_states("NG").await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn countries_never_expire() {
        let api = Arc::new(CountingGeo::new(false));
        let resolver = LocationResolver::with_ttl(api.clone(), Duration::ZERO);

        resolver.list_countries().await;
        resolver.list_countries().await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_errors_become_empty_lists_and_are_not_cached() {
        let api = Arc::new(CountingGeo::new(true));
        let resolver = LocationResolver::new(api.clone());

        assert!(resolver.list_cities("NG", "LA").await.is_empty());
        assert!(resolver.list_cities("NG", "LA").await.is_empty());

        // Both calls went upstream; failures never enter the cache.
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fallback_list_is_small_but_usable() {
        let cities = fallback_cities();
        assert_eq!(cities.len(), 3);
        assert_eq!(cities[0].name, "Lagos");
    }
}
