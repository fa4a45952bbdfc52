//! Service boundary: the operations exposed over HTTP and the CLI.
//!
//! Every operation is infallible at this boundary. Upstream failures have
//! already been contained inside the clients and the pipeline; what remains
//! here is composition, pagination, and the advisory response cache.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cache::TtlCache;
use crate::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_GEOCODE_BASE_URL, DEFAULT_NPPES_BASE_URL,
    DEFAULT_OVER_FETCH_FACTOR, DEFAULT_TRIALS_BASE_URL, GEOCODE_TIMEOUT_SECS,
    REGISTRY_TIMEOUT_SECS, TRIAL_PHYSICIAN_POOL_SIZE, TRIALS_MAX_PAGE_SIZE, TRIALS_TIMEOUT_SECS,
};
use crate::distance::{NearbyPhysician, physicians_within_radius};
use crate::geo::MapQuestClient;
use crate::npi::{NppesClient, Physician, PhysicianFinder};
use crate::states::normalize_state;
use crate::trials::{TrialSummary, TrialsClient, TrialsPage};

const USER_AGENT: &str = "trial-physician-finder/0.1";

#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub nppes_base_url: String,
    pub trials_base_url: String,
    pub geocode_base_url: String,
    pub mapquest_api_key: Option<String>,
    pub over_fetch_factor: usize,
    pub strict_city_match: bool,
    pub cache_ttl: Duration,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            nppes_base_url: DEFAULT_NPPES_BASE_URL.to_string(),
            trials_base_url: DEFAULT_TRIALS_BASE_URL.to_string(),
            geocode_base_url: DEFAULT_GEOCODE_BASE_URL.to_string(),
            mapquest_api_key: None,
            over_fetch_factor: DEFAULT_OVER_FETCH_FACTOR,
            strict_city_match: false,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhysicianSearchResponse {
    pub count: usize,
    pub results: Vec<Physician>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
    pub total: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialsSearchResponse {
    pub trials: Vec<TrialSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialWithPhysicians {
    #[serde(flatten)]
    pub trial: TrialSummary,
    pub physicians: Vec<NearbyPhysician>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialsWithPhysiciansResponse {
    pub condition: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub trials: Vec<TrialWithPhysicians>,
    pub pagination: Pagination,
}

pub struct FinderService {
    finder: PhysicianFinder<NppesClient, MapQuestClient>,
    trials: TrialsClient,
    physician_cache: TtlCache<String, PhysicianSearchResponse>,
    trials_cache: TtlCache<String, TrialsSearchResponse>,
}

impl FinderService {
    pub fn new(config: FinderConfig) -> Result<Self> {
        let registry_http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REGISTRY_TIMEOUT_SECS))
            .build()
            .context("failed creating registry HTTP client")?;
        let geocode_http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(GEOCODE_TIMEOUT_SECS))
            .build()
            .context("failed creating geocoding HTTP client")?;
        let trials_http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TRIALS_TIMEOUT_SECS))
            .build()
            .context("failed creating trials HTTP client")?;

        let registry = NppesClient::new(registry_http, config.nppes_base_url.clone());
        let geocoder = MapQuestClient::new(
            geocode_http,
            config.geocode_base_url.clone(),
            config.mapquest_api_key.clone(),
        );

        Ok(Self {
            finder: PhysicianFinder::new(
                registry,
                geocoder,
                config.over_fetch_factor,
                config.strict_city_match,
            ),
            trials: TrialsClient::new(trials_http, config.trials_base_url.clone()),
            physician_cache: TtlCache::new(config.cache_ttl),
            trials_cache: TtlCache::new(config.cache_ttl),
        })
    }

    /// Physician discovery for a city/state/condition context. Always
    /// returns a well-formed (possibly empty) response.
    pub async fn find_physicians(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        condition: Option<&str>,
        limit: usize,
    ) -> PhysicianSearchResponse {
        let key = format!(
            "physicians|{}|{}|{}|{limit}",
            city.unwrap_or(""),
            state.unwrap_or(""),
            condition.unwrap_or(""),
        );
        self.physician_cache
            .get_or_compute(key, || async move {
                let results = self
                    .finder
                    .find_physicians(city, state, condition, limit)
                    .await;
                PhysicianSearchResponse {
                    count: results.len(),
                    results,
                }
            })
            .await
    }

    /// One page of trial summaries with pagination metadata. Upstream
    /// failures degrade to an empty page.
    pub async fn find_trials(
        &self,
        condition: Option<&str>,
        location: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> TrialsSearchResponse {
        let limit = limit.max(1);
        let key = format!(
            "trials|{}|{}|{limit}|{offset}",
            condition.unwrap_or(""),
            location.unwrap_or(""),
        );
        self.trials_cache
            .get_or_compute(key, || async move {
                // The upstream paginates by token, not offset; fetch one page
                // covering the requested window and slice it locally.
                let window = offset.saturating_add(limit).min(TRIALS_MAX_PAGE_SIZE);
                let page = match self.trials.fetch_page(condition, location, window).await {
                    Ok(page) => page,
                    Err(err) => {
                        tracing::error!(error = %err, "trials fetch failed, returning empty page");
                        TrialsPage {
                            studies: Vec::new(),
                            total: 0,
                        }
                    }
                };
                let total = page.total;
                let trials: Vec<TrialSummary> =
                    page.studies.into_iter().skip(offset).take(limit).collect();
                TrialsSearchResponse {
                    trials,
                    pagination: build_pagination(limit, offset, total),
                }
            })
            .await
    }

    /// The merged query: one trials page, one physician pool, and a
    /// proximity join of the pool against each trial's first listed site.
    pub async fn find_trials_with_physicians(
        &self,
        condition: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        limit: usize,
        offset: usize,
        max_distance_km: f64,
    ) -> TrialsWithPhysiciansResponse {
        let state_norm = state
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(normalize_state);
        let location = state_norm
            .clone()
            .or_else(|| city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()));

        let trials = self
            .find_trials(condition, location.as_deref(), limit, offset)
            .await;
        let pool = self
            .find_physicians(city, state, condition, TRIAL_PHYSICIAN_POOL_SIZE)
            .await;

        TrialsWithPhysiciansResponse {
            condition: condition.map(str::to_string),
            city: city.map(str::to_string),
            state: state_norm,
            trials: attach_nearby_physicians(trials.trials, &pool.results, max_distance_km),
            pagination: trials.pagination,
        }
    }
}

fn build_pagination(limit: usize, offset: usize, total: u64) -> Pagination {
    Pagination {
        limit,
        offset,
        total,
        has_more: (offset.saturating_add(limit) as u64) < total,
    }
}

/// Join the physician pool against each trial's first listed site. A trial
/// whose first site has no coordinates gets zero physicians, not an error.
fn attach_nearby_physicians(
    trials: Vec<TrialSummary>,
    pool: &[Physician],
    max_distance_km: f64,
) -> Vec<TrialWithPhysicians> {
    trials
        .into_iter()
        .map(|trial| {
            let physicians = trial
                .locations
                .first()
                .and_then(|site| Some((site.lat?, site.lon?)))
                .map(|(lat, lon)| physicians_within_radius(lat, lon, pool, max_distance_km))
                .unwrap_or_default();
            TrialWithPhysicians { trial, physicians }
        })
        .collect()
}
