use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_GEOCODE_BASE_URL, DEFAULT_NPPES_BASE_URL,
    DEFAULT_OVER_FETCH_FACTOR, DEFAULT_RADIUS_KM, DEFAULT_RESULT_LIMIT, DEFAULT_TRIALS_BASE_URL,
};
use crate::service::FinderConfig;

#[derive(Parser, Debug)]
#[command(name = "trial-physician-finder")]
#[command(about = "Clinical trial and physician discovery backend", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// One-shot physician lookup, printed as JSON.
    Physicians(PhysiciansArgs),
    /// One-shot trial search with nearby physicians, printed as JSON.
    Trials(TrialsArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ApiArgs {
    /// NPPES registry base URL.
    #[arg(long, default_value = DEFAULT_NPPES_BASE_URL)]
    pub nppes_base_url: String,

    /// ClinicalTrials.gov studies base URL.
    #[arg(long, default_value = DEFAULT_TRIALS_BASE_URL)]
    pub trials_base_url: String,

    /// Geocoding service base URL.
    #[arg(long, default_value = DEFAULT_GEOCODE_BASE_URL)]
    pub geocode_base_url: String,

    /// Geocoding API key. Geocoding is skipped when unset.
    #[arg(long, env = "MAPQUEST_API_KEY")]
    pub mapquest_api_key: Option<String>,

    /// Raw-record multiplier applied to the result limit on registry
    /// queries, absorbing classifier and address rejections.
    #[arg(long, default_value_t = DEFAULT_OVER_FETCH_FACTOR)]
    pub over_fetch_factor: usize,

    /// Require an exact practice-city match instead of trusting the
    /// registry's looser city filter.
    #[arg(long)]
    pub strict_city_match: bool,

    /// Response cache TTL in seconds. 0 disables caching.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,
}

impl ApiArgs {
    pub fn to_config(&self) -> FinderConfig {
        FinderConfig {
            nppes_base_url: self.nppes_base_url.clone(),
            trials_base_url: self.trials_base_url.clone(),
            geocode_base_url: self.geocode_base_url.clone(),
            mapquest_api_key: self.mapquest_api_key.clone(),
            over_fetch_factor: self.over_fetch_factor,
            strict_city_match: self.strict_city_match,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 9000)]
    pub port: u16,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PhysiciansArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Practice city filter.
    #[arg(long)]
    pub city: Option<String>,

    /// State code or full name (e.g. TX or Texas).
    #[arg(long)]
    pub state: Option<String>,

    /// Free-text medical condition used for specialty matching.
    #[arg(long)]
    pub condition: Option<String>,

    #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
    pub limit: usize,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TrialsArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Free-text medical condition.
    #[arg(long)]
    pub condition: Option<String>,

    /// City used for the physician pool.
    #[arg(long)]
    pub city: Option<String>,

    /// State code or full name (e.g. TX or Texas).
    #[arg(long)]
    pub state: Option<String>,

    #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
    pub limit: usize,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Radius for the trial-site physician join, in kilometers.
    #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
    pub max_distance_km: f64,
}
