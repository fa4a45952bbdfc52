pub const DEFAULT_NPPES_BASE_URL: &str = "https://npiregistry.cms.hhs.gov/api/";
pub const DEFAULT_TRIALS_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/studies";
pub const DEFAULT_GEOCODE_BASE_URL: &str = "https://www.mapquestapi.com/geocoding/v1/address";

pub const NPPES_API_DOC_URL: &str = "https://npiregistry.cms.hhs.gov/api-page";
pub const TRIALS_API_DOC_URL: &str = "https://clinicaltrials.gov/data-api/api";
pub const GEOCODE_API_DOC_URL: &str =
    "https://developer.mapquest.com/documentation/geocoding-api/";

/// NPPES rejects `limit` values above 200.
pub const NPPES_MAX_LIMIT: usize = 200;
/// ClinicalTrials.gov v2 caps `pageSize` at 1000.
pub const TRIALS_MAX_PAGE_SIZE: usize = 1000;

pub const DEFAULT_RESULT_LIMIT: usize = 10;
pub const DEFAULT_OVER_FETCH_FACTOR: usize = 5;
pub const DEFAULT_RADIUS_KM: f64 = 50.0;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Size of the physician pool fetched once per trials query and then
/// proximity-joined against each trial site.
pub const TRIAL_PHYSICIAN_POOL_SIZE: usize = 100;

pub const REGISTRY_TIMEOUT_SECS: u64 = 10;
pub const GEOCODE_TIMEOUT_SECS: u64 = 5;
pub const TRIALS_TIMEOUT_SECS: u64 = 15;
