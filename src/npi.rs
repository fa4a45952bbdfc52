//! NPPES registry client and the physician discovery engine.
//!
//! The engine turns (city, state, condition, limit) into a deduplicated,
//! classified, geocoded list of physicians. Queries against the registry are
//! bounded and retry-free: every candidate specialty term costs at most one
//! upstream call per cascade stage, a failed call contributes zero records,
//! and the cascade sheds constraints (city first, then the specialty filter)
//! only when the stricter stages produced nothing at all.

use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::NPPES_MAX_LIMIT;
use crate::geo::{Geocode, geocode_all};
use crate::specialty;
use crate::states::normalize_state;
use crate::taxonomy;

/// One registry call's worth of parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub specialty: Option<String>,
    pub limit: usize,
}

/// Seam between the engine and the registry transport, so the cascade can be
/// exercised without network I/O.
#[allow(async_fn_in_trait)]
pub trait ProviderSearch {
    async fn search(&self, query: &RegistryQuery) -> Result<Vec<RegistryRecord>>;
}

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    #[serde(default)]
    results: Vec<RegistryRecord>,
}

/// Raw NPPES provider entry, kept permissive: every field the upstream may
/// omit is optional and unexpected extras are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegistryRecord {
    number: Option<NpiNumber>,
    basic: Option<RegistryBasic>,
    #[serde(default)]
    addresses: Vec<RegistryAddress>,
    #[serde(default)]
    taxonomies: Vec<RegistryTaxonomy>,
}

/// NPPES has emitted the NPI both as a JSON number and as a string across
/// API revisions.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NpiNumber {
    Text(String),
    Digits(u64),
}

impl NpiNumber {
    fn to_digits(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Digits(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RegistryBasic {
    first_name: Option<String>,
    last_name: Option<String>,
    credential: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RegistryAddress {
    address_purpose: Option<String>,
    address_1: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RegistryTaxonomy {
    code: Option<String>,
    desc: Option<String>,
    #[serde(default)]
    primary: bool,
}

/// A classified physician with a resolvable practice address. Coordinates
/// are both-or-neither and absent when geocoding failed.
#[derive(Debug, Clone, Serialize)]
pub struct Physician {
    pub npi: String,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub specialty: Option<String>,
    pub credential: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Physician {
    /// Free-text practice address handed to the geocoder.
    fn full_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.address,
            self.city.as_deref().unwrap_or(""),
            self.state.as_deref().unwrap_or(""),
            self.postal_code.as_deref().unwrap_or(""),
        )
    }
}

pub struct NppesClient {
    client: reqwest::Client,
    base_url: String,
}

impl NppesClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

impl ProviderSearch for NppesClient {
    async fn search(&self, query: &RegistryQuery) -> Result<Vec<RegistryRecord>> {
        let mut params: Vec<(&str, String)> = vec![
            ("version", "2.1".to_string()),
            // Individual providers only, never organizations.
            ("enumeration_type", "NPI-1".to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(city) = &query.city {
            params.push(("city", city.clone()));
        }
        if let Some(state) = &query.state {
            params.push(("state", state.clone()));
        }
        if let Some(specialty) = &query.specialty {
            params.push(("taxonomy_description", specialty.clone()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .context("NPPES request failed")?
            .error_for_status()
            .context("NPPES returned an error status")?;
        let body: RegistryResponse = response.json().await.context("invalid NPPES JSON")?;
        Ok(body.results)
    }
}

/// Build the cascade as data: each stage is the list of registry queries to
/// issue, and a later stage runs only when every earlier stage produced zero
/// accepted records.
fn relaxation_stages(
    city: Option<&str>,
    state: Option<&str>,
    terms: &[&str],
    fetch_limit: usize,
) -> Vec<Vec<RegistryQuery>> {
    let query = |city: Option<&str>, specialty: Option<&str>| RegistryQuery {
        city: city.map(str::to_string),
        state: state.map(str::to_string),
        specialty: specialty.map(str::to_string),
        limit: fetch_limit,
    };

    let mut stages: Vec<Vec<RegistryQuery>> = Vec::new();
    if terms.is_empty() {
        // No specialty filter: geography only, then shed the city.
        stages.push(vec![query(city, None)]);
        if city.is_some() && state.is_some() {
            stages.push(vec![query(None, None)]);
        }
        return stages;
    }

    stages.push(terms.iter().map(|&term| query(city, Some(term))).collect());
    if city.is_some() && state.is_some() {
        stages.push(terms.iter().map(|&term| query(None, Some(term))).collect());
    }
    stages.push(vec![query(city, None)]);
    stages
}

/// Reject non-physicians and records without a usable practice address, and
/// project the survivors into the output shape. Runs before geocoding so no
/// external call is spent on a record that will be dropped anyway.
fn screen_record(
    record: &RegistryRecord,
    query_city: Option<&str>,
    strict_city_match: bool,
) -> Option<Physician> {
    let npi = record.number.as_ref()?.to_digits();
    if npi.is_empty() {
        return None;
    }

    let codes = record
        .taxonomies
        .iter()
        .filter_map(|taxonomy| taxonomy.code.as_deref());
    if !taxonomy::is_physician(codes) {
        return None;
    }

    let practice = record
        .addresses
        .iter()
        .find(|address| address.address_purpose.as_deref() == Some("LOCATION"))?;
    let street = practice
        .address_1
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    if strict_city_match {
        if let Some(want) = query_city {
            let got = practice.city.as_deref().unwrap_or("");
            if !got.trim().eq_ignore_ascii_case(want.trim()) {
                return None;
            }
        }
    }

    let basic = record.basic.clone().unwrap_or_default();
    let name = format!(
        "{} {}",
        basic.first_name.as_deref().unwrap_or(""),
        basic.last_name.as_deref().unwrap_or(""),
    )
    .trim()
    .to_string();

    let primary_taxonomy = record
        .taxonomies
        .iter()
        .find(|taxonomy| taxonomy.primary)
        .or_else(|| record.taxonomies.first());

    Some(Physician {
        npi,
        name,
        address: street,
        city: practice.city.clone(),
        state: practice.state.clone(),
        postal_code: practice.postal_code.clone(),
        specialty: primary_taxonomy.and_then(|taxonomy| taxonomy.desc.clone()),
        credential: basic.credential,
        lat: None,
        lon: None,
    })
}

/// The physician discovery pipeline: specialty resolution, cascading
/// registry queries, classification, dedup, and concurrent geocoding.
pub struct PhysicianFinder<S, G> {
    search: S,
    geocoder: G,
    over_fetch_factor: usize,
    strict_city_match: bool,
}

impl<S: ProviderSearch, G: Geocode> PhysicianFinder<S, G> {
    pub fn new(search: S, geocoder: G, over_fetch_factor: usize, strict_city_match: bool) -> Self {
        Self {
            search,
            geocoder,
            over_fetch_factor: over_fetch_factor.max(1),
            strict_city_match,
        }
    }

    /// Resolve up to `limit` deduplicated physicians for the query context.
    /// Never fails: upstream errors are logged and contribute zero records,
    /// and a short or empty result is a valid answer.
    pub async fn find_physicians(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        condition: Option<&str>,
        limit: usize,
    ) -> Vec<Physician> {
        let limit = limit.max(1);
        let city = city.map(str::trim).filter(|c| !c.is_empty());
        let state = state
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(normalize_state);

        let terms = specialty::resolve(condition);
        // Over-fetch to absorb classifier and address rejections.
        let fetch_limit = limit
            .saturating_mul(self.over_fetch_factor)
            .min(NPPES_MAX_LIMIT);
        let stages = relaxation_stages(city, state.as_deref(), terms, fetch_limit);

        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<Physician> = Vec::new();

        for (stage_index, stage) in stages.iter().enumerate() {
            if !accepted.is_empty() {
                break;
            }
            if stage_index > 0 {
                tracing::info!(stage = stage_index, "no matches yet, relaxing search constraints");
            }
            for query in stage {
                if accepted.len() >= limit {
                    break;
                }
                let records = match self.search.search(query).await {
                    Ok(records) => records,
                    Err(err) => {
                        tracing::warn!(
                            city = query.city.as_deref().unwrap_or("-"),
                            state = query.state.as_deref().unwrap_or("-"),
                            specialty = query.specialty.as_deref().unwrap_or("-"),
                            error = %err,
                            "registry query failed, continuing without it"
                        );
                        continue;
                    }
                };
                tracing::debug!(
                    returned = records.len(),
                    specialty = query.specialty.as_deref().unwrap_or("-"),
                    "registry query returned"
                );
                for record in &records {
                    if accepted.len() >= limit {
                        break;
                    }
                    // Strictness applies to the city the query actually
                    // carried, so a city-relaxed stage is not re-filtered.
                    let Some(physician) =
                        screen_record(record, query.city.as_deref(), self.strict_city_match)
                    else {
                        continue;
                    };
                    // First occurrence wins across all term queries.
                    if !seen.insert(physician.npi.clone()) {
                        continue;
                    }
                    accepted.push(physician);
                }
            }
        }

        let addresses: Vec<String> = accepted
            .iter()
            .map(Physician::full_address)
            .collect();
        let points = geocode_all(&self.geocoder, &addresses).await;
        for (physician, point) in accepted.iter_mut().zip(points) {
            if let Some(point) = point {
                physician.lat = Some(point.lat);
                physician.lon = Some(point.lon);
            }
        }

        tracing::info!(count = accepted.len(), "physician search finished");
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PhysicianFinder, ProviderSearch, RegistryAddress, RegistryBasic, RegistryQuery,
        RegistryRecord, RegistryTaxonomy, relaxation_stages,
    };
    use crate::geo::{Geocode, GeoPoint};
    use anyhow::{Result, anyhow};

    fn record(npi: u64, codes: &[&str], city: &str) -> RegistryRecord {
        RegistryRecord {
            number: Some(super::NpiNumber::Digits(npi)),
            basic: Some(RegistryBasic {
                first_name: Some("Alex".to_string()),
                last_name: Some(format!("Provider{npi}")),
                credential: Some("M.D.".to_string()),
            }),
            addresses: vec![
                RegistryAddress {
                    address_purpose: Some("MAILING".to_string()),
                    address_1: Some("PO Box 1".to_string()),
                    city: Some(city.to_string()),
                    state: Some("TX".to_string()),
                    postal_code: Some("75201".to_string()),
                },
                RegistryAddress {
                    address_purpose: Some("LOCATION".to_string()),
                    address_1: Some(format!("{npi} Main St")),
                    city: Some(city.to_string()),
                    state: Some("TX".to_string()),
                    postal_code: Some("75201".to_string()),
                },
            ],
            taxonomies: codes
                .iter()
                .enumerate()
                .map(|(i, code)| RegistryTaxonomy {
                    code: Some((*code).to_string()),
                    desc: Some("Internal Medicine".to_string()),
                    primary: i == 0,
                })
                .collect(),
        }
    }

    /// Returns canned record batches depending on which constraints the
    /// query still carries.
    #[derive(Default)]
    struct StubSearch {
        with_city: Vec<RegistryRecord>,
        state_only: Vec<RegistryRecord>,
        no_specialty: Vec<RegistryRecord>,
        fail_specialties: Vec<String>,
    }

    impl ProviderSearch for StubSearch {
        async fn search(&self, query: &RegistryQuery) -> Result<Vec<RegistryRecord>> {
            if let Some(specialty) = &query.specialty {
                if self.fail_specialties.contains(specialty) {
                    return Err(anyhow!("upstream unavailable"));
                }
            }
            if query.specialty.is_none() {
                return Ok(self.no_specialty.clone());
            }
            if query.city.is_some() {
                Ok(self.with_city.clone())
            } else {
                Ok(self.state_only.clone())
            }
        }
    }

    struct NoGeocoder;

    impl Geocode for NoGeocoder {
        async fn geocode(&self, _address: &str) -> Option<GeoPoint> {
            None
        }
    }

    /// Fails for any address containing the marker substring.
    struct FlakyGeocoder;

    impl Geocode for FlakyGeocoder {
        async fn geocode(&self, address: &str) -> Option<GeoPoint> {
            if address.contains("13 Main St") {
                None
            } else {
                Some(GeoPoint {
                    lat: 32.0,
                    lon: -96.0,
                })
            }
        }
    }

    #[test]
    fn cascade_stages_shed_city_then_specialty() {
        let stages = relaxation_stages(
            Some("Dallas"),
            Some("TX"),
            &["Medical Oncology", "Hematology & Oncology"],
            40,
        );
        assert_eq!(stages.len(), 3);
        // Stage 1: one query per term, full constraints.
        assert_eq!(stages[0].len(), 2);
        assert_eq!(stages[0][0].city.as_deref(), Some("Dallas"));
        assert_eq!(stages[0][0].specialty.as_deref(), Some("Medical Oncology"));
        // Stage 2: city dropped, terms kept.
        assert!(stages[1].iter().all(|q| q.city.is_none()));
        assert!(stages[1].iter().all(|q| q.specialty.is_some()));
        // Stage 3: specialty dropped.
        assert_eq!(stages[2].len(), 1);
        assert!(stages[2][0].specialty.is_none());
        assert_eq!(stages[2][0].city.as_deref(), Some("Dallas"));
    }

    #[test]
    fn cascade_without_terms_skips_to_unfiltered_queries() {
        let stages = relaxation_stages(Some("Dallas"), Some("TX"), &[], 40);
        assert_eq!(stages.len(), 2);
        assert!(stages[0][0].specialty.is_none());
        assert!(stages[1][0].city.is_none());
    }

    #[tokio::test]
    async fn respects_limit_and_deduplicates() {
        let mut batch = Vec::new();
        for npi in [1u64, 2, 3, 2, 1, 4, 5, 6, 7, 8] {
            batch.push(record(npi, &["207R00000X"], "Dallas"));
        }
        let stub = StubSearch {
            with_city: batch,
            ..Default::default()
        };
        let finder = PhysicianFinder::new(stub, NoGeocoder, 5, false);
        let found = finder
            .find_physicians(Some("Dallas"), Some("TX"), Some("diabetes"), 5)
            .await;
        assert_eq!(found.len(), 5);
        let mut npis: Vec<&str> = found.iter().map(|p| p.npi.as_str()).collect();
        npis.dedup();
        assert_eq!(npis, vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn excludes_non_physicians_and_missing_addresses() {
        let mut no_address = record(30, &["207R00000X"], "Dallas");
        no_address.addresses.retain(|a| a.address_purpose.as_deref() != Some("LOCATION"));
        // No condition means no specialty filter on the registry query.
        let stub = StubSearch {
            no_specialty: vec![
                record(10, &["207R00000X"], "Dallas"),
                record(11, &["363L00000X"], "Dallas"),
                record(12, &["207R00000X", "363L00000X"], "Dallas"),
                no_address,
            ],
            ..Default::default()
        };
        let finder = PhysicianFinder::new(stub, NoGeocoder, 5, false);
        let found = finder
            .find_physicians(Some("Dallas"), Some("TX"), None, 10)
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].npi, "10");
        assert_eq!(found[0].address, "10 Main St");
        assert_eq!(found[0].specialty.as_deref(), Some("Internal Medicine"));
    }

    #[tokio::test]
    async fn relaxes_to_state_scope_when_city_matches_nothing() {
        let stub = StubSearch {
            state_only: vec![record(20, &["207RX0202X"], "Houston")],
            ..Default::default()
        };
        let finder = PhysicianFinder::new(stub, NoGeocoder, 5, false);
        let found = finder
            .find_physicians(Some("Nowhereville"), Some("Texas"), Some("cancer"), 5)
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].npi, "20");
        assert_eq!(found[0].state.as_deref(), Some("TX"));
    }

    #[tokio::test]
    async fn a_failing_term_query_degrades_instead_of_aborting() {
        let stub = StubSearch {
            with_city: vec![record(40, &["207RH0003X"], "Dallas")],
            fail_specialties: vec!["Medical Oncology".to_string()],
            ..Default::default()
        };
        let finder = PhysicianFinder::new(stub, NoGeocoder, 5, false);
        // "cancer" resolves to Medical Oncology first; that query errors and
        // the next term still produces the record.
        let found = finder
            .find_physicians(Some("Dallas"), Some("TX"), Some("cancer"), 5)
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].npi, "40");
    }

    #[tokio::test]
    async fn strict_city_match_filters_practice_city() {
        let stub = StubSearch {
            no_specialty: vec![
                record(50, &["207R00000X"], "Dallas"),
                record(51, &["207R00000X"], "Plano"),
            ],
            ..Default::default()
        };
        let finder = PhysicianFinder::new(stub, NoGeocoder, 5, true);
        let found = finder
            .find_physicians(Some("dallas"), Some("TX"), None, 10)
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].npi, "50");
    }

    #[tokio::test]
    async fn geocoding_failures_leave_coordinates_absent() {
        let stub = StubSearch {
            no_specialty: (11u64..=15)
                .map(|npi| record(npi, &["207R00000X"], "Dallas"))
                .collect(),
            ..Default::default()
        };
        let finder = PhysicianFinder::new(stub, FlakyGeocoder, 5, false);
        let found = finder
            .find_physicians(Some("Dallas"), Some("TX"), None, 5)
            .await;
        assert_eq!(found.len(), 5);
        let without_coords: Vec<&str> = found
            .iter()
            .filter(|p| p.lat.is_none())
            .map(|p| p.npi.as_str())
            .collect();
        assert_eq!(without_coords, vec!["13"]);
        for physician in &found {
            assert_eq!(physician.lat.is_some(), physician.lon.is_some());
        }
    }

    #[tokio::test]
    async fn breast_cancer_in_dallas_end_to_end() {
        let stub = StubSearch {
            with_city: (1u64..=8)
                .map(|npi| record(npi, &["207RX0202X"], "Dallas"))
                .collect(),
            ..Default::default()
        };
        let finder = PhysicianFinder::new(stub, NoGeocoder, 5, false);
        let found = finder
            .find_physicians(Some("Dallas"), Some("TX"), Some("breast cancer"), 5)
            .await;
        assert!(found.len() <= 5);
        let npis: std::collections::HashSet<&str> =
            found.iter().map(|p| p.npi.as_str()).collect();
        assert_eq!(npis.len(), found.len());
    }
}
