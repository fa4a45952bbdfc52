//! ClinicalTrials.gov v2 client.
//!
//! A single page fetch plus field projection: the upstream study document is
//! a deep module tree and the service only surfaces a flat summary of it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::TRIALS_MAX_PAGE_SIZE;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudiesResponse {
    #[serde(default)]
    studies: Vec<Study>,
    total_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Study {
    protocol_section: Option<ProtocolSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolSection {
    identification_module: Option<IdentificationModule>,
    status_module: Option<StatusModule>,
    description_module: Option<DescriptionModule>,
    conditions_module: Option<ConditionsModule>,
    sponsor_collaborators_module: Option<SponsorCollaboratorsModule>,
    design_module: Option<DesignModule>,
    eligibility_module: Option<EligibilityModule>,
    contacts_locations_module: Option<ContactsLocationsModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentificationModule {
    nct_id: Option<String>,
    brief_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusModule {
    overall_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescriptionModule {
    brief_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionsModule {
    #[serde(default)]
    conditions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsorCollaboratorsModule {
    lead_sponsor: Option<LeadSponsor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeadSponsor {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesignModule {
    #[serde(default)]
    phases: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EligibilityModule {
    eligibility_criteria: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactsLocationsModule {
    #[serde(default)]
    central_contacts: Vec<RawContact>,
    #[serde(default)]
    locations: Vec<RawLocation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContact {
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    facility: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    geo_point: Option<RawGeoPoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeoPoint {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Flat projection of one study.
#[derive(Debug, Clone, Serialize)]
pub struct TrialSummary {
    pub nct_id: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub conditions: Vec<String>,
    pub sponsor: Option<String>,
    pub phases: Vec<String>,
    pub locations: Vec<TrialSite>,
    pub eligibility: Eligibility,
    pub contact: Option<TrialContact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialSite {
    pub facility: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Eligibility {
    pub inclusion: Option<String>,
    pub exclusion: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// One page of projected studies plus the upstream total for pagination.
#[derive(Debug, Clone)]
pub struct TrialsPage {
    pub studies: Vec<TrialSummary>,
    pub total: u64,
}

pub struct TrialsClient {
    client: reqwest::Client,
    base_url: String,
}

impl TrialsClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Fetch one page of studies by condition text and free-text location.
    pub async fn fetch_page(
        &self,
        condition: Option<&str>,
        location: Option<&str>,
        page_size: usize,
    ) -> Result<TrialsPage> {
        let page_size = page_size.clamp(1, TRIALS_MAX_PAGE_SIZE);
        let mut params: Vec<(&str, String)> = vec![
            ("pageSize", page_size.to_string()),
            ("countTotal", "true".to_string()),
        ];
        if let Some(condition) = condition.map(str::trim).filter(|c| !c.is_empty()) {
            params.push(("query.cond", condition.to_string()));
        }
        if let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) {
            params.push(("query.locn", location.to_string()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .context("trials request failed")?
            .error_for_status()
            .context("trials registry returned an error status")?;
        let body: StudiesResponse = response.json().await.context("invalid trials JSON")?;

        let studies: Vec<TrialSummary> =
            body.studies.into_iter().filter_map(project_study).collect();
        let total = body.total_count.unwrap_or(studies.len() as u64);
        Ok(TrialsPage { studies, total })
    }
}

/// Project a raw study into the summary shape. Studies without an identifier
/// are dropped; everything else degrades to field-level `None`s.
fn project_study(study: Study) -> Option<TrialSummary> {
    let protocol = study.protocol_section.unwrap_or_default();
    let identification = protocol.identification_module.unwrap_or_default();
    let nct_id = identification
        .nct_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())?;

    let contacts_locations = protocol.contacts_locations_module.unwrap_or_default();
    let locations = contacts_locations
        .locations
        .into_iter()
        .map(|location| {
            let geo = location.geo_point.unwrap_or_default();
            TrialSite {
                facility: location.facility,
                city: location.city,
                state: location.state,
                country: location.country,
                lat: geo.lat,
                lon: geo.lon,
            }
        })
        .collect();
    let contact = contacts_locations
        .central_contacts
        .into_iter()
        .next()
        .map(|contact| TrialContact {
            name: contact.name,
            phone: contact.phone,
            email: contact.email,
        });

    let eligibility = protocol
        .eligibility_module
        .unwrap_or_default()
        .eligibility_criteria
        .map(|text| split_eligibility(&text))
        .unwrap_or_default();

    Some(TrialSummary {
        nct_id,
        title: identification.brief_title,
        status: protocol
            .status_module
            .unwrap_or_default()
            .overall_status,
        summary: protocol
            .description_module
            .unwrap_or_default()
            .brief_summary,
        conditions: protocol.conditions_module.unwrap_or_default().conditions,
        sponsor: protocol
            .sponsor_collaborators_module
            .unwrap_or_default()
            .lead_sponsor
            .and_then(|sponsor| sponsor.name),
        phases: protocol.design_module.unwrap_or_default().phases,
        locations,
        eligibility,
        contact,
    })
}

/// Split the combined eligibility text on its "Inclusion Criteria" /
/// "Exclusion Criteria" section markers. Text without markers lands in the
/// inclusion section wholesale.
fn split_eligibility(text: &str) -> Eligibility {
    let lower = text.to_ascii_lowercase();
    let inclusion_at = lower.find("inclusion criteria");
    let exclusion_at = lower.find("exclusion criteria");

    let clean = |segment: &str| {
        let trimmed = segment
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    match (inclusion_at, exclusion_at) {
        (Some(inc), Some(exc)) if inc <= exc => Eligibility {
            inclusion: clean(&text[inc + "inclusion criteria".len()..exc]),
            exclusion: clean(&text[exc + "exclusion criteria".len()..]),
        },
        (Some(inc), None) => Eligibility {
            inclusion: clean(&text[inc + "inclusion criteria".len()..]),
            exclusion: None,
        },
        (None, Some(exc)) => Eligibility {
            inclusion: clean(&text[..exc]),
            exclusion: clean(&text[exc + "exclusion criteria".len()..]),
        },
        _ => Eligibility {
            inclusion: clean(text),
            exclusion: None,
        },
    }
}
