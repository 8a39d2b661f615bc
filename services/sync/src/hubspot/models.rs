use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw CRM object from the search API (`/crm/v3/objects/{type}/search`).
/// Property values can be null; absent property bags mark records that are
/// not usable for transformation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub properties: Option<HashMap<String, Option<String>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RawRecord>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl SearchResponse {
    /// The next page's offset, if the API returned one and it parses.
    pub fn next_after(&self) -> Option<u64> {
        self.paging
            .as_ref()?
            .next
            .as_ref()?
            .after
            .parse()
            .ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<PagingNext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagingNext {
    pub after: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub filter_groups: Vec<FilterGroup>,
    pub sorts: Vec<Sort>,
    pub properties: Vec<String>,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl SearchRequest {
    /// Build a search request sorted ascending on `sort_property`, filtered
    /// to the inclusive `window` when one is given (epoch-millisecond
    /// values), unfiltered otherwise.
    pub fn new(
        sort_property: &str,
        properties: &[&str],
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
        after: Option<u64>,
        limit: u32,
    ) -> Self {
        let filter_groups = match window {
            Some((start, end)) => vec![FilterGroup {
                filters: vec![
                    Filter {
                        property_name: sort_property.to_string(),
                        operator: "GTE".to_string(),
                        value: start.timestamp_millis().to_string(),
                    },
                    Filter {
                        property_name: sort_property.to_string(),
                        operator: "LTE".to_string(),
                        value: end.timestamp_millis().to_string(),
                    },
                ],
            }],
            None => Vec::new(),
        };

        Self {
            filter_groups,
            sorts: vec![Sort {
                property_name: sort_property.to_string(),
                direction: "ASCENDING".to_string(),
            }],
            properties: properties.iter().map(|p| p.to_string()).collect(),
            limit,
            after: after.map(|a| a.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub property_name: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sort {
    pub property_name: String,
    pub direction: String,
}

/// Response from the OAuth token endpoint (`/oauth/v1/token`).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssociationsResponse {
    #[serde(default)]
    pub results: Vec<AssociatedContact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssociatedContact {
    #[serde(default)]
    pub properties: Option<AssociatedContactProperties>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssociatedContactProperties {
    #[serde(default)]
    pub email: Option<String>,
}

impl AssociationsResponse {
    /// Attendee identities (emails), skipping contacts without one.
    pub fn emails(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|c| c.properties.as_ref()?.email.clone())
            .filter(|e| !e.is_empty())
            .collect()
    }
}
