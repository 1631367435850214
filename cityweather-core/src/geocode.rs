use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::model::ResolvedPlace;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Every candidate derived from the query was tried and none matched.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("City not found. Try another name.")]
    NotFound,
}

/// A single lookup against the geocoding backend failed (transport,
/// status, or payload). The resolver treats this as a per-candidate miss.
#[derive(Debug, Error)]
#[error("Failed to geocode city: {0}")]
pub struct GeocodeError(pub String);

/// One match returned by the geocoding backend.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoMatch {
    pub name: String,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoMatch {
    /// Canonical display name: name, admin area, country, joined by ", "
    /// with empty or absent components omitted.
    fn display_name(&self) -> String {
        [
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Free-text place lookup. The production implementation talks to the
/// Open-Meteo geocoding API; tests script their own.
#[async_trait]
pub trait Geocoder: Send + Sync + std::fmt::Debug {
    async fn search(&self, name: &str) -> Result<Vec<GeoMatch>, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: GEOCODING_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.to_string(),
        }
    }
}

impl Default for OpenMeteoGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    /// Absent entirely when nothing matched.
    #[serde(default)]
    results: Option<Vec<GeoMatch>>,
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn search(&self, name: &str) -> Result<Vec<GeoMatch>, GeocodeError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError(format!("request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(GeocodeError(format!("status {status}")));
        }

        let body: GeoSearchResponse = res
            .json()
            .await
            .map_err(|e| GeocodeError(format!("malformed response: {e}")))?;

        Ok(body.results.unwrap_or_default())
    }
}

/// Resolves a free-text query or saved label to a canonical place.
#[derive(Debug)]
pub struct PlaceResolver {
    geocoder: Box<dyn Geocoder>,
}

impl PlaceResolver {
    pub fn new() -> Self {
        Self::with_geocoder(Box::new(OpenMeteoGeocoder::new()))
    }

    pub fn with_geocoder(geocoder: Box<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Try each candidate derived from `query` in order and return the
    /// first match.
    ///
    /// Saved labels are themselves resolver output ("Halifax, Nova Scotia,
    /// Canada"), and re-resolving the full label can fail where the bare
    /// city name succeeds, so a failed or empty lookup falls through to
    /// the next candidate. Only full exhaustion is an error.
    pub async fn resolve(&self, query: &str) -> Result<ResolvedPlace, ResolveError> {
        for candidate in candidates(query) {
            match self.geocoder.search(&candidate).await {
                Ok(matches) => {
                    if let Some(m) = matches.first() {
                        return Ok(ResolvedPlace {
                            display_name: m.display_name(),
                            latitude: m.latitude,
                            longitude: m.longitude,
                        });
                    }
                    tracing::debug!(candidate = %candidate, "no geocoding match, trying next candidate");
                }
                Err(e) => {
                    tracing::debug!(candidate = %candidate, error = %e, "geocoding lookup failed, trying next candidate");
                }
            }
        }

        tracing::warn!(query, "no candidate resolved");
        Err(ResolveError::NotFound)
    }
}

impl Default for PlaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered candidate queries for a label: the full trimmed input, then the
/// trimmed part before the first comma. Duplicates collapse, order is
/// preserved.
fn candidates(query: &str) -> Vec<String> {
    let full = query.trim();

    let mut out = Vec::new();
    if !full.is_empty() {
        out.push(full.to_string());
    }
    if let Some((head, _)) = full.split_once(',') {
        let head = head.trim();
        if !head.is_empty() && !out.iter().any(|c| c == head) {
            out.push(head.to_string());
        }
    }

    out
}
