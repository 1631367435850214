use thiserror::Error;

use crate::{
    geocode::{PlaceResolver, ResolveError},
    model::{ResolvedPlace, SearchResult},
    store::{LocationStore, MAX_SAVED_LOCATIONS, StoreError},
    weather::{UpstreamError, WeatherClient},
};

/// The first failure of the resolve-then-fetch chain, surfaced to the
/// caller as one user-facing message. No retry, no partial result.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Weather(#[from] UpstreamError),
}

/// Where a search session currently stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Searching,
    Resolved(SearchResult),
    Failed(String),
}

/// Single-place workflow: resolve one query, fetch its weather, and offer
/// to save the canonical name if there is room.
#[derive(Debug)]
pub struct SearchSession<'a> {
    resolver: &'a PlaceResolver,
    weather: &'a WeatherClient,
    store: &'a LocationStore,
    state: SessionState,
}

impl<'a> SearchSession<'a> {
    pub fn new(
        resolver: &'a PlaceResolver,
        weather: &'a WeatherClient,
        store: &'a LocationStore,
    ) -> Self {
        Self {
            resolver,
            weather,
            store,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Resolve `query` and fetch current weather for the match. On failure
    /// the session holds only the failure message; there is no partial
    /// result to save.
    pub async fn search(&mut self, query: &str) -> Result<SearchResult, SearchError> {
        self.state = SessionState::Searching;

        let outcome = self.run_search(query).await;
        self.state = match &outcome {
            Ok(result) => SessionState::Resolved(result.clone()),
            Err(e) => SessionState::Failed(e.to_string()),
        };

        outcome
    }

    async fn run_search(&self, query: &str) -> Result<SearchResult, SearchError> {
        let place = self.resolver.resolve(query).await?;
        let conditions = self
            .weather
            .fetch_current(place.latitude, place.longitude)
            .await?;

        Ok(SearchResult { place, conditions })
    }

    /// Whether a save would currently be accepted. Advisory only: another
    /// session can fill the last slot between this check and `try_save`,
    /// and the store re-checks under its own lock.
    pub fn can_save(&self) -> bool {
        self.store.count() < MAX_SAVED_LOCATIONS
    }

    /// Persist the place under its canonical display name, not the query
    /// text the search started from.
    pub fn try_save(&self, place: &ResolvedPlace) -> Result<(), StoreError> {
        self.store.save(&place.display_name)
    }
}
