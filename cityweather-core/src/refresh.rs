use futures::future::join_all;

use crate::{
    geocode::PlaceResolver,
    model::SavedCityCard,
    store::LocationStore,
    weather::WeatherClient,
};

/// Runs one refresh cycle over every saved location.
///
/// The coordinator owns no state of its own. A cycle superseded by a newer
/// `refresh_all` call is not cancelled; both run to completion and the
/// consumer keeps whichever result arrives last.
#[derive(Debug)]
pub struct RefreshCoordinator<'a> {
    store: &'a LocationStore,
    resolver: &'a PlaceResolver,
    weather: &'a WeatherClient,
}

impl<'a> RefreshCoordinator<'a> {
    pub fn new(
        store: &'a LocationStore,
        resolver: &'a PlaceResolver,
        weather: &'a WeatherClient,
    ) -> Self {
        Self {
            store,
            resolver,
            weather,
        }
    }

    /// Produce a settled card for every saved label.
    ///
    /// The label list is snapshotted up front: saves and removals landing
    /// afterwards wait for the next cycle, and the snapshot fixes both the
    /// scope and the order of the result. An empty snapshot returns
    /// immediately with no network activity. Pipelines run as interleaved
    /// in-flight requests on the current task and settle independently;
    /// the returned sequence keeps snapshot order no matter which pipeline
    /// finished first.
    pub async fn refresh_all(&self) -> Vec<SavedCityCard> {
        let snapshot = self.store.list();
        if snapshot.is_empty() {
            return Vec::new();
        }

        tracing::debug!(count = snapshot.len(), "refreshing saved locations");
        join_all(snapshot.into_iter().map(|label| self.refresh_label(label))).await
    }

    /// One label's pipeline: resolve, then fetch. A failure settles this
    /// card as `Failed` and touches no other pipeline.
    async fn refresh_label(&self, label: String) -> SavedCityCard {
        let card = SavedCityCard::loading(label);

        let place = match self.resolver.resolve(card.label()).await {
            Ok(place) => place,
            Err(e) => {
                tracing::warn!(label = card.label(), error = %e, "refresh pipeline failed to resolve");
                return card.failed(e.to_string());
            }
        };

        match self.weather.fetch_current(place.latitude, place.longitude).await {
            Ok(conditions) => card.ready(place, conditions),
            Err(e) => {
                tracing::warn!(label = card.label(), error = %e, "refresh pipeline failed to fetch weather");
                card.failed(e.to_string())
            }
        }
    }
}
