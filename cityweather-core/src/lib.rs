//! Core library for the `cityweather` app.
//!
//! This crate defines:
//! - A durable, capacity-bounded set of saved city labels
//! - Place resolution for free-text queries and saved labels, with
//!   candidate fallback
//! - Current-weather fetching for resolved coordinates
//! - The refresh cycle that turns every saved label into a view-model card
//!
//! It is used by `cityweather-cli`, but can also be reused by other
//! frontends or services.

pub mod geocode;
pub mod model;
pub mod refresh;
pub mod search;
pub mod store;
pub mod weather;

pub use geocode::{GeoMatch, GeocodeError, Geocoder, OpenMeteoGeocoder, PlaceResolver, ResolveError};
pub use model::{
    CardState, CurrentConditions, ResolvedPlace, SavedCityCard, SearchResult, WeatherCondition,
};
pub use refresh::RefreshCoordinator;
pub use search::{SearchError, SearchSession, SessionState};
pub use store::{LocationStore, MAX_SAVED_LOCATIONS, StoreError};
pub use weather::{UpstreamError, WeatherClient};
