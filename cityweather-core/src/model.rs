use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A place resolved from a free-text query or a saved label.
///
/// Derived data, recomputed whenever a label needs coordinates and never
/// persisted. The geocoding source may answer differently over time, so the
/// display name can drift from the label it was resolved from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Current weather at a coordinate pair, fetched fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub wind_direction_deg: f64,
    pub weather_code: i32,
    /// Upstream local-time observation stamp, minute precision
    /// (e.g. "2024-05-11T14:30").
    pub observed_at: String,
}

impl CurrentConditions {
    /// Observation time parsed for display, `None` if upstream sent
    /// something unexpected.
    pub fn observed_at_local(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.observed_at, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.observed_at, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }

    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// Weather categories for the WMO interpretation codes reported by the
/// weather backend (`weather_code` above carries the raw value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    FreezingRain,
    Snow,
    Showers,
    Thunderstorm,
}

impl WeatherCondition {
    /// Classify a WMO weather code. Unknown codes fall back to `Clear`.
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 | 2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 | 53 | 55 | 56 | 57 => Self::Drizzle,
            61 | 63 | 65 => Self::Rain,
            66 | 67 => Self::FreezingRain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            80..=82 => Self::Showers,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::FreezingRain => "Freezing rain",
            Self::Snow => "Snow",
            Self::Showers => "Rain showers",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// Outcome of a successful search: the resolved place and its weather.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub place: ResolvedPlace,
    pub conditions: CurrentConditions,
}

/// One row of the saved-locations view model.
///
/// A card starts `Loading` and settles exactly once, to `Ready` or
/// `Failed`; a completed refresh cycle only ever hands out settled cards.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCityCard {
    label: String,
    state: CardState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardState {
    /// The refresh pipeline for this label is still in flight.
    Loading,
    Ready {
        place: ResolvedPlace,
        conditions: CurrentConditions,
    },
    Failed {
        message: String,
    },
}

impl SavedCityCard {
    pub fn loading(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: CardState::Loading,
        }
    }

    /// Settle the card with its resolved place and conditions. Terminal.
    pub fn ready(self, place: ResolvedPlace, conditions: CurrentConditions) -> Self {
        debug_assert!(matches!(self.state, CardState::Loading));
        Self {
            state: CardState::Ready { place, conditions },
            ..self
        }
    }

    /// Settle the card with a user-facing failure message. Terminal.
    pub fn failed(self, message: impl Into<String>) -> Self {
        debug_assert!(matches!(self.state, CardState::Loading));
        Self {
            state: CardState::Failed {
                message: message.into(),
            },
            ..self
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.state, CardState::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(code: i32, observed_at: &str) -> CurrentConditions {
        CurrentConditions {
            temperature_c: 4.5,
            wind_speed_kmh: 18.0,
            wind_direction_deg: 230.0,
            weather_code: code,
            observed_at: observed_at.to_string(),
        }
    }

    #[test]
    fn wmo_codes_classify() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Overcast);
        assert_eq!(WeatherCondition::from_wmo_code(61), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(80), WeatherCondition::Showers);
        assert_eq!(
            WeatherCondition::from_wmo_code(95),
            WeatherCondition::Thunderstorm
        );
    }

    #[test]
    fn unknown_wmo_code_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(42), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn observed_at_parses_minute_precision() {
        let c = conditions(0, "2024-05-11T14:30");
        let parsed = c.observed_at_local().expect("minute precision must parse");
        assert_eq!(parsed.format("%H:%M").to_string(), "14:30");
    }

    #[test]
    fn observed_at_tolerates_garbage() {
        let c = conditions(0, "not a timestamp");
        assert!(c.observed_at_local().is_none());
    }

    #[test]
    fn card_settles_ready() {
        let card = SavedCityCard::loading("Halifax");
        assert!(!card.is_settled());

        let place = ResolvedPlace {
            display_name: "Halifax, Nova Scotia, Canada".to_string(),
            latitude: 44.65,
            longitude: -63.57,
        };
        let card = card.ready(place, conditions(3, "2024-05-11T14:30"));

        assert!(card.is_settled());
        assert_eq!(card.label(), "Halifax");
        assert!(matches!(card.state(), CardState::Ready { .. }));
    }

    #[test]
    fn card_settles_failed() {
        let card = SavedCityCard::loading("Atlantis").failed("City not found. Try another name.");
        assert!(card.is_settled());
        match card.state() {
            CardState::Failed { message } => {
                assert_eq!(message, "City not found. Try another name.");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
