use serde::{Deserialize, Serialize};

/// Maximum number of saved origins kept in the store.
pub const MAX_SAVED_ORIGINS: usize = 2;

/// The `(origin, destination)` pair a travel-time request was issued for.
///
/// Doubles as the correlation tag for the request/reply exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutePair {
    pub origin: String,
    pub destination: String,
}

impl RoutePair {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    /// Both ends present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.origin.trim().is_empty() && !self.destination.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelData {
    pub duration: String,
    pub distance: String,
}

/// A travel-time result, valid only for the pair that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelResult {
    pub pair: RoutePair,
    pub data: TravelData,
}

impl TravelResult {
    pub fn is_for(&self, pair: &RoutePair) -> bool {
        &self.pair == pair
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_host(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }

    /// Stored choice wins; otherwise fall back to the host color scheme.
    pub fn resolve(stored: Option<Theme>, host_prefers_dark: bool) -> Self {
        stored.unwrap_or_else(|| Self::from_host(host_prefers_dark))
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}
