use crate::types::{RoutePair, TravelData};
use serde::{Deserialize, Serialize};

/// Context-menu entry that triggers a capture.
pub const CAPTURE_MENU_ID: &str = "calculateTravelTime";
pub const CAPTURE_MENU_TITLE: &str = "Calculate travel time from here";
pub const CAPTURE_MENU_CONTEXT: &str = "selection";

/// Messages carried on the extension message bus, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Panel -> Coordinator: compute driving time for a pair.
    #[serde(rename = "GET_TRAVEL_TIME")]
    GetTravelTime { origin: String, destination: String },

    /// Coordinator -> Panel: a new destination was captured.
    #[serde(rename = "CALCULATE_TRAVEL_TIME")]
    CalculateTravelTime { destination: String },

    /// Any context -> page: report the current text selection.
    #[serde(rename = "GET_SELECTED_TEXT")]
    GetSelectedText,
}

impl Message {
    pub fn travel_time(pair: &RoutePair) -> Self {
        Message::GetTravelTime {
            origin: pair.origin.clone(),
            destination: pair.destination.clone(),
        }
    }
}

/// Reply to `GET_TRAVEL_TIME`.
///
/// Wire shape is `{success: true, data}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTimeReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TravelData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TravelTimeReply {
    pub fn ok(data: TravelData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Collapses the wire shape into a `Result`, treating malformed replies as failures.
    pub fn into_result(self) -> Result<TravelData, String> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (true, None, _) => Err("Reply is missing travel data".into()),
            (false, _, Some(e)) if !e.trim().is_empty() => Err(e),
            (false, _, _) => Err("Unknown error".into()),
        }
    }
}

/// Reply to `GET_SELECTED_TEXT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTextReply {
    pub text: String,
}
