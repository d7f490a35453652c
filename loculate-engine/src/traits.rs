use async_trait::async_trait;
use loculate_core::protocol::{Message, TravelTimeReply};
use loculate_core::state::StoreRecord;
use loculate_core::types::{RoutePair, TravelData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Asynchronous key/value store shared by every context of one install.
///
/// There is no transaction across keys: two `get`s (or a `get` racing another
/// context's `set`) can observe a mix of old and new values.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the subset of `keys` that exist. Missing keys are simply absent.
    async fn get(&self, keys: &[&str]) -> anyhow::Result<StoreRecord>;
    async fn set(&self, record: StoreRecord) -> anyhow::Result<()>;
}

/// What the Coordinator calls to actually compute a route (the proxy, over HTTP).
#[async_trait]
pub trait TravelTimeService: Send + Sync {
    async fn travel_time(&self, pair: &RoutePair) -> anyhow::Result<TravelData>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The receiver dropped the reply handle without answering.
    #[error("No response")]
    NoResponse,
    /// Nobody is listening on the bus; to the user this is the same as silence.
    #[error("No response")]
    Closed,
    #[error("Request timed out")]
    TimedOut,
}

/// Panel side of the message bus: send one request, wait for exactly one reply.
#[async_trait]
pub trait TravelTimeBroker: Send + Sync {
    async fn request(&self, pair: &RoutePair) -> Result<TravelTimeReply, BusError>;
}

/// Opens (or signals) the Panel. The payload is the capture signal message.
#[async_trait]
pub trait PanelLauncher: Send + Sync {
    async fn open_panel(&self, signal: Message) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub contexts: Vec<String>,
}

/// Host right-click menu. `create` with an existing id replaces that entry.
pub trait ContextMenuRegistry: Send + Sync {
    fn create(&self, item: MenuItem) -> anyhow::Result<()>;
}

/// Page-level access to the user's highlighted text.
pub trait SelectionSource: Send + Sync {
    fn current_selection(&self) -> Option<String>;
}
