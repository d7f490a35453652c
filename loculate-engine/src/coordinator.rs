use crate::traits::{ContextMenuRegistry, MenuItem, PanelLauncher, StateStore, TravelTimeService};
use loculate_core::protocol::{
    CAPTURE_MENU_CONTEXT, CAPTURE_MENU_ID, CAPTURE_MENU_TITLE, Message, TravelTimeReply,
};
use loculate_core::state::{StoreRecord, selected_text_record};
use loculate_core::types::RoutePair;
use std::sync::Arc;

/// A right-click on the capture menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    pub menu_item_id: String,
    pub selection_text: Option<String>,
}

/// Store writes and the panel signal produced by one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePlan {
    pub writes: StoreRecord,
    pub signal: Message,
}

pub fn capture_menu_item() -> MenuItem {
    MenuItem {
        id: CAPTURE_MENU_ID.into(),
        title: CAPTURE_MENU_TITLE.into(),
        contexts: vec![CAPTURE_MENU_CONTEXT.into()],
    }
}

/// Decides what a capture event does. `None` means ignore it.
pub fn plan_capture(event: &CaptureEvent) -> Option<CapturePlan> {
    if event.menu_item_id != CAPTURE_MENU_ID {
        return None;
    }
    let text = event.selection_text.as_deref()?;
    if text.trim().is_empty() {
        return None;
    }

    Some(CapturePlan {
        writes: selected_text_record(text),
        signal: Message::CalculateTravelTime {
            destination: text.to_string(),
        },
    })
}

/// Background coordinator.
///
/// Holds only collaborator handles. Every durable fact lives in the store, so an
/// instance can be dropped and rebuilt between any two events.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn StateStore>,
    travel: Arc<dyn TravelTimeService>,
    panel: Arc<dyn PanelLauncher>,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn StateStore>,
        travel: Arc<dyn TravelTimeService>,
        panel: Arc<dyn PanelLauncher>,
    ) -> Self {
        Self {
            store,
            travel,
            panel,
        }
    }

    /// Install/update hook. Safe to run any number of times.
    pub fn on_installed(&self, menus: &dyn ContextMenuRegistry) -> anyhow::Result<()> {
        menus.create(capture_menu_item())
    }

    /// Returns whether the event was acted on.
    pub async fn on_capture(&self, event: &CaptureEvent) -> anyhow::Result<bool> {
        let Some(plan) = plan_capture(event) else {
            log::debug!("ignoring capture event for menu {:?}", event.menu_item_id);
            return Ok(false);
        };

        // Destination must be in the store before the panel is told to look.
        self.store.set(plan.writes).await?;
        self.panel.open_panel(plan.signal).await?;
        log::info!("captured destination; panel signalled");
        Ok(true)
    }

    /// Bus endpoint. Returns the single reply for messages this context owns,
    /// `None` for messages addressed to someone else.
    pub async fn handle_message(&self, msg: Message) -> Option<TravelTimeReply> {
        match msg {
            Message::GetTravelTime {
                origin,
                destination,
            } => Some(self.travel_time(&RoutePair::new(origin, destination)).await),
            _ => None,
        }
    }

    /// Exactly one HTTP call, exactly one reply, on every path.
    pub async fn travel_time(&self, pair: &RoutePair) -> TravelTimeReply {
        match self.travel.travel_time(pair).await {
            Ok(data) => TravelTimeReply::ok(data),
            Err(e) => {
                log::warn!("travel time request failed: {e:#}");
                TravelTimeReply::err(e.to_string())
            }
        }
    }
}
