//! Panel controller: the interactive surface's state machine.
//!
//! `Idle -> Loading -> {Success, Error}`, re-entered whenever the resolved
//! `(origin, destination)` pair changes. Origin management (add/select/delete)
//! runs alongside the request cycle and persists straight to the store.
//!
//! The request cycle is split into [`PanelController::begin_request`] and
//! [`PanelController::apply_reply`] so a host that drives replies itself can
//! interleave them; [`PanelController::refresh`] is the sequential convenience.

use crate::traits::{BusError, StateStore, TravelTimeBroker};
use loculate_core::origins::{AddOutcome, OriginError, SavedOrigins};
use loculate_core::protocol::{Message, TravelTimeReply};
use loculate_core::state::{
    KEY_LEGACY_ORIGIN, KEY_SAVED_ORIGINS, KEY_SELECTED_ORIGIN_INDEX, KEY_SELECTED_TEXT, KEY_THEME,
    PanelSnapshot, StoreRecord, origins_record, plan_migration, selected_index_record,
    theme_record,
};
use loculate_core::types::{RoutePair, Theme, TravelResult};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Origin(#[from] OriginError),
    #[error("persist panel state: {0:#}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelStatus {
    Idle,
    Loading(RoutePair),
    Success(TravelResult),
    Error(String),
}

impl PanelStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PanelStatus::Idle => "idle",
            PanelStatus::Loading(_) => "loading",
            PanelStatus::Success(_) => "success",
            PanelStatus::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    pub origins: SavedOrigins,
    pub destination: Option<String>,
    /// Free-text origin field. Only `add_origin` consumes it.
    pub origin_input: String,
    pub theme: Theme,
    pub status: PanelStatus,
    /// Non-fatal user notice, e.g. the capacity rejection.
    pub notice: Option<String>,
    last_requested: Option<RoutePair>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            origins: SavedOrigins::empty(),
            destination: None,
            origin_input: String::new(),
            theme: Theme::Light,
            status: PanelStatus::Idle,
            notice: None,
            last_requested: None,
        }
    }
}

impl PanelState {
    /// The pair a request would be issued for right now, if both ends are known.
    pub fn current_pair(&self) -> Option<RoutePair> {
        let origin = self.origins.selected_origin()?;
        let destination = self.destination.as_deref()?;
        let pair = RoutePair::new(origin, destination);
        pair.is_complete().then_some(pair)
    }

    pub fn result(&self) -> Option<&TravelResult> {
        match &self.status {
            PanelStatus::Success(r) => Some(r),
            _ => None,
        }
    }
}

pub struct PanelController {
    store: Arc<dyn StateStore>,
    broker: Arc<dyn TravelTimeBroker>,
    reply_timeout: Option<Duration>,
    state: PanelState,
}

impl PanelController {
    pub fn new(store: Arc<dyn StateStore>, broker: Arc<dyn TravelTimeBroker>) -> Self {
        Self {
            store,
            broker,
            reply_timeout: None,
            state: PanelState::default(),
        }
    }

    /// Bounds how long a request may sit in `Loading` before failing.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Loads state from the store and kicks off a request if one is possible.
    pub async fn mount(&mut self, host_prefers_dark: bool) {
        let snapshot = self.load_snapshot().await;

        self.state.origins = snapshot.origins();
        self.state.destination = snapshot.destination().map(str::to_string);
        self.state.theme = Theme::resolve(snapshot.theme, host_prefers_dark);
        self.state.status = PanelStatus::Idle;
        self.state.last_requested = None;

        self.refresh().await;
    }

    /// Four independent reads; any of them may fail or see another context
    /// mid-write, so the result is reconciled rather than trusted.
    async fn load_snapshot(&self) -> PanelSnapshot {
        let (origins, index, text, theme) = tokio::join!(
            self.store.get(&[KEY_SAVED_ORIGINS, KEY_LEGACY_ORIGIN]),
            self.store.get(&[KEY_SELECTED_ORIGIN_INDEX]),
            self.store.get(&[KEY_SELECTED_TEXT]),
            self.store.get(&[KEY_THEME]),
        );

        let mut merged = StoreRecord::new();
        for part in [origins, index, text, theme] {
            match part {
                Ok(record) => merged.extend(record),
                Err(e) => log::warn!("store read failed; treating keys as absent: {e:#}"),
            }
        }

        let mut snapshot = PanelSnapshot::from_record(&merged);
        if let Some(writes) = plan_migration(&snapshot) {
            log::info!("migrating legacy single origin into saved origins");
            if let Err(e) = self.store.set(writes.clone()).await {
                log::warn!("writing migrated origins failed: {e:#}");
            }
            snapshot.apply(&writes);
        }
        snapshot
    }

    /// Handles a bus message addressed to the panel.
    pub async fn on_message(&mut self, msg: Message) {
        match msg {
            Message::CalculateTravelTime { destination } => {
                let destination = destination.trim();
                if destination.is_empty() {
                    return;
                }
                self.state.destination = Some(destination.to_string());
                self.refresh().await;
            }
            other => log::debug!("panel ignoring message: {other:?}"),
        }
    }

    pub fn set_origin_input(&mut self, input: impl Into<String>) {
        self.state.origin_input = input.into();
    }

    /// Saves the origin field as a new origin (or selects its duplicate).
    pub async fn add_origin(&mut self) -> Result<AddOutcome, PanelError> {
        let mut origins = self.state.origins.clone();
        let outcome = match origins.add(&self.state.origin_input) {
            Ok(outcome) => outcome,
            Err(OriginError::LimitReached) => {
                self.state.notice = Some(OriginError::LimitReached.to_string());
                return Err(OriginError::LimitReached.into());
            }
            Err(e) => return Err(e.into()),
        };

        self.store.set(origins_record(&origins)).await?;
        self.state.origins = origins;
        self.state.origin_input.clear();
        self.state.notice = None;

        self.refresh().await;
        Ok(outcome)
    }

    /// Explicit pick from the list. Leaves the origin field untouched.
    pub async fn select_origin(&mut self, index: usize) -> Result<(), PanelError> {
        let mut origins = self.state.origins.clone();
        origins.select(index)?;

        self.store.set(selected_index_record(&origins)).await?;
        self.state.origins = origins;

        self.refresh().await;
        Ok(())
    }

    pub async fn delete_origin(&mut self, index: usize) -> Result<(), PanelError> {
        let mut origins = self.state.origins.clone();
        let outcome = origins.delete(index)?;

        self.store.set(origins_record(&origins)).await?;
        self.state.origins = origins;
        self.state.notice = None;

        if outcome.selection_cleared {
            // Nothing left to compute against.
            self.clear_result();
        } else {
            self.refresh().await;
        }
        Ok(())
    }

    pub async fn toggle_theme(&mut self) -> Result<Theme, PanelError> {
        let theme = self.state.theme.toggled();
        self.store.set(theme_record(theme)).await?;
        self.state.theme = theme;
        Ok(theme)
    }

    /// Issues at most one request for the current pair and applies its reply.
    pub async fn refresh(&mut self) {
        let Some(pair) = self.begin_request() else {
            return;
        };
        let reply = self.dispatch(&pair).await;
        self.apply_reply(&pair, reply);
    }

    /// Enters `Loading` if the current pair is complete and differs from the last
    /// pair requested. Returns the pair to send.
    pub fn begin_request(&mut self) -> Option<RoutePair> {
        let pair = self.state.current_pair()?;
        if self.state.last_requested.as_ref() == Some(&pair) {
            return None;
        }

        log::debug!("panel loading travel time");
        self.state.last_requested = Some(pair.clone());
        self.state.status = PanelStatus::Loading(pair.clone());
        Some(pair)
    }

    /// Applies a reply tagged with the pair it was requested for.
    ///
    /// Replies for anything other than the pair currently loading are stale and
    /// dropped. Returns whether the reply was applied.
    pub fn apply_reply(
        &mut self,
        pair: &RoutePair,
        reply: Result<TravelTimeReply, BusError>,
    ) -> bool {
        match &self.state.status {
            PanelStatus::Loading(loading) if loading == pair => {}
            _ => {
                log::debug!("discarding stale travel time reply");
                return false;
            }
        }

        let outcome = reply
            .map_err(|e| e.to_string())
            .and_then(TravelTimeReply::into_result);

        match outcome {
            Ok(data) => {
                self.state.status = PanelStatus::Success(TravelResult {
                    pair: pair.clone(),
                    data,
                });
            }
            Err(message) => {
                log::info!("travel time failed: {message}");
                // The pair stays recorded: errors are terminal until the pair changes.
                self.state.status = PanelStatus::Error(message);
            }
        }
        true
    }

    async fn dispatch(&self, pair: &RoutePair) -> Result<TravelTimeReply, BusError> {
        let request = self.broker.request(pair);
        match self.reply_timeout {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .unwrap_or(Err(BusError::TimedOut)),
            None => request.await,
        }
    }

    fn clear_result(&mut self) {
        self.state.status = PanelStatus::Idle;
        self.state.last_requested = None;
    }
}
