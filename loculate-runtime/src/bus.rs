//! In-process message bus between the panel and the coordinator.
//!
//! Each request travels with its own `oneshot` reply handle, so the reply path
//! stays open for as long as the coordinator needs and a dropped handle turns
//! into an explicit `NoResponse` on the panel side.

use async_trait::async_trait;
use loculate_core::protocol::{Message, TravelTimeReply};
use loculate_core::types::RoutePair;
use loculate_engine::coordinator::Coordinator;
use loculate_engine::traits::{BusError, PanelLauncher, TravelTimeBroker};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub struct Envelope {
    pub message: Message,
    pub reply: oneshot::Sender<TravelTimeReply>,
}

#[derive(Debug, Clone)]
pub struct ChannelBus {
    tx: mpsc::Sender<Envelope>,
}

pub fn channel(capacity: usize) -> (ChannelBus, mpsc::Receiver<Envelope>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelBus { tx }, rx)
}

#[async_trait]
impl TravelTimeBroker for ChannelBus {
    async fn request(&self, pair: &RoutePair) -> Result<TravelTimeReply, BusError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                message: Message::travel_time(pair),
                reply: reply_tx,
            })
            .await
            .map_err(|_| BusError::Closed)?;
        reply_rx.await.map_err(|_| BusError::NoResponse)
    }
}

/// Runs the coordinator's bus endpoint until every sender is gone.
///
/// Each message is handled on its own task so a slow upstream call never
/// blocks the next request.
pub async fn serve(coordinator: Coordinator, mut rx: mpsc::Receiver<Envelope>) {
    while let Some(Envelope { message, reply }) = rx.recv().await {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            match coordinator.handle_message(message).await {
                Some(answer) => {
                    if reply.send(answer).is_err() {
                        log::debug!("requester went away before the reply was sent");
                    }
                }
                // Not ours; dropping the handle tells the sender there is no answer.
                None => drop(reply),
            }
        });
    }
    log::debug!("coordinator bus closed");
}

/// Delivers capture signals to whatever panel is listening.
#[derive(Debug, Clone)]
pub struct PanelSignals {
    tx: mpsc::UnboundedSender<Message>,
}

pub fn panel_channel() -> (PanelSignals, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PanelSignals { tx }, rx)
}

#[async_trait]
impl PanelLauncher for PanelSignals {
    async fn open_panel(&self, signal: Message) -> anyhow::Result<()> {
        // A closed panel is fine: it reads the destination from the store on mount.
        if self.tx.send(signal).is_err() {
            log::debug!("no panel listening for capture signal");
        }
        Ok(())
    }
}
