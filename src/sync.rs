use tokio::{sync::watch, task::JoinHandle};
use uuid::Uuid;

use crate::director::LiveState;

/// Read side of the live-state fan-out. Cheap to clone; every clone observes
/// the same sequence of director writes.
///
/// Subscriptions begin from "now": the current value is delivered first and
/// updates missed while not subscribed are not replayed, so reconnecting
/// clients must start from a fresh snapshot.
#[derive(Clone)]
pub struct SyncChannel {
    state_rx: watch::Receiver<LiveState>,
}

impl SyncChannel {
    pub fn new(state_rx: watch::Receiver<LiveState>) -> Self {
        Self { state_rx }
    }

    pub fn snapshot(&self) -> LiveState {
        self.state_rx.borrow().clone()
    }

    /// Raw receiver for callers that drive their own select loop, such as the
    /// WebSocket fan-out.
    pub fn watch(&self) -> watch::Receiver<LiveState> {
        self.state_rx.clone()
    }

    /// Registers a change listener. The callback first receives the current
    /// `active_cue_id`, then every subsequent change in write order, until the
    /// returned [`Subscription`] is closed or dropped.
    pub fn subscribe<F>(&self, mut on_change: F) -> Subscription
    where
        F: FnMut(Option<Uuid>) + Send + 'static,
    {
        let mut state_rx = self.state_rx.clone();
        let task = tokio::spawn(async move {
            on_change(state_rx.borrow_and_update().active_cue_id);
            while state_rx.changed().await.is_ok() {
                on_change(state_rx.borrow_and_update().active_cue_id);
            }
            log::debug!("Sync channel closed; subscription task finished.");
        });
        Subscription { task }
    }
}

/// Owns the forwarding task behind one subscription. Dropping it aborts the
/// task; [`Subscription::close`] additionally waits until the task has
/// finished, so no callback invocation can happen after it returns.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub async fn close(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
