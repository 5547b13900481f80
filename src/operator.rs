use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::{
    director::DirectorCommand,
    sync::{Subscription, SyncChannel},
};

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("live control is unavailable")]
    ControlUnavailable,
}

/// One on-air control panel. Commands go to the director; the locally shown
/// selection is updated optimistically on click and reconciled against the
/// operator's own sync subscription (the operator is also a subscriber), so a
/// concurrent operator's write eventually replaces an optimistic value.
pub struct OperatorClient {
    director_tx: mpsc::Sender<DirectorCommand>,
    selection_tx: Arc<watch::Sender<Option<Uuid>>>,
    selection_rx: watch::Receiver<Option<Uuid>>,
    subscription: Subscription,
}

impl OperatorClient {
    pub fn connect(director_tx: mpsc::Sender<DirectorCommand>, sync: &SyncChannel) -> Self {
        let (selection_tx, selection_rx) = watch::channel(sync.snapshot().active_cue_id);
        let selection_tx = Arc::new(selection_tx);

        let confirmed_tx = selection_tx.clone();
        let subscription = sync.subscribe(move |id| {
            confirmed_tx.send_replace(id);
        });

        Self {
            director_tx,
            selection_tx,
            selection_rx,
            subscription,
        }
    }

    /// The selection the control panel should highlight right now.
    pub fn selection(&self) -> Option<Uuid> {
        *self.selection_rx.borrow()
    }

    pub fn selection_rx(&self) -> watch::Receiver<Option<Uuid>> {
        self.selection_rx.clone()
    }

    pub async fn activate_cue(&self, cue_id: Uuid) -> Result<(), OperatorError> {
        self.issue(DirectorCommand::Activate { cue_id }, Some(cue_id))
            .await
    }

    pub async fn deactivate(&self) -> Result<(), OperatorError> {
        self.issue(DirectorCommand::Deactivate, None).await
    }

    async fn issue(
        &self,
        command: DirectorCommand,
        optimistic: Option<Uuid>,
    ) -> Result<(), OperatorError> {
        let previous = *self.selection_rx.borrow();
        self.selection_tx.send_replace(optimistic);

        if self.director_tx.send(command).await.is_err() {
            // Roll the optimistic selection back so the panel does not keep
            // highlighting a cue that never went live.
            self.selection_tx.send_replace(previous);
            log::error!("Failed to send command to the director.");
            return Err(OperatorError::ControlUnavailable);
        }
        Ok(())
    }

    pub async fn close(self) {
        self.subscription.close().await;
    }
}
