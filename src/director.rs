use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::store::CueStore;

/// The singleton on-air record. Exactly one instance lives in the director's
/// watch channel for the lifetime of the process.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    pub active_cue_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorCommand {
    Activate { cue_id: Uuid },
    Deactivate,
}

/// Owns the live state. Commands arrive over an mpsc channel and are applied
/// as unconditional overwrites: concurrent operators resolve by last write
/// wins, with no merge.
pub struct Director {
    cue_store: CueStore,
    command_rx: mpsc::Receiver<DirectorCommand>,
    state_tx: watch::Sender<LiveState>,
}

impl Director {
    pub fn new(
        cue_store: CueStore,
        command_rx: mpsc::Receiver<DirectorCommand>,
        state_tx: watch::Sender<LiveState>,
    ) -> Self {
        Self {
            cue_store,
            command_rx,
            state_tx,
        }
    }

    pub async fn run(mut self) {
        log::info!("Director run loop started.");
        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command).await;
        }
        log::info!("Director run loop finished.");
    }

    async fn handle_command(&self, command: DirectorCommand) {
        let next = match command {
            DirectorCommand::Activate { cue_id } => {
                if self.cue_store.get_cue(&cue_id).await.is_none() {
                    // The reference is written anyway; viewers resolve unknown
                    // ids to the waiting display.
                    log::warn!("Activating unknown cue '{}'.", cue_id);
                }
                Some(cue_id)
            }
            DirectorCommand::Deactivate => None,
        };

        let changed = self.state_tx.send_if_modified(|state| {
            if state.active_cue_id == next {
                return false;
            }
            state.active_cue_id = next;
            true
        });

        if changed {
            log::info!("Live state is now {:?}.", next);
        } else {
            log::debug!("Live state unchanged ({:?}).", next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cue::{CueDraft, CueKind};

    async fn setup_director() -> (
        CueStore,
        mpsc::Sender<DirectorCommand>,
        watch::Receiver<LiveState>,
    ) {
        let store = CueStore::new(None);
        let (command_tx, command_rx) = mpsc::channel::<DirectorCommand>(32);
        let (state_tx, state_rx) = watch::channel::<LiveState>(LiveState::default());

        let director = Director::new(store.clone(), command_rx, state_tx);
        tokio::spawn(director.run());

        (store, command_tx, state_rx)
    }

    async fn seed_cue(store: &CueStore, name: &str, value: &str) -> Uuid {
        store
            .create_cue(CueDraft {
                name: name.to_string(),
                kind: CueKind::Color,
                value: value.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn activate_publishes_new_state() {
        let (store, command_tx, mut state_rx) = setup_director().await;
        let cue_id = seed_cue(&store, "Red", "#ff0000").await;

        command_tx
            .send(DirectorCommand::Activate { cue_id })
            .await
            .unwrap();

        state_rx.changed().await.unwrap();
        assert_eq!(state_rx.borrow().active_cue_id, Some(cue_id));
    }

    #[tokio::test]
    async fn deactivate_clears_state() {
        let (store, command_tx, mut state_rx) = setup_director().await;
        let cue_id = seed_cue(&store, "Red", "#ff0000").await;

        command_tx
            .send(DirectorCommand::Activate { cue_id })
            .await
            .unwrap();
        state_rx.changed().await.unwrap();

        command_tx.send(DirectorCommand::Deactivate).await.unwrap();
        state_rx.changed().await.unwrap();
        assert_eq!(state_rx.borrow().active_cue_id, None);
    }

    #[tokio::test]
    async fn repeated_deactivate_is_silent() {
        let (store, command_tx, mut state_rx) = setup_director().await;
        let cue_id = seed_cue(&store, "Red", "#ff0000").await;

        command_tx
            .send(DirectorCommand::Activate { cue_id })
            .await
            .unwrap();
        state_rx.changed().await.unwrap();
        command_tx.send(DirectorCommand::Deactivate).await.unwrap();
        state_rx.changed().await.unwrap();

        command_tx.send(DirectorCommand::Deactivate).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(!state_rx.has_changed().unwrap());
        assert_eq!(state_rx.borrow().active_cue_id, None);
    }

    #[tokio::test]
    async fn unknown_cue_is_still_written() {
        let (_store, command_tx, mut state_rx) = setup_director().await;
        let cue_id = Uuid::new_v4();

        command_tx
            .send(DirectorCommand::Activate { cue_id })
            .await
            .unwrap();

        state_rx.changed().await.unwrap();
        assert_eq!(state_rx.borrow().active_cue_id, Some(cue_id));
    }

    #[tokio::test]
    async fn rapid_commands_settle_on_last_write() {
        let (store, command_tx, mut state_rx) = setup_director().await;
        let a = seed_cue(&store, "A", "#ff0000").await;
        let b = seed_cue(&store, "B", "#00ff00").await;

        command_tx
            .send(DirectorCommand::Activate { cue_id: a })
            .await
            .unwrap();
        command_tx
            .send(DirectorCommand::Activate { cue_id: b })
            .await
            .unwrap();

        let state = state_rx
            .wait_for(|state| state.active_cue_id == Some(b))
            .await
            .unwrap();
        assert_eq!(state.active_cue_id, Some(b));
    }
}
