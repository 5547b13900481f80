use std::path::PathBuf;

use tokio::sync::{mpsc, watch};

use crate::{
    director::{Director, DirectorCommand, LiveState},
    store::CueStore,
    sync::SyncChannel,
};

pub mod apiserver;
pub mod config;
pub mod director;
pub mod error;
pub mod event;
pub mod model;
pub mod operator;
pub mod session;
pub mod store;
pub mod sync;
pub mod viewer;

pub struct BackendHandle {
    pub cue_store: CueStore,
    pub director_tx: mpsc::Sender<DirectorCommand>,
    pub sync: SyncChannel,
}

/// Boots the cue store and the director task and returns the handles the API
/// server and in-process clients hang off of.
pub async fn start_backend(data_path: Option<PathBuf>) -> Result<BackendHandle, anyhow::Error> {
    let cue_store = CueStore::new(data_path);
    cue_store.load_if_present().await?;

    let (director_tx, director_rx) = mpsc::channel::<DirectorCommand>(32);
    let (state_tx, state_rx) = watch::channel::<LiveState>(LiveState::default());

    let director = Director::new(cue_store.clone(), director_rx, state_tx);
    tokio::spawn(director.run());

    Ok(BackendHandle {
        cue_store,
        director_tx,
        sync: SyncChannel::new(state_rx),
    })
}
