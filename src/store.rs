use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::{
    event::StoreEvent,
    model::{
        CueSheet,
        cue::{Cue, CueDraft, CueError},
    },
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cue not found")]
    NotFound,
    #[error(transparent)]
    InvalidCue(#[from] CueError),
}

/// Shared handle to the cue sheet. Cheap to clone; all clones see the same
/// sheet. Mutations go through the CRUD methods, which broadcast a
/// [`StoreEvent`] and persist the sheet when a data path is configured.
#[derive(Clone)]
pub struct CueStore {
    sheet: Arc<RwLock<CueSheet>>,
    event_tx: broadcast::Sender<StoreEvent>,
    data_path: Option<PathBuf>,
}

impl CueStore {
    pub fn new(data_path: Option<PathBuf>) -> Self {
        let (event_tx, _) = broadcast::channel::<StoreEvent>(32);
        Self {
            sheet: Arc::new(RwLock::new(CueSheet::default())),
            event_tx,
            data_path,
        }
    }

    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, CueSheet> {
        self.sheet.read().await
    }

    async fn write_with<F, R>(&self, updater: F) -> R
    where
        F: FnOnce(&mut CueSheet) -> R,
    {
        let mut guard = self.sheet.write().await;
        updater(&mut guard)
    }

    pub async fn list_cues(&self) -> Vec<Cue> {
        self.read().await.cues.clone()
    }

    pub async fn get_cue(&self, cue_id: &Uuid) -> Option<Cue> {
        self.read()
            .await
            .cues
            .iter()
            .find(|c| c.id.eq(cue_id))
            .cloned()
    }

    pub async fn create_cue(&self, draft: CueDraft) -> Result<Cue, StoreError> {
        let (name, payload) = draft.into_parts()?;
        let cue = Cue {
            id: Uuid::new_v4(),
            name,
            payload,
        };

        self.write_with(|sheet| sheet.cues.push(cue.clone())).await;

        self.persist().await;
        self.notify(StoreEvent::CueAdded { cue: cue.clone() });
        Ok(cue)
    }

    pub async fn update_cue(&self, cue_id: Uuid, draft: CueDraft) -> Result<Cue, StoreError> {
        let (name, payload) = draft.into_parts()?;

        let updated = self
            .write_with(|sheet| {
                let target = sheet.cues.iter_mut().find(|c| c.id.eq(&cue_id))?;
                target.name = name;
                target.payload = payload;
                Some(target.clone())
            })
            .await
            .ok_or(StoreError::NotFound)?;

        self.persist().await;
        self.notify(StoreEvent::CueUpdated {
            cue: updated.clone(),
        });
        Ok(updated)
    }

    /// Removes the cue. Deliberately does not touch the live state: a deleted
    /// cue that is still active is resolved on the viewer side, which degrades
    /// to the waiting display.
    pub async fn delete_cue(&self, cue_id: Uuid) -> Result<(), StoreError> {
        let removed = self
            .write_with(|sheet| {
                let before = sheet.cues.len();
                sheet.cues.retain(|c| c.id.ne(&cue_id));
                sheet.cues.len() < before
            })
            .await;

        if !removed {
            return Err(StoreError::NotFound);
        }

        self.persist().await;
        self.notify(StoreEvent::CueRemoved { cue_id });
        Ok(())
    }

    pub async fn load_from_file(&self, path: &Path) -> Result<(), anyhow::Error> {
        let content = tokio::fs::read_to_string(path).await?;

        let new_sheet: CueSheet =
            tokio::task::spawn_blocking(move || serde_json::from_str(&content)).await??;

        self.write_with(|sheet| {
            *sheet = new_sheet;
        })
        .await;

        self.notify(StoreEvent::SheetLoaded);
        log::info!("Cue sheet loaded from: {}", path.display());
        Ok(())
    }

    pub async fn save_to_file(&self, path: &Path) -> Result<(), anyhow::Error> {
        let sheet_clone = self.read().await.clone();

        let content =
            tokio::task::spawn_blocking(move || serde_json::to_string_pretty(&sheet_clone))
                .await??;

        tokio::fs::write(path, content).await?;
        log::info!("Cue sheet saved to: {}", path.display());
        Ok(())
    }

    /// Loads the configured data file if it exists. A missing file is a fresh
    /// install, not an error.
    pub async fn load_if_present(&self) -> Result<(), anyhow::Error> {
        let Some(path) = self.data_path.clone() else {
            return Ok(());
        };
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            self.load_from_file(&path).await?;
        }
        Ok(())
    }

    async fn persist(&self) {
        let Some(path) = self.data_path.clone() else {
            return;
        };
        // The in-memory mutation already happened; a failed save must not fail
        // the request, only get logged.
        if let Err(e) = self.save_to_file(&path).await {
            log::error!("Failed to persist cue sheet: {:?}", e);
        }
    }

    fn notify(&self, event: StoreEvent) {
        if self.event_tx.send(event).is_err() {
            log::trace!("No clients are listening to store events.");
        }
    }
}
