use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    event::StoreEvent,
    model::cue::Cue,
    store::CueStore,
    sync::{Subscription, SyncChannel},
};

/// What an audience display should show. Exactly one of three shapes: the
/// waiting screen, or the active cue rendered by its payload kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Waiting,
    Active(Cue),
}

/// Total derivation of the display from the live reference and the locally
/// known cue set. An unknown reference (e.g. a cue deleted while active)
/// degrades to the waiting display instead of erroring.
pub fn derive_display(active_cue_id: Option<Uuid>, cues: &[Cue]) -> DisplayState {
    match active_cue_id {
        None => DisplayState::Waiting,
        Some(id) => match cues.iter().find(|c| c.id.eq(&id)) {
            Some(cue) => DisplayState::Active(cue.clone()),
            None => DisplayState::Waiting,
        },
    }
}

/// One audience display. Fetches an initial snapshot (cue list + live state),
/// then folds live-state notifications and store change events into a watch
/// channel of [`DisplayState`].
pub struct ViewerClient {
    display_rx: watch::Receiver<DisplayState>,
    subscription: Subscription,
    task: JoinHandle<()>,
}

impl ViewerClient {
    pub async fn connect(cue_store: CueStore, sync: SyncChannel) -> Self {
        // Store events are not replayed, so the stream must be open before
        // the cue-list snapshot is taken; a mutation landing in between is
        // then seen twice (snapshot and event), which the reconcile loop
        // applies idempotently. The sync subscription is the opposite case:
        // it delivers the current value on subscribe, so it may safely start
        // after the snapshot.
        let store_events = cue_store.events();
        let cues = cue_store.list_cues().await;

        let active = sync.snapshot().active_cue_id;
        let (display_tx, display_rx) = watch::channel(derive_display(active, &cues));

        let (notify_tx, notify_rx) = mpsc::unbounded_channel::<Option<Uuid>>();
        let subscription = sync.subscribe(move |id| {
            let _ = notify_tx.send(id);
        });

        let task = tokio::spawn(reconcile(
            cue_store, cues, active, notify_rx, store_events, display_tx,
        ));

        Self {
            display_rx,
            subscription,
            task,
        }
    }

    pub fn display(&self) -> DisplayState {
        self.display_rx.borrow().clone()
    }

    pub fn display_rx(&self) -> watch::Receiver<DisplayState> {
        self.display_rx.clone()
    }

    pub async fn close(self) {
        self.subscription.close().await;
        self.task.abort();
        let _ = self.task.await;
    }
}

async fn reconcile(
    cue_store: CueStore,
    mut cues: Vec<Cue>,
    mut active: Option<Uuid>,
    mut notify_rx: mpsc::UnboundedReceiver<Option<Uuid>>,
    mut store_events: broadcast::Receiver<StoreEvent>,
    display_tx: watch::Sender<DisplayState>,
) {
    loop {
        tokio::select! {
            notified = notify_rx.recv() => match notified {
                Some(id) => active = id,
                None => break,
            },
            event = store_events.recv() => match event {
                // Upsert rather than blind push: a cue created between the
                // event subscription and the list snapshot arrives both ways.
                Ok(StoreEvent::CueAdded { cue }) | Ok(StoreEvent::CueUpdated { cue }) => {
                    if let Some(known) = cues.iter_mut().find(|c| c.id.eq(&cue.id)) {
                        *known = cue;
                    } else {
                        cues.push(cue);
                    }
                }
                Ok(StoreEvent::CueRemoved { cue_id }) => cues.retain(|c| c.id.ne(&cue_id)),
                // A replaced sheet or a lagged event stream invalidates the
                // local cache; refetch instead of patching.
                Ok(StoreEvent::SheetLoaded) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    cues = cue_store.list_cues().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }

        let next = derive_display(active, &cues);
        display_tx.send_if_modified(|display| {
            if *display == next {
                return false;
            }
            *display = next;
            true
        });
    }
    log::debug!("Viewer reconciliation task finished.");
}
