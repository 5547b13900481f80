use uuid::Uuid;

use crate::model::cue::Cue;

/// Change notifications emitted by the cue store. Viewer clients fold these
/// into their local cue cache so a deleted cue degrades their display instead
/// of leaving a dangling reference on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    CueAdded { cue: Cue },
    CueUpdated { cue: Cue },
    CueRemoved { cue_id: Uuid },
    SheetLoaded,
}
