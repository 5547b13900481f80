use serde::{Deserialize, Serialize};

use crate::model::cue::Cue;

pub mod cue;

/// The persisted cue collection. Order is insertion order and is what both
/// the admin table and the on-air button grid display.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CueSheet {
    pub cues: Vec<Cue>,
}
