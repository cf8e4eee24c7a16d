use serde::{Deserialize, Serialize};

use crate::models::sport::Sport;
use crate::models::state::Lean;

/// A generated confidence pick (heuristic, fully replaced on regeneration)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pick {
    /// Stable identifier within a generation batch
    pub id: String,

    /// Player the pick is about
    pub player: String,

    /// Stat market the pick targets
    pub market: String,

    /// Free-form line the pick is set against (may be empty)
    pub line: String,

    /// Directional intent
    pub lean: Lean,

    /// Sampled confidence, always within [0.55, 0.86]
    pub confidence: f64,

    /// Fixed rationale lines (a labeled stub, not per-player analysis)
    pub reasoning: Vec<String>,
}

impl Pick {
    /// Identifier format shared with the UI layer
    pub fn make_id(sport: Sport, player: &str, market: &str, index: usize) -> String {
        format!("{}-{}-{}-{}", sport, player, market, index)
    }
}
