use serde::{Deserialize, Serialize};

/// Normalized scoreboard event, derived deterministically from the provider payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedEvent {
    /// Provider event identifier
    pub id: String,

    /// Matchup name (e.g. "Lakers @ Celtics")
    pub name: String,

    /// Scheduled date string as reported by the provider
    pub date: String,

    /// Textual status: "pre" scheduled, "in" live, "post" finished;
    /// other provider values pass through unchanged
    pub phase: String,

    /// Long status detail (e.g. "End of 4th Quarter")
    pub detail: String,

    /// Short status detail (e.g. "Final")
    pub short_detail: String,

    /// Whether the event has completed
    pub completed: bool,

    /// Home side
    pub home: TeamScore,

    /// Away side
    pub away: TeamScore,
}

impl NormalizedEvent {
    pub fn is_live(&self) -> bool {
        self.phase == "in" && !self.completed
    }
}

/// One side of a normalized event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamScore {
    /// Team display name
    pub name: String,

    /// Team abbreviation (may be empty)
    pub abbr: String,

    /// Score, coerced to a number (0 when missing or invalid)
    pub score: i64,
}

/// Roster entry extracted from a summary/boxscore payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntry {
    /// Player display name
    pub name: String,

    /// Team label the player appeared under (may be empty)
    pub team: String,
}
