use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::cache::{GamesCache, PropsCache};
use crate::models::pick::Pick;
use crate::models::sport::{Route, Sport, DEFAULT_BOOK};

/// The single persisted application state. Created at boot from
/// storage-or-defaults, mutated only through the state container,
/// reset only by an explicit reset action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppState {
    /// Currently selected league
    pub sport: Sport,

    /// Currently selected view
    pub route: Route,

    /// Odds gateway base URL; empty disables odds features
    pub gateway_url: String,

    /// Preferred bookmaker key; empty means "use first returned"
    pub preferred_book: String,

    /// Player-prop odds cache, scoped by (sport, market)
    pub props_cache: Option<PropsCache>,

    /// Game odds cache, scoped by (sport, book)
    pub games_cache: Option<GamesCache>,

    /// Last chosen prop market per sport, remembered across switches
    pub market_by_sport: HashMap<Sport, String>,

    /// Event pinned for the Players view
    pub selected_event_id: Option<String>,

    /// Watch-list entries across all sports, in insertion order
    pub tracked: Vec<TrackedEntry>,

    /// Generated picks per sport, replaced wholesale on regeneration
    pub picks_by_sport: HashMap<Sport, Vec<Pick>>,

    /// Timestamp of the last successful scoreboard fetch
    pub last_updated_at: Option<DateTime<Utc>>,

    /// Last watch-list id handed out; ids are stable across removals
    #[serde(default)]
    pub tracked_seq: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sport: Sport::Nba,
            route: Route::Live,
            gateway_url: String::new(),
            preferred_book: DEFAULT_BOOK.to_string(),
            props_cache: None,
            games_cache: None,
            market_by_sport: HashMap::new(),
            selected_event_id: None,
            tracked: Vec::new(),
            picks_by_sport: HashMap::new(),
            last_updated_at: None,
            tracked_seq: 0,
        }
    }
}

impl AppState {
    /// Decode a stored blob as the shallow merge of defaults with the
    /// stored top-level fields. Fields the blob predates keep their
    /// defaults; nested values are replaced wholesale, never deep-merged.
    pub fn from_blob(raw: &str) -> serde_json::Result<Self> {
        let stored: Value = serde_json::from_str(raw)?;
        let defaults = serde_json::to_value(Self::default())?;

        let merged = match (defaults, stored) {
            (Value::Object(mut base), Value::Object(overlay)) => {
                base.extend(overlay);
                Value::Object(base)
            }
            // a non-object blob cannot be merged; typed decode reports it
            (_, other) => other,
        };

        let mut state: Self = serde_json::from_value(merged)?;
        state.restore_tracked_ids();
        Ok(state)
    }

    /// Serialize the full state for persistence or backup export
    pub fn to_blob(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Gateway market key for the current sport: the remembered choice,
    /// else the sport's default
    pub fn odds_market(&self) -> String {
        self.market_by_sport
            .get(&self.sport)
            .filter(|m| !m.is_empty())
            .cloned()
            .unwrap_or_else(|| self.sport.default_odds_market().to_string())
    }

    /// Watch-list entries for one sport, relative order preserved
    pub fn tracked_for(&self, sport: Sport) -> Vec<&TrackedEntry> {
        self.tracked.iter().filter(|t| t.sport == sport).collect()
    }

    /// Picks for one sport (empty when never generated)
    pub fn picks_for(&self, sport: Sport) -> &[Pick] {
        self.picks_by_sport
            .get(&sport)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    /// Append a watch-list entry for the current sport. Duplicates are
    /// allowed; the new entry gets the sport's first stat market, an
    /// empty line and a MORE lean.
    pub fn track(&mut self, name: &str) -> u64 {
        self.tracked_seq += 1;
        let id = self.tracked_seq;
        self.tracked.push(TrackedEntry {
            id,
            sport: self.sport,
            name: name.trim().to_string(),
            market: self.sport.markets()[0].to_string(),
            line: String::new(),
            lean: Lean::More,
        });
        id
    }

    /// Remove a watch-list entry; `None` when the id is unknown
    pub fn untrack(&mut self, id: u64) -> Option<TrackedEntry> {
        let idx = self.tracked.iter().position(|t| t.id == id)?;
        Some(self.tracked.remove(idx))
    }

    /// Shallow-merge patch fields into an entry; `None` when the id is unknown
    pub fn edit_tracked(&mut self, id: u64, patch: TrackedPatch) -> Option<&TrackedEntry> {
        let entry = self.tracked.iter_mut().find(|t| t.id == id)?;
        entry.apply(patch);
        Some(entry)
    }

    /// Blobs written before ids existed carry entries with id 0; hand
    /// those fresh ids and keep the sequence ahead of every known id.
    fn restore_tracked_ids(&mut self) {
        let max_id = self.tracked.iter().map(|t| t.id).max().unwrap_or(0);
        let mut seq = self.tracked_seq.max(max_id);
        for entry in &mut self.tracked {
            if entry.id == 0 {
                seq += 1;
                entry.id = seq;
            }
        }
        self.tracked_seq = seq;
    }
}

/// A watch-list entry. Uniqueness of (sport, name, market) is not
/// enforced; duplicates are allowed by design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedEntry {
    /// Stable synthetic id assigned at creation, never reused
    #[serde(default)]
    pub id: u64,

    /// Sport the entry belongs to
    pub sport: Sport,

    /// Player name (provider-supplied or free text)
    pub name: String,

    /// Stat market from the sport's vocabulary
    pub market: String,

    /// Free-form line; may be empty or non-numeric
    pub line: String,

    /// Directional intent
    pub lean: Lean,
}

impl TrackedEntry {
    fn apply(&mut self, patch: TrackedPatch) {
        if let Some(market) = patch.market {
            self.market = market;
        }
        if let Some(line) = patch.line {
            self.line = line;
        }
        if let Some(lean) = patch.lean {
            self.lean = lean;
        }
    }
}

/// Field-level edit for a watch-list entry; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedPatch {
    pub market: Option<String>,
    pub line: Option<String>,
    pub lean: Option<Lean>,
}

/// Directional bet intent relative to a line
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Lean {
    #[default]
    More,
    Less,
}

impl Lean {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lean::More => "MORE",
            Lean::Less => "LESS",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MORE" => Some(Lean::More),
            "LESS" => Some(Lean::Less),
            _ => None,
        }
    }

    pub fn flip(&self) -> Self {
        match self {
            Lean::More => Lean::Less,
            Lean::Less => Lean::More,
        }
    }
}

impl fmt::Display for Lean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_blob_merges_onto_defaults() {
        let state = AppState::from_blob(r#"{"sport":"MLB"}"#).unwrap();
        let defaults = AppState::default();

        assert_eq!(state.sport, Sport::Mlb);
        assert_eq!(state.route, defaults.route);
        assert_eq!(state.preferred_book, defaults.preferred_book);
        assert_eq!(state.gateway_url, defaults.gateway_url);
        assert!(state.props_cache.is_none());
        assert!(state.tracked.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut state = AppState::default();
        state.sport = Sport::Nhl;
        state.route = Route::Players;
        state.gateway_url = "https://gw.example".to_string();
        state.track("Connor McDavid");
        state
            .market_by_sport
            .insert(Sport::Nhl, "player_goals".to_string());
        state.last_updated_at = Some(Utc::now());

        let blob = state.to_blob().unwrap();
        let loaded = AppState::from_blob(&blob).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn malformed_blobs_are_rejected() {
        assert!(AppState::from_blob("not json").is_err());
        assert!(AppState::from_blob("[1,2,3]").is_err());
        assert!(AppState::from_blob(r#"{"sport":"CRICKET"}"#).is_err());
    }

    #[test]
    fn entries_without_ids_are_backfilled() {
        let blob = r#"{
            "tracked": [
                {"sport":"NBA","name":"Jayson Tatum","market":"PTS","line":"27.5","lean":"MORE"},
                {"sport":"NBA","name":"Luka Dončić","market":"AST","line":"","lean":"LESS"}
            ]
        }"#;
        let state = AppState::from_blob(blob).unwrap();

        let ids: Vec<u64> = state.tracked.iter().map(|t| t.id).collect();
        assert!(ids.iter().all(|id| *id > 0));
        assert_ne!(ids[0], ids[1]);
        assert_eq!(state.tracked_seq, *ids.iter().max().unwrap());
    }

    #[test]
    fn track_uses_sport_defaults() {
        let mut state = AppState::default();
        state.sport = Sport::Nfl;
        let id = state.track("  Josh Allen ");

        let entry = state.tracked.last().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.name, "Josh Allen");
        assert_eq!(entry.market, "PASS_YDS");
        assert_eq!(entry.line, "");
        assert_eq!(entry.lean, Lean::More);
    }

    #[test]
    fn tracked_is_scoped_per_sport() {
        let mut state = AppState::default();
        state.track("Jayson Tatum");
        state.track("Nikola Jokić");
        state.sport = Sport::Nfl;

        assert!(state.tracked_for(Sport::Nfl).is_empty());
        assert_eq!(state.tracked_for(Sport::Nba).len(), 2);
        // switching sport filtered, never deleted
        assert_eq!(state.tracked.len(), 2);
    }

    #[test]
    fn edit_merges_only_given_fields() {
        let mut state = AppState::default();
        let id = state.track("Jayson Tatum");

        let patch = TrackedPatch {
            line: Some("27.5".to_string()),
            lean: Some(Lean::Less),
            ..Default::default()
        };
        state.edit_tracked(id, patch).unwrap();

        let entry = &state.tracked[0];
        assert_eq!(entry.market, "PTS");
        assert_eq!(entry.line, "27.5");
        assert_eq!(entry.lean, Lean::Less);

        assert!(state.edit_tracked(999, TrackedPatch::default()).is_none());
        assert!(state.untrack(999).is_none());
    }

    #[test]
    fn odds_market_prefers_remembered_choice() {
        let mut state = AppState::default();
        assert_eq!(state.odds_market(), "player_points");

        state
            .market_by_sport
            .insert(Sport::Nba, "player_threes".to_string());
        assert_eq!(state.odds_market(), "player_threes");

        // an empty remembered value falls back to the default
        state.market_by_sport.insert(Sport::Nba, String::new());
        assert_eq!(state.odds_market(), "player_points");
    }
}
