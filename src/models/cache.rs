use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::odds::OddsEvent;
use crate::models::sport::Sport;

/// Player-prop cache lifetime
pub const PROPS_TTL_MINS: i64 = 15;

/// Game-odds cache lifetime
pub const GAMES_TTL_MINS: i64 = 10;

/// Live scoreboard snapshot lifetime
pub const LIVE_TTL_SECS: i64 = 30;

/// Cached player-prop odds, scoped by (sport, market)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropsCache {
    /// Sport the fetch was issued for
    pub sport: Sport,

    /// Gateway market key the fetch was issued for
    pub market: String,

    /// When the fetch resolved
    pub fetched_at: DateTime<Utc>,

    /// Whether the gateway hit its per-request event scan cap,
    /// meaning the sheet may be missing events
    #[serde(default)]
    pub truncated: bool,

    /// Events with the single requested prop market attached
    pub data: Vec<OddsEvent>,
}

impl PropsCache {
    /// A record is usable only when its scope matches the current
    /// selection exactly and it is younger than the TTL. A mismatch or
    /// an expired record reads the same as no record at all.
    pub fn fresh_for(&self, sport: Sport, market: &str, now: DateTime<Utc>) -> bool {
        self.sport == sport
            && self.market == market
            && now.signed_duration_since(self.fetched_at) < Duration::minutes(PROPS_TTL_MINS)
    }
}

/// Cached game odds, scoped by (sport, book)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GamesCache {
    /// Sport the fetch was issued for
    pub sport: Sport,

    /// Bookmaker preference at fetch time (empty = none)
    pub book: String,

    /// When the fetch resolved
    pub fetched_at: DateTime<Utc>,

    /// Events with h2h/totals/spreads markets attached
    pub data: Vec<OddsEvent>,
}

impl GamesCache {
    /// Same scoping rule as props, except an empty current preference
    /// accepts a record fetched under any book.
    pub fn fresh_for(&self, sport: Sport, preferred_book: &str, now: DateTime<Utc>) -> bool {
        self.sport == sport
            && (preferred_book.is_empty() || self.book == preferred_book)
            && now.signed_duration_since(self.fetched_at) < Duration::minutes(GAMES_TTL_MINS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props_at(sport: Sport, market: &str, fetched_at: DateTime<Utc>) -> PropsCache {
        PropsCache {
            sport,
            market: market.to_string(),
            fetched_at,
            truncated: false,
            data: Vec::new(),
        }
    }

    #[test]
    fn props_ttl_boundary() {
        let now = Utc::now();
        let fresh = props_at(Sport::Nba, "player_points", now - Duration::seconds(14 * 60 + 59));
        let stale = props_at(Sport::Nba, "player_points", now - Duration::seconds(15 * 60 + 1));

        assert!(fresh.fresh_for(Sport::Nba, "player_points", now));
        assert!(!stale.fresh_for(Sport::Nba, "player_points", now));
    }

    #[test]
    fn props_scope_mismatch_beats_recency() {
        let now = Utc::now();
        let cache = props_at(Sport::Nba, "player_points", now);

        assert!(!cache.fresh_for(Sport::Nfl, "player_points", now));
        assert!(!cache.fresh_for(Sport::Nba, "player_rebounds", now));
    }

    #[test]
    fn games_ttl_and_book_scoping() {
        let now = Utc::now();
        let cache = GamesCache {
            sport: Sport::Nhl,
            book: "fanduel".to_string(),
            fetched_at: now - Duration::minutes(9),
            data: Vec::new(),
        };

        assert!(cache.fresh_for(Sport::Nhl, "fanduel", now));
        // no current preference accepts any cached book
        assert!(cache.fresh_for(Sport::Nhl, "", now));
        assert!(!cache.fresh_for(Sport::Nhl, "draftkings", now));
        assert!(!cache.fresh_for(Sport::Nhl, "fanduel", now + Duration::minutes(2)));
    }
}
