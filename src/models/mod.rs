pub mod cache;
pub mod event;
pub mod odds;
pub mod pick;
pub mod sport;
pub mod state;

pub use cache::{GamesCache, PropsCache, GAMES_TTL_MINS, LIVE_TTL_SECS, PROPS_TTL_MINS};
pub use event::{NormalizedEvent, PlayerEntry, TeamScore};
pub use odds::{select_bookmaker, Bookmaker, OddsEvent, OddsMarket, OddsOutcome};
pub use pick::Pick;
pub use sport::{Route, Sport, DEFAULT_BOOK, KNOWN_BOOKS};
pub use state::{AppState, Lean, TrackedEntry, TrackedPatch};
