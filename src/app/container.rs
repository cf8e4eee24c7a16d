use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::scoreboard::ScoreboardPayload;
use crate::app::picks;
use crate::db::StateStorage;
use crate::models::{
    AppState, GamesCache, NormalizedEvent, PropsCache, Route, Sport, TrackedPatch, LIVE_TTL_SECS,
};

/// Process-lifetime scoreboard snapshot; never persisted. The raw
/// payload is kept because fight cards derive their roster from it.
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    /// Sport the fetch was issued for
    pub sport: Sport,

    /// Raw provider payload
    pub payload: ScoreboardPayload,

    /// Normalized events from the payload
    pub events: Vec<NormalizedEvent>,

    /// When the fetch resolved
    pub fetched_at: DateTime<Utc>,
}

impl LiveSnapshot {
    /// A snapshot is only ever shown for the sport it was fetched for
    pub fn events_for(&self, sport: Sport) -> &[NormalizedEvent] {
        if self.sport == sport {
            &self.events
        } else {
            &[]
        }
    }

    /// Refetch guard: matching sport, younger than the TTL, and a
    /// non-empty event list. Empty results are refetched eagerly.
    pub fn fresh_enough(&self, sport: Sport, now: DateTime<Utc>) -> bool {
        self.sport == sport
            && now.signed_duration_since(self.fetched_at) < Duration::seconds(LIVE_TTL_SECS)
            && !self.events.is_empty()
    }
}

/// Cache scopes guarded by request tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    Live,
    Games,
    Props,
}

/// Monotonic per-scope counters. A fetch response is applied only when
/// it carries the latest token issued for its scope, so late responses
/// for an abandoned selection are dropped instead of winning the race.
#[derive(Debug, Clone, Default)]
struct FetchTokens {
    live: u64,
    games: u64,
    props: u64,
}

/// Every possible state mutation. User input and fetch completions both
/// arrive here; nothing mutates [`AppState`] any other way.
#[derive(Debug)]
pub enum Action {
    SetRoute(Route),
    SetSport(Sport),
    SetGatewayUrl(String),
    SetPreferredBook(String),
    /// Choose the prop market for the current sport
    SetPropsMarket(String),
    SelectEvent(Option<String>),
    Track { name: String },
    Untrack { id: u64 },
    EditTracked { id: u64, patch: TrackedPatch },
    RegeneratePicks,
    ApplyScoreboard { token: u64, snapshot: LiveSnapshot },
    ApplyGameOdds { token: u64, cache: GamesCache },
    ApplyPropOdds { token: u64, cache: PropsCache },
    ImportBackup { raw: String },
    Reset,
}

/// What a dispatch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// State was mutated and persisted
    Applied,
    /// The carried token was no longer the latest for its scope
    DiscardedStale,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("no tracked entry with id {0}")]
    UnknownTrackedId(u64),

    #[error("backup import failed: {0}")]
    BadImport(#[from] serde_json::Error),
}

/// Owns the one mutable [`AppState`] plus the non-persisted live
/// snapshot. All mutation goes through [`dispatch`](Self::dispatch),
/// which persists before the caller derives a view.
pub struct StateContainer {
    state: AppState,
    live: Option<LiveSnapshot>,
    tokens: FetchTokens,
    revision: u64,
    storage: Arc<dyn StateStorage>,
}

impl StateContainer {
    /// Load stored state and wrap it. Absence, unreadable blobs and
    /// storage failures all fall back to defaults; boot never errors.
    pub async fn boot(storage: Arc<dyn StateStorage>) -> Self {
        let state = match storage.load_blob().await {
            Ok(Some(blob)) => match AppState::from_blob(&blob) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Stored state was unreadable, starting from defaults: {}", e);
                    AppState::default()
                }
            },
            Ok(None) => AppState::default(),
            Err(e) => {
                warn!("Failed to read stored state, starting from defaults: {}", e);
                AppState::default()
            }
        };

        Self {
            state,
            live: None,
            tokens: FetchTokens::default(),
            revision: 0,
            storage,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn live(&self) -> Option<&LiveSnapshot> {
        self.live.as_ref()
    }

    /// Bumped on every applied dispatch; callers re-derive their view
    /// whenever it changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Serialize the current state for backup export
    pub fn export_backup(&self) -> serde_json::Result<String> {
        self.state.to_blob()
    }

    /// Issue the next request token for a scope. The fetch that took it
    /// must hand it back through the matching apply action.
    pub fn begin_fetch(&mut self, scope: FetchScope) -> u64 {
        let slot = match scope {
            FetchScope::Live => &mut self.tokens.live,
            FetchScope::Games => &mut self.tokens.games,
            FetchScope::Props => &mut self.tokens.props,
        };
        *slot += 1;
        *slot
    }

    /// Apply one action: mutate, persist, bump the revision. Stale fetch
    /// responses are discarded without touching state.
    pub async fn dispatch(&mut self, action: Action) -> Result<Dispatched, StateError> {
        match action {
            Action::SetRoute(route) => {
                self.state.route = route;
            }
            Action::SetSport(sport) => {
                // only an actual change invalidates; reselecting the
                // current sport keeps its caches
                if self.state.sport != sport {
                    self.state.sport = sport;
                    self.state.selected_event_id = None;
                    self.tokens.live += 1;
                    self.invalidate_games();
                    self.invalidate_props();
                }
            }
            Action::SetGatewayUrl(url) => {
                self.state.gateway_url = url.trim().to_string();
                self.invalidate_games();
                self.invalidate_props();
            }
            Action::SetPreferredBook(book) => {
                self.state.preferred_book = book.trim().to_string();
                self.invalidate_games();
            }
            Action::SetPropsMarket(market) => {
                self.state.market_by_sport.insert(self.state.sport, market);
                self.invalidate_props();
            }
            Action::SelectEvent(id) => {
                self.state.selected_event_id = id;
            }
            Action::Track { name } => {
                self.state.track(&name);
            }
            Action::Untrack { id } => {
                self.state
                    .untrack(id)
                    .ok_or(StateError::UnknownTrackedId(id))?;
            }
            Action::EditTracked { id, patch } => {
                self.state
                    .edit_tracked(id, patch)
                    .ok_or(StateError::UnknownTrackedId(id))?;
            }
            Action::RegeneratePicks => {
                let picks = picks::generate(&self.state, &mut rand::thread_rng());
                self.state.picks_by_sport.insert(self.state.sport, picks);
            }
            Action::ApplyScoreboard { token, snapshot } => {
                if token != self.tokens.live {
                    debug!("Discarding stale scoreboard response (token {})", token);
                    return Ok(Dispatched::DiscardedStale);
                }
                self.state.last_updated_at = Some(snapshot.fetched_at);
                self.live = Some(snapshot);
            }
            Action::ApplyGameOdds { token, cache } => {
                if token != self.tokens.games {
                    debug!("Discarding stale game odds response (token {})", token);
                    return Ok(Dispatched::DiscardedStale);
                }
                self.state.games_cache = Some(cache);
            }
            Action::ApplyPropOdds { token, cache } => {
                if token != self.tokens.props {
                    debug!("Discarding stale prop odds response (token {})", token);
                    return Ok(Dispatched::DiscardedStale);
                }
                self.state.props_cache = Some(cache);
            }
            Action::ImportBackup { raw } => {
                self.state = AppState::from_blob(&raw)?;
            }
            Action::Reset => {
                if let Err(e) = self.storage.clear().await {
                    error!("Failed to clear stored state: {}", e);
                }
                self.state = AppState::default();
                self.revision += 1;
                return Ok(Dispatched::Applied);
            }
        }

        self.persist().await;
        self.revision += 1;
        Ok(Dispatched::Applied)
    }

    /// Null the games cache and retire any in-flight games fetch
    fn invalidate_games(&mut self) {
        self.state.games_cache = None;
        self.tokens.games += 1;
    }

    /// Null the props cache and retire any in-flight props fetch
    fn invalidate_props(&mut self) {
        self.state.props_cache = None;
        self.tokens.props += 1;
    }

    /// Persist before render. A failed write keeps the mutation (no
    /// rollback) and is only logged.
    async fn persist(&self) {
        match self.state.to_blob() {
            Ok(blob) => {
                if let Err(e) = self.storage.save_blob(&blob).await {
                    error!("Failed to persist state: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize state: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStateStore;

    async fn container() -> (StateContainer, Arc<MemoryStateStore>) {
        let storage = Arc::new(MemoryStateStore::new());
        let container = StateContainer::boot(storage.clone()).await;
        (container, storage)
    }

    fn games_cache(sport: Sport) -> GamesCache {
        GamesCache {
            sport,
            book: "fanduel".to_string(),
            fetched_at: Utc::now(),
            data: Vec::new(),
        }
    }

    fn props_cache(sport: Sport, market: &str) -> PropsCache {
        PropsCache {
            sport,
            market: market.to_string(),
            fetched_at: Utc::now(),
            truncated: false,
            data: Vec::new(),
        }
    }

    async fn seed_odds_caches(container: &mut StateContainer) {
        let token = container.begin_fetch(FetchScope::Games);
        container
            .dispatch(Action::ApplyGameOdds {
                token,
                cache: games_cache(Sport::Nba),
            })
            .await
            .unwrap();

        let token = container.begin_fetch(FetchScope::Props);
        container
            .dispatch(Action::ApplyPropOdds {
                token,
                cache: props_cache(Sport::Nba, "player_points"),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn market_change_nulls_props_only() {
        let (mut container, _) = container().await;
        seed_odds_caches(&mut container).await;

        container
            .dispatch(Action::SetPropsMarket("player_threes".to_string()))
            .await
            .unwrap();

        assert!(container.state().props_cache.is_none());
        assert!(container.state().games_cache.is_some());
        assert_eq!(container.state().odds_market(), "player_threes");
    }

    #[tokio::test]
    async fn book_change_nulls_games_only() {
        let (mut container, _) = container().await;
        seed_odds_caches(&mut container).await;

        container
            .dispatch(Action::SetPreferredBook("betmgm".to_string()))
            .await
            .unwrap();

        assert!(container.state().games_cache.is_none());
        assert!(container.state().props_cache.is_some());
    }

    #[tokio::test]
    async fn sport_change_clears_selection_and_caches() {
        let (mut container, _) = container().await;
        seed_odds_caches(&mut container).await;
        container
            .dispatch(Action::SelectEvent(Some("401585601".to_string())))
            .await
            .unwrap();

        container.dispatch(Action::SetSport(Sport::Nfl)).await.unwrap();

        assert_eq!(container.state().sport, Sport::Nfl);
        assert!(container.state().selected_event_id.is_none());
        assert!(container.state().games_cache.is_none());
        assert!(container.state().props_cache.is_none());
    }

    #[tokio::test]
    async fn reselecting_current_sport_keeps_caches() {
        let (mut container, _) = container().await;
        seed_odds_caches(&mut container).await;

        container.dispatch(Action::SetSport(Sport::Nba)).await.unwrap();

        assert!(container.state().games_cache.is_some());
        assert!(container.state().props_cache.is_some());
    }

    #[tokio::test]
    async fn stale_fetch_responses_are_discarded() {
        let (mut container, _) = container().await;

        let stale = container.begin_fetch(FetchScope::Props);
        let latest = container.begin_fetch(FetchScope::Props);

        let outcome = container
            .dispatch(Action::ApplyPropOdds {
                token: stale,
                cache: props_cache(Sport::Nba, "player_points"),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Dispatched::DiscardedStale);
        assert!(container.state().props_cache.is_none());

        let outcome = container
            .dispatch(Action::ApplyPropOdds {
                token: latest,
                cache: props_cache(Sport::Nba, "player_points"),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Dispatched::Applied);
        assert!(container.state().props_cache.is_some());
    }

    #[tokio::test]
    async fn invalidation_retires_inflight_fetches() {
        let (mut container, _) = container().await;

        let token = container.begin_fetch(FetchScope::Props);
        container
            .dispatch(Action::SetPropsMarket("player_rebounds".to_string()))
            .await
            .unwrap();

        // the response for the old market arrives after the change
        let outcome = container
            .dispatch(Action::ApplyPropOdds {
                token,
                cache: props_cache(Sport::Nba, "player_points"),
            })
            .await
            .unwrap();

        assert_eq!(outcome, Dispatched::DiscardedStale);
        assert!(container.state().props_cache.is_none());
    }

    #[tokio::test]
    async fn mutations_persist_before_render() {
        let (mut container, storage) = container().await;

        container
            .dispatch(Action::Track {
                name: "Jayson Tatum".to_string(),
            })
            .await
            .unwrap();

        let blob = storage.load_blob().await.unwrap().unwrap();
        assert!(blob.contains("Jayson Tatum"));

        // a rebooted container sees exactly what was persisted
        let rebooted = StateContainer::boot(storage.clone()).await;
        assert_eq!(rebooted.state(), container.state());
    }

    #[tokio::test]
    async fn unknown_tracked_ids_are_rejected() {
        let (mut container, _) = container().await;

        let err = container
            .dispatch(Action::Untrack { id: 42 })
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::UnknownTrackedId(42)));

        let err = container
            .dispatch(Action::EditTracked {
                id: 42,
                patch: TrackedPatch::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::UnknownTrackedId(42)));
    }

    #[tokio::test]
    async fn import_replaces_state_and_bad_import_leaves_it() {
        let (mut container, _) = container().await;
        container
            .dispatch(Action::Track {
                name: "Jayson Tatum".to_string(),
            })
            .await
            .unwrap();

        container
            .dispatch(Action::ImportBackup {
                raw: r#"{"sport":"MLB"}"#.to_string(),
            })
            .await
            .unwrap();

        let defaults = AppState::default();
        assert_eq!(container.state().sport, Sport::Mlb);
        assert_eq!(container.state().preferred_book, defaults.preferred_book);
        assert!(container.state().tracked.is_empty());

        let before = container.state().clone();
        let err = container
            .dispatch(Action::ImportBackup {
                raw: "{broken".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::BadImport(_)));
        assert_eq!(container.state(), &before);
    }

    #[tokio::test]
    async fn reset_clears_storage_and_state() {
        let (mut container, storage) = container().await;
        container
            .dispatch(Action::Track {
                name: "Luka Dončić".to_string(),
            })
            .await
            .unwrap();

        container.dispatch(Action::Reset).await.unwrap();

        assert_eq!(container.state(), &AppState::default());
        assert!(storage.load_blob().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn boot_tolerates_garbage_blobs() {
        let storage = Arc::new(MemoryStateStore::new());
        storage.save_blob("definitely not json").await.unwrap();

        let container = StateContainer::boot(storage).await;
        assert_eq!(container.state(), &AppState::default());
    }
}
