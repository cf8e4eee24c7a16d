use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::scoreboard::{parse_fighters, parse_players, parse_scoreboard};
use crate::api::{GatewayError, OddsGatewayClient, ScoreboardClient, PROPS_SCAN_CAP};
use crate::app::container::{
    Action, Dispatched, FetchScope, LiveSnapshot, StateContainer, StateError,
};
use crate::app::view::{self, RosterSource, ViewInputs, ViewModel};
use crate::config::Config;
use crate::db::StateStorage;
use crate::models::{AppState, GamesCache, PlayerEntry, PropsCache, Route, Sport};

/// Transient user-facing message. Queued by operations, drained by the
/// driver, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Refreshing,
    ScoresUpdated,
    /// Scoreboard fetch failed; cached scores stay up
    LiveFeedBlocked,
    OddsUpdated,
    LinesUpdated,
    PicksUpdated,
    PlayerTracked(String),
    EntryRemoved,
    GatewaySaved,
    GatewayCleared,
    BackupImported,
    StateReset,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Refreshing => f.write_str("Refreshing scores"),
            Notice::ScoresUpdated => f.write_str("Scores updated"),
            Notice::LiveFeedBlocked => f.write_str("Live feed blocked. Using cached scores."),
            Notice::OddsUpdated => f.write_str("Odds updated"),
            Notice::LinesUpdated => f.write_str("Lines updated"),
            Notice::PicksUpdated => f.write_str("Picks ready"),
            Notice::PlayerTracked(name) => write!(f, "Tracking {}", name),
            Notice::EntryRemoved => f.write_str("Removed"),
            Notice::GatewaySaved => f.write_str("Gateway saved"),
            Notice::GatewayCleared => f.write_str("Gateway cleared"),
            Notice::BackupImported => f.write_str("Backup imported"),
            Notice::StateReset => f.write_str("Reset done"),
        }
    }
}

/// Drives the state container against both external feeds: best-effort
/// scoreboard refreshes, user-triggered odds loads, roster resolution
/// and view derivation.
pub struct Session {
    container: StateContainer,
    scoreboard: ScoreboardClient,
    gateway: OddsGatewayClient,
    notices: Vec<Notice>,
    games_error: Option<String>,
    props_error: Option<String>,
}

impl Session {
    /// Boot the container from storage and wire up both API clients
    pub async fn new(config: &Config, storage: Arc<dyn StateStorage>) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let scoreboard = ScoreboardClient::new(&config.scoreboard_base_url, timeout)?;
        let gateway = OddsGatewayClient::new(timeout)?;

        let mut container = StateContainer::boot(storage).await;

        // Seed the gateway URL from the environment when state has none yet
        if container.state().gateway_url.is_empty() {
            if let Some(url) = &config.odds_gateway_url {
                container
                    .dispatch(Action::SetGatewayUrl(url.clone()))
                    .await?;
                info!("Odds gateway URL seeded from environment");
            }
        }

        Ok(Self {
            container,
            scoreboard,
            gateway,
            notices: Vec::new(),
            games_error: None,
            props_error: None,
        })
    }

    pub fn state(&self) -> &AppState {
        self.container.state()
    }

    pub fn revision(&self) -> u64 {
        self.container.revision()
    }

    pub fn games_error(&self) -> Option<&str> {
        self.games_error.as_deref()
    }

    pub fn props_error(&self) -> Option<&str> {
        self.props_error.as_deref()
    }

    /// Forward an action to the container unchanged
    pub async fn dispatch(&mut self, action: Action) -> Result<Dispatched, StateError> {
        self.container.dispatch(action).await
    }

    /// Drain queued notices in arrival order
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Best-effort scoreboard refresh. Skips the fetch while the current
    /// snapshot is fresh (unless forced); a failed fetch keeps the
    /// snapshot and `last_updated_at` untouched and queues one notice.
    pub async fn refresh_live(&mut self, force: bool) {
        let sport = self.container.state().sport;
        let now = Utc::now();

        if !force {
            if let Some(snapshot) = self.container.live() {
                if snapshot.fresh_enough(sport, now) {
                    debug!("Live snapshot for {} is fresh, skipping fetch", sport);
                    return;
                }
            }
        }

        self.push_notice(Notice::Refreshing);
        let token = self.container.begin_fetch(FetchScope::Live);

        match self.scoreboard.get_scoreboard(sport).await {
            Ok(payload) => {
                let events = parse_scoreboard(&payload);
                info!("Scoreboard returned {} events for {}", events.len(), sport);
                let snapshot = LiveSnapshot {
                    sport,
                    payload,
                    events,
                    fetched_at: Utc::now(),
                };
                if let Ok(Dispatched::Applied) = self
                    .container
                    .dispatch(Action::ApplyScoreboard { token, snapshot })
                    .await
                {
                    self.push_notice(Notice::ScoresUpdated);
                }
            }
            Err(e) => {
                warn!("Scoreboard fetch failed for {}: {}", sport, e);
                self.push_notice(Notice::LiveFeedBlocked);
            }
        }
    }

    /// Switch sport, then refresh the scoreboard for it
    pub async fn set_sport(&mut self, sport: Sport) -> Result<(), StateError> {
        self.container.dispatch(Action::SetSport(sport)).await?;
        self.refresh_live(false).await;
        Ok(())
    }

    /// User-triggered game odds load. Errors land in the inline error
    /// region for the games card; the cache is only written on success.
    pub async fn load_game_odds(&mut self) -> Result<(), GatewayError> {
        self.games_error = None;

        let sport = self.container.state().sport;
        let book = self.container.state().preferred_book.clone();
        let base = self.container.state().gateway_url.clone();
        let token = self.container.begin_fetch(FetchScope::Games);

        match self.gateway.fetch_game_odds(&base, sport, &book).await {
            Ok(events) => {
                let cache = GamesCache {
                    sport,
                    book,
                    fetched_at: Utc::now(),
                    data: events,
                };
                if let Ok(Dispatched::Applied) = self
                    .container
                    .dispatch(Action::ApplyGameOdds { token, cache })
                    .await
                {
                    self.push_notice(Notice::OddsUpdated);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Game odds load failed: {}", e);
                self.games_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// User-triggered prop odds load for the current sport's market
    pub async fn load_prop_odds(&mut self) -> Result<(), GatewayError> {
        self.props_error = None;

        let sport = self.container.state().sport;
        let market = self.container.state().odds_market();
        let book = self.container.state().preferred_book.clone();
        let base = self.container.state().gateway_url.clone();
        let token = self.container.begin_fetch(FetchScope::Props);

        match self
            .gateway
            .fetch_prop_odds(&base, sport, &market, &book)
            .await
        {
            Ok(events) => {
                let truncated = events.len() >= PROPS_SCAN_CAP;
                let cache = PropsCache {
                    sport,
                    market,
                    fetched_at: Utc::now(),
                    truncated,
                    data: events,
                };
                if let Ok(Dispatched::Applied) = self
                    .container
                    .dispatch(Action::ApplyPropOdds { token, cache })
                    .await
                {
                    self.push_notice(Notice::LinesUpdated);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Prop odds load failed: {}", e);
                self.props_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn track_player(&mut self, name: &str) -> Result<(), StateError> {
        self.container
            .dispatch(Action::Track {
                name: name.to_string(),
            })
            .await?;
        self.push_notice(Notice::PlayerTracked(name.trim().to_string()));
        Ok(())
    }

    pub async fn untrack(&mut self, id: u64) -> Result<(), StateError> {
        self.container.dispatch(Action::Untrack { id }).await?;
        self.push_notice(Notice::EntryRemoved);
        Ok(())
    }

    pub async fn set_gateway_url(&mut self, url: &str) -> Result<(), StateError> {
        let trimmed = url.trim().to_string();
        let cleared = trimmed.is_empty();
        self.container
            .dispatch(Action::SetGatewayUrl(trimmed))
            .await?;
        self.push_notice(if cleared {
            Notice::GatewayCleared
        } else {
            Notice::GatewaySaved
        });
        Ok(())
    }

    pub async fn regenerate_picks(&mut self) -> Result<(), StateError> {
        self.container.dispatch(Action::RegeneratePicks).await?;
        self.push_notice(Notice::PicksUpdated);
        Ok(())
    }

    /// Serialize the current state for the backup surface
    pub fn export_backup(&self) -> serde_json::Result<String> {
        self.container.export_backup()
    }

    /// Replace state with an imported blob merged onto defaults.
    /// Malformed input is rejected and surfaced to the caller.
    pub async fn import_backup(&mut self, raw: &str) -> Result<(), StateError> {
        self.container
            .dispatch(Action::ImportBackup {
                raw: raw.to_string(),
            })
            .await?;
        self.push_notice(Notice::BackupImported);
        Ok(())
    }

    pub async fn reset(&mut self) -> Result<(), StateError> {
        self.container.dispatch(Action::Reset).await?;
        self.push_notice(Notice::StateReset);
        Ok(())
    }

    /// Derive the current route's view-model, resolving the Players
    /// roster first when that route is active
    pub async fn view(&self) -> ViewModel {
        let (roster, roster_source) = self.resolve_roster().await;

        let inputs = ViewInputs {
            state: self.container.state(),
            live: self.container.live(),
            now: Utc::now(),
            games_error: self.games_error.as_deref(),
            props_error: self.props_error.as_deref(),
            roster: &roster,
            roster_source,
        };
        view::derive(&inputs)
    }

    /// Players-view roster: the selected event's boxscore where the
    /// sport has one, fighters off the live card for fight sports, demo
    /// names otherwise. Fetch failures degrade to the demo roster.
    async fn resolve_roster(&self) -> (Vec<PlayerEntry>, RosterSource) {
        let state = self.container.state();
        if state.route != Route::Players {
            return (Vec::new(), RosterSource::Demo);
        }
        let sport = state.sport;

        if !sport.has_boxscore() {
            let fighters = self
                .container
                .live()
                .filter(|snapshot| snapshot.sport == sport)
                .map(|snapshot| parse_fighters(&snapshot.payload))
                .unwrap_or_default();
            if !fighters.is_empty() {
                return (fighters, RosterSource::FightCard);
            }
            return (demo_entries(sport), RosterSource::Demo);
        }

        if let Some(event_id) = state.selected_event_id.clone() {
            match self.scoreboard.get_summary(sport, &event_id).await {
                Ok(summary) => {
                    let players = parse_players(&summary);
                    if !players.is_empty() {
                        return (players, RosterSource::Boxscore);
                    }
                }
                Err(e) => warn!("Summary fetch failed for event {}: {}", event_id, e),
            }
        }

        (demo_entries(sport), RosterSource::Demo)
    }

    fn push_notice(&mut self, notice: Notice) {
        debug!("notice: {}", notice);
        self.notices.push(notice);
    }
}

fn demo_entries(sport: Sport) -> Vec<PlayerEntry> {
    sport
        .demo_roster()
        .iter()
        .map(|name| PlayerEntry {
            name: name.to_string(),
            team: String::new(),
        })
        .collect()
}
