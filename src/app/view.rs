use chrono::{DateTime, Utc};

use crate::app::container::LiveSnapshot;
use crate::models::{
    select_bookmaker, AppState, GamesCache, NormalizedEvent, OddsMarket, Pick, PlayerEntry,
    PropsCache, Route, Sport, TrackedEntry, KNOWN_BOOKS,
};

/// Prop sheets are cut off after this many outcome rows
pub const PROP_ROW_CAP: usize = 120;

/// Inputs the derivation reads. Everything is borrowed; the produced
/// view-model owns its data and is recomputed from scratch each render.
pub struct ViewInputs<'a> {
    pub state: &'a AppState,
    pub live: Option<&'a LiveSnapshot>,
    pub now: DateTime<Utc>,
    pub games_error: Option<&'a str>,
    pub props_error: Option<&'a str>,
    pub roster: &'a [PlayerEntry],
    pub roster_source: RosterSource,
}

/// Where the Players-view roster came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSource {
    /// Boxscore summary of the selected event
    Boxscore,
    /// Fighters pulled off the live fight card
    FightCard,
    /// Static demo names
    Demo,
}

/// One render's worth of data for the current route
#[derive(Debug, Clone, PartialEq)]
pub enum ViewModel {
    Live(LiveView),
    Games(GamesView),
    Players(PlayersView),
    Picks(PicksView),
    Profile(ProfileView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveView {
    pub sport: Sport,
    /// Events currently in progress
    pub rows: Vec<NormalizedEvent>,
    /// All events on the snapshot, including scheduled and finished
    pub total_events: usize,
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GamesView {
    pub sport: Sport,
    pub events: Vec<NormalizedEvent>,
    pub odds: OddsCard<GameOddsSheet>,
    /// Inline error from the last failed odds load
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayersView {
    pub sport: Sport,
    /// Selector options for pinning an event
    pub events: Vec<NormalizedEvent>,
    pub selected_event_id: Option<String>,
    pub roster: Vec<PlayerEntry>,
    pub roster_source: RosterSource,
    /// Gateway market key currently chosen for this sport
    pub market: String,
    pub market_label: String,
    pub market_choices: &'static [(&'static str, &'static str)],
    pub odds: OddsCard<PropsSheet>,
    pub error: Option<String>,
    pub tracked: Vec<TrackedEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PicksView {
    pub sport: Sport,
    pub picks: Vec<Pick>,
    pub tracked_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub gateway_url: String,
    pub preferred_book: String,
    pub books: &'static [&'static str],
    pub tracked_total: usize,
}

/// Odds cards always land in one of three affordances. Stale and
/// mismatched caches render exactly like absent ones.
#[derive(Debug, Clone, PartialEq)]
pub enum OddsCard<T> {
    /// Gateway URL missing; loading is disabled
    NotConfigured,
    /// Nothing fresh for the current scope; user must load
    NothingLoaded,
    Loaded(T),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameOddsSheet {
    pub rows: Vec<GameOddsRow>,
    pub fetched_at: DateTime<Utc>,
}

/// One event's game odds from the chosen bookmaker. The three markets
/// default independently: a missing market is just an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOddsRow {
    pub matchup: String,
    pub commence_time: Option<DateTime<Utc>>,
    pub book: String,
    pub moneyline: Vec<PriceLine>,
    pub totals: Vec<PriceLine>,
    pub spreads: Vec<PriceLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLine {
    pub label: String,
    pub point: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropsSheet {
    pub market: String,
    pub market_label: String,
    pub rows: Vec<PropRow>,
    /// The gateway hit its scan cap; the sheet may be missing events
    pub truncated: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropRow {
    pub matchup: String,
    pub book: String,
    pub player: String,
    /// "Over"/"Under" wording from the outcome name
    pub side: String,
    pub point: Option<f64>,
    pub price: Option<f64>,
}

/// Derive the view-model for the current route. Pure: no fetching, no
/// mutation, freshness judged against the passed clock.
pub fn derive(inputs: &ViewInputs<'_>) -> ViewModel {
    match inputs.state.route {
        Route::Live => ViewModel::Live(derive_live(inputs)),
        Route::Games => ViewModel::Games(derive_games(inputs)),
        Route::Players => ViewModel::Players(derive_players(inputs)),
        Route::Picks => ViewModel::Picks(derive_picks(inputs)),
        Route::Profile => ViewModel::Profile(derive_profile(inputs)),
    }
}

fn snapshot_events(inputs: &ViewInputs<'_>) -> Vec<NormalizedEvent> {
    inputs
        .live
        .map(|snapshot| snapshot.events_for(inputs.state.sport).to_vec())
        .unwrap_or_default()
}

fn derive_live(inputs: &ViewInputs<'_>) -> LiveView {
    let events = snapshot_events(inputs);
    let rows = events.iter().filter(|ev| ev.is_live()).cloned().collect();

    LiveView {
        sport: inputs.state.sport,
        rows,
        total_events: events.len(),
        last_updated_at: inputs.state.last_updated_at,
    }
}

fn derive_games(inputs: &ViewInputs<'_>) -> GamesView {
    let state = inputs.state;

    let odds = if state.gateway_url.is_empty() {
        OddsCard::NotConfigured
    } else {
        match &state.games_cache {
            Some(cache) if cache.fresh_for(state.sport, &state.preferred_book, inputs.now) => {
                OddsCard::Loaded(GameOddsSheet {
                    rows: game_rows(cache, &state.preferred_book),
                    fetched_at: cache.fetched_at,
                })
            }
            _ => OddsCard::NothingLoaded,
        }
    };

    GamesView {
        sport: state.sport,
        events: snapshot_events(inputs),
        odds,
        error: inputs.games_error.map(|e| e.to_string()),
    }
}

fn derive_players(inputs: &ViewInputs<'_>) -> PlayersView {
    let state = inputs.state;
    let market = state.odds_market();

    let odds = if state.gateway_url.is_empty() {
        OddsCard::NotConfigured
    } else {
        match &state.props_cache {
            Some(cache) if cache.fresh_for(state.sport, &market, inputs.now) => {
                OddsCard::Loaded(PropsSheet {
                    market: cache.market.clone(),
                    market_label: state.sport.odds_market_label(&cache.market).to_string(),
                    rows: prop_rows(cache, &state.preferred_book),
                    truncated: cache.truncated,
                    fetched_at: cache.fetched_at,
                })
            }
            _ => OddsCard::NothingLoaded,
        }
    };

    PlayersView {
        sport: state.sport,
        events: snapshot_events(inputs),
        selected_event_id: state.selected_event_id.clone(),
        roster: inputs.roster.to_vec(),
        roster_source: inputs.roster_source,
        market_label: state.sport.odds_market_label(&market).to_string(),
        market,
        market_choices: state.sport.odds_markets(),
        odds,
        error: inputs.props_error.map(|e| e.to_string()),
        tracked: state
            .tracked_for(state.sport)
            .into_iter()
            .cloned()
            .collect(),
    }
}

fn derive_picks(inputs: &ViewInputs<'_>) -> PicksView {
    let state = inputs.state;

    PicksView {
        sport: state.sport,
        picks: state.picks_for(state.sport).to_vec(),
        tracked_count: state.tracked_for(state.sport).len(),
    }
}

fn derive_profile(inputs: &ViewInputs<'_>) -> ProfileView {
    let state = inputs.state;

    ProfileView {
        gateway_url: state.gateway_url.clone(),
        preferred_book: state.preferred_book.clone(),
        books: &KNOWN_BOOKS,
        tracked_total: state.tracked.len(),
    }
}

fn game_rows(cache: &GamesCache, preferred_book: &str) -> Vec<GameOddsRow> {
    cache
        .data
        .iter()
        .map(|ev| {
            let book = select_bookmaker(&ev.bookmakers, preferred_book);
            let (label, moneyline, totals, spreads) = match book {
                Some(b) => (
                    b.title.clone().unwrap_or_else(|| b.key.clone()),
                    price_lines(b.market("h2h")),
                    price_lines(b.market("totals")),
                    price_lines(b.market("spreads")),
                ),
                None => (String::new(), Vec::new(), Vec::new(), Vec::new()),
            };

            GameOddsRow {
                matchup: ev.matchup(),
                commence_time: ev.commence_time,
                book: label,
                moneyline,
                totals,
                spreads,
            }
        })
        .collect()
}

fn price_lines(market: Option<&OddsMarket>) -> Vec<PriceLine> {
    market
        .map(|m| {
            m.outcomes
                .iter()
                .map(|o| PriceLine {
                    label: o.name.clone(),
                    point: o.point,
                    price: o.price,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Flatten prop outcomes across events: chosen bookmaker, first market
/// only, capped at [`PROP_ROW_CAP`] rows.
fn prop_rows(cache: &PropsCache, preferred_book: &str) -> Vec<PropRow> {
    let mut rows = Vec::new();

    for ev in &cache.data {
        let Some(book) = select_bookmaker(&ev.bookmakers, preferred_book) else {
            continue;
        };
        let Some(market) = book.markets.first() else {
            continue;
        };

        for outcome in &market.outcomes {
            if rows.len() >= PROP_ROW_CAP {
                return rows;
            }
            rows.push(PropRow {
                matchup: ev.matchup(),
                book: book.title.clone().unwrap_or_else(|| book.key.clone()),
                player: outcome
                    .description
                    .clone()
                    .unwrap_or_else(|| outcome.name.clone()),
                side: outcome.name.clone(),
                point: outcome.point,
                price: outcome.price,
            });
        }
    }

    rows
}

/// American-odds display: signed integer, em dash when unpriced
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{:+}", p as i64),
        None => "—".to_string(),
    }
}
