use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncBufReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prop_tracker::app::view::{
    format_price, GamesView, LiveView, OddsCard, PicksView, PlayersView, PriceLine, ProfileView,
    RosterSource,
};
use prop_tracker::app::{Action, Session, ViewModel};
use prop_tracker::config::Config;
use prop_tracker::db::SqliteStateStore;
use prop_tracker::models::{Lean, Route, Sport, TrackedPatch};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is the dashboard surface
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prop_tracker=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting prop-tracker");

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let store = Arc::new(SqliteStateStore::new(&config.database_url).await?);
    let mut session = Session::new(&config, store).await?;
    info!("Session ready");

    session.refresh_live(false).await;
    render(&mut session).await;

    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }
        if matches!(line, "quit" | "exit" | "q") {
            break;
        }

        if let Err(e) = run_command(&mut session, line).await {
            println!("error: {:#}", e);
        }
        render(&mut session).await;
        prompt();
    }

    info!("Shutting down prop-tracker");
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

async fn run_command(session: &mut Session, line: &str) -> Result<()> {
    let (cmd, rest) = match line.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "sport" => {
            let sport = Sport::from_key(rest).with_context(|| {
                format!("unknown sport '{}' (try nba, nfl, mlb, nhl, epl, ufc)", rest)
            })?;
            session.set_sport(sport).await?;
        }
        "tab" | "route" => {
            let route = Route::from_key(rest).with_context(|| {
                format!("unknown tab '{}' (try live, games, players, picks, profile)", rest)
            })?;
            session.dispatch(Action::SetRoute(route)).await?;
        }
        "refresh" => session.refresh_live(true).await,
        // Odds failures surface in the card's inline error region
        "odds" => {
            let _ = session.load_game_odds().await;
        }
        "lines" => {
            let _ = session.load_prop_odds().await;
        }
        "select" => {
            let selection = match rest {
                "" | "none" => None,
                id => Some(id.to_string()),
            };
            session.dispatch(Action::SelectEvent(selection)).await?;
        }
        "market" => {
            session
                .dispatch(Action::SetPropsMarket(rest.to_string()))
                .await?;
        }
        "book" => {
            session
                .dispatch(Action::SetPreferredBook(rest.to_string()))
                .await?;
        }
        "gateway" => {
            let url = if rest == "clear" { "" } else { rest };
            session.set_gateway_url(url).await?;
        }
        "track" => {
            if rest.is_empty() {
                anyhow::bail!("usage: track <player name>");
            }
            session.track_player(rest).await?;
        }
        "untrack" => {
            let id: u64 = rest.parse().context("usage: untrack <id>")?;
            session.untrack(id).await?;
        }
        "edit" => run_edit(session, rest).await?,
        "picks" => session.regenerate_picks().await?,
        "export" => println!("{}", session.export_backup()?),
        "import" => {
            let raw = std::fs::read_to_string(rest)
                .with_context(|| format!("cannot read backup file '{}'", rest))?;
            session.import_backup(&raw).await?;
        }
        "reset" => session.reset().await?,
        "help" => print_help(),
        other => anyhow::bail!("unknown command '{}' (try `help`)", other),
    }

    Ok(())
}

async fn run_edit(session: &mut Session, rest: &str) -> Result<()> {
    let mut parts = rest.splitn(3, ' ');
    let id: u64 = parts
        .next()
        .unwrap_or_default()
        .parse()
        .context("usage: edit <id> market|line|lean <value>")?;
    let field = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default().trim();

    let patch = match field {
        "market" => TrackedPatch {
            market: Some(value.to_string()),
            ..Default::default()
        },
        "line" => TrackedPatch {
            line: Some(value.to_string()),
            ..Default::default()
        },
        // `lean flip` toggles; an explicit MORE/LESS sets it directly
        "lean" if value.eq_ignore_ascii_case("flip") => {
            let current = session
                .state()
                .tracked
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.lean)
                .unwrap_or_default();
            TrackedPatch {
                lean: Some(current.flip()),
                ..Default::default()
            }
        }
        "lean" => {
            let lean = Lean::from_key(value)
                .with_context(|| format!("unknown lean '{}' (try MORE or LESS)", value))?;
            TrackedPatch {
                lean: Some(lean),
                ..Default::default()
            }
        }
        other => anyhow::bail!("unknown field '{}' (try market, line, lean)", other),
    };

    session.dispatch(Action::EditTracked { id, patch }).await?;
    Ok(())
}

async fn render(session: &mut Session) {
    for notice in session.take_notices() {
        println!("* {}", notice);
    }

    match session.view().await {
        ViewModel::Live(view) => render_live(&view),
        ViewModel::Games(view) => render_games(&view),
        ViewModel::Players(view) => render_players(&view),
        ViewModel::Picks(view) => render_picks(&view),
        ViewModel::Profile(view) => render_profile(&view),
    }
}

fn render_live(view: &LiveView) {
    println!("== Live [{}] ==", view.sport);
    if view.rows.is_empty() {
        println!("  no games in progress ({} on the board)", view.total_events);
    }
    for ev in &view.rows {
        println!(
            "  {} {:>3} @ {} {:>3}   {}",
            ev.away.abbr, ev.away.score, ev.home.abbr, ev.home.score, ev.detail
        );
    }
    if let Some(ts) = view.last_updated_at {
        println!("  updated {}", ts.format("%H:%M:%S"));
    }
}

fn render_games(view: &GamesView) {
    println!("== Games [{}] ==", view.sport);
    for ev in &view.events {
        println!("  {}  {}", ev.name, ev.short_detail);
    }
    if let Some(err) = &view.error {
        println!("  ! {}", err);
    }
    match &view.odds {
        OddsCard::NotConfigured => println!("  odds: set a gateway URL on the profile tab"),
        OddsCard::NothingLoaded => println!("  odds: nothing loaded, run `odds`"),
        OddsCard::Loaded(sheet) => {
            println!("  odds as of {}", sheet.fetched_at.format("%H:%M:%S"));
            for row in &sheet.rows {
                println!("  {}  [{}]", row.matchup, row.book);
                print_market("ml", &row.moneyline);
                print_market("total", &row.totals);
                print_market("spread", &row.spreads);
            }
        }
    }
}

fn print_market(tag: &str, lines: &[PriceLine]) {
    if lines.is_empty() {
        return;
    }
    let cells: Vec<String> = lines
        .iter()
        .map(|l| match l.point {
            Some(point) => format!("{} {} {}", l.label, point, format_price(l.price)),
            None => format!("{} {}", l.label, format_price(l.price)),
        })
        .collect();
    println!("    {:>6}  {}", tag, cells.join(" | "));
}

fn render_players(view: &PlayersView) {
    println!("== Players [{}] ==", view.sport);

    if !view.events.is_empty() {
        println!("  events (select <id> to pin one):");
        for ev in &view.events {
            let marker = if view.selected_event_id.as_deref() == Some(ev.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!("  {} {}  {}", marker, ev.id, ev.name);
        }
    }

    let source = match view.roster_source {
        RosterSource::Boxscore => "boxscore",
        RosterSource::FightCard => "fight card",
        RosterSource::Demo => "demo",
    };
    println!("  roster ({}):", source);
    for entry in &view.roster {
        if entry.team.is_empty() {
            println!("    {}", entry.name);
        } else {
            println!("    {}  [{}]", entry.name, entry.team);
        }
    }

    let choices: Vec<String> = view
        .market_choices
        .iter()
        .map(|(key, label)| format!("{} ({})", key, label))
        .collect();
    println!(
        "  market: {} | choices: {}",
        view.market_label,
        choices.join(", ")
    );

    if let Some(err) = &view.error {
        println!("  ! {}", err);
    }
    match &view.odds {
        OddsCard::NotConfigured => println!("  lines: set a gateway URL on the profile tab"),
        OddsCard::NothingLoaded => println!("  lines: nothing loaded, run `lines`"),
        OddsCard::Loaded(sheet) => {
            println!(
                "  {} lines as of {}{}",
                sheet.market_label,
                sheet.fetched_at.format("%H:%M:%S"),
                if sheet.truncated { " (truncated)" } else { "" }
            );
            for row in &sheet.rows {
                let point = row.point.map(|p| p.to_string()).unwrap_or_default();
                println!(
                    "    {:<24} {:>5} {:>6} {:>6}  {}",
                    row.player,
                    row.side,
                    point,
                    format_price(row.price),
                    row.matchup
                );
            }
        }
    }

    if !view.tracked.is_empty() {
        println!("  tracked:");
        for entry in &view.tracked {
            println!(
                "    #{} {}  {} {} {}",
                entry.id, entry.name, entry.market, entry.line, entry.lean
            );
        }
    }
}

fn render_picks(view: &PicksView) {
    println!("== Picks [{}] ==", view.sport);
    if view.picks.is_empty() {
        println!("  none yet, run `picks` ({} tracked)", view.tracked_count);
        return;
    }
    for pick in &view.picks {
        let target = if pick.line.is_empty() {
            pick.market.clone()
        } else {
            format!("{} {}", pick.market, pick.line)
        };
        println!(
            "  {} {} {}  {:.0}%",
            pick.player,
            pick.lean,
            target,
            pick.confidence * 100.0
        );
        for line in &pick.reasoning {
            println!("    - {}", line);
        }
    }
}

fn render_profile(view: &ProfileView) {
    println!("== Profile ==");
    if view.gateway_url.is_empty() {
        println!("  gateway: (not set)");
    } else {
        println!("  gateway: {}", view.gateway_url);
    }
    println!(
        "  book: {}  (known: {})",
        view.preferred_book,
        view.books.join(", ")
    );
    println!("  tracked entries: {}", view.tracked_total);
}

fn print_help() {
    println!("commands:");
    println!("  sport <nba|nfl|mlb|nhl|epl|ufc>   switch sport");
    println!("  tab <live|games|players|picks|profile>");
    println!("  refresh                           force a scoreboard refresh");
    println!("  odds                              load game odds for this sport");
    println!("  lines                             load prop lines for this sport");
    println!("  select <event-id|none>            pin an event for the roster");
    println!("  market <key>                      choose the prop market");
    println!("  book <name>                       preferred bookmaker");
    println!("  gateway <url|clear>               odds gateway URL");
    println!("  track <player name>               add a player to the watch-list");
    println!("  untrack <id>                      remove a watch-list entry");
    println!("  edit <id> market|line|lean <value>  (lean also takes `flip`)");
    println!("  picks                             regenerate picks for this sport");
    println!("  export                            print a state backup");
    println!("  import <file>                     restore from a backup file");
    println!("  reset                             wipe saved state");
    println!("  quit");
}
