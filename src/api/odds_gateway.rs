use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::{OddsEvent, Sport};

const REGIONS: &str = "us";
const ODDS_FORMAT: &str = "american";
const DATE_FORMAT: &str = "iso";
const GAME_MARKETS: &str = "h2h,totals,spreads";

/// The gateway aggregates per-event prop odds and stops scanning after
/// this many events per request, so a result of exactly this length may
/// be missing events.
pub const PROPS_SCAN_CAP: usize = 20;

/// Errors surfaced by odds loads; none of these are fatal to the core
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("odds gateway URL is not configured")]
    NotConfigured,

    #[error("odds gateway error: HTTP {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("odds gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("odds gateway returned an unreadable payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Client for the odds forwarding gateway. The base URL lives in user
/// state rather than the client so it can change at runtime.
pub struct OddsGatewayClient {
    client: Client,
}

impl OddsGatewayClient {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetch game odds (h2h/totals/spreads) for a sport
    pub async fn fetch_game_odds(
        &self,
        base_url: &str,
        sport: Sport,
        preferred_book: &str,
    ) -> Result<Vec<OddsEvent>, GatewayError> {
        let base = normalize_base(base_url)?;
        let mut url = format!(
            "{}/odds?sport={}&markets={}&regions={}&oddsFormat={}&dateFormat={}",
            base,
            sport.odds_key(),
            GAME_MARKETS,
            REGIONS,
            ODDS_FORMAT,
            DATE_FORMAT
        );
        push_book(&mut url, preferred_book);

        self.fetch_events(&url).await
    }

    /// Fetch player-prop odds for one market of a sport
    pub async fn fetch_prop_odds(
        &self,
        base_url: &str,
        sport: Sport,
        market: &str,
        preferred_book: &str,
    ) -> Result<Vec<OddsEvent>, GatewayError> {
        let base = normalize_base(base_url)?;
        let mut url = format!(
            "{}/props?sport={}&market={}&regions={}&oddsFormat={}&dateFormat={}",
            base,
            sport.odds_key(),
            urlencoding::encode(market),
            REGIONS,
            ODDS_FORMAT,
            DATE_FORMAT
        );
        push_book(&mut url, preferred_book);

        self.fetch_events(&url).await
    }

    async fn fetch_events(&self, url: &str) -> Result<Vec<OddsEvent>, GatewayError> {
        debug!("Fetching odds from: {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message: clip_message(&text),
            });
        }

        let value: Value = serde_json::from_str(&text)?;
        Ok(unwrap_envelope(value)?)
    }
}

/// A missing gateway URL short-circuits before any network call
fn normalize_base(base_url: &str) -> Result<String, GatewayError> {
    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(GatewayError::NotConfigured);
    }
    Ok(base.to_string())
}

fn push_book(url: &mut String, preferred_book: &str) {
    if !preferred_book.is_empty() {
        url.push_str("&bookmakers=");
        url.push_str(&urlencoding::encode(preferred_book));
    }
}

/// The gateway replies either with the upstream body directly or with a
/// {status, body} envelope; accept both. A null body reads as empty.
fn unwrap_envelope(value: Value) -> Result<Vec<OddsEvent>, serde_json::Error> {
    let body = match value {
        Value::Object(mut map) if map.contains_key("body") => {
            map.remove("body").unwrap_or(Value::Null)
        }
        other => other,
    };

    match body {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other),
    }
}

/// Keep upstream error bodies short enough for an inline error region
fn clip_message(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= 200 {
        trimmed.to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
