use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event as reported by the odds gateway. Field names follow the
/// upstream odds API, so no serde renames are needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OddsEvent {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub sport_key: String,

    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub home_team: String,

    #[serde(default)]
    pub away_team: String,

    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

impl OddsEvent {
    /// "Away @ Home" label used by the odds views
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

/// A bookmaker's offering within an event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Bookmaker {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub markets: Vec<OddsMarket>,
}

impl Bookmaker {
    /// Look up a market by gateway key (e.g. "h2h", "totals")
    pub fn market(&self, key: &str) -> Option<&OddsMarket> {
        self.markets.iter().find(|m| m.key == key)
    }
}

/// A priced market within a bookmaker's offering
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OddsMarket {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

/// A single priced outcome
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OddsOutcome {
    /// Outcome name; "Over"/"Under" for props and totals, team name for h2h
    #[serde(default)]
    pub name: String,

    /// Player name on prop outcomes
    #[serde(default)]
    pub description: Option<String>,

    /// Line the outcome is set against
    #[serde(default)]
    pub point: Option<f64>,

    /// American price
    #[serde(default)]
    pub price: Option<f64>,
}

/// Choose the bookmaker to read: the preferred key when it is present
/// among the event's bookmakers, otherwise the first one returned.
/// An empty preference means "no preference".
pub fn select_bookmaker<'a>(bookmakers: &'a [Bookmaker], preferred: &str) -> Option<&'a Bookmaker> {
    if bookmakers.is_empty() {
        return None;
    }
    if !preferred.is_empty() {
        if let Some(hit) = bookmakers.iter().find(|b| b.key == preferred) {
            return Some(hit);
        }
    }
    bookmakers.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(key: &str) -> Bookmaker {
        Bookmaker {
            key: key.to_string(),
            title: None,
            markets: Vec::new(),
        }
    }

    #[test]
    fn preferred_bookmaker_wins_when_present() {
        let books = vec![book("draftkings"), book("fanduel")];
        let chosen = select_bookmaker(&books, "fanduel").unwrap();
        assert_eq!(chosen.key, "fanduel");
    }

    #[test]
    fn missing_preference_falls_back_to_first() {
        let books = vec![book("draftkings"), book("fanduel")];
        assert_eq!(select_bookmaker(&books, "caesars").unwrap().key, "draftkings");
        assert_eq!(select_bookmaker(&books, "").unwrap().key, "draftkings");
        assert!(select_bookmaker(&[], "fanduel").is_none());
    }

    #[test]
    fn deserializes_sparse_upstream_payload() {
        let raw = r#"[{
            "id": "evt1",
            "sport_key": "basketball_nba",
            "home_team": "Boston Celtics",
            "away_team": "Dallas Mavericks",
            "bookmakers": [{
                "key": "fanduel",
                "markets": [{
                    "key": "player_points",
                    "outcomes": [
                        {"name": "Over", "description": "Jayson Tatum", "point": 27.5, "price": -112},
                        {"name": "Under", "description": "Jayson Tatum", "point": 27.5}
                    ]
                }]
            }]
        }]"#;

        let events: Vec<OddsEvent> = serde_json::from_str(raw).unwrap();
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.matchup(), "Dallas Mavericks @ Boston Celtics");
        assert!(ev.commence_time.is_none());

        let market = ev.bookmakers[0].market("player_points").unwrap();
        assert_eq!(market.outcomes[0].price, Some(-112.0));
        assert_eq!(market.outcomes[1].price, None);
        assert!(ev.bookmakers[0].market("h2h").is_none());
    }
}
