use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{NormalizedEvent, PlayerEntry, Sport, TeamScore};

/// Client for the public scoreboard/summary provider
pub struct ScoreboardClient {
    client: Client,
    base_url: String,
}

impl ScoreboardClient {
    /// Create a new client. Every call is bounded by `timeout`; on
    /// expiry the call fails and any cached data stays untouched.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build scoreboard HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the scoreboard for a sport
    pub async fn get_scoreboard(&self, sport: Sport) -> Result<ScoreboardPayload> {
        let url = format!("{}/{}/scoreboard", self.base_url, sport.provider_path());
        debug!("Fetching scoreboard from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to fetch scoreboard")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Scoreboard API error: {} - {}", status, text);
        }

        response
            .json()
            .await
            .context("Failed to parse scoreboard payload")
    }

    /// Fetch the boxscore summary for one event
    pub async fn get_summary(&self, sport: Sport, event_id: &str) -> Result<SummaryPayload> {
        let url = format!(
            "{}/{}/summary?event={}",
            self.base_url,
            sport.provider_path(),
            urlencoding::encode(event_id)
        );
        debug!("Fetching summary from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to fetch event summary")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Summary API error: {} - {}", status, text);
        }

        response
            .json()
            .await
            .context("Failed to parse summary payload")
    }
}

/// Scoreboard response (only the fields the normalizers read)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreboardPayload {
    #[serde(default)]
    pub events: Vec<EventPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<StatusPayload>,
    #[serde(default)]
    pub competitions: Vec<CompetitionPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionPayload {
    #[serde(default)]
    pub competitors: Vec<CompetitorPayload>,
    #[serde(default)]
    pub status: Option<StatusPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorPayload {
    /// "home" or "away"; absent on some feeds, in which case the
    /// normalizer falls back to positional order
    #[serde(default)]
    pub home_away: Option<String>,
    /// String on most feeds, number on some; coerced during normalization
    #[serde(default)]
    pub score: Value,
    #[serde(default)]
    pub team: Option<TeamPayload>,
    #[serde(default)]
    pub athlete: Option<AthletePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(default, rename = "type")]
    pub status_type: Option<StatusTypePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTypePayload {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub short_detail: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPayload {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub short_display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthletePayload {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Summary response; only the boxscore roster is read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryPayload {
    #[serde(default)]
    pub boxscore: Option<BoxscorePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoxscorePayload {
    #[serde(default)]
    pub players: Vec<TeamPlayersPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamPlayersPayload {
    #[serde(default)]
    pub team: Option<TeamPayload>,
    #[serde(default)]
    pub statistics: Vec<StatGroupPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatGroupPayload {
    #[serde(default)]
    pub athletes: Vec<AthleteRowPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthleteRowPayload {
    #[serde(default)]
    pub athlete: Option<AthletePayload>,
}

/// Normalize a scoreboard payload into the internal event shape.
/// Home/away are selected by the explicit role marker, falling back to
/// positional order; the status on the competition wins over the one on
/// the event; scores coerce to 0 when missing or unreadable.
pub fn parse_scoreboard(payload: &ScoreboardPayload) -> Vec<NormalizedEvent> {
    payload
        .events
        .iter()
        .map(|ev| {
            let comp = ev.competitions.first();
            let competitors = comp.map(|c| c.competitors.as_slice()).unwrap_or(&[]);

            let home = competitors
                .iter()
                .find(|c| c.home_away.as_deref() == Some("home"))
                .or_else(|| competitors.first());
            let away = competitors
                .iter()
                .find(|c| c.home_away.as_deref() == Some("away"))
                .or_else(|| competitors.get(1));

            let status = comp
                .and_then(|c| c.status.as_ref())
                .and_then(|s| s.status_type.as_ref())
                .or_else(|| ev.status.as_ref().and_then(|s| s.status_type.as_ref()));

            NormalizedEvent {
                id: ev.id.clone(),
                name: ev
                    .name
                    .clone()
                    .or_else(|| ev.short_name.clone())
                    .unwrap_or_else(|| "Event".to_string()),
                date: ev.date.clone().unwrap_or_default(),
                phase: status.and_then(|s| s.state.clone()).unwrap_or_default(),
                detail: status.and_then(|s| s.detail.clone()).unwrap_or_default(),
                short_detail: status
                    .and_then(|s| s.short_detail.clone())
                    .unwrap_or_default(),
                completed: status.map(|s| s.completed).unwrap_or(false),
                home: convert_side(home),
                away: convert_side(away),
            }
        })
        .collect()
}

fn convert_side(competitor: Option<&CompetitorPayload>) -> TeamScore {
    let Some(c) = competitor else {
        return TeamScore::default();
    };
    let team = c.team.as_ref();

    TeamScore {
        name: team
            .and_then(|t| {
                t.display_name
                    .clone()
                    .or_else(|| t.short_display_name.clone())
                    .or_else(|| t.name.clone())
            })
            .unwrap_or_default(),
        abbr: team
            .and_then(|t| t.abbreviation.clone())
            .unwrap_or_default(),
        score: coerce_score(&c.score),
    }
}

fn coerce_score(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as i64).unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        _ => 0,
    }
}

/// Walk a boxscore payload (team -> stat group -> athlete) into a
/// de-duplicated roster. Entries with no display name are skipped;
/// de-dup key is the (name, team) pair.
pub fn parse_players(payload: &SummaryPayload) -> Vec<PlayerEntry> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();

    let blocks = payload
        .boxscore
        .as_ref()
        .map(|b| b.players.as_slice())
        .unwrap_or(&[]);

    for block in blocks {
        let team = block
            .team
            .as_ref()
            .and_then(|t| t.abbreviation.clone().or_else(|| t.display_name.clone()))
            .unwrap_or_default();

        for group in &block.statistics {
            for row in &group.athletes {
                let Some(name) = row.athlete.as_ref().and_then(|a| a.display_name.clone()) else {
                    continue;
                };
                if name.is_empty() || !seen.insert(format!("{}|{}", name, team)) {
                    continue;
                }
                out.push(PlayerEntry {
                    name,
                    team: team.clone(),
                });
            }
        }
    }

    out
}

/// Fight cards carry fighters as competitors directly on the scoreboard,
/// so the roster comes from there rather than a boxscore. De-dup by name.
pub fn parse_fighters(payload: &ScoreboardPayload) -> Vec<PlayerEntry> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for ev in &payload.events {
        for comp in &ev.competitions {
            for c in &comp.competitors {
                let name = c
                    .athlete
                    .as_ref()
                    .and_then(|a| a.display_name.clone())
                    .or_else(|| c.team.as_ref().and_then(|t| t.display_name.clone()));
                let Some(name) = name else {
                    continue;
                };
                if name.is_empty() || !seen.insert(name.clone()) {
                    continue;
                }
                out.push(PlayerEntry {
                    name,
                    team: "UFC".to_string(),
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scoreboard() -> ScoreboardPayload {
        let raw = r#"{
            "events": [{
                "id": "401585601",
                "name": "Dallas Mavericks at Boston Celtics",
                "shortName": "DAL @ BOS",
                "date": "2026-01-15T00:30Z",
                "competitions": [{
                    "competitors": [
                        {"homeAway": "home", "score": "102",
                         "team": {"displayName": "Boston Celtics", "abbreviation": "BOS"}},
                        {"homeAway": "away", "score": 96,
                         "team": {"displayName": "Dallas Mavericks", "abbreviation": "DAL"}}
                    ],
                    "status": {"type": {"state": "in", "detail": "End of 3rd Quarter",
                               "shortDetail": "End 3rd", "completed": false}}
                }]
            }]
        }"#;
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn scoreboard_normalizes_roles_and_scores() {
        let events = parse_scoreboard(&sample_scoreboard());
        assert_eq!(events.len(), 1);

        let ev = &events[0];
        assert_eq!(ev.id, "401585601");
        assert_eq!(ev.phase, "in");
        assert!(!ev.completed);
        assert!(ev.is_live());
        assert_eq!(ev.home.abbr, "BOS");
        assert_eq!(ev.home.score, 102);
        assert_eq!(ev.away.abbr, "DAL");
        assert_eq!(ev.away.score, 96);
    }

    #[test]
    fn missing_role_markers_fall_back_to_position() {
        let raw = r#"{
            "events": [{
                "id": "e1",
                "shortName": "A vs B",
                "competitions": [{
                    "competitors": [
                        {"team": {"displayName": "Alpha"}, "score": "1"},
                        {"team": {"displayName": "Beta"}}
                    ]
                }],
                "status": {"type": {"state": "pre", "detail": "Sat, 7:00 PM"}}
            }, {
                "id": "e2",
                "competitions": []
            }]
        }"#;
        let payload: ScoreboardPayload = serde_json::from_str(raw).unwrap();
        let events = parse_scoreboard(&payload);

        let ev = &events[0];
        assert_eq!(ev.name, "A vs B");
        assert_eq!(ev.home.name, "Alpha");
        assert_eq!(ev.away.name, "Beta");
        // event-level status applies when the competition has none
        assert_eq!(ev.phase, "pre");
        // absent score coerces to zero
        assert_eq!(ev.away.score, 0);

        // no name at all gets the placeholder
        assert_eq!(events[1].name, "Event");
    }

    #[test]
    fn unreadable_scores_coerce_to_zero() {
        assert_eq!(coerce_score(&serde_json::json!("102")), 102);
        assert_eq!(coerce_score(&serde_json::json!(96)), 96);
        assert_eq!(coerce_score(&serde_json::json!("n/a")), 0);
        assert_eq!(coerce_score(&serde_json::json!({"value": 3})), 0);
        assert_eq!(coerce_score(&Value::Null), 0);
    }

    #[test]
    fn summary_roster_dedups_by_name_and_team() {
        let raw = r#"{
            "boxscore": {
                "players": [{
                    "team": {"abbreviation": "BOS", "displayName": "Boston Celtics"},
                    "statistics": [
                        {"athletes": [
                            {"athlete": {"displayName": "Jayson Tatum"}},
                            {"athlete": {"displayName": "Derrick White"}},
                            {"athlete": {}}
                        ]},
                        {"athletes": [
                            {"athlete": {"displayName": "Jayson Tatum"}}
                        ]}
                    ]
                }]
            }
        }"#;
        let payload: SummaryPayload = serde_json::from_str(raw).unwrap();
        let players = parse_players(&payload);

        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Jayson Tatum");
        assert_eq!(players[0].team, "BOS");
    }

    #[test]
    fn fight_cards_list_each_fighter_once() {
        let raw = r#"{
            "events": [{
                "id": "600040925",
                "competitions": [
                    {"competitors": [
                        {"athlete": {"displayName": "Jon Jones"}},
                        {"athlete": {"displayName": "Tom Aspinall"}}
                    ]},
                    {"competitors": [
                        {"athlete": {"displayName": "Jon Jones"}},
                        {"team": {"displayName": "Alex Pereira"}}
                    ]}
                ]
            }]
        }"#;
        let payload: ScoreboardPayload = serde_json::from_str(raw).unwrap();
        let fighters = parse_fighters(&payload);

        let names: Vec<&str> = fighters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Jon Jones", "Tom Aspinall", "Alex Pereira"]);
        assert!(fighters.iter().all(|f| f.team == "UFC"));
    }
}
