use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported leagues (closed set)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sport {
    Nba,
    Nfl,
    Mlb,
    Nhl,
    Epl,
    Ufc,
}

impl Sport {
    /// All supported sports in display order
    pub const ALL: [Sport; 6] = [
        Sport::Nba,
        Sport::Nfl,
        Sport::Mlb,
        Sport::Nhl,
        Sport::Epl,
        Sport::Ufc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Nba => "NBA",
            Sport::Nfl => "NFL",
            Sport::Mlb => "MLB",
            Sport::Nhl => "NHL",
            Sport::Epl => "EPL",
            Sport::Ufc => "UFC",
        }
    }

    /// Parse a user-supplied sport key (case-insensitive)
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NBA" => Some(Sport::Nba),
            "NFL" => Some(Sport::Nfl),
            "MLB" => Some(Sport::Mlb),
            "NHL" => Some(Sport::Nhl),
            "EPL" => Some(Sport::Epl),
            "UFC" => Some(Sport::Ufc),
            _ => None,
        }
    }

    /// Scoreboard provider path segment for this sport
    pub fn provider_path(&self) -> &'static str {
        match self {
            Sport::Nba => "basketball/nba",
            Sport::Nfl => "football/nfl",
            Sport::Mlb => "baseball/mlb",
            Sport::Nhl => "hockey/nhl",
            Sport::Epl => "soccer/eng.1",
            Sport::Ufc => "mma/ufc",
        }
    }

    /// Sport key understood by the odds gateway
    pub fn odds_key(&self) -> &'static str {
        match self {
            Sport::Nba => "basketball_nba",
            Sport::Nfl => "americanfootball_nfl",
            Sport::Nhl => "icehockey_nhl",
            Sport::Mlb => "baseball_mlb",
            Sport::Epl => "soccer_epl",
            Sport::Ufc => "mma_mixed_martial_arts",
        }
    }

    /// Watch-list stat vocabulary; the first entry is the default market
    /// assigned to a newly tracked player
    pub fn markets(&self) -> &'static [&'static str] {
        match self {
            Sport::Nba => &["PTS", "REB", "AST", "PRA"],
            Sport::Nfl => &["PASS_YDS", "RUSH_YDS", "REC_YDS", "TD"],
            Sport::Mlb => &["H", "HR", "RBI", "SO"],
            Sport::Nhl => &["SOG", "PTS"],
            Sport::Epl => &["SHOTS", "SOG", "GOALS"],
            Sport::Ufc => &["KOs", "SUBS", "SIG_STR"],
        }
    }

    /// Prop odds markets offered for this sport as (gateway key, label) pairs
    pub fn odds_markets(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Sport::Nba => &[
                ("player_points", "Points"),
                ("player_rebounds", "Rebounds"),
                ("player_assists", "Assists"),
                ("player_threes", "3PT Made"),
                ("player_points_rebounds_assists", "PRA"),
            ],
            Sport::Nfl => &[
                ("player_pass_tds", "Pass TDs"),
                ("player_pass_yds", "Pass Yards"),
                ("player_rush_yds", "Rush Yards"),
                ("player_rec_yds", "Rec Yards"),
                ("player_receptions", "Receptions"),
            ],
            Sport::Nhl => &[
                ("player_points", "Points"),
                ("player_goals", "Goals"),
                ("player_assists", "Assists"),
                ("player_shots_on_goal", "Shots on Goal"),
            ],
            Sport::Mlb => &[
                ("batter_hits", "Hits"),
                ("batter_home_runs", "Home Runs"),
                ("batter_rbis", "RBIs"),
                ("pitcher_strikeouts", "Pitcher Ks"),
            ],
            Sport::Epl => &[
                ("player_goals", "Goals"),
                ("player_assists", "Assists"),
                ("player_shots_on_target", "Shots on Target"),
            ],
            Sport::Ufc => &[
                ("fighter_takedowns", "Takedowns"),
                ("fighter_sig_strikes", "Sig Strikes"),
            ],
        }
    }

    /// Default gateway market key for this sport
    pub fn default_odds_market(&self) -> &'static str {
        self.odds_markets()[0].0
    }

    /// Human label for a gateway market key, falling back to the key itself
    pub fn odds_market_label<'a>(&self, key: &'a str) -> &'a str {
        self.odds_markets()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| *label)
            .unwrap_or(key)
    }

    /// Well-known names used when the watch-list is empty
    pub fn demo_roster(&self) -> &'static [&'static str] {
        match self {
            Sport::Nba => &[
                "Luka Dončić",
                "Nikola Jokić",
                "Jayson Tatum",
                "Shai Gilgeous-Alexander",
                "Giannis Antetokounmpo",
            ],
            Sport::Nfl => &[
                "Patrick Mahomes",
                "Josh Allen",
                "Christian McCaffrey",
                "Tyreek Hill",
                "Justin Jefferson",
            ],
            Sport::Mlb => &[
                "Shohei Ohtani",
                "Aaron Judge",
                "Juan Soto",
                "Mookie Betts",
                "Ronald Acuña Jr.",
            ],
            Sport::Nhl => &[
                "Connor McDavid",
                "Auston Matthews",
                "Nathan MacKinnon",
                "David Pastrňák",
                "Cale Makar",
            ],
            Sport::Epl => &[
                "Erling Haaland",
                "Mohamed Salah",
                "Bukayo Saka",
                "Kevin De Bruyne",
                "Son Heung-min",
            ],
            Sport::Ufc => &[
                "Jon Jones",
                "Islam Makhachev",
                "Sean O'Malley",
                "Alex Pereira",
                "Leon Edwards",
            ],
        }
    }

    /// Whether the summary endpoint carries a boxscore roster for this sport
    pub fn has_boxscore(&self) -> bool {
        !matches!(self, Sport::Ufc)
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI views (pure presentation selector)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    #[default]
    Live,
    Games,
    Players,
    Picks,
    Profile,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Live => "live",
            Route::Games => "games",
            Route::Players => "players",
            Route::Picks => "picks",
            Route::Profile => "profile",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Some(Route::Live),
            "games" => Some(Route::Games),
            "players" => Some(Route::Players),
            "picks" => Some(Route::Picks),
            "profile" => Some(Route::Profile),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookmaker keys the profile view offers as choices
pub const KNOWN_BOOKS: [&str; 4] = ["fanduel", "draftkings", "betmgm", "caesars"];

/// Bookmaker used until the user picks another
pub const DEFAULT_BOOK: &str = "fanduel";
