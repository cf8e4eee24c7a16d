use rand::Rng;

use crate::models::{AppState, Lean, Pick};

/// At most this many picks per generation; extra watch-list entries are dropped
pub const MAX_PICKS: usize = 6;

/// Demo roster names used when the watch-list is empty
const DEMO_SEEDS: usize = 5;

const CONFIDENCE_BASE: f64 = 0.58;
const CONFIDENCE_SPREAD: f64 = 0.28;
const CONFIDENCE_MIN: f64 = 0.55;
const CONFIDENCE_MAX: f64 = 0.86;

#[derive(Clone, Copy)]
struct Seed<'a> {
    name: &'a str,
    market: Option<&'a str>,
    line: &'a str,
    lean: Option<Lean>,
}

/// Generate picks for the current sport from the watch-list, or from
/// the sport's demo roster when nothing is tracked. Structure is
/// deterministic; lean and confidence are resampled on every call, so
/// regeneration always replaces the previous batch wholesale.
pub fn generate(state: &AppState, rng: &mut impl Rng) -> Vec<Pick> {
    let sport = state.sport;
    let tracked = state.tracked_for(sport);

    let seeds: Vec<Seed> = if tracked.is_empty() {
        sport
            .demo_roster()
            .iter()
            .take(DEMO_SEEDS)
            .map(|name| Seed {
                name,
                market: None,
                line: "",
                lean: None,
            })
            .collect()
    } else {
        tracked
            .iter()
            .map(|t| Seed {
                name: t.name.as_str(),
                market: if t.market.is_empty() {
                    None
                } else {
                    Some(t.market.as_str())
                },
                line: t.line.as_str(),
                lean: Some(t.lean),
            })
            .collect()
    };

    let vocab = sport.markets();

    seeds
        .into_iter()
        .take(MAX_PICKS)
        .enumerate()
        .map(|(i, seed)| {
            let market = seed.market.unwrap_or(vocab[i % vocab.len()]).to_string();
            let lean = seed.lean.unwrap_or_else(|| {
                if rng.gen_bool(0.5) {
                    Lean::More
                } else {
                    Lean::Less
                }
            });
            let confidence = (CONFIDENCE_BASE + rng.gen::<f64>() * CONFIDENCE_SPREAD)
                .clamp(CONFIDENCE_MIN, CONFIDENCE_MAX);

            Pick {
                id: Pick::make_id(sport, seed.name, &market, i),
                player: seed.name.to_string(),
                market,
                line: seed.line.to_string(),
                lean,
                confidence,
                reasoning: reasoning_lines(),
            }
        })
        .collect()
}

/// The same fixed rationale for every pick; this is a labeled stub,
/// not per-player analysis
fn reasoning_lines() -> Vec<String> {
    vec![
        "Role + usage look stable.".to_string(),
        "Opponent profile matches the market.".to_string(),
        "Recent form supports the lean.".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn empty_watch_list_uses_demo_roster() {
        let state = AppState::default();
        let picks = generate(&state, &mut rng());

        assert_eq!(picks.len(), DEMO_SEEDS);
        let roster = Sport::Nba.demo_roster();
        for (i, pick) in picks.iter().enumerate() {
            assert_eq!(pick.player, roster[i]);
            // demo picks cycle the stat vocabulary by position
            let vocab = Sport::Nba.markets();
            assert_eq!(pick.market, vocab[i % vocab.len()]);
            assert_eq!(pick.reasoning.len(), 3);
        }
    }

    #[test]
    fn output_is_capped_at_six() {
        let mut state = AppState::default();
        for i in 0..8 {
            state.track(&format!("Player {}", i));
        }

        let picks = generate(&state, &mut rng());
        assert_eq!(picks.len(), MAX_PICKS);
        assert_eq!(picks[0].player, "Player 0");
    }

    #[test]
    fn tracked_entries_keep_their_market_and_lean() {
        let mut state = AppState::default();
        let id = state.track("Nikola Jokić");
        state
            .edit_tracked(
                id,
                crate::models::TrackedPatch {
                    market: Some("REB".to_string()),
                    lean: Some(Lean::Less),
                    ..Default::default()
                },
            )
            .unwrap();

        let picks = generate(&state, &mut rng());
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].market, "REB");
        assert_eq!(picks[0].lean, Lean::Less);
        assert_eq!(picks[0].id, "NBA-Nikola Jokić-REB-0");
    }

    #[test]
    fn tracked_line_rides_into_the_pick() {
        let mut state = AppState::default();
        let id = state.track("Jayson Tatum");
        state
            .edit_tracked(
                id,
                crate::models::TrackedPatch {
                    line: Some("27.5".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let picks = generate(&state, &mut rng());
        assert_eq!(picks[0].line, "27.5");

        // demo seeds have no line to carry
        let empty = generate(&AppState::default(), &mut rng());
        assert!(empty.iter().all(|p| p.line.is_empty()));
    }

    #[test]
    fn confidence_always_stays_in_bounds() {
        let state = AppState::default();
        let mut rng = rng();

        for _ in 0..50 {
            for pick in generate(&state, &mut rng) {
                assert!(
                    (CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&pick.confidence),
                    "confidence {} out of bounds",
                    pick.confidence
                );
            }
        }
    }

    #[test]
    fn watch_lists_of_other_sports_are_ignored() {
        let mut state = AppState::default();
        state.track("Jayson Tatum");
        state.sport = Sport::Ufc;

        let picks = generate(&state, &mut rng());
        // UFC has no tracked entries, so its demo roster kicks in
        assert_eq!(picks.len(), DEMO_SEEDS);
        assert_eq!(picks[0].player, "Jon Jones");
    }
}
