pub mod odds_gateway;
pub mod scoreboard;

pub use odds_gateway::{GatewayError, OddsGatewayClient, PROPS_SCAN_CAP};
pub use scoreboard::ScoreboardClient;
