//! Double-elimination dart tournament engine: roster and team draw,
//! winners bracket with a FIFO losers queue, king-seat finals, side
//! scoreboards and payout math, all serializable as one session blob.

pub mod bracket;
pub mod errors;
pub mod payouts;
pub mod persistence;
pub mod roster;
pub mod scoreboard;
pub mod session;
pub mod teams;
pub mod types;

pub use bracket::{BracketMatch, BracketSide, DoubleElimBracket, FinalsState, LosersMatch};
pub use errors::{ErrorKind, TournamentError};
pub use payouts::{calculate_payouts, PayoutBreakdown, PayoutConfig, PayoutLine, PotSource};
pub use persistence::{load_session, load_session_or_default, save_session};
pub use roster::{PlayerDatabase, PlayerRoster, SavedPlayer};
pub use scoreboard::{is_possible_out, BigHit, BigHitLog, MasterOutBoard, MasterOutCell, MasterOutEntry};
pub use session::{CourtAssignment, SessionSummary, Standings, TournamentSession, TournamentView};
pub use teams::{generate_teams, shuffle_teams};
pub use types::{Gender, MatchId, Player, PlayerId, Team, TeamId};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// default `info` level. Call once at startup; later calls are no-ops.
pub fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .try_init();
}
