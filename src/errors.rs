use crate::types::{MatchId, PlayerId, TeamId};

use thiserror::Error;

/// Broad classification for callers that only care how to present a
/// refusal, not which one it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// Bad input; nothing was mutated. Retry with corrected values.
  Validation,
  /// The referenced player/team/match does not exist.
  NotFound,
  /// The operation conflicts with already-recorded state.
  Conflict,
  /// Reading or writing the persistence blob failed.
  Storage,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TournamentError {
  #[error("Tournament in progress. Cannot change teams or reseed.")]
  TournamentLocked,

  #[error("You need at least 2 players to generate teams.")]
  NotEnoughPlayers,

  #[error("You need at least 2 teams to generate a bracket, got {0}.")]
  NotEnoughTeams(usize),

  #[error("First name and last name are required.")]
  MissingPlayerName,

  #[error("Player {0} not found.")]
  PlayerNotFound(PlayerId),

  #[error("Team {0} not found.")]
  TeamNotFound(TeamId),

  #[error("Player 1 and Player 2 must be different.")]
  SamePlayerTwice,

  #[error("Player {0} is already on a team.")]
  PlayerAlreadyTeamed(PlayerId),

  #[error("Match {0} not found.")]
  MatchNotFound(MatchId),

  #[error("No teams assigned to match {0} yet.")]
  MatchHasNoTeams(MatchId),

  #[error("Team {team_id} is not playing in match {match_id}.")]
  TeamNotInMatch { match_id: MatchId, team_id: TeamId },

  #[error("Match {0} already has a different winner recorded.")]
  MatchAlreadyResolved(MatchId),

  #[error("Board number must be between 1 and 20.")]
  InvalidBoardNumber(u32),

  #[error("Need both a winners bracket champion and a losers bracket champion first.")]
  ChampionsNotDecided,

  #[error("Finals are already complete.")]
  FinalsComplete,

  #[error("Finals match number must be 1 or 2.")]
  InvalidFinalsMatch(u8),

  #[error("Play finals match 1 first.")]
  FinalsMatch1NotPlayed,

  #[error("Finals match 1 already has a winner.")]
  FinalsMatch1AlreadyPlayed,

  #[error("King seat already won match 1. No match 2 is needed.")]
  FinalsMatch2NotNeeded,

  #[error("Team {0} is not one of the two finalists.")]
  NotAFinalist(TeamId),

  #[error("Out number must be between 1 and 180.")]
  OutNumberOutOfRange(u32),

  #[error("{0} has no possible Master Out.")]
  ImpossibleOut(u32),

  #[error("Big Hit type must not be empty.")]
  MissingShotType,

  #[error("No saved players in the database.")]
  NoSavedPlayers,

  #[error("{op} {path}: {message}")]
  Storage {
    op: &'static str,
    path: String,
    message: String,
  },
}

impl TournamentError {
  pub fn kind(&self) -> ErrorKind {
    use TournamentError::*;
    match self {
      PlayerNotFound(_) | TeamNotFound(_) | MatchNotFound(_) => ErrorKind::NotFound,
      TournamentLocked
      | MatchAlreadyResolved(_)
      | FinalsComplete
      | FinalsMatch1AlreadyPlayed
      | FinalsMatch2NotNeeded => ErrorKind::Conflict,
      Storage { .. } => ErrorKind::Storage,
      _ => ErrorKind::Validation,
    }
  }
}
