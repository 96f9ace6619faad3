use crate::errors::TournamentError;
use crate::types::{MatchId, Team, TeamId, MAX_BOARD_NUMBER, MIN_TEAMS_FOR_BRACKET};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

// ── Match records ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketSide {
  Winners,
  Losers,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketMatch {
  pub id: MatchId,
  pub round: u32,
  pub index: usize,
  pub team1: Option<Team>,
  pub team2: Option<Team>,
  pub winner: Option<Team>,
  #[serde(default)]
  pub board: Option<u32>,
}

/// Losers matches always carry two teams; the queue only pairs when it
/// holds two of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LosersMatch {
  pub id: MatchId,
  pub round: u32,
  pub team1: Team,
  pub team2: Team,
  pub winner: Option<Team>,
  #[serde(default)]
  pub board: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalsState {
  pub match1_winner: Option<Team>,
  pub match2_winner: Option<Team>,
  pub champion: Option<Team>,
  pub runner_up: Option<Team>,
}

impl FinalsState {
  pub fn is_complete(&self) -> bool {
    self.champion.is_some()
  }
}

// ── Engine ─────────────────────────────────────────────────────────────

/// Double-elimination state: winners rounds, losers pairing queue and
/// match list, per-team loss counts, finals, and the tournament lock.
/// Everything here is stored verbatim in the persistence blob; nothing
/// is recomputed on load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoubleElimBracket {
  winners_rounds: Vec<Vec<BracketMatch>>,
  round1_summary: Vec<BracketMatch>,
  losers_matches: Vec<LosersMatch>,
  losers_waiting: Vec<Team>,
  team_losses: HashMap<TeamId, u8>,
  finals: FinalsState,
  locked: bool,
}

impl DoubleElimBracket {
  /// Build the winners bracket from the team list in array order,
  /// padding up to a power of two with empty slots. Round-1 matches
  /// with a single team auto-advance it without locking the tournament
  /// and without charging anyone a loss.
  pub fn build(teams: &[Team]) -> Result<Self, TournamentError> {
    let team_count = teams.len();
    if team_count < MIN_TEAMS_FOR_BRACKET {
      return Err(TournamentError::NotEnoughTeams(team_count));
    }

    let bracket_size = team_count.next_power_of_two();
    let rounds_count = bracket_size.trailing_zeros();

    let mut slots: Vec<Option<Team>> = teams.iter().cloned().map(Some).collect();
    slots.resize(bracket_size, None);

    let mut bracket = DoubleElimBracket::default();
    let mut match_id: MatchId = 1;

    let mut round1 = Vec::with_capacity(bracket_size / 2);
    for pair in slots.chunks(2) {
      round1.push(BracketMatch {
        id: match_id,
        round: 1,
        index: round1.len(),
        team1: pair[0].clone(),
        team2: pair[1].clone(),
        winner: None,
        board: None,
      });
      match_id += 1;
    }
    bracket.winners_rounds.push(round1);

    for round in 2..=rounds_count {
      let prev_len = bracket.winners_rounds.last().map(|r| r.len()).unwrap_or(0);
      let mut this_round = Vec::with_capacity(prev_len / 2);
      for index in 0..prev_len / 2 {
        this_round.push(BracketMatch {
          id: match_id,
          round,
          index,
          team1: None,
          team2: None,
          winner: None,
          board: None,
        });
        match_id += 1;
      }
      bracket.winners_rounds.push(this_round);
    }

    for team in teams {
      bracket.team_losses.insert(team.id, 0);
    }
    bracket.round1_summary = bracket.winners_rounds[0].clone();

    bracket.auto_advance_round1_byes();
    info!(teams = team_count, rounds = rounds_count, "winners bracket built");
    Ok(bracket)
  }

  fn auto_advance_round1_byes(&mut self) {
    let round1_len = self.winners_rounds.first().map(|r| r.len()).unwrap_or(0);
    for idx in 0..round1_len {
      let advance = {
        let m = &self.winners_rounds[0][idx];
        if m.winner.is_some() {
          None
        } else {
          match (&m.team1, &m.team2) {
            (Some(t), None) => Some(t.clone()),
            (None, Some(t)) => Some(t.clone()),
            _ => None,
          }
        }
      };
      if let Some(team) = advance {
        self.resolve_winners_at(0, idx, team, false);
      }
    }
  }

  // ── Winners bracket resolution ───────────────────────────────────────

  /// Record the winner of a winners-bracket match. Re-recording the
  /// same winner is a no-op; a different winner is refused.
  pub fn record_winner(&mut self, match_id: MatchId, winner_id: TeamId) -> Result<(), TournamentError> {
    let (round_idx, match_idx) = self
      .find_winners_match(match_id)
      .ok_or(TournamentError::MatchNotFound(match_id))?;

    let winner = {
      let m = &self.winners_rounds[round_idx][match_idx];
      if let Some(prev) = &m.winner {
        if prev.id == winner_id {
          return Ok(());
        }
        return Err(TournamentError::MatchAlreadyResolved(match_id));
      }
      participant_of(m.team1.as_ref(), m.team2.as_ref(), match_id, winner_id)?
    };

    self.resolve_winners_at(round_idx, match_idx, winner, true);
    Ok(())
  }

  fn resolve_winners_at(&mut self, round_idx: usize, match_idx: usize, winner: Team, engage_lock: bool) {
    let (match_id, loser) = {
      let m = &mut self.winners_rounds[round_idx][match_idx];
      m.winner = Some(winner.clone());
      let loser = match (&m.team1, &m.team2) {
        (Some(t1), Some(t2)) => {
          Some(if t1.id == winner.id { t2.clone() } else { t1.clone() })
        }
        _ => None,
      };
      (m.id, loser)
    };

    if engage_lock {
      self.engage_lock();
    }

    // Mirror round-1 results onto the summary table.
    if round_idx == 0 {
      if let Some(summary) = self.round1_summary.iter_mut().find(|m| m.id == match_id) {
        summary.winner = Some(winner.clone());
      }
    }

    if round_idx + 1 < self.winners_rounds.len() {
      let next_idx = match_idx / 2;
      let next = &mut self.winners_rounds[round_idx + 1][next_idx];
      if match_idx % 2 == 0 {
        next.team1 = Some(winner.clone());
      } else {
        next.team2 = Some(winner.clone());
      }
    }

    info!(match_id, winner = winner.id, "winners match resolved");
    if let Some(loser) = loser {
      self.record_loss(loser);
    }
  }

  fn find_winners_match(&self, match_id: MatchId) -> Option<(usize, usize)> {
    for (round_idx, round) in self.winners_rounds.iter().enumerate() {
      if let Some(match_idx) = round.iter().position(|m| m.id == match_id) {
        return Some((round_idx, match_idx));
      }
    }
    None
  }

  // ── Loss ledger / losers queue ───────────────────────────────────────

  fn record_loss(&mut self, team: Team) {
    let count = self.team_losses.entry(team.id).or_insert(0);
    *count += 1;
    let losses = *count;
    info!(team = team.id, losses, "loss recorded");
    if losses == 1 {
      self.enqueue_loser(team);
    }
    // Two losses: eliminated. The team simply never gets paired again.
  }

  fn enqueue_loser(&mut self, team: Team) {
    self.losers_waiting.push(team);
    if self.losers_waiting.len() >= 2 {
      let team1 = self.losers_waiting.remove(0);
      let team2 = self.losers_waiting.remove(0);
      let index = self.losers_matches.len();
      let paired = LosersMatch {
        id: index as MatchId + 1,
        // Two matches per synthetic display round.
        round: index as u32 / 2 + 1,
        team1,
        team2,
        winner: None,
        board: None,
      };
      info!(id = paired.id, round = paired.round, "losers match paired");
      self.losers_matches.push(paired);
    }
  }

  /// Record the winner of a losers-bracket match. The loser takes its
  /// second loss (eliminated); the winner re-enters the pairing queue.
  pub fn record_losers_winner(&mut self, match_id: MatchId, winner_id: TeamId) -> Result<(), TournamentError> {
    let idx = self
      .losers_matches
      .iter()
      .position(|m| m.id == match_id)
      .ok_or(TournamentError::MatchNotFound(match_id))?;

    let (winner, loser) = {
      let m = &self.losers_matches[idx];
      if let Some(prev) = &m.winner {
        if prev.id == winner_id {
          return Ok(());
        }
        return Err(TournamentError::MatchAlreadyResolved(match_id));
      }
      if m.team1.id == winner_id {
        (m.team1.clone(), m.team2.clone())
      } else if m.team2.id == winner_id {
        (m.team2.clone(), m.team1.clone())
      } else {
        return Err(TournamentError::TeamNotInMatch {
          match_id,
          team_id: winner_id,
        });
      }
    };

    self.losers_matches[idx].winner = Some(winner.clone());
    self.engage_lock();
    info!(match_id, winner = winner.id, "losers match resolved");
    self.record_loss(loser);
    self.enqueue_loser(winner);
    Ok(())
  }

  // ── Finals ───────────────────────────────────────────────────────────

  /// Winners-bracket champion: winner of the last winners match.
  pub fn king_seat(&self) -> Option<&Team> {
    self.winners_rounds.last()?.last()?.winner.as_ref()
  }

  /// Losers-bracket champion: winner of the last losers match.
  pub fn losers_champion(&self) -> Option<&Team> {
    self.losers_matches.last()?.winner.as_ref()
  }

  /// Finals under king-seat rules: the challenger must beat the king
  /// seat twice; match 2 is decisive for whoever wins it.
  pub fn record_finals_result(&mut self, match_number: u8, winner_id: TeamId) -> Result<(), TournamentError> {
    if !(1..=2).contains(&match_number) {
      return Err(TournamentError::InvalidFinalsMatch(match_number));
    }
    let king = self
      .king_seat()
      .cloned()
      .ok_or(TournamentError::ChampionsNotDecided)?;
    let challenger = self
      .losers_champion()
      .cloned()
      .ok_or(TournamentError::ChampionsNotDecided)?;
    if self.finals.is_complete() {
      return Err(TournamentError::FinalsComplete);
    }

    let winner = if king.id == winner_id {
      king.clone()
    } else if challenger.id == winner_id {
      challenger.clone()
    } else {
      return Err(TournamentError::NotAFinalist(winner_id));
    };

    if match_number == 1 {
      if self.finals.match1_winner.is_some() {
        return Err(TournamentError::FinalsMatch1AlreadyPlayed);
      }
      self.engage_lock();
      self.finals.match1_winner = Some(winner.clone());
      if winner.id == king.id {
        self.finals.champion = Some(king);
        self.finals.runner_up = Some(challenger);
      }
    } else {
      let match1_winner = self
        .finals
        .match1_winner
        .as_ref()
        .ok_or(TournamentError::FinalsMatch1NotPlayed)?;
      if match1_winner.id == king.id {
        return Err(TournamentError::FinalsMatch2NotNeeded);
      }
      self.engage_lock();
      self.finals.match2_winner = Some(winner.clone());
      let runner_up = if winner.id == king.id { challenger } else { king };
      self.finals.champion = Some(winner);
      self.finals.runner_up = Some(runner_up);
    }

    info!(match_number, winner = winner_id, "finals result recorded");
    Ok(())
  }

  // ── Boards / lock / accessors ────────────────────────────────────────

  pub fn assign_board(&mut self, side: BracketSide, match_id: MatchId, board: Option<u32>) -> Result<(), TournamentError> {
    if let Some(b) = board {
      if b == 0 || b > MAX_BOARD_NUMBER {
        return Err(TournamentError::InvalidBoardNumber(b));
      }
    }
    match side {
      BracketSide::Winners => {
        let (round_idx, match_idx) = self
          .find_winners_match(match_id)
          .ok_or(TournamentError::MatchNotFound(match_id))?;
        self.winners_rounds[round_idx][match_idx].board = board;
        if round_idx == 0 {
          if let Some(summary) = self.round1_summary.iter_mut().find(|m| m.id == match_id) {
            summary.board = board;
          }
        }
      }
      BracketSide::Losers => {
        let m = self
          .losers_matches
          .iter_mut()
          .find(|m| m.id == match_id)
          .ok_or(TournamentError::MatchNotFound(match_id))?;
        m.board = board;
      }
    }
    Ok(())
  }

  pub(crate) fn engage_lock(&mut self) {
    if !self.locked {
      self.locked = true;
      info!("tournament locked");
    }
  }

  pub fn is_locked(&self) -> bool {
    self.locked
  }

  pub fn is_built(&self) -> bool {
    !self.winners_rounds.is_empty()
  }

  pub fn winners_rounds(&self) -> &[Vec<BracketMatch>] {
    &self.winners_rounds
  }

  pub fn round1_summary(&self) -> &[BracketMatch] {
    &self.round1_summary
  }

  pub fn losers_matches(&self) -> &[LosersMatch] {
    &self.losers_matches
  }

  pub fn waiting_queue(&self) -> &[Team] {
    &self.losers_waiting
  }

  pub fn losses_for(&self, team_id: TeamId) -> u8 {
    self.team_losses.get(&team_id).copied().unwrap_or(0)
  }

  pub fn team_losses(&self) -> &HashMap<TeamId, u8> {
    &self.team_losses
  }

  pub fn finals(&self) -> &FinalsState {
    &self.finals
  }
}

fn participant_of(
  team1: Option<&Team>,
  team2: Option<&Team>,
  match_id: MatchId,
  winner_id: TeamId,
) -> Result<Team, TournamentError> {
  if team1.is_none() && team2.is_none() {
    return Err(TournamentError::MatchHasNoTeams(match_id));
  }
  if let Some(t) = team1 {
    if t.id == winner_id {
      return Ok(t.clone());
    }
  }
  if let Some(t) = team2 {
    if t.id == winner_id {
      return Ok(t.clone());
    }
  }
  Err(TournamentError::TeamNotInMatch {
    match_id,
    team_id: winner_id,
  })
}
