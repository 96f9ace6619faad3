use crate::bracket::{BracketMatch, BracketSide, DoubleElimBracket, LosersMatch};
use crate::errors::TournamentError;
use crate::payouts::{calculate_payouts, PayoutBreakdown, PayoutConfig};
use crate::roster::PlayerRoster;
use crate::scoreboard::{BigHit, BigHitLog, MasterOutBoard, MasterOutCell, MasterOutEntry};
use crate::teams;
use crate::types::{Gender, MatchId, Player, PlayerId, Team, TeamId, MIN_TEAMS_FOR_BRACKET};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

// ── Session ────────────────────────────────────────────────────────────

/// The whole tournament night in one owned value. Every mutation goes
/// through a method here; the struct serializes as the persistence
/// blob and round-trips without losing state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TournamentSession {
  roster: PlayerRoster,
  teams: Vec<Team>,
  bracket: DoubleElimBracket,
  master_outs: MasterOutBoard,
  big_hits: BigHitLog,
}

impl TournamentSession {
  pub fn new() -> Self {
    TournamentSession::default()
  }

  // ── Roster ───────────────────────────────────────────────────────────

  pub fn add_player(
    &mut self,
    first_name: &str,
    last_name: &str,
    nickname: Option<&str>,
    gender: Gender,
  ) -> Result<Player, TournamentError> {
    let player = self
      .roster
      .add_player(first_name, last_name, nickname, gender)?
      .clone();
    info!(player = player.id, "player added");
    Ok(player)
  }

  /// Removing a player also removes any team they were on and resets
  /// the whole bracket state, including the lock.
  pub fn remove_player(&mut self, player_id: PlayerId) -> Result<Player, TournamentError> {
    let removed = self.roster.remove_player(player_id)?;
    self.teams.retain(|t| !t.has_player(player_id));
    self.reset_bracket();
    info!(player = player_id, "player removed, bracket reset");
    Ok(removed)
  }

  pub fn toggle_paid(&mut self, player_id: PlayerId) -> Result<bool, TournamentError> {
    self.roster.toggle_paid(player_id)
  }

  pub fn players(&self) -> &[Player] {
    self.roster.all()
  }

  pub fn roster(&self) -> &PlayerRoster {
    &self.roster
  }

  pub fn roster_mut(&mut self) -> &mut PlayerRoster {
    &mut self.roster
  }

  // ── Teams ────────────────────────────────────────────────────────────

  /// Random draw from the roster. Refused once the tournament is
  /// locked; resets all bracket state.
  pub fn generate_teams(&mut self, seed: u64) -> Result<&[Team], TournamentError> {
    self.ensure_unlocked()?;
    self.teams = teams::generate_teams(self.roster.all(), seed)?;
    self.reset_bracket();
    info!(teams = self.teams.len(), "teams generated");
    Ok(&self.teams)
  }

  pub fn add_manual_team(
    &mut self,
    player1_id: PlayerId,
    player2_id: PlayerId,
  ) -> Result<&Team, TournamentError> {
    self.ensure_unlocked()?;
    if player1_id == player2_id {
      return Err(TournamentError::SamePlayerTwice);
    }
    let player1 = self
      .roster
      .get(player1_id)
      .ok_or(TournamentError::PlayerNotFound(player1_id))?
      .clone();
    let player2 = self
      .roster
      .get(player2_id)
      .ok_or(TournamentError::PlayerNotFound(player2_id))?
      .clone();
    for id in [player1_id, player2_id] {
      if self.teams.iter().any(|t| t.has_player(id)) {
        return Err(TournamentError::PlayerAlreadyTeamed(id));
      }
    }

    self.teams.push(Team {
      id: teams::next_team_id(&self.teams),
      player1,
      player2: Some(player2),
    });
    self.reset_bracket();
    Ok(self.teams.last().expect("just pushed"))
  }

  pub fn teams(&self) -> &[Team] {
    &self.teams
  }

  pub fn team(&self, team_id: TeamId) -> Option<&Team> {
    self.teams.iter().find(|t| t.id == team_id)
  }

  // ── Bracket ──────────────────────────────────────────────────────────

  /// (Re)build the winners bracket from the current team order. A
  /// rebuild mid-tournament is allowed and keeps the lock engaged.
  pub fn generate_bracket(&mut self) -> Result<(), TournamentError> {
    let was_locked = self.bracket.is_locked();
    self.bracket = DoubleElimBracket::build(&self.teams)?;
    if was_locked {
      self.bracket.engage_lock();
    }
    Ok(())
  }

  /// Shuffle the team list and rebuild from scratch. Refused while
  /// locked.
  pub fn reseed(&mut self, seed: u64) -> Result<(), TournamentError> {
    self.ensure_unlocked()?;
    if self.teams.len() < MIN_TEAMS_FOR_BRACKET {
      return Err(TournamentError::NotEnoughTeams(self.teams.len()));
    }
    self.teams = teams::shuffle_teams(&self.teams, seed);
    self.bracket = DoubleElimBracket::build(&self.teams)?;
    info!("bracket reseeded");
    Ok(())
  }

  /// Explicit full reset: brackets, losses, queue, finals and the lock
  /// are cleared. Players and teams stay.
  pub fn reset_bracket(&mut self) {
    self.bracket = DoubleElimBracket::default();
  }

  pub fn record_winner(&mut self, match_id: MatchId, winner_id: TeamId) -> Result<(), TournamentError> {
    self.bracket.record_winner(match_id, winner_id)
  }

  pub fn record_losers_winner(&mut self, match_id: MatchId, winner_id: TeamId) -> Result<(), TournamentError> {
    self.bracket.record_losers_winner(match_id, winner_id)
  }

  pub fn record_finals_result(&mut self, match_number: u8, winner_id: TeamId) -> Result<(), TournamentError> {
    self.bracket.record_finals_result(match_number, winner_id)
  }

  pub fn assign_board(
    &mut self,
    side: BracketSide,
    match_id: MatchId,
    board: Option<u32>,
  ) -> Result<(), TournamentError> {
    self.bracket.assign_board(side, match_id, board)
  }

  pub fn bracket(&self) -> &DoubleElimBracket {
    &self.bracket
  }

  pub fn is_locked(&self) -> bool {
    self.bracket.is_locked()
  }

  fn ensure_unlocked(&self) -> Result<(), TournamentError> {
    if self.bracket.is_locked() {
      return Err(TournamentError::TournamentLocked);
    }
    Ok(())
  }

  // ── Scoreboards ──────────────────────────────────────────────────────

  pub fn add_master_out(
    &mut self,
    player_id: PlayerId,
    out_number: u32,
    now: DateTime<Utc>,
  ) -> Result<&MasterOutEntry, TournamentError> {
    if self.roster.get(player_id).is_none() {
      return Err(TournamentError::PlayerNotFound(player_id));
    }
    self.master_outs.add_entry(player_id, out_number, now)
  }

  pub fn add_big_hit(
    &mut self,
    player_id: PlayerId,
    shot_type: &str,
    now: DateTime<Utc>,
  ) -> Result<&BigHit, TournamentError> {
    if self.roster.get(player_id).is_none() {
      return Err(TournamentError::PlayerNotFound(player_id));
    }
    self.big_hits.add_entry(player_id, shot_type, now)
  }

  pub fn master_out_cells(&self) -> Vec<MasterOutCell> {
    self.master_outs.cells()
  }

  pub fn big_hits(&self) -> Vec<&BigHit> {
    self.big_hits.sorted_entries()
  }

  // ── Reporting ────────────────────────────────────────────────────────

  pub fn standings(&self) -> Standings {
    let finals = self.bracket.finals();
    let mut standings = Standings {
      champion: finals.champion.clone(),
      runner_up: finals.runner_up.clone(),
      unbeaten: Vec::new(),
      one_loss: Vec::new(),
      eliminated: Vec::new(),
    };
    for team in &self.teams {
      match self.bracket.losses_for(team.id) {
        0 => standings.unbeaten.push(team.clone()),
        1 => standings.one_loss.push(team.clone()),
        _ => standings.eliminated.push(team.clone()),
      }
    }
    standings
  }

  pub fn summary(&self) -> SessionSummary {
    let total_players = self.roster.len();
    let paid_players = self.roster.paid_count();
    SessionSummary {
      total_players,
      paid_players,
      unpaid_players: total_players - paid_players,
      total_teams: self.teams.len(),
      round1_matches: self.bracket.round1_summary().len(),
    }
  }

  pub fn payouts(&self, config: &PayoutConfig) -> PayoutBreakdown {
    calculate_payouts(self.roster.all(), config)
  }

  /// Matches that have a board assigned, no winner yet and at least
  /// one team, from both brackets. Sorted for the wall display.
  pub fn court_assignments(&self) -> Vec<CourtAssignment> {
    let mut rows = Vec::new();

    for round in self.bracket.winners_rounds() {
      for m in round {
        if let Some(board) = m.board {
          if m.winner.is_none() && (m.team1.is_some() || m.team2.is_some()) {
            rows.push(CourtAssignment {
              board,
              side: BracketSide::Winners,
              round: m.round,
              match_id: m.id,
              label: versus_label(m.team1.as_ref(), m.team2.as_ref()),
            });
          }
        }
      }
    }
    for m in self.bracket.losers_matches() {
      if let Some(board) = m.board {
        if m.winner.is_none() {
          rows.push(CourtAssignment {
            board,
            side: BracketSide::Losers,
            round: m.round,
            match_id: m.id,
            label: versus_label(Some(&m.team1), Some(&m.team2)),
          });
        }
      }
    }

    // "Loser" sorts before "Winner", matching the wall board.
    rows.sort_by(|a, b| {
      (a.board, side_label(a.side), a.round, a.match_id)
        .cmp(&(b.board, side_label(b.side), b.round, b.match_id))
    });
    rows
  }

  /// Everything a renderer needs, in one serializable view.
  pub fn snapshot(&self) -> TournamentView {
    let finals = self.bracket.finals();
    let losers_rounds = self.losers_rounds_view();
    TournamentView {
      players: self.roster.all().to_vec(),
      teams: self.teams.iter().map(|t| self.team_view(t)).collect(),
      round1_matches: self
        .bracket
        .round1_summary()
        .iter()
        .map(|m| self.match_view(m))
        .collect(),
      winners_rounds: self
        .bracket
        .winners_rounds()
        .iter()
        .map(|round| round.iter().map(|m| self.match_view(m)).collect())
        .collect(),
      losers_rounds,
      losers_waiting: self
        .bracket
        .waiting_queue()
        .iter()
        .map(|t| self.team_view(t))
        .collect(),
      finals: FinalsView {
        king_seat: self.bracket.king_seat().map(|t| self.team_view(t)),
        challenger: self.bracket.losers_champion().map(|t| self.team_view(t)),
        match1_winner: finals.match1_winner.as_ref().map(|t| self.team_view(t)),
        match2_winner: finals.match2_winner.as_ref().map(|t| self.team_view(t)),
        champion: finals.champion.as_ref().map(|t| self.team_view(t)),
        runner_up: finals.runner_up.as_ref().map(|t| self.team_view(t)),
      },
      standings: self.standings(),
      summary: self.summary(),
      court_assignments: self.court_assignments(),
      master_out_cells: self.master_outs.cells(),
      big_hits: self.big_hits.sorted_entries().into_iter().cloned().collect(),
      locked: self.bracket.is_locked(),
    }
  }

  fn team_view(&self, team: &Team) -> TeamView {
    TeamView {
      id: team.id,
      label: team.label(),
      losses: self.bracket.losses_for(team.id),
    }
  }

  fn match_view(&self, m: &BracketMatch) -> MatchView {
    MatchView {
      id: m.id,
      round: m.round,
      team1: m.team1.as_ref().map(|t| self.team_view(t)),
      team2: m.team2.as_ref().map(|t| self.team_view(t)),
      winner: m.winner.as_ref().map(|t| self.team_view(t)),
      board: m.board,
    }
  }

  fn losers_match_view(&self, m: &LosersMatch) -> MatchView {
    MatchView {
      id: m.id,
      round: m.round,
      team1: Some(self.team_view(&m.team1)),
      team2: Some(self.team_view(&m.team2)),
      winner: m.winner.as_ref().map(|t| self.team_view(t)),
      board: m.board,
    }
  }

  fn losers_rounds_view(&self) -> Vec<Vec<MatchView>> {
    let mut by_round: BTreeMap<u32, Vec<MatchView>> = BTreeMap::new();
    for m in self.bracket.losers_matches() {
      by_round
        .entry(m.round)
        .or_default()
        .push(self.losers_match_view(m));
    }
    by_round.into_values().collect()
  }
}

fn versus_label(team1: Option<&Team>, team2: Option<&Team>) -> String {
  let name = |t: Option<&Team>| t.map(|t| t.label()).unwrap_or_else(|| "TBD".to_string());
  format!("{} vs {}", name(team1), name(team2))
}

fn side_label(side: BracketSide) -> &'static str {
  match side {
    BracketSide::Winners => "Winner",
    BracketSide::Losers => "Loser",
  }
}

// ── Views ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
  pub id: TeamId,
  pub label: String,
  pub losses: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
  pub id: MatchId,
  pub round: u32,
  pub team1: Option<TeamView>,
  pub team2: Option<TeamView>,
  pub winner: Option<TeamView>,
  pub board: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalsView {
  pub king_seat: Option<TeamView>,
  pub challenger: Option<TeamView>,
  pub match1_winner: Option<TeamView>,
  pub match2_winner: Option<TeamView>,
  pub champion: Option<TeamView>,
  pub runner_up: Option<TeamView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
  pub champion: Option<Team>,
  pub runner_up: Option<Team>,
  pub unbeaten: Vec<Team>,
  pub one_loss: Vec<Team>,
  pub eliminated: Vec<Team>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
  pub total_players: usize,
  pub paid_players: usize,
  pub unpaid_players: usize,
  pub total_teams: usize,
  pub round1_matches: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtAssignment {
  pub board: u32,
  pub side: BracketSide,
  pub round: u32,
  pub match_id: MatchId,
  pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
  pub players: Vec<Player>,
  pub teams: Vec<TeamView>,
  pub round1_matches: Vec<MatchView>,
  pub winners_rounds: Vec<Vec<MatchView>>,
  pub losers_rounds: Vec<Vec<MatchView>>,
  pub losers_waiting: Vec<TeamView>,
  pub finals: FinalsView,
  pub standings: Standings,
  pub summary: SessionSummary,
  pub court_assignments: Vec<CourtAssignment>,
  pub master_out_cells: Vec<MasterOutCell>,
  pub big_hits: Vec<BigHit>,
  pub locked: bool,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn session_with_players(n: u32) -> TournamentSession {
    let mut session = TournamentSession::new();
    for i in 1..=n {
      session
        .add_player(
          &format!("First{i}"),
          &format!("Last{i}"),
          None,
          if i % 2 == 0 { Gender::Female } else { Gender::Male },
        )
        .unwrap();
    }
    session
  }

  fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
  }

  #[test]
  fn lock_blocks_structural_changes() {
    let mut session = session_with_players(8);
    session.generate_teams(11).unwrap();
    session.generate_bracket().unwrap();
    assert!(!session.is_locked());

    let first_match = session.bracket().winners_rounds()[0][0].clone();
    let winner_id = first_match.team1.unwrap().id;
    session.record_winner(first_match.id, winner_id).unwrap();
    assert!(session.is_locked());

    assert_eq!(
      session.generate_teams(12),
      Err(TournamentError::TournamentLocked)
    );
    assert_eq!(
      session.add_manual_team(1, 2).err(),
      Some(TournamentError::TournamentLocked)
    );
    assert_eq!(session.reseed(13), Err(TournamentError::TournamentLocked));

    session.reset_bracket();
    assert!(!session.is_locked());
    session.generate_teams(12).unwrap();
  }

  #[test]
  fn bracket_rebuild_keeps_the_lock() {
    let mut session = session_with_players(4);
    session.generate_teams(3).unwrap();
    session.generate_bracket().unwrap();
    let m = session.bracket().winners_rounds()[0][0].clone();
    session.record_winner(m.id, m.team1.unwrap().id).unwrap();
    assert!(session.is_locked());

    session.generate_bracket().unwrap();
    assert!(session.is_locked());
    // The rebuild itself is clean: no winners, no losses.
    assert!(session.bracket().losers_matches().is_empty());
    assert!(session.standings().one_loss.is_empty());
  }

  #[test]
  fn removing_a_player_strips_their_team_and_unlocks() {
    let mut session = session_with_players(4);
    session.generate_teams(5).unwrap();
    session.generate_bracket().unwrap();
    let m = session.bracket().winners_rounds()[0][0].clone();
    session.record_winner(m.id, m.team1.unwrap().id).unwrap();
    assert!(session.is_locked());

    let victim = session.teams()[0].player1.id;
    session.remove_player(victim).unwrap();
    assert_eq!(session.teams().len(), 1);
    assert!(!session.is_locked());
    assert!(!session.bracket().is_built());
  }

  #[test]
  fn manual_team_validation() {
    let mut session = session_with_players(5);
    assert_eq!(
      session.add_manual_team(1, 1).err(),
      Some(TournamentError::SamePlayerTwice)
    );
    assert_eq!(
      session.add_manual_team(1, 99).err(),
      Some(TournamentError::PlayerNotFound(99))
    );

    session.add_manual_team(1, 2).unwrap();
    assert_eq!(
      session.add_manual_team(2, 3).err(),
      Some(TournamentError::PlayerAlreadyTeamed(2))
    );

    let team = session.add_manual_team(3, 4).unwrap();
    assert_eq!(team.id, 2);
  }

  #[test]
  fn scoreboard_entries_need_a_known_player() {
    let mut session = session_with_players(2);
    assert_eq!(
      session.add_master_out(99, 100, now()).err(),
      Some(TournamentError::PlayerNotFound(99))
    );
    assert_eq!(
      session.add_big_hit(99, "180", now()).err(),
      Some(TournamentError::PlayerNotFound(99))
    );
    session.add_master_out(1, 100, now()).unwrap();
    session.add_big_hit(2, "Ton 80", now()).unwrap();
    assert_eq!(session.big_hits().len(), 1);
  }

  #[test]
  fn standings_group_by_losses() {
    let mut session = session_with_players(8);
    session.generate_teams(2).unwrap();
    session.generate_bracket().unwrap();

    let round1: Vec<_> = session.bracket().winners_rounds()[0].to_vec();
    for m in &round1 {
      session.record_winner(m.id, m.team1.as_ref().unwrap().id).unwrap();
    }
    let lm = session.bracket().losers_matches()[0].clone();
    session.record_losers_winner(lm.id, lm.team1.id).unwrap();

    let standings = session.standings();
    assert_eq!(standings.unbeaten.len(), 2);
    assert_eq!(standings.one_loss.len(), 1);
    assert_eq!(standings.eliminated.len(), 1);
    assert!(standings.champion.is_none());
  }

  #[test]
  fn court_assignments_sort_losers_first_per_board() {
    let mut session = session_with_players(16);
    session.generate_teams(7).unwrap();
    session.generate_bracket().unwrap();

    let round1: Vec<_> = session.bracket().winners_rounds()[0].to_vec();
    session.record_winner(round1[0].id, round1[0].team1.as_ref().unwrap().id).unwrap();
    session.record_winner(round1[1].id, round1[1].team1.as_ref().unwrap().id).unwrap();
    let lm_id = session.bracket().losers_matches()[0].id;

    session.assign_board(BracketSide::Winners, round1[2].id, Some(3)).unwrap();
    session.assign_board(BracketSide::Losers, lm_id, Some(3)).unwrap();
    session.assign_board(BracketSide::Winners, round1[3].id, Some(1)).unwrap();

    let rows = session.court_assignments();
    assert_eq!(rows.len(), 3);
    assert_eq!((rows[0].board, rows[0].side), (1, BracketSide::Winners));
    assert_eq!((rows[1].board, rows[1].side), (3, BracketSide::Losers));
    assert_eq!((rows[2].board, rows[2].side), (3, BracketSide::Winners));
  }

  #[test]
  fn resolved_matches_leave_the_court_list() {
    let mut session = session_with_players(4);
    session.generate_teams(9).unwrap();
    session.generate_bracket().unwrap();

    let m = session.bracket().winners_rounds()[0][0].clone();
    session.assign_board(BracketSide::Winners, m.id, Some(5)).unwrap();
    assert_eq!(session.court_assignments().len(), 1);
    session.record_winner(m.id, m.team1.unwrap().id).unwrap();
    assert!(session.court_assignments().is_empty());
  }

  #[test]
  fn snapshot_carries_labels_and_losses() {
    let mut session = session_with_players(4);
    session.generate_teams(21).unwrap();
    session.generate_bracket().unwrap();
    let m = session.bracket().winners_rounds()[0][0].clone();
    let (w, l) = (m.team1.unwrap().id, m.team2.unwrap().id);
    session.record_winner(m.id, w).unwrap();

    let view = session.snapshot();
    assert!(view.locked);
    assert_eq!(view.winners_rounds.len(), 1);
    let loser_view = view.teams.iter().find(|t| t.id == l).unwrap();
    assert_eq!(loser_view.losses, 1);
    assert!(loser_view.label.starts_with(&format!("Team {l}:")));
    assert_eq!(view.losers_waiting.len(), 1);
    assert_eq!(view.summary.total_teams, 2);
  }
}
