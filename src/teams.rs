use crate::errors::TournamentError;
use crate::types::{Player, Team, TeamId, MIN_PLAYERS_FOR_TEAMS};

// ── Seeded RNG ─────────────────────────────────────────────────────────

/// Small xorshift generator so team draws are reproducible from a seed.
/// The bracket engine itself never randomizes; only the draw does.
#[derive(Clone, Debug)]
pub struct ShuffleRng {
  state: u64,
}

impl ShuffleRng {
  pub fn new(seed: u64) -> Self {
    let mut state = seed;
    if state == 0 {
      state = 0x9E37_79B9_7F4A_7C15;
    }
    ShuffleRng { state }
  }

  fn next_u64(&mut self) -> u64 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    self.state = x;
    x
  }

  fn next_index(&mut self, bound: usize) -> usize {
    if bound == 0 {
      return 0;
    }
    (self.next_u64() % bound as u64) as usize
  }
}

fn shuffled<T: Clone>(items: &[T], rng: &mut ShuffleRng) -> Vec<T> {
  let mut arr = items.to_vec();
  for i in (1..arr.len()).rev() {
    let j = rng.next_index(i + 1);
    arr.swap(i, j);
  }
  arr
}

// ── Team draw ──────────────────────────────────────────────────────────

/// Random draw: shuffle the roster, pair adjacent players. An odd
/// player count leaves the last team solo. Team ids restart at 1.
pub fn generate_teams(players: &[Player], seed: u64) -> Result<Vec<Team>, TournamentError> {
  if players.len() < MIN_PLAYERS_FOR_TEAMS {
    return Err(TournamentError::NotEnoughPlayers);
  }
  let mut rng = ShuffleRng::new(seed);
  let drawn = shuffled(players, &mut rng);

  let mut teams = Vec::with_capacity(drawn.len().div_ceil(2));
  let mut team_number: TeamId = 1;
  let mut iter = drawn.into_iter();
  while let Some(p1) = iter.next() {
    let p2 = iter.next();
    teams.push(Team {
      id: team_number,
      player1: p1,
      player2: p2,
    });
    team_number += 1;
  }
  Ok(teams)
}

/// Reseed draw: shuffle the existing team list. Team ids are kept.
pub fn shuffle_teams(teams: &[Team], seed: u64) -> Vec<Team> {
  let mut rng = ShuffleRng::new(seed);
  shuffled(teams, &mut rng)
}

/// Next id for a manually added team.
pub fn next_team_id(teams: &[Team]) -> TeamId {
  teams.iter().map(|t| t.id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Gender;

  fn player(id: u32) -> Player {
    Player {
      id,
      first_name: format!("P{id}"),
      last_name: "Test".to_string(),
      nickname: None,
      gender: Gender::Male,
      paid: false,
    }
  }

  #[test]
  fn rejects_single_player() {
    let players = vec![player(1)];
    assert_eq!(
      generate_teams(&players, 7),
      Err(TournamentError::NotEnoughPlayers)
    );
  }

  #[test]
  fn draw_is_deterministic_per_seed() {
    let players: Vec<Player> = (1..=8).map(player).collect();
    let a = generate_teams(&players, 42).unwrap();
    let b = generate_teams(&players, 42).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn every_player_lands_on_exactly_one_team() {
    let players: Vec<Player> = (1..=9).map(player).collect();
    let teams = generate_teams(&players, 3).unwrap();
    assert_eq!(teams.len(), 5);
    assert!(teams.last().unwrap().is_solo());

    let mut seen: Vec<u32> = teams
      .iter()
      .flat_map(|t| {
        let mut ids = vec![t.player1.id];
        if let Some(p2) = &t.player2 {
          ids.push(p2.id);
        }
        ids
      })
      .collect();
    seen.sort_unstable();
    assert_eq!(seen, (1..=9).collect::<Vec<_>>());
  }

  #[test]
  fn team_ids_restart_at_one() {
    let players: Vec<Player> = (1..=6).map(player).collect();
    let teams = generate_teams(&players, 99).unwrap();
    let ids: Vec<u32> = teams.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[test]
  fn reseed_keeps_team_ids() {
    let players: Vec<Player> = (1..=8).map(player).collect();
    let teams = generate_teams(&players, 1).unwrap();
    let reshuffled = shuffle_teams(&teams, 2);
    let mut before: Vec<u32> = teams.iter().map(|t| t.id).collect();
    let mut after: Vec<u32> = reshuffled.iter().map(|t| t.id).collect();
    before.sort_unstable();
    after.sort_unstable();
    assert_eq!(before, after);
  }

  #[test]
  fn next_id_follows_highest() {
    let players: Vec<Player> = (1..=4).map(player).collect();
    let teams = generate_teams(&players, 5).unwrap();
    assert_eq!(next_team_id(&teams), 3);
    assert_eq!(next_team_id(&[]), 1);
  }
}
