use crate::errors::TournamentError;
use crate::types::{PlayerId, MASTER_OUT_MAX};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::info;

// ── Master Out possibility map ─────────────────────────────────────────

/// True at index n when n can be finished in up to three darts with the
/// last dart a double, a triple, or the 50 bull. Non-final darts may be
/// any single (1-20), double, triple, 25 or 50.
fn possible_out_map() -> &'static [bool] {
  static MAP: OnceLock<Vec<bool>> = OnceLock::new();
  MAP.get_or_init(|| {
    let max = MASTER_OUT_MAX as usize;
    let mut map = vec![false; max + 1];

    let mut dart_scores = Vec::new();
    for v in 1..=20u32 {
      dart_scores.push(v);
      dart_scores.push(2 * v);
      dart_scores.push(3 * v);
    }
    dart_scores.push(25);
    dart_scores.push(50);

    let mut finishing_darts = Vec::new();
    for v in 1..=20u32 {
      finishing_darts.push(2 * v);
      finishing_darts.push(3 * v);
    }
    finishing_darts.push(50);

    let mut mark = |total: u32| {
      if (1..=MASTER_OUT_MAX).contains(&total) {
        map[total as usize] = true;
      }
    };
    for &last in &finishing_darts {
      mark(last);
    }
    for &d1 in &dart_scores {
      for &last in &finishing_darts {
        mark(d1 + last);
      }
    }
    for &d1 in &dart_scores {
      for &d2 in &dart_scores {
        for &last in &finishing_darts {
          mark(d1 + d2 + last);
        }
      }
    }
    map
  })
}

pub fn is_possible_out(out_number: u32) -> bool {
  (1..=MASTER_OUT_MAX).contains(&out_number) && possible_out_map()[out_number as usize]
}

// ── Master Out board ───────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterOutEntry {
  pub id: u32,
  pub player_id: PlayerId,
  pub out_number: u32,
  pub timestamp: DateTime<Utc>,
}

/// One cell of the 1-180 board: who called the number first, who came
/// later, and whether the number can be finished at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterOutCell {
  pub out_number: u32,
  pub possible: bool,
  pub first_player: Option<PlayerId>,
  pub other_players: Vec<PlayerId>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasterOutBoard {
  entries: Vec<MasterOutEntry>,
  next_entry_id: u32,
}

impl MasterOutBoard {
  /// Claim an out number for a player. Numbers with no possible Master
  /// Out are refused; multiple players may claim the same number.
  pub fn add_entry(
    &mut self,
    player_id: PlayerId,
    out_number: u32,
    now: DateTime<Utc>,
  ) -> Result<&MasterOutEntry, TournamentError> {
    if !(1..=MASTER_OUT_MAX).contains(&out_number) {
      return Err(TournamentError::OutNumberOutOfRange(out_number));
    }
    if !is_possible_out(out_number) {
      return Err(TournamentError::ImpossibleOut(out_number));
    }
    self.next_entry_id += 1;
    self.entries.push(MasterOutEntry {
      id: self.next_entry_id,
      player_id,
      out_number,
      timestamp: now,
    });
    info!(player = player_id, out_number, "master out recorded");
    Ok(self.entries.last().expect("just pushed"))
  }

  pub fn entries(&self) -> &[MasterOutEntry] {
    &self.entries
  }

  /// Full 1-180 board in display order.
  pub fn cells(&self) -> Vec<MasterOutCell> {
    (1..=MASTER_OUT_MAX)
      .map(|n| {
        let mut claimants = self
          .entries
          .iter()
          .filter(|e| e.out_number == n)
          .map(|e| e.player_id);
        let first_player = claimants.next();
        MasterOutCell {
          out_number: n,
          possible: is_possible_out(n),
          first_player,
          other_players: claimants.collect(),
        }
      })
      .collect()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}

// ── Big Hits ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigHit {
  pub id: u32,
  pub player_id: PlayerId,
  pub shot_type: String,
  pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BigHitLog {
  entries: Vec<BigHit>,
  next_entry_id: u32,
}

impl BigHitLog {
  pub fn add_entry(
    &mut self,
    player_id: PlayerId,
    shot_type: &str,
    now: DateTime<Utc>,
  ) -> Result<&BigHit, TournamentError> {
    let shot_type = shot_type.trim();
    if shot_type.is_empty() {
      return Err(TournamentError::MissingShotType);
    }
    self.next_entry_id += 1;
    self.entries.push(BigHit {
      id: self.next_entry_id,
      player_id,
      shot_type: shot_type.to_string(),
      timestamp: now,
    });
    info!(player = player_id, shot_type, "big hit recorded");
    Ok(self.entries.last().expect("just pushed"))
  }

  /// Entries in timestamp order (stable for equal stamps).
  pub fn sorted_entries(&self) -> Vec<&BigHit> {
    let mut list: Vec<&BigHit> = self.entries.iter().collect();
    list.sort_by_key(|e| e.timestamp);
    list
  }

  pub fn entries(&self) -> &[BigHit] {
    &self.entries
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
  }

  #[test]
  fn known_possible_and_impossible_outs() {
    // The classic gaps near the top of the board.
    for n in [169, 172, 173, 175, 176, 178, 179] {
      assert!(!is_possible_out(n), "{n} should be impossible");
    }
    for n in [2, 50, 167, 170, 171, 174, 177, 180] {
      assert!(is_possible_out(n), "{n} should be possible");
    }
    // 1 cannot be finished on a double/triple/bull.
    assert!(!is_possible_out(1));
    assert!(!is_possible_out(0));
    assert!(!is_possible_out(181));
  }

  #[test]
  fn board_rejects_invalid_numbers() {
    let mut board = MasterOutBoard::default();
    assert_eq!(
      board.add_entry(1, 181, at(0)).err(),
      Some(TournamentError::OutNumberOutOfRange(181))
    );
    assert_eq!(
      board.add_entry(1, 169, at(0)).err(),
      Some(TournamentError::ImpossibleOut(169))
    );
    assert!(board.entries().is_empty());
  }

  #[test]
  fn first_claimant_keeps_the_cell() {
    let mut board = MasterOutBoard::default();
    board.add_entry(7, 120, at(0)).unwrap();
    board.add_entry(9, 120, at(1)).unwrap();
    board.add_entry(7, 60, at(2)).unwrap();

    let cells = board.cells();
    let cell_120 = &cells[119];
    assert_eq!(cell_120.out_number, 120);
    assert_eq!(cell_120.first_player, Some(7));
    assert_eq!(cell_120.other_players, vec![9]);

    let cell_169 = &cells[168];
    assert!(!cell_169.possible);
    assert_eq!(cell_169.first_player, None);
  }

  #[test]
  fn big_hits_sort_by_time() {
    let mut log = BigHitLog::default();
    log.add_entry(1, "180", at(5)).unwrap();
    log.add_entry(2, "Bullseye finish", at(1)).unwrap();
    assert_eq!(
      log.add_entry(3, "   ", at(2)).err(),
      Some(TournamentError::MissingShotType)
    );

    let sorted = log.sorted_entries();
    assert_eq!(sorted.len(), 2);
    assert_eq!(sorted[0].player_id, 2);
    assert_eq!(sorted[1].shot_type, "180");
  }
}
