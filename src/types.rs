use serde::{Deserialize, Serialize};

// ── Constants ──────────────────────────────────────────────────────────

pub const MIN_TEAMS_FOR_BRACKET: usize = 2;
pub const MIN_PLAYERS_FOR_TEAMS: usize = 2;
pub const MAX_BOARD_NUMBER: u32 = 20;
pub const MASTER_OUT_MAX: u32 = 180;
pub const HONEY_POT_DEFAULT_THRESHOLD: u32 = 4;

// ── Ids ────────────────────────────────────────────────────────────────

pub type PlayerId = u32;
pub type TeamId = u32;
pub type MatchId = u32;

// ── Players ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  #[serde(rename = "M")]
  Male,
  #[serde(rename = "F")]
  Female,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
  pub id: PlayerId,
  pub first_name: String,
  pub last_name: String,
  #[serde(default)]
  pub nickname: Option<String>,
  pub gender: Gender,
  #[serde(default)]
  pub paid: bool,
}

impl Player {
  /// `First "Nick" Last` when a nickname is set, `First Last` otherwise.
  pub fn display_name(&self) -> String {
    match &self.nickname {
      Some(nick) if !nick.is_empty() => {
        format!("{} \"{}\" {}", self.first_name, nick, self.last_name)
      }
      _ => format!("{} {}", self.first_name, self.last_name),
    }
  }
}

// ── Teams ──────────────────────────────────────────────────────────────

/// A team embeds copies of its players; roster edits that touch a team
/// member invalidate the team list rather than patching it in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
  pub id: TeamId,
  pub player1: Player,
  #[serde(default)]
  pub player2: Option<Player>,
}

impl Team {
  pub fn is_solo(&self) -> bool {
    self.player2.is_none()
  }

  pub fn has_player(&self, player_id: PlayerId) -> bool {
    self.player1.id == player_id
      || self.player2.as_ref().is_some_and(|p| p.id == player_id)
  }

  pub fn label(&self) -> String {
    let p1 = self.player1.display_name();
    match &self.player2 {
      Some(p2) => format!("Team {}: {} & {}", self.id, p1, p2.display_name()),
      None => format!("Team {}: {} + (bye)", self.id, p1),
    }
  }
}
