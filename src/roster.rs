use crate::errors::TournamentError;
use crate::types::{Gender, Player, PlayerId};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

// ── Roster ─────────────────────────────────────────────────────────────

/// Players signed up for the current tournament night.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerRoster {
    players: Vec<Player>,
    next_player_id: PlayerId,
}

impl PlayerRoster {
    pub fn add_player(
        &mut self,
        first_name: &str,
        last_name: &str,
        nickname: Option<&str>,
        gender: Gender,
    ) -> Result<&Player, TournamentError> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(TournamentError::MissingPlayerName);
        }
        let nickname = nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        self.next_player_id += 1;
        self.players.push(Player {
            id: self.next_player_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            nickname,
            gender,
            paid: false,
        });
        Ok(self.players.last().expect("just pushed"))
    }

    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<Player, TournamentError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(TournamentError::PlayerNotFound(player_id))?;
        Ok(self.players.remove(index))
    }

    /// Flip the paid flag; returns the new value.
    pub fn toggle_paid(&mut self, player_id: PlayerId) -> Result<bool, TournamentError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(TournamentError::PlayerNotFound(player_id))?;
        player.paid = !player.paid;
        Ok(player.paid)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn all(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn paid_count(&self) -> usize {
        self.players.iter().filter(|p| p.paid).count()
    }

    pub fn female_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.gender == Gender::Female)
            .count()
    }

    fn contains_identity(&self, saved: &SavedPlayer) -> bool {
        self.players.iter().any(|p| saved.matches(p))
    }
}

// ── Saved player database ──────────────────────────────────────────────

/// Identity of a regular, kept across tournament nights. Paid status
/// and ids are per-night and never stored here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlayer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub gender: Gender,
}

impl SavedPlayer {
    fn from_player(player: &Player) -> Self {
        SavedPlayer {
            first_name: player.first_name.clone(),
            last_name: player.last_name.clone(),
            nickname: player.nickname.clone(),
            gender: player.gender,
        }
    }

    fn matches(&self, player: &Player) -> bool {
        self.first_name == player.first_name
            && self.last_name == player.last_name
            && self.nickname == player.nickname
            && self.gender == player.gender
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDatabase {
    saved: Vec<SavedPlayer>,
}

impl PlayerDatabase {
    /// Remember a player for future nights; duplicates are dropped.
    /// Returns true when the player was actually added.
    pub fn remember(&mut self, player: &Player) -> bool {
        let entry = SavedPlayer::from_player(player);
        if self.saved.contains(&entry) {
            return false;
        }
        self.saved.push(entry);
        true
    }

    /// Add every saved player not already on the roster, with fresh
    /// ids and unpaid. Returns how many were added.
    pub fn merge_into(&self, roster: &mut PlayerRoster) -> Result<usize, TournamentError> {
        if self.saved.is_empty() {
            return Err(TournamentError::NoSavedPlayers);
        }
        let mut added = 0;
        for saved in &self.saved {
            if roster.contains_identity(saved) {
                continue;
            }
            roster.add_player(
                &saved.first_name,
                &saved.last_name,
                saved.nickname.as_deref(),
                saved.gender,
            )?;
            added += 1;
        }
        info!(added, "saved players merged into roster");
        Ok(added)
    }

    pub fn clear(&mut self) {
        self.saved.clear();
    }

    pub fn all(&self) -> &[SavedPlayer] {
        &self.saved
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// A missing file is an empty database, matching first-run behavior.
    pub fn load(path: &Path) -> Result<Self, TournamentError> {
        if !path.is_file() {
            return Ok(PlayerDatabase::default());
        }
        let data = fs::read_to_string(path).map_err(|e| TournamentError::Storage {
            op: "read",
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&data).map_err(|e| TournamentError::Storage {
            op: "parse",
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), TournamentError> {
        let payload = serde_json::to_string_pretty(self).map_err(|e| TournamentError::Storage {
            op: "encode",
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(path, payload).map_err(|e| TournamentError::Storage {
            op: "write",
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assigns_sequential_ids_and_trims() {
        let mut roster = PlayerRoster::default();
        let id1 = roster
            .add_player("  Alice ", "Smith", Some(" Ace "), Gender::Female)
            .unwrap()
            .id;
        let id2 = roster
            .add_player("Bob", "Jones", Some(""), Gender::Male)
            .unwrap()
            .id;
        assert_eq!((id1, id2), (1, 2));

        let alice = roster.get(1).unwrap();
        assert_eq!(alice.first_name, "Alice");
        assert_eq!(alice.nickname.as_deref(), Some("Ace"));
        assert_eq!(alice.display_name(), "Alice \"Ace\" Smith");
        assert!(roster.get(2).unwrap().nickname.is_none());
    }

    #[test]
    fn add_requires_both_names() {
        let mut roster = PlayerRoster::default();
        assert_eq!(
            roster.add_player("", "Smith", None, Gender::Male).err(),
            Some(TournamentError::MissingPlayerName)
        );
        assert_eq!(
            roster.add_player("Al", "   ", None, Gender::Male).err(),
            Some(TournamentError::MissingPlayerName)
        );
    }

    #[test]
    fn toggle_and_counts() {
        let mut roster = PlayerRoster::default();
        roster.add_player("A", "A", None, Gender::Female).unwrap();
        roster.add_player("B", "B", None, Gender::Male).unwrap();
        assert!(roster.toggle_paid(1).unwrap());
        assert_eq!(roster.paid_count(), 1);
        assert_eq!(roster.female_count(), 1);
        assert!(!roster.toggle_paid(1).unwrap());
        assert_eq!(roster.paid_count(), 0);
        assert_eq!(
            roster.toggle_paid(99),
            Err(TournamentError::PlayerNotFound(99))
        );
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut roster = PlayerRoster::default();
        roster.add_player("A", "A", None, Gender::Male).unwrap();
        roster.remove_player(1).unwrap();
        let id = roster.add_player("B", "B", None, Gender::Male).unwrap().id;
        assert_eq!(id, 2);
    }

    #[test]
    fn database_dedups_on_identity() {
        let mut roster = PlayerRoster::default();
        roster.add_player("A", "A", None, Gender::Male).unwrap();
        let player = roster.get(1).unwrap().clone();

        let mut db = PlayerDatabase::default();
        assert!(db.remember(&player));
        assert!(!db.remember(&player));
        assert_eq!(db.all().len(), 1);
    }

    #[test]
    fn merge_skips_players_already_present() {
        let mut db = PlayerDatabase::default();
        let mut source = PlayerRoster::default();
        source.add_player("A", "A", None, Gender::Male).unwrap();
        source.add_player("B", "B", None, Gender::Female).unwrap();
        for p in source.all() {
            db.remember(p);
        }

        let mut roster = PlayerRoster::default();
        roster.add_player("A", "A", None, Gender::Male).unwrap();
        let added = db.merge_into(&mut roster).unwrap();
        assert_eq!(added, 1);
        assert_eq!(roster.len(), 2);
        // Merged players always start unpaid.
        assert!(roster.all().iter().all(|p| !p.paid));
    }

    #[test]
    fn merge_on_empty_database_is_refused() {
        let db = PlayerDatabase::default();
        let mut roster = PlayerRoster::default();
        assert_eq!(
            db.merge_into(&mut roster),
            Err(TournamentError::NoSavedPlayers)
        );
    }

    #[test]
    fn database_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.json");

        let mut roster = PlayerRoster::default();
        roster.add_player("A", "A", Some("Ace"), Gender::Female).unwrap();
        let mut db = PlayerDatabase::default();
        db.remember(roster.get(1).unwrap());

        db.save(&path).unwrap();
        let loaded = PlayerDatabase::load(&path).unwrap();
        assert_eq!(loaded, db);

        // Missing file reads as empty.
        let missing = PlayerDatabase::load(&dir.path().join("nope.json")).unwrap();
        assert!(missing.is_empty());
    }
}
