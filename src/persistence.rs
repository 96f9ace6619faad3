use crate::errors::TournamentError;
use crate::session::TournamentSession;

use std::fs;
use std::path::Path;
use tracing::info;

// ── Session persistence ────────────────────────────────────────────────

/// Pretty-printed JSON, same shape the session serializes to. The blob
/// carries the full engine state, so loading needs no rebuild step.
pub fn session_to_json(session: &TournamentSession) -> Result<String, TournamentError> {
  serde_json::to_string_pretty(session).map_err(|e| TournamentError::Storage {
    op: "encode",
    path: String::new(),
    message: e.to_string(),
  })
}

pub fn session_from_json(data: &str) -> Result<TournamentSession, TournamentError> {
  serde_json::from_str(data).map_err(|e| TournamentError::Storage {
    op: "parse",
    path: String::new(),
    message: e.to_string(),
  })
}

pub fn save_session(session: &TournamentSession, path: &Path) -> Result<(), TournamentError> {
  let payload = serde_json::to_string_pretty(session).map_err(|e| TournamentError::Storage {
    op: "encode",
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  fs::write(path, payload).map_err(|e| TournamentError::Storage {
    op: "write",
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  info!(path = %path.display(), "session saved");
  Ok(())
}

pub fn load_session(path: &Path) -> Result<TournamentSession, TournamentError> {
  let data = fs::read_to_string(path).map_err(|e| TournamentError::Storage {
    op: "read",
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  let session = serde_json::from_str(&data).map_err(|e| TournamentError::Storage {
    op: "parse",
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  info!(path = %path.display(), "session loaded");
  Ok(session)
}

/// A missing file starts a fresh night instead of failing.
pub fn load_session_or_default(path: &Path) -> Result<TournamentSession, TournamentError> {
  if !path.is_file() {
    return Ok(TournamentSession::new());
  }
  load_session(path)
}
