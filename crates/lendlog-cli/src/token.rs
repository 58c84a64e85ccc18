//! The persisted session, stored as JSON between invocations.

use std::{
  fs,
  io::{self, Write},
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use lendlog_core::session::Session;

/// `~/.config/lendlog/token`, or a relative `lendlog-token` without `$HOME`.
pub fn default_path() -> PathBuf {
  match std::env::var("HOME") {
    Ok(home) => PathBuf::from(home).join(".config/lendlog/token"),
    Err(_) => PathBuf::from("lendlog-token"),
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

/// The saved session, or `None` if nobody is signed in.
pub fn load(path: &Path) -> Result<Option<Session>> {
  let raw = match fs::read_to_string(path) {
    Ok(raw) => raw,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(e).with_context(|| format!("reading token file {}", path.display())),
  };
  let session = serde_json::from_str(&raw)
    .with_context(|| format!("parsing token file {}", path.display()))?;
  Ok(Some(session))
}

/// Write the session, creating the file owner-only on unix.
pub fn save(path: &Path, session: &Session) -> Result<()> {
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
  }
  let raw = serde_json::to_string_pretty(session)?;

  let mut options = fs::OpenOptions::new();
  options.write(true).create(true).truncate(true);
  #[cfg(unix)]
  {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
  }
  let mut file = options
    .open(path)
    .with_context(|| format!("opening token file {}", path.display()))?;

  // `mode` only applies on creation; narrow a file left by an older run.
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
  }
  file
    .write_all(raw.as_bytes())
    .with_context(|| format!("writing token file {}", path.display()))?;
  Ok(())
}

/// Forget the saved session. A missing file is not an error.
pub fn clear(path: &Path) -> Result<()> {
  match fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e).with_context(|| format!("removing token file {}", path.display())),
  }
}
