//! Persistent storage for the Gemini API key: one literal string at a fixed
//! well-known path. Deliberately a low-security convenience store, not a
//! vault; anything with filesystem access can read it.

use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Whether a stored credential counts as configured. The empty string is
/// storable but reads as absent; no other shape validation exists.
pub fn is_present(credential: &str) -> bool {
    !credential.is_empty()
}

#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn open_default() -> Self {
        Self {
            path: home_dir().join(".casedesk").join("api_key"),
        }
    }

    #[cfg(test)]
    pub(crate) fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the stored key. A missing file is simply "no key yet"; an
    /// unreadable one is logged and treated the same so startup never fails.
    pub fn load(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(value) => value,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                warn!("failed to read credential file {}: {err}", self.path.display());
                String::new()
            }
        }
    }

    /// Persist exactly what was written, including the empty string. Atomic
    /// replace via a temp file so a crash mid-write never truncates the key.
    pub fn save(&self, value: &str) -> io::Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "key path has no parent"))?;
        fs::create_dir_all(dir)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, value)?;
        match fs::rename(&tmp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                    fs::rename(&tmp_path, &self.path)?;
                    Ok(())
                } else {
                    Err(rename_err)
                }
            }
        }
    }
}
