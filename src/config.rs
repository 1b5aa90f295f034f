//! Notes directory resolution
//!
//! Priority:
//! 1. `--dir` flag
//! 2. `KG_NOTES_DIR` environment variable (empty counts as unset)
//! 3. `~/.kg-notes`

use std::path::{Path, PathBuf};

use crate::constants as C;
use crate::store::NoteStore;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// The notes directory
    pub root: PathBuf,
    /// Whether to output in JSON format
    pub json: bool,
}

impl Context {
    pub fn new(dir: Option<&str>, json: bool) -> Self {
        Self {
            root: notes_path(dir),
            json,
        }
    }

    pub fn store(&self) -> NoteStore {
        NoteStore::new(&self.root)
    }
}

/// Resolve the notes directory from the flag, the environment and the home directory
pub fn notes_path(flag: Option<&str>) -> PathBuf {
    let env = std::env::var(C::ENV_NOTES_DIR).ok();
    resolve_notes_path(flag, env.as_deref(), dirs::home_dir().as_deref())
}

fn resolve_notes_path(flag: Option<&str>, env: Option<&str>, home: Option<&Path>) -> PathBuf {
    if let Some(dir) = flag.filter(|s| !s.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = env.filter(|s| !s.is_empty()) {
        return PathBuf::from(dir);
    }
    home.map(|h| h.join(C::DEFAULT_NOTES_DIR))
        .unwrap_or_else(|| PathBuf::from(C::DEFAULT_NOTES_DIR))
}

/// Path with forward slashes, for printing
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins() {
        let path = resolve_notes_path(Some("/flag"), Some("/env"), Some(Path::new("/home/u")));
        assert_eq!(path, PathBuf::from("/flag"));
    }

    #[test]
    fn test_env_over_home() {
        let path = resolve_notes_path(None, Some("/env"), Some(Path::new("/home/u")));
        assert_eq!(path, PathBuf::from("/env"));
        let path = resolve_notes_path(None, Some(""), Some(Path::new("/home/u")));
        assert_eq!(path, PathBuf::from("/home/u/.kg-notes"));
    }

    #[test]
    fn test_no_home() {
        assert_eq!(resolve_notes_path(None, None, None), PathBuf::from(".kg-notes"));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(Path::new("a\\b/c.md")), "a/b/c.md");
    }
}
