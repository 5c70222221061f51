//! Configuration access port trait.

use std::path::PathBuf;

/// Read-only access to `[section] key = value` settings. Numeric keys are
/// parsed by `config_validation::read_number`, which never defaults a
/// present but malformed value.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Non-empty trimmed value as a path.
    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}
