use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_NAME: &str = "mathdash";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Quiz history database under `$HOME/.local/state/mathdash`
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join("history.db"))
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().join("history.db"))
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_named_after_the_app() {
        if let Some(db) = AppDirs::db_path() {
            assert!(db.ends_with("history.db"));
            assert!(db.to_string_lossy().contains(APP_NAME));
        }
        if let Some(cfg) = AppDirs::config_path() {
            assert!(cfg.ends_with("config.json"));
        }
    }
}
