use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::operation::Operation;
use crate::session::QuizConfig;

pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Last-used settings, restored on the next run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub player_name: String,
    pub operation: Operation,
    pub tables: Vec<u32>,
    pub digits: u32,
    pub questions: usize,
    pub time_per_question: u32,
}

impl Default for Config {
    fn default() -> Self {
        let quiz = QuizConfig::default();
        Self {
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            operation: quiz.operation,
            tables: quiz.operand_pool,
            digits: quiz.digit_count,
            questions: quiz.question_count,
            time_per_question: quiz.time_per_question,
        }
    }
}

impl Config {
    pub fn from_quiz(quiz: &QuizConfig, player_name: &str) -> Self {
        Self {
            player_name: player_name.to_string(),
            operation: quiz.operation,
            tables: quiz.operand_pool.clone(),
            digits: quiz.digit_count,
            questions: quiz.question_count,
            time_per_question: quiz.time_per_question,
        }
    }

    pub fn quiz_config(&self) -> QuizConfig {
        QuizConfig::new(self.operation)
            .with_operand_pool(self.tables.iter().copied())
            .with_digit_count(self.digits)
            .with_question_count(self.questions)
            .with_time_per_question(self.time_per_question)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("mathdash_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("ignoring unreadable config {}: {}", self.path.display(), e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            player_name: "Zoe".into(),
            operation: Operation::Division,
            tables: vec![3, 4],
            digits: 1,
            questions: 20,
            time_per_question: 15,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn garbage_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"player_name":"Leo"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.player_name, "Leo");
        assert_eq!(cfg.questions, Config::default().questions);
    }

    #[test]
    fn quiz_config_conversion() {
        let quiz = QuizConfig::new(Operation::Multiplication)
            .with_operand_pool([9, 2])
            .with_question_count(12);
        let cfg = Config::from_quiz(&quiz, "Ivy");
        assert_eq!(cfg.player_name, "Ivy");
        assert_eq!(cfg.quiz_config(), quiz);
    }
}
