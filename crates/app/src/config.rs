use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "khatma.db";
const DATASET_FILE_NAME: &str = "pages-simple.json";

pub const DB_ENV: &str = "KHATMA_DB";
pub const DATASET_ENV: &str = "KHATMA_DATASET";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "khatma", "khatma")
}

impl Config {
    /// Reads `path`, or `config.toml` in the platform config dir. A missing file means defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME)),
        };

        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("read config {}", path.display()))?;
                toml::from_str::<Config>(&raw)
                    .with_context(|| format!("parse config {}", path.display()))?
            }
            _ => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(db) = std::env::var_os(DB_ENV) {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(dataset) = std::env::var_os(DATASET_ENV) {
            self.dataset_path = Some(PathBuf::from(dataset));
        }
    }

    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        let path = match &self.db_path {
            Some(path) => path.clone(),
            None => {
                let dirs = project_dirs().context("resolve project dirs")?;
                dirs.config_dir().join(DB_FILE_NAME)
            }
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        Ok(path)
    }

    pub fn dataset_path(&self) -> anyhow::Result<PathBuf> {
        match &self.dataset_path {
            Some(path) => Ok(path.clone()),
            None => {
                let dirs = project_dirs().context("resolve project dirs")?;
                Ok(dirs.data_dir().join(DATASET_FILE_NAME))
            }
        }
    }
}
