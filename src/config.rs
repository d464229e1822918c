// ⚙️ Data Configuration - where the datasets live
// Every request reloads from these paths; nothing is cached

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "LAVANDERIO_DATA_DIR";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const PORTFOLIO_FILE: &str = "sample_clients.csv";
pub const CUSTOMERS_FILE: &str = "clientes_lavanderio.csv";
pub const TRANSACTIONS_FILE: &str = "transacoes_financeiras.csv";
pub const METRICS_FILE: &str = "metricas_lavanderio.csv";
pub const CONTEXT_FILE: &str = "contexto_lavanderio.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub portfolio_file: String,
    pub customers_file: String,
    pub transactions_file: String,
    pub metrics_file: String,
    pub context_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig::new(DEFAULT_DATA_DIR)
    }
}

impl DataConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        DataConfig {
            data_dir: data_dir.into(),
            portfolio_file: PORTFOLIO_FILE.to_string(),
            customers_file: CUSTOMERS_FILE.to_string(),
            transactions_file: TRANSACTIONS_FILE.to_string(),
            metrics_file: METRICS_FILE.to_string(),
            context_file: CONTEXT_FILE.to_string(),
        }
    }

    /// Reads `LAVANDERIO_DATA_DIR`, falling back to `./data`
    pub fn from_env() -> Self {
        match env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => DataConfig::new(dir),
            _ => DataConfig::default(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn portfolio_path(&self) -> PathBuf {
        self.data_dir.join(&self.portfolio_file)
    }

    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join(&self.customers_file)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.data_dir.join(&self.transactions_file)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join(&self.metrics_file)
    }

    pub fn context_path(&self) -> PathBuf {
        self.data_dir.join(&self.context_file)
    }
}
