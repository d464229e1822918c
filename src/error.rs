// ⚠️ Error types - one enum for the whole library
// Binaries wrap these in anyhow; the HTTP layer maps them to status codes

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// File could not be opened or read
    #[error("Erro ao ler arquivo {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV row could not be parsed into its typed record
    #[error("Erro ao ler {dataset}: {source}")]
    Csv {
        dataset: &'static str,
        #[source]
        source: csv::Error,
    },

    /// Context document is not valid JSON for its schema
    #[error("Erro ao ler contexto da empresa: {0}")]
    Json(#[from] serde_json::Error),

    /// Required columns absent from a CSV header
    #[error("Colunas obrigatórias não encontradas em {dataset}: {missing:?}")]
    MissingColumns {
        dataset: &'static str,
        missing: Vec<String>,
    },

    #[error("Nenhum registro encontrado em {0}")]
    EmptyDataset(&'static str),

    #[error("Invalid analysisType: {0}")]
    InvalidAnalysisType(String),

    #[error("Tipo de gráfico não suportado: {0}")]
    UnsupportedChartType(String),

    /// Request body is missing a mandatory field
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Request body is not the JSON object the endpoint expects
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Built-in detection pattern failed to compile
    #[error("Padrão de detecção inválido: {0}")]
    Pattern(#[from] regex::Error),
}

impl AnalyticsError {
    /// True when the caller sent a bad request rather than the data being broken
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidAnalysisType(_)
                | AnalyticsError::UnsupportedChartType(_)
                | AnalyticsError::MissingField(_)
                | AnalyticsError::InvalidBody(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
