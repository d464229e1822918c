// LavandeRio Analytics - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod config;
pub mod stats;
pub mod dataset;          // CSV tables + company context
pub mod analyzer;         // Collections portfolio analyses
pub mod charts;           // Chart-ready series from keyword dispatch
pub mod chart_detection;  // Is this answer worth a chart?
pub mod rag;              // Keyword lookup over pre-rendered blocks

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{AnalyticsError, Result};
pub use config::DataConfig;
pub use dataset::{
    Debtor, Customer, Transaction, MonthlyMetric, CompanyContext,
    PaymentHistory, Datasets, Table,
    load_table, read_table, load_context,
};
pub use analyzer::{
    AnalysisType, AnalysisResult, CollectionAnalyzer, RiskSegment,
    SummaryStats, PriorityReport, PriorityClient, StrategyReport, InsightsReport,
    priority_score,
};
pub use charts::{
    ChartKind, ChartData, ChartPoint, ChartValue, ChartGenerator,
    generate_chart_data,
};
pub use chart_detection::{ChartDetection, detect_chartable_content};
pub use rag::{KnowledgeBase, KnowledgeItem, KnowledgeKind, rag_context, cosine_similarity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
