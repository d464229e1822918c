// 📂 Dataset Loader - CSV → typed rows
// Every table declares its required columns; a missing column fails the whole load

use crate::config::DataConfig;
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

// ============================================================================
// TABLE CONTRACT
// ============================================================================

/// A CSV-backed row type with a fixed header contract
pub trait Table: DeserializeOwned {
    /// Name used in error messages and logs
    const DATASET: &'static str;

    /// Columns that must be present in the header
    const REQUIRED_COLUMNS: &'static [&'static str];
}

// ============================================================================
// PORTFOLIO DEBTOR (sample_clients.csv)
// ============================================================================

/// One row of the collections portfolio
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Debtor {
    #[serde(rename = "cliente_id")]
    pub id: String,

    #[serde(rename = "nome_empresa")]
    pub company_name: String,

    #[serde(rename = "valor_devido")]
    pub debt: f64,

    #[serde(rename = "dias_atraso")]
    pub delay_days: u32,

    /// Raw history label, see [`PaymentHistory::from_label`]
    #[serde(rename = "historico_pagamento")]
    pub payment_history: String,

    #[serde(rename = "setor")]
    pub sector: String,

    #[serde(rename = "porte")]
    pub size: String,

    #[serde(rename = "score_credito")]
    pub credit_score: f64,

    #[serde(rename = "canal_preferido")]
    pub preferred_channel: String,
}

impl Debtor {
    pub fn history(&self) -> PaymentHistory {
        PaymentHistory::from_label(&self.payment_history)
    }

    pub fn is_delinquent(&self) -> bool {
        self.delay_days > 0
    }
}

impl Table for Debtor {
    const DATASET: &'static str = "sample_clients.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "cliente_id",
        "nome_empresa",
        "valor_devido",
        "dias_atraso",
        "historico_pagamento",
        "setor",
        "porte",
        "score_credito",
        "canal_preferido",
    ];
}

/// Payment history category of a debtor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentHistory {
    Good,
    Regular,
    Poor,
    /// Any label outside the three known ones
    Other,
}

impl PaymentHistory {
    pub const ALL_KNOWN: [PaymentHistory; 3] = [
        PaymentHistory::Good,
        PaymentHistory::Regular,
        PaymentHistory::Poor,
    ];

    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "bom_pagador" => PaymentHistory::Good,
            "regular" => PaymentHistory::Regular,
            "mal_pagador" => PaymentHistory::Poor,
            _ => PaymentHistory::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentHistory::Good => "bom_pagador",
            PaymentHistory::Regular => "regular",
            PaymentHistory::Poor => "mal_pagador",
            PaymentHistory::Other => "outro",
        }
    }
}

// ============================================================================
// CUSTOMER ACCOUNT (clientes_lavanderio.csv)
// ============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Customer {
    #[serde(rename = "customer_id")]
    pub id: String,

    #[serde(rename = "razao_social")]
    pub company_name: String,

    #[serde(rename = "cnpj", default)]
    pub cnpj: Option<String>,

    #[serde(rename = "plano_servico")]
    pub plan: String,

    #[serde(rename = "faturamento_mensal")]
    pub monthly_revenue: f64,

    #[serde(rename = "dias_atraso")]
    pub delay_days: u32,

    #[serde(rename = "ultima_cobranca", default)]
    pub last_billed: Option<NaiveDate>,

    #[serde(rename = "canal_contato")]
    pub channel: String,

    #[serde(rename = "score_neofin")]
    pub score: u32,

    #[serde(rename = "status_conta")]
    pub status: String,

    #[serde(rename = "setor_cliente")]
    pub sector: String,

    #[serde(rename = "regiao")]
    pub region: String,

    #[serde(rename = "tipo_contrato")]
    pub contract_type: String,
}

impl Customer {
    pub fn is_active(&self) -> bool {
        self.status == "ativo"
    }

    pub fn is_defaulting(&self) -> bool {
        self.status == "inadimplente"
    }
}

impl Table for Customer {
    const DATASET: &'static str = "clientes_lavanderio.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "razao_social",
        "plano_servico",
        "faturamento_mensal",
        "dias_atraso",
        "canal_contato",
        "score_neofin",
        "status_conta",
        "setor_cliente",
        "regiao",
        "tipo_contrato",
    ];
}

// ============================================================================
// TRANSACTION (transacoes_financeiras.csv)
// ============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Transaction {
    #[serde(rename = "transaction_id", default)]
    pub id: Option<String>,

    #[serde(rename = "customer_id")]
    pub customer_id: String,

    #[serde(rename = "data_vencimento")]
    pub due_date: NaiveDate,

    #[serde(rename = "valor_original")]
    pub original_value: f64,

    /// Empty when nothing was paid
    #[serde(rename = "valor_pago")]
    pub paid_value: Option<f64>,

    #[serde(rename = "data_pagamento", default)]
    pub payment_date: Option<NaiveDate>,

    #[serde(rename = "tipo_servico", default)]
    pub service_type: Option<String>,

    #[serde(rename = "metodo_pagamento", default)]
    pub payment_method: Option<String>,

    #[serde(rename = "juros_aplicados", default)]
    pub interest: Option<f64>,

    #[serde(rename = "status_transacao", default)]
    pub status: Option<String>,

    #[serde(rename = "mes_competencia", default)]
    pub accrual_month: Option<String>,
}

impl Transaction {
    pub fn paid(&self) -> f64 {
        self.paid_value.unwrap_or(0.0)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_date.is_some()
    }
}

impl Table for Transaction {
    const DATASET: &'static str = "transacoes_financeiras.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "valor_original",
        "valor_pago",
        "data_vencimento",
    ];
}

// ============================================================================
// MONTHLY METRIC (metricas_lavanderio.csv)
// ============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MonthlyMetric {
    /// Month tag, `YYYY-MM`
    #[serde(rename = "mes_ano")]
    pub month: String,

    #[serde(rename = "receita_recorrente", default)]
    pub recurring_revenue: Option<f64>,

    #[serde(rename = "receita_total")]
    pub revenue: f64,

    #[serde(rename = "taxa_inadimplencia")]
    pub delinquency_rate: f64,

    #[serde(rename = "cac")]
    pub cac: f64,

    #[serde(rename = "ltv")]
    pub ltv: f64,

    #[serde(rename = "churn_rate")]
    pub churn_rate: f64,

    #[serde(rename = "ticket_medio")]
    pub average_ticket: f64,

    #[serde(rename = "novos_clientes", default)]
    pub new_clients: Option<u32>,

    #[serde(rename = "clientes_ativos")]
    pub active_clients: u32,

    #[serde(rename = "margem_bruta")]
    pub gross_margin: f64,
}

impl Table for MonthlyMetric {
    const DATASET: &'static str = "metricas_lavanderio.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "mes_ano",
        "receita_total",
        "taxa_inadimplencia",
        "churn_rate",
        "cac",
        "ltv",
        "ticket_medio",
        "clientes_ativos",
        "margem_bruta",
    ];
}

// ============================================================================
// COMPANY CONTEXT (contexto_lavanderio.json)
// ============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompanyContext {
    #[serde(rename = "empresa")]
    pub company: CompanyInfo,

    #[serde(rename = "negocio")]
    pub business: BusinessInfo,

    #[serde(rename = "solucao_neofin")]
    pub solution: SolutionInfo,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompanyInfo {
    #[serde(rename = "nome")]
    pub name: String,

    #[serde(rename = "fundacao")]
    pub founded: String,

    #[serde(rename = "sede", default)]
    pub headquarters: Option<String>,

    #[serde(rename = "filiais", default)]
    pub branches: Option<u32>,

    #[serde(rename = "funcionarios", default)]
    pub employees: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BusinessInfo {
    #[serde(rename = "modelo")]
    pub model: String,

    #[serde(rename = "segmentos")]
    pub segments: Vec<String>,

    #[serde(rename = "capacidade_diaria")]
    pub daily_capacity: String,

    #[serde(rename = "territorio", default)]
    pub territory: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SolutionInfo {
    #[serde(rename = "implementacao")]
    pub implemented: String,

    #[serde(rename = "modulos")]
    pub modules: Vec<String>,
}

// ============================================================================
// LOADING
// ============================================================================

/// Check a CSV header against the required column list
pub fn validate_columns(
    dataset: &'static str,
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalyticsError::MissingColumns { dataset, missing })
    }
}

/// Parse a table from any reader (header row first)
pub fn read_table<T: Table, R: Read>(reader: R) -> Result<Vec<T>> {
    let csv_err = |source| AnalyticsError::Csv {
        dataset: T::DATASET,
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    validate_columns(T::DATASET, &headers, T::REQUIRED_COLUMNS)?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result.map_err(csv_err)?;
        rows.push(row);
    }

    Ok(rows)
}

pub fn load_table<T: Table>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|source| AnalyticsError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let rows = read_table::<T, _>(file)?;
    debug!(dataset = T::DATASET, rows = rows.len(), "Loaded table");

    Ok(rows)
}

pub fn load_context(path: &Path) -> Result<CompanyContext> {
    let file = File::open(path).map_err(|source| AnalyticsError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let context: CompanyContext = serde_json::from_reader(file)?;
    debug!(path = %path.display(), "Loaded company context");

    Ok(context)
}

/// Everything the chart generator and the keyword lookup read
#[derive(Debug, Clone)]
pub struct Datasets {
    pub customers: Vec<Customer>,
    pub transactions: Vec<Transaction>,
    pub metrics: Vec<MonthlyMetric>,
    pub context: CompanyContext,
}

impl Datasets {
    pub fn load(config: &DataConfig) -> Result<Self> {
        Ok(Datasets {
            customers: load_table(&config.customers_path())?,
            transactions: load_table(&config.transactions_path())?,
            metrics: load_table(&config.metrics_path())?,
            context: load_context(&config.context_path())?,
        })
    }

    /// Transactions belonging to one customer, in file order
    pub fn transactions_for<'a>(
        &'a self,
        customer_id: &'a str,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions
            .iter()
            .filter(move |tx| tx.customer_id == customer_id)
    }

    pub fn latest_metric(&self) -> Option<&MonthlyMetric> {
        self.metrics.last()
    }
}
