// 📈 Chart Generator - chart-ready series from a chart type and a free-text query
// The query is only tested for keywords (case-insensitive substring, first match wins)

use crate::config::DataConfig;
use crate::dataset::{load_table, Customer, MonthlyMetric, Table};
use crate::error::{AnalyticsError, Result};
use crate::stats::title_case;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

pub const RANKING_SIZE: usize = 10;
pub const DEFAULT_RANKING_SIZE: usize = 8;

// ============================================================================
// CHART TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Area,
    Pie,
    Bar,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "line" => Ok(ChartKind::Line),
            "area" => Ok(ChartKind::Area),
            "pie" => Ok(ChartKind::Pie),
            "bar" => Ok(ChartKind::Bar),
            other => Err(AnalyticsError::UnsupportedChartType(other.to_string())),
        }
    }
}

/// Integer columns (days, scores) stay integers in the JSON output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartValue {
    Integer(u64),
    Decimal(f64),
}

impl ChartValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ChartValue::Integer(v) => *v as f64,
            ChartValue::Decimal(v) => *v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: ChartValue,
}

impl ChartPoint {
    fn decimal(name: impl Into<String>, value: f64) -> Self {
        ChartPoint {
            name: name.into(),
            value: ChartValue::Decimal(value),
        }
    }

    fn integer(name: impl Into<String>, value: u64) -> Self {
        ChartPoint {
            name: name.into(),
            value: ChartValue::Integer(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: Vec<ChartPoint>,
    pub title: String,
    pub description: String,
}

// ============================================================================
// QUERY DISPATCH
// ============================================================================

/// Monthly metric plotted by temporal charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalSeries {
    Revenue,
    Delinquency,
    Churn,
    Ticket,
    /// No keyword matched; plots revenue
    Default,
}

impl TemporalSeries {
    pub fn from_query(query: &str) -> Self {
        let q = query.to_lowercase();
        if q.contains("receita") || q.contains("faturamento") {
            TemporalSeries::Revenue
        } else if q.contains("inadimpl") {
            TemporalSeries::Delinquency
        } else if q.contains("churn") {
            TemporalSeries::Churn
        } else if q.contains("ticket") {
            TemporalSeries::Ticket
        } else {
            TemporalSeries::Default
        }
    }

    fn value(&self, metric: &MonthlyMetric) -> f64 {
        match self {
            TemporalSeries::Revenue | TemporalSeries::Default => metric.revenue,
            TemporalSeries::Delinquency => metric.delinquency_rate,
            TemporalSeries::Churn => metric.churn_rate,
            TemporalSeries::Ticket => metric.average_ticket,
        }
    }

    fn labels(&self) -> (&'static str, &'static str) {
        match self {
            TemporalSeries::Revenue => (
                "Evolução da Receita Total",
                "Receita mensal da LavandeRio ao longo do tempo",
            ),
            TemporalSeries::Delinquency => (
                "Evolução da Taxa de Inadimplência",
                "Taxa de inadimplência mensal (%)",
            ),
            TemporalSeries::Churn => ("Evolução do Churn Rate", "Taxa de cancelamento mensal (%)"),
            TemporalSeries::Ticket => ("Evolução do Ticket Médio", "Ticket médio mensal"),
            TemporalSeries::Default => ("Evolução da Receita Total", "Receita mensal da LavandeRio"),
        }
    }
}

/// Customer attribute grouped by pie charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Sector,
    Plan,
    Region,
}

impl Distribution {
    /// Falls back to sector
    pub fn from_query(query: &str) -> Self {
        let q = query.to_lowercase();
        if q.contains("setor") {
            Distribution::Sector
        } else if q.contains("plano") {
            Distribution::Plan
        } else if q.contains("regi") {
            Distribution::Region
        } else {
            Distribution::Sector
        }
    }

    fn key<'a>(&self, customer: &'a Customer) -> &'a str {
        match self {
            Distribution::Sector => &customer.sector,
            Distribution::Plan => &customer.plan,
            Distribution::Region => &customer.region,
        }
    }

    fn display(&self, key: &str) -> String {
        match self {
            Distribution::Sector => title_case(key),
            Distribution::Plan => key.to_string(),
            Distribution::Region => title_case(&key.replace('_', " ")),
        }
    }

    fn labels(&self) -> (&'static str, &'static str) {
        match self {
            Distribution::Sector => (
                "Distribuição por Setor",
                "Faturamento total por setor de atividade",
            ),
            Distribution::Plan => ("Distribuição por Plano", "Faturamento total por tipo de plano"),
            Distribution::Region => (
                "Distribuição por Região",
                "Faturamento total por região do Rio de Janeiro",
            ),
        }
    }
}

/// Customer ranking used by bar charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    TopRevenue,
    Delay,
    Score,
    Default,
}

impl Ranking {
    pub fn from_query(query: &str) -> Self {
        let q = query.to_lowercase();
        if q.contains("top") || q.contains("maior") {
            Ranking::TopRevenue
        } else if q.contains("atraso") {
            Ranking::Delay
        } else if q.contains("score") {
            Ranking::Score
        } else {
            Ranking::Default
        }
    }

    fn size(&self) -> usize {
        match self {
            Ranking::Default => DEFAULT_RANKING_SIZE,
            _ => RANKING_SIZE,
        }
    }

    fn labels(&self) -> (&'static str, &'static str) {
        match self {
            Ranking::TopRevenue => (
                "Top 10 Clientes por Faturamento",
                "Ranking dos clientes com maior faturamento mensal",
            ),
            Ranking::Delay => (
                "Clientes com Maior Atraso",
                "Ranking por dias de atraso no pagamento",
            ),
            Ranking::Score => (
                "Top 10 Clientes por Score Neofin",
                "Ranking dos clientes com melhor score de crédito",
            ),
            Ranking::Default => (
                "Top 8 Clientes por Faturamento",
                "Ranking dos principais clientes da LavandeRio",
            ),
        }
    }
}

/// `2023-10` → `Out 2023`; anything else is kept verbatim
pub fn month_label(tag: &str) -> String {
    let parsed = tag.split_once('-').and_then(|(year, month)| {
        let month: usize = month.parse().ok()?;
        if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) && (1..=12).contains(&month) {
            Some(format!("{} {}", MONTH_ABBREVIATIONS[month - 1], year))
        } else {
            None
        }
    });

    parsed.unwrap_or_else(|| tag.to_string())
}

/// First two words of the company name
pub fn display_name(company_name: &str) -> String {
    company_name
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// CHART GENERATOR
// ============================================================================

pub struct ChartGenerator<'a> {
    customers: &'a [Customer],
    metrics: &'a [MonthlyMetric],
}

impl<'a> ChartGenerator<'a> {
    pub fn new(customers: &'a [Customer], metrics: &'a [MonthlyMetric]) -> Self {
        ChartGenerator { customers, metrics }
    }

    pub fn generate(&self, kind: ChartKind, query: &str) -> Result<ChartData> {
        match kind {
            ChartKind::Line | ChartKind::Area => self.temporal(kind, query),
            ChartKind::Pie => self.distribution(query),
            ChartKind::Bar => self.ranking(query),
        }
    }

    fn temporal(&self, kind: ChartKind, query: &str) -> Result<ChartData> {
        if self.metrics.is_empty() {
            return Err(AnalyticsError::EmptyDataset(MonthlyMetric::DATASET));
        }

        let series = TemporalSeries::from_query(query);
        info!(%kind, ?series, "Temporal chart");

        let data = self
            .metrics
            .iter()
            .map(|m| ChartPoint::decimal(month_label(&m.month), series.value(m)))
            .collect();

        let (title, description) = series.labels();
        Ok(ChartData {
            kind,
            data,
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    fn distribution(&self, query: &str) -> Result<ChartData> {
        if self.customers.is_empty() {
            return Err(AnalyticsError::EmptyDataset(Customer::DATASET));
        }

        let grouping = Distribution::from_query(query);
        info!(?grouping, "Distribution chart");

        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for customer in self.customers {
            *totals.entry(grouping.key(customer)).or_insert(0.0) += customer.monthly_revenue;
        }

        let data = totals
            .into_iter()
            .map(|(key, total)| ChartPoint::decimal(grouping.display(key), total))
            .collect();

        let (title, description) = grouping.labels();
        Ok(ChartData {
            kind: ChartKind::Pie,
            data,
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    fn ranking(&self, query: &str) -> Result<ChartData> {
        if self.customers.is_empty() {
            return Err(AnalyticsError::EmptyDataset(Customer::DATASET));
        }

        let ranking = Ranking::from_query(query);
        info!(?ranking, "Ranking chart");

        let mut ranked: Vec<&Customer> = match ranking {
            Ranking::Delay => self.customers.iter().filter(|c| c.delay_days > 0).collect(),
            _ => self.customers.iter().collect(),
        };

        // Stable sorts: ties keep file order
        match ranking {
            Ranking::TopRevenue | Ranking::Default => {
                ranked.sort_by(|a, b| b.monthly_revenue.total_cmp(&a.monthly_revenue))
            }
            Ranking::Delay => ranked.sort_by(|a, b| b.delay_days.cmp(&a.delay_days)),
            Ranking::Score => ranked.sort_by(|a, b| b.score.cmp(&a.score)),
        }
        ranked.truncate(ranking.size());

        let data = ranked
            .into_iter()
            .map(|c| {
                let name = display_name(&c.company_name);
                match ranking {
                    Ranking::Delay => ChartPoint::integer(name, c.delay_days as u64),
                    Ranking::Score => ChartPoint::integer(name, c.score as u64),
                    _ => ChartPoint::decimal(name, c.monthly_revenue),
                }
            })
            .collect();

        let (title, description) = ranking.labels();
        Ok(ChartData {
            kind: ChartKind::Bar,
            data,
            title: title.to_string(),
            description: description.to_string(),
        })
    }
}

/// Parse the chart tag, then build the series from freshly loaded tables
///
/// Only the customer and metric tables are read.
pub fn generate_chart_data(chart_type: &str, query: &str, config: &DataConfig) -> Result<ChartData> {
    let kind: ChartKind = chart_type.parse()?;

    let customers: Vec<Customer> = load_table(&config.customers_path())?;
    let metrics: Vec<MonthlyMetric> = load_table(&config.metrics_path())?;

    ChartGenerator::new(&customers, &metrics).generate(kind, query)
}
