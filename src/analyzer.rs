// 💰 Collection Analyzer - portfolio statistics and priority scoring
// Summary, priority ranking, strategy by delay segment, recovery insights
//
// Segments:
//   low / early   : dias_atraso <= 30
//   medium / mid  : 30 < dias_atraso <= 60
//   high / late   : dias_atraso > 60
//
// Priority score:
//   valor_devido * 0.4 + dias_atraso * 50 * 0.4 + peso_historico * 1000 * 0.2

use crate::dataset::{load_table, Debtor, PaymentHistory, Table};
use crate::error::{AnalyticsError, Result};
use crate::stats::{mean, pearson, round2, value_counts};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const MEDIUM_RISK_THRESHOLD_DAYS: u32 = 30;
pub const HIGH_RISK_THRESHOLD_DAYS: u32 = 60;

pub const DEBT_WEIGHT: f64 = 0.4;
pub const DELAY_WEIGHT: f64 = 0.4;
pub const HISTORY_WEIGHT: f64 = 0.2;

/// Brings one day of delay onto the debt scale
pub const DELAY_SCALE: f64 = 50.0;
/// Brings a history weight (1..3) onto the debt scale
pub const HISTORY_SCALE: f64 = 1000.0;

pub const PRIORITY_LIST_SIZE: usize = 10;
pub const TOP_SECTORS: usize = 5;
pub const TOP_CHANNELS: usize = 3;

pub const NO_PRIORITY_CLIENTS: &str = "Nenhum cliente em atraso para priorizar";

impl PaymentHistory {
    /// Weight used by the priority score; worse history ranks higher
    pub fn priority_weight(&self) -> f64 {
        match self {
            PaymentHistory::Poor => 3.0,
            PaymentHistory::Regular => 2.0,
            PaymentHistory::Good => 1.0,
            PaymentHistory::Other => 2.0,
        }
    }

    /// Share of the debt expected to be recovered
    pub fn recovery_rate(&self) -> f64 {
        match self {
            PaymentHistory::Good => 0.85,
            PaymentHistory::Regular => 0.65,
            PaymentHistory::Poor => 0.35,
            PaymentHistory::Other => 0.5,
        }
    }
}

// ============================================================================
// ANALYSIS TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Summary,
    Priority,
    Strategies,
    Insights,
}

impl AnalysisType {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisType::Summary => "summary",
            AnalysisType::Priority => "priority",
            AnalysisType::Strategies => "strategies",
            AnalysisType::Insights => "insights",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "summary" => Ok(AnalysisType::Summary),
            "priority" => Ok(AnalysisType::Priority),
            "strategies" => Ok(AnalysisType::Strategies),
            "insights" => Ok(AnalysisType::Insights),
            other => Err(AnalyticsError::InvalidAnalysisType(other.to_string())),
        }
    }
}

// ============================================================================
// RISK SEGMENT
// ============================================================================

/// Delay bucket; the three variants partition every possible delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskSegment {
    Low,
    Medium,
    High,
}

impl RiskSegment {
    pub fn classify(delay_days: u32) -> Self {
        if delay_days > HIGH_RISK_THRESHOLD_DAYS {
            RiskSegment::High
        } else if delay_days > MEDIUM_RISK_THRESHOLD_DAYS {
            RiskSegment::Medium
        } else {
            RiskSegment::Low
        }
    }

    /// Collection stage name used in strategy reports
    pub fn stage(&self) -> &'static str {
        match self {
            RiskSegment::Low => "early_stage",
            RiskSegment::Medium => "middle_stage",
            RiskSegment::High => "late_stage",
        }
    }

    /// Fixed playbook picked by stage and mean credit score
    pub fn recommendation(&self, avg_credit_score: f64) -> &'static str {
        match self {
            RiskSegment::Low if avg_credit_score > 600.0 => {
                "Abordagem amigável via canal preferido. Lembrete cortês com facilidades de pagamento."
            }
            RiskSegment::Low => {
                "Contato proativo com proposta de parcelamento. Acompanhamento semanal."
            }
            RiskSegment::Medium if avg_credit_score > 500.0 => {
                "Negociação ativa com desconto para pagamento à vista. Contato telefônico direto."
            }
            RiskSegment::Medium => {
                "Ação intensiva com plano de pagamento estruturado. Acompanhamento rigoroso."
            }
            RiskSegment::High if avg_credit_score > 400.0 => {
                "Negociação agressiva com descontos significativos. Último aviso antes de ação legal."
            }
            RiskSegment::High => {
                "Preparação para ação judicial. Última chance de acordo extrajudicial."
            }
        }
    }
}

/// Linear priority score; non-decreasing in debt and delay for a fixed history
pub fn priority_score(debt: f64, delay_days: u32, history: PaymentHistory) -> f64 {
    debt * DEBT_WEIGHT
        + delay_days as f64 * DELAY_SCALE * DELAY_WEIGHT
        + history.priority_weight() * HISTORY_SCALE * HISTORY_WEIGHT
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSegmentation {
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

impl RiskSegmentation {
    pub fn total(&self) -> usize {
        self.high_risk + self.medium_risk + self.low_risk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorDebt {
    pub sector: String,
    pub total_debt: f64,
    pub avg_delay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_clients: usize,
    pub total_debt: f64,
    pub avg_debt: f64,
    pub avg_delay: f64,
    pub risk_segmentation: RiskSegmentation,
    pub payment_history_distribution: BTreeMap<String, usize>,
    pub top_sectors_by_debt: Vec<SectorDebt>,
    pub analysis_timestamp: DateTime<Local>,
}

/// Ranked debtor; keys follow the portfolio CSV columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityClient {
    #[serde(rename = "cliente_id")]
    pub id: String,
    #[serde(rename = "nome_empresa")]
    pub company_name: String,
    #[serde(rename = "valor_devido")]
    pub debt: f64,
    #[serde(rename = "dias_atraso")]
    pub delay_days: u32,
    #[serde(rename = "historico_pagamento")]
    pub payment_history: String,
    #[serde(rename = "score_credito")]
    pub credit_score: f64,
    pub priority_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityReport {
    pub priority_clients: Vec<PriorityClient>,
    pub total_priority_debt: f64,
    pub avg_priority_delay: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub analysis_timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCount {
    pub channel: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStrategy {
    pub client_count: usize,
    pub total_debt: f64,
    pub avg_credit_score: f64,
    pub preferred_channels: Vec<ChannelCount>,
    pub recommended_approach: String,
}

/// Empty segments are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategiesBySegment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early_stage: Option<SegmentStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_stage: Option<SegmentStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_stage: Option<SegmentStrategy>,
}

impl StrategiesBySegment {
    pub fn get(&self, segment: RiskSegment) -> Option<&SegmentStrategy> {
        match segment {
            RiskSegment::Low => self.early_stage.as_ref(),
            RiskSegment::Medium => self.middle_stage.as_ref(),
            RiskSegment::High => self.late_stage.as_ref(),
        }
    }

    fn set(&mut self, segment: RiskSegment, strategy: SegmentStrategy) {
        match segment {
            RiskSegment::Low => self.early_stage = Some(strategy),
            RiskSegment::Medium => self.middle_stage = Some(strategy),
            RiskSegment::High => self.late_stage = Some(strategy),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategies_by_segment: StrategiesBySegment,
    pub analysis_timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeStats {
    pub total_debt: f64,
    pub mean_debt: f64,
    pub count: usize,
    pub avg_credit_score: f64,
    pub avg_delay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsReport {
    pub size_analysis: BTreeMap<String, SizeStats>,
    /// `null` when the correlation is undefined (fewer than two rows, constant column)
    pub credit_score_correlation: Option<f64>,
    pub estimated_total_recovery: f64,
    pub recovery_by_payment_history: BTreeMap<String, f64>,
    pub recovery_rate_assumptions: BTreeMap<String, f64>,
    pub analysis_timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Summary(SummaryStats),
    Priority(PriorityReport),
    Strategies(StrategyReport),
    Insights(InsightsReport),
}

// ============================================================================
// COLLECTION ANALYZER
// ============================================================================

#[derive(Debug)]
pub struct CollectionAnalyzer {
    debtors: Vec<Debtor>,
}

impl CollectionAnalyzer {
    pub fn new(debtors: Vec<Debtor>) -> Self {
        CollectionAnalyzer { debtors }
    }

    /// Load and validate the portfolio CSV
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(CollectionAnalyzer::new(load_table(path)?))
    }

    pub fn debtors(&self) -> &[Debtor] {
        &self.debtors
    }

    pub fn run(&self, analysis: AnalysisType) -> Result<AnalysisResult> {
        info!(%analysis, rows = self.debtors.len(), "Running portfolio analysis");

        Ok(match analysis {
            AnalysisType::Summary => AnalysisResult::Summary(self.summary_stats()?),
            AnalysisType::Priority => AnalysisResult::Priority(self.priority_clients()),
            AnalysisType::Strategies => AnalysisResult::Strategies(self.collection_strategies()?),
            AnalysisType::Insights => AnalysisResult::Insights(self.recovery_insights()?),
        })
    }

    fn ensure_not_empty(&self) -> Result<()> {
        if self.debtors.is_empty() {
            Err(AnalyticsError::EmptyDataset(Debtor::DATASET))
        } else {
            Ok(())
        }
    }

    pub fn summary_stats(&self) -> Result<SummaryStats> {
        self.ensure_not_empty()?;

        let debts: Vec<f64> = self.debtors.iter().map(|d| d.debt).collect();
        let delays: Vec<f64> = self.debtors.iter().map(|d| d.delay_days as f64).collect();

        let mut segmentation = RiskSegmentation {
            high_risk: 0,
            medium_risk: 0,
            low_risk: 0,
        };
        for debtor in &self.debtors {
            match RiskSegment::classify(debtor.delay_days) {
                RiskSegment::High => segmentation.high_risk += 1,
                RiskSegment::Medium => segmentation.medium_risk += 1,
                RiskSegment::Low => segmentation.low_risk += 1,
            }
        }

        let mut payment_history_distribution = BTreeMap::new();
        for debtor in &self.debtors {
            *payment_history_distribution
                .entry(debtor.payment_history.clone())
                .or_insert(0) += 1;
        }

        Ok(SummaryStats {
            total_clients: self.debtors.len(),
            total_debt: debts.iter().sum(),
            avg_debt: mean(&debts).unwrap_or(0.0),
            avg_delay: mean(&delays).unwrap_or(0.0),
            risk_segmentation: segmentation,
            payment_history_distribution,
            top_sectors_by_debt: self.top_sectors_by_debt(),
            analysis_timestamp: Local::now(),
        })
    }

    fn top_sectors_by_debt(&self) -> Vec<SectorDebt> {
        let mut by_sector: BTreeMap<&str, (f64, Vec<f64>)> = BTreeMap::new();
        for debtor in &self.debtors {
            let entry = by_sector.entry(debtor.sector.as_str()).or_default();
            entry.0 += debtor.debt;
            entry.1.push(debtor.delay_days as f64);
        }

        let mut sectors: Vec<SectorDebt> = by_sector
            .into_iter()
            .map(|(sector, (total_debt, delays))| SectorDebt {
                sector: sector.to_string(),
                total_debt,
                avg_delay: mean(&delays).unwrap_or(0.0),
            })
            .collect();

        sectors.sort_by(|a, b| b.total_debt.total_cmp(&a.total_debt));
        sectors.truncate(TOP_SECTORS);
        sectors
    }

    /// Top delinquent debtors by priority score
    ///
    /// Never fails: a portfolio with nobody overdue yields an empty list and a message.
    pub fn priority_clients(&self) -> PriorityReport {
        let mut ranked: Vec<PriorityClient> = self
            .debtors
            .iter()
            .filter(|d| d.is_delinquent())
            .map(|d| PriorityClient {
                id: d.id.clone(),
                company_name: d.company_name.clone(),
                debt: d.debt,
                delay_days: d.delay_days,
                payment_history: d.payment_history.clone(),
                credit_score: d.credit_score,
                priority_score: priority_score(d.debt, d.delay_days, d.history()),
            })
            .collect();

        // Stable: equal scores keep file order
        ranked.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        ranked.truncate(PRIORITY_LIST_SIZE);

        if ranked.is_empty() {
            warn!(rows = self.debtors.len(), "No delinquent clients to prioritize");
            return PriorityReport {
                priority_clients: Vec::new(),
                total_priority_debt: 0.0,
                avg_priority_delay: 0.0,
                message: Some(NO_PRIORITY_CLIENTS.to_string()),
                analysis_timestamp: Local::now(),
            };
        }

        let delays: Vec<f64> = ranked.iter().map(|c| c.delay_days as f64).collect();

        PriorityReport {
            total_priority_debt: ranked.iter().map(|c| c.debt).sum(),
            avg_priority_delay: mean(&delays).unwrap_or(0.0),
            priority_clients: ranked,
            message: None,
            analysis_timestamp: Local::now(),
        }
    }

    pub fn collection_strategies(&self) -> Result<StrategyReport> {
        self.ensure_not_empty()?;

        let mut strategies = StrategiesBySegment::default();

        for segment in [RiskSegment::Low, RiskSegment::Medium, RiskSegment::High] {
            let members: Vec<&Debtor> = self
                .debtors
                .iter()
                .filter(|d| RiskSegment::classify(d.delay_days) == segment)
                .collect();

            if members.is_empty() {
                continue;
            }

            let scores: Vec<f64> = members.iter().map(|d| d.credit_score).collect();
            let avg_credit_score = mean(&scores).unwrap_or(0.0);

            let preferred_channels = value_counts(members.iter().map(|d| d.preferred_channel.as_str()))
                .into_iter()
                .take(TOP_CHANNELS)
                .map(|(channel, count)| ChannelCount { channel, count })
                .collect();

            strategies.set(
                segment,
                SegmentStrategy {
                    client_count: members.len(),
                    total_debt: members.iter().map(|d| d.debt).sum(),
                    avg_credit_score,
                    preferred_channels,
                    recommended_approach: segment.recommendation(avg_credit_score).to_string(),
                },
            );
        }

        Ok(StrategyReport {
            strategies_by_segment: strategies,
            analysis_timestamp: Local::now(),
        })
    }

    pub fn recovery_insights(&self) -> Result<InsightsReport> {
        self.ensure_not_empty()?;

        let mut by_size: BTreeMap<&str, Vec<&Debtor>> = BTreeMap::new();
        for debtor in &self.debtors {
            by_size.entry(debtor.size.as_str()).or_default().push(debtor);
        }

        let size_analysis = by_size
            .into_iter()
            .map(|(size, members)| {
                let debts: Vec<f64> = members.iter().map(|d| d.debt).collect();
                let scores: Vec<f64> = members.iter().map(|d| d.credit_score).collect();
                let delays: Vec<f64> = members.iter().map(|d| d.delay_days as f64).collect();

                let stats = SizeStats {
                    total_debt: round2(debts.iter().sum()),
                    mean_debt: round2(mean(&debts).unwrap_or(0.0)),
                    count: members.len(),
                    avg_credit_score: round2(mean(&scores).unwrap_or(0.0)),
                    avg_delay: round2(mean(&delays).unwrap_or(0.0)),
                };
                (size.to_string(), stats)
            })
            .collect();

        let scores: Vec<f64> = self.debtors.iter().map(|d| d.credit_score).collect();
        let debts: Vec<f64> = self.debtors.iter().map(|d| d.debt).collect();
        let credit_score_correlation = pearson(&scores, &debts);

        let mut recovery_by_payment_history: BTreeMap<String, f64> = BTreeMap::new();
        let mut estimated_total_recovery = 0.0;
        for debtor in &self.debtors {
            let recovery = debtor.debt * debtor.history().recovery_rate();
            estimated_total_recovery += recovery;
            *recovery_by_payment_history
                .entry(debtor.payment_history.clone())
                .or_insert(0.0) += recovery;
        }

        let recovery_rate_assumptions = PaymentHistory::ALL_KNOWN
            .iter()
            .map(|h| (h.label().to_string(), h.recovery_rate()))
            .collect();

        Ok(InsightsReport {
            size_analysis,
            credit_score_correlation,
            estimated_total_recovery,
            recovery_by_payment_history,
            recovery_rate_assumptions,
            analysis_timestamp: Local::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_debtor(id: &str, debt: f64, delay: u32, history: &str) -> Debtor {
        Debtor {
            id: id.to_string(),
            company_name: format!("Empresa {}", id),
            debt,
            delay_days: delay,
            payment_history: history.to_string(),
            sector: "varejo".to_string(),
            size: "pequeno".to_string(),
            credit_score: 600.0,
            preferred_channel: "email".to_string(),
        }
    }

    fn sample_portfolio() -> Vec<Debtor> {
        let mut debtors = vec![
            create_test_debtor("C1", 1000.0, 0, "bom_pagador"),
            create_test_debtor("C2", 5000.0, 15, "regular"),
            create_test_debtor("C3", 20000.0, 30, "regular"),
            create_test_debtor("C4", 8000.0, 31, "mal_pagador"),
            create_test_debtor("C5", 3000.0, 60, "mal_pagador"),
            create_test_debtor("C6", 12000.0, 61, "mal_pagador"),
            create_test_debtor("C7", 500.0, 120, "regular"),
        ];
        debtors[3].sector = "industria".to_string();
        debtors[3].size = "grande".to_string();
        debtors[3].credit_score = 450.0;
        debtors[5].sector = "industria".to_string();
        debtors[5].preferred_channel = "telefone".to_string();
        debtors[5].credit_score = 380.0;
        debtors[6].sector = "servicos".to_string();
        debtors[6].credit_score = 300.0;
        debtors
    }

    #[test]
    fn test_analysis_type_parsing() {
        assert_eq!("summary".parse::<AnalysisType>().unwrap(), AnalysisType::Summary);
        assert_eq!("insights".parse::<AnalysisType>().unwrap(), AnalysisType::Insights);
        assert!(matches!(
            "forecast".parse::<AnalysisType>(),
            Err(AnalyticsError::InvalidAnalysisType(_))
        ));
    }

    #[test]
    fn test_risk_segment_boundaries() {
        assert_eq!(RiskSegment::classify(0), RiskSegment::Low);
        assert_eq!(RiskSegment::classify(30), RiskSegment::Low);
        assert_eq!(RiskSegment::classify(31), RiskSegment::Medium);
        assert_eq!(RiskSegment::classify(60), RiskSegment::Medium);
        assert_eq!(RiskSegment::classify(61), RiskSegment::High);
        assert_eq!(RiskSegment::High.stage(), "late_stage");
    }

    #[test]
    fn test_summary_totals_match_columns() {
        let analyzer = CollectionAnalyzer::new(sample_portfolio());
        let summary = analyzer.summary_stats().unwrap();

        let expected_debt: f64 = analyzer.debtors().iter().map(|d| d.debt).sum();
        let expected_delay: f64 =
            analyzer.debtors().iter().map(|d| d.delay_days as f64).sum::<f64>() / 7.0;

        assert_eq!(summary.total_clients, 7);
        assert_eq!(summary.total_debt, expected_debt);
        assert_eq!(summary.avg_debt, expected_debt / 7.0);
        assert_eq!(summary.avg_delay, expected_delay);
    }

    #[test]
    fn test_risk_segmentation_partitions_rows() {
        let analyzer = CollectionAnalyzer::new(sample_portfolio());
        let summary = analyzer.summary_stats().unwrap();
        let seg = &summary.risk_segmentation;

        assert_eq!(seg.low_risk, 3);
        assert_eq!(seg.medium_risk, 2);
        assert_eq!(seg.high_risk, 2);
        assert_eq!(seg.total(), summary.total_clients);
    }

    #[test]
    fn test_summary_distribution_and_sectors() {
        let analyzer = CollectionAnalyzer::new(sample_portfolio());
        let summary = analyzer.summary_stats().unwrap();

        assert_eq!(summary.payment_history_distribution["mal_pagador"], 3);
        assert_eq!(summary.payment_history_distribution["regular"], 3);
        assert_eq!(summary.payment_history_distribution["bom_pagador"], 1);

        let sectors: Vec<&str> = summary
            .top_sectors_by_debt
            .iter()
            .map(|s| s.sector.as_str())
            .collect();
        assert_eq!(sectors, vec!["varejo", "industria", "servicos"]);
        assert_eq!(summary.top_sectors_by_debt[0].total_debt, 29000.0);
        assert_eq!(summary.top_sectors_by_debt[1].avg_delay, 46.0);
    }

    #[test]
    fn test_summary_empty_dataset_fails() {
        let analyzer = CollectionAnalyzer::new(Vec::new());
        assert!(matches!(
            analyzer.summary_stats(),
            Err(AnalyticsError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_priority_score_formula() {
        // 10000 * 0.4 + 45 * 50 * 0.4 + 3 * 1000 * 0.2
        let score = priority_score(10000.0, 45, PaymentHistory::Poor);
        assert!((score - (4000.0 + 900.0 + 600.0)).abs() < 1e-9);
    }

    #[test]
    fn test_priority_score_monotonic() {
        for history in PaymentHistory::ALL_KNOWN {
            let mut previous = f64::MIN;
            for debt in [0.0, 10.0, 1000.0, 50000.0] {
                for delay in [0, 1, 30, 90] {
                    let base = priority_score(debt, delay, history);
                    assert!(priority_score(debt + 1.0, delay, history) >= base);
                    assert!(priority_score(debt, delay + 1, history) >= base);
                }
                let score = priority_score(debt, 0, history);
                assert!(score >= previous);
                previous = score;
            }
        }
    }

    #[test]
    fn test_priority_ranking() {
        let analyzer = CollectionAnalyzer::new(sample_portfolio());
        let report = analyzer.priority_clients();

        // C1 is current and excluded
        assert_eq!(report.priority_clients.len(), 6);
        assert!(report.priority_clients.iter().all(|c| c.id != "C1"));
        assert_eq!(report.priority_clients[0].id, "C3");
        assert!(report
            .priority_clients
            .windows(2)
            .all(|w| w[0].priority_score >= w[1].priority_score));
        assert_eq!(report.total_priority_debt, 48500.0);
        assert!(report.message.is_none());
    }

    #[test]
    fn test_priority_limited_to_ten() {
        let debtors: Vec<Debtor> = (0..15)
            .map(|i| create_test_debtor(&format!("C{}", i), 1000.0 * i as f64, 10 + i, "regular"))
            .collect();
        let report = CollectionAnalyzer::new(debtors).priority_clients();

        assert_eq!(report.priority_clients.len(), PRIORITY_LIST_SIZE);
        assert_eq!(report.priority_clients[0].id, "C14");
    }

    #[test]
    fn test_priority_ties_keep_file_order() {
        let debtors = vec![
            create_test_debtor("A", 1000.0, 10, "regular"),
            create_test_debtor("B", 1000.0, 10, "regular"),
        ];
        let report = CollectionAnalyzer::new(debtors).priority_clients();

        assert_eq!(report.priority_clients[0].id, "A");
        assert_eq!(report.priority_clients[1].id, "B");
    }

    #[test]
    fn test_priority_empty_dataset() {
        let report = CollectionAnalyzer::new(Vec::new()).priority_clients();

        assert!(report.priority_clients.is_empty());
        assert_eq!(report.message.as_deref(), Some(NO_PRIORITY_CLIENTS));
        assert_eq!(report.total_priority_debt, 0.0);
    }

    #[test]
    fn test_priority_all_current_clients() {
        let debtors = vec![
            create_test_debtor("A", 1000.0, 0, "bom_pagador"),
            create_test_debtor("B", 9000.0, 0, "regular"),
        ];
        let report = CollectionAnalyzer::new(debtors).priority_clients();

        assert!(report.priority_clients.is_empty());
        assert!(report.message.is_some());
    }

    #[test]
    fn test_collection_strategies() {
        let analyzer = CollectionAnalyzer::new(sample_portfolio());
        let report = analyzer.collection_strategies().unwrap();
        let by_segment = &report.strategies_by_segment;

        let early = by_segment.get(RiskSegment::Low).unwrap();
        assert_eq!(early.client_count, 3);
        assert_eq!(early.total_debt, 26000.0);
        assert_eq!(early.avg_credit_score, 600.0);
        assert_eq!(
            early.recommended_approach,
            RiskSegment::Low.recommendation(600.0)
        );
        assert!(early.recommended_approach.starts_with("Contato proativo"));

        let middle = by_segment.get(RiskSegment::Medium).unwrap();
        assert_eq!(middle.client_count, 2);
        assert_eq!(middle.avg_credit_score, 525.0);
        assert!(middle.recommended_approach.starts_with("Negociação ativa"));

        let late = by_segment.get(RiskSegment::High).unwrap();
        assert_eq!(late.avg_credit_score, 340.0);
        assert!(late.recommended_approach.starts_with("Preparação para ação judicial"));
        assert_eq!(late.preferred_channels[0].channel, "telefone");
    }

    #[test]
    fn test_strategies_skip_empty_segments() {
        let debtors = vec![create_test_debtor("A", 100.0, 5, "regular")];
        let report = CollectionAnalyzer::new(debtors).collection_strategies().unwrap();

        assert!(report.strategies_by_segment.early_stage.is_some());
        assert!(report.strategies_by_segment.middle_stage.is_none());
        assert!(report.strategies_by_segment.late_stage.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["strategies_by_segment"].get("late_stage").is_none());
    }

    #[test]
    fn test_recovery_insights() {
        let analyzer = CollectionAnalyzer::new(sample_portfolio());
        let report = analyzer.recovery_insights().unwrap();

        let expected: f64 = analyzer
            .debtors()
            .iter()
            .map(|d| d.debt * d.history().recovery_rate())
            .sum();
        assert!((report.estimated_total_recovery - expected).abs() < 1e-9);
        assert!((report.recovery_by_payment_history["bom_pagador"] - 850.0).abs() < 1e-9);

        assert_eq!(report.size_analysis["grande"].count, 1);
        assert_eq!(report.size_analysis["pequeno"].count, 6);
        assert_eq!(report.recovery_rate_assumptions["mal_pagador"], 0.35);
        assert!(report.credit_score_correlation.is_some());
    }

    #[test]
    fn test_unknown_history_uses_default_rate() {
        let debtors = vec![create_test_debtor("A", 1000.0, 10, "novo")];
        let report = CollectionAnalyzer::new(debtors).recovery_insights().unwrap();

        assert_eq!(report.estimated_total_recovery, 500.0);
        assert_eq!(report.recovery_by_payment_history["novo"], 500.0);
        assert_eq!(report.credit_score_correlation, None);
    }

    #[test]
    fn test_run_dispatch() {
        let analyzer = CollectionAnalyzer::new(sample_portfolio());

        assert!(matches!(
            analyzer.run(AnalysisType::Priority).unwrap(),
            AnalysisResult::Priority(_)
        ));
        assert!(matches!(
            analyzer.run(AnalysisType::Strategies).unwrap(),
            AnalysisResult::Strategies(_)
        ));
    }
}
