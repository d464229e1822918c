// 🔎 Keyword Lookup - pre-rendered text blocks selected by query keywords
//
// Not retrieval in the embedding sense: a fixed keyword → category table picks
// which blocks of the knowledge base are returned. Knowledge base order is
// customer profiles, sector analyses, monthly metrics, company context; the
// first three blocks of a targeted kind win.

use crate::dataset::{Customer, Datasets};
use crate::error::Result;
use crate::stats::{format_money, mean, title_case, value_counts};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const CONTEXT_HEADER: &str = "DADOS RELEVANTES DA LAVANDERIO:\n\n";
pub const MAX_CONTEXT_ITEMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeKind {
    CustomerProfile,
    SectorAnalysis,
    MonthlyMetrics,
    CompanyContext,
}

/// Query keyword → knowledge kinds it targets
pub const KEYWORDS: &[(&str, &[KnowledgeKind])] = &[
    ("situação", &[KnowledgeKind::CompanyContext, KnowledgeKind::MonthlyMetrics]),
    ("lavanderio", &[KnowledgeKind::CompanyContext]),
    ("clientes", &[KnowledgeKind::CustomerProfile, KnowledgeKind::SectorAnalysis]),
    ("setor", &[KnowledgeKind::SectorAnalysis]),
    ("inadimplência", &[KnowledgeKind::MonthlyMetrics]),
    ("tendência", &[KnowledgeKind::MonthlyMetrics]),
    ("prioridade", &[KnowledgeKind::CustomerProfile]),
    ("segmentação", &[KnowledgeKind::SectorAnalysis]),
    ("faturamento", &[KnowledgeKind::CustomerProfile, KnowledgeKind::SectorAnalysis]),
    ("receita", &[KnowledgeKind::MonthlyMetrics]),
];

/// Targets used when no keyword matches
pub const DEFAULT_TARGETS: &[KnowledgeKind] =
    &[KnowledgeKind::CompanyContext, KnowledgeKind::MonthlyMetrics];

const CURRENT_CHALLENGES: &str = "\
- Inadimplência cresceu de 8.5% (out/23) para 16.7% (jan/24)
- Sazonalidade: queda de 20% entre dezembro e janeiro
- Fluxo de caixa: 45 dias prazo médio vs 30 dias custo operacional";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub kind: KnowledgeKind,
    pub content: String,
    pub metadata: BTreeMap<String, Value>,
}

/// Kinds targeted by a query, in keyword-table order without duplicates
pub fn target_kinds(query: &str) -> Vec<KnowledgeKind> {
    let query = query.to_lowercase();
    let mut targets: Vec<KnowledgeKind> = Vec::new();

    for (keyword, kinds) in KEYWORDS {
        if query.contains(keyword) {
            for kind in kinds.iter() {
                if !targets.contains(kind) {
                    targets.push(*kind);
                }
            }
        }
    }

    if targets.is_empty() {
        targets.extend_from_slice(DEFAULT_TARGETS);
    }

    targets
}

/// Cosine similarity; 0 for mismatched lengths or a zero-norm vector
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

// ============================================================================
// KNOWLEDGE BASE
// ============================================================================

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    items: Vec<KnowledgeItem>,
    general_summary: String,
}

impl KnowledgeBase {
    pub fn build(datasets: &Datasets) -> Self {
        let mut items = Vec::new();

        for customer in &datasets.customers {
            items.push(customer_profile(customer, datasets));
        }
        items.extend(sector_analyses(&datasets.customers));
        for metric in &datasets.metrics {
            items.push(KnowledgeItem {
                kind: KnowledgeKind::MonthlyMetrics,
                content: format!(
                    "Métricas {}:\n\
                     - Receita Total: R$ {}\n\
                     - Taxa Inadimplência: {:.1}%\n\
                     - CAC: R$ {} | LTV: R$ {}\n\
                     - Churn Rate: {:.1}%\n\
                     - Ticket Médio: R$ {}\n\
                     - Clientes Ativos: {}\n\
                     - Margem Bruta: {:.1}%",
                    metric.month,
                    format_money(metric.revenue),
                    metric.delinquency_rate,
                    format_money(metric.cac),
                    format_money(metric.ltv),
                    metric.churn_rate,
                    format_money(metric.average_ticket),
                    metric.active_clients,
                    metric.gross_margin,
                ),
                metadata: BTreeMap::from([("mes".to_string(), json!(metric.month))]),
            });
        }
        items.push(company_context(datasets));

        debug!(items = items.len(), "Built knowledge base");

        KnowledgeBase {
            items,
            general_summary: general_summary(datasets),
        }
    }

    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    pub fn general_summary(&self) -> &str {
        &self.general_summary
    }

    /// Blocks relevant to the query, or the general summary when none are
    pub fn context_for_query(&self, query: &str) -> String {
        let targets = target_kinds(query);

        let relevant: Vec<&KnowledgeItem> = self
            .items
            .iter()
            .filter(|item| targets.contains(&item.kind))
            .take(MAX_CONTEXT_ITEMS)
            .collect();

        debug!(?targets, matched = relevant.len(), "Keyword lookup");

        if relevant.is_empty() {
            return self.general_summary.clone();
        }

        let mut context = String::from(CONTEXT_HEADER);
        for item in relevant {
            context.push_str(&item.content);
            context.push_str("\n\n");
        }
        context
    }
}

/// Load data through `loader`, then answer the query
///
/// Load failures come back as an error text, never as an `Err`.
pub fn rag_context<F>(query: &str, loader: F) -> String
where
    F: FnOnce() -> Result<Datasets>,
{
    match loader() {
        Ok(datasets) => KnowledgeBase::build(&datasets).context_for_query(query),
        Err(e) => {
            warn!(error = %e, "Knowledge base unavailable");
            format!("Erro no sistema RAG: {}", e)
        }
    }
}

// ============================================================================
// BLOCK RENDERING
// ============================================================================

fn customer_profile(customer: &Customer, datasets: &Datasets) -> KnowledgeItem {
    let (billed, paid) = datasets
        .transactions_for(&customer.id)
        .fold((0.0, 0.0), |(billed, paid), tx| {
            (billed + tx.original_value, paid + tx.paid())
        });
    let payment_rate = if billed > 0.0 { paid / billed * 100.0 } else { 0.0 };

    let content = format!(
        "Cliente: {} ({})\n\
         Setor: {} | Região: {} | Plano: {}\n\
         Faturamento Mensal: R$ {}\n\
         Status: {} | Score Neofin: {}\n\
         Dias em Atraso: {} | Canal Preferido: {}\n\
         Histórico Financeiro: Total faturado R$ {}, Taxa de pagamento: {:.1}%\n\
         Tipo de Contrato: {}",
        customer.company_name,
        customer.id,
        customer.sector,
        customer.region,
        customer.plan,
        format_money(customer.monthly_revenue),
        customer.status,
        customer.score,
        customer.delay_days,
        customer.channel,
        format_money(billed),
        payment_rate,
        customer.contract_type,
    );

    KnowledgeItem {
        kind: KnowledgeKind::CustomerProfile,
        content,
        metadata: BTreeMap::from([
            ("customer_id".to_string(), json!(customer.id)),
            ("setor".to_string(), json!(customer.sector)),
            ("status".to_string(), json!(customer.status)),
            ("score".to_string(), json!(customer.score)),
            ("atraso".to_string(), json!(customer.delay_days)),
        ]),
    }
}

fn sector_analyses(customers: &[Customer]) -> Vec<KnowledgeItem> {
    let mut by_sector: BTreeMap<&str, Vec<&Customer>> = BTreeMap::new();
    for customer in customers {
        by_sector.entry(customer.sector.as_str()).or_default().push(customer);
    }

    by_sector
        .into_iter()
        .map(|(sector, members)| {
            let revenues: Vec<f64> = members.iter().map(|c| c.monthly_revenue).collect();
            let delays: Vec<f64> = members.iter().map(|c| c.delay_days as f64).collect();
            let scores: Vec<f64> = members.iter().map(|c| c.score as f64).collect();

            let content = format!(
                "Análise do Setor {}:\n\
                 - Total de clientes: {}\n\
                 - Faturamento total: R$ {}\n\
                 - Ticket médio: R$ {}\n\
                 - Dias atraso médio: {:.1}\n\
                 - Score médio: {:.0}",
                title_case(sector),
                members.len(),
                format_money(revenues.iter().sum()),
                format_money(mean(&revenues).unwrap_or(0.0)),
                mean(&delays).unwrap_or(0.0),
                mean(&scores).unwrap_or(0.0),
            );

            KnowledgeItem {
                kind: KnowledgeKind::SectorAnalysis,
                content,
                metadata: BTreeMap::from([("setor".to_string(), json!(sector))]),
            }
        })
        .collect()
}

fn company_context(datasets: &Datasets) -> KnowledgeItem {
    let context = &datasets.context;

    let content = format!(
        "LavandeRio - Informações Gerais:\n\
         Empresa: {} (fundada em {})\n\
         Modelo de Negócio: {}\n\
         Segmentos Atendidos: {}\n\
         Capacidade: {}\n\
         \n\
         Desafios Atuais:\n\
         {}\n\
         \n\
         Solução Neofin implementada em {} com módulos:\n\
         {}",
        context.company.name,
        context.company.founded,
        context.business.model,
        context.business.segments.join(", "),
        context.business.daily_capacity,
        CURRENT_CHALLENGES,
        context.solution.implemented,
        context.solution.modules.join(", "),
    );

    KnowledgeItem {
        kind: KnowledgeKind::CompanyContext,
        content,
        metadata: BTreeMap::from([("type".to_string(), json!("contexto"))]),
    }
}

fn general_summary(datasets: &Datasets) -> String {
    let customers = &datasets.customers;
    let revenues: Vec<f64> = customers.iter().map(|c| c.monthly_revenue).collect();

    let (delinquency, margin) = match datasets.latest_metric() {
        Some(m) => (m.delinquency_rate.to_string(), m.gross_margin.to_string()),
        None => ("N/A".to_string(), "N/A".to_string()),
    };

    let top_sectors: Vec<String> = value_counts(customers.iter().map(|c| c.sector.as_str()))
        .into_iter()
        .take(3)
        .map(|(sector, _)| sector)
        .collect();

    format!(
        "SITUAÇÃO ATUAL DA LAVANDERIO:\n\
         \n\
         📊 CARTEIRA DE CLIENTES:\n\
         - Total de clientes: {}\n\
         - Clientes ativos: {}\n\
         - Clientes inadimplentes: {}\n\
         \n\
         💰 PERFORMANCE FINANCEIRA:\n\
         - Faturamento mensal: R$ {}\n\
         - Ticket médio: R$ {}\n\
         - Taxa de inadimplência: {}%\n\
         - Margem bruta: {}%\n\
         \n\
         🏢 SEGMENTOS PRINCIPAIS:\n\
         - {}\n\
         \n\
         ⚠️ DESAFIOS ATUAIS:\n\
         {}",
        customers.len(),
        customers.iter().filter(|c| c.is_active()).count(),
        customers.iter().filter(|c| c.is_defaulting()).count(),
        format_money(revenues.iter().sum()),
        format_money(mean(&revenues).unwrap_or(0.0)),
        delinquency,
        margin,
        top_sectors.join(", "),
        CURRENT_CHALLENGES,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{
        BusinessInfo, CompanyContext, CompanyInfo, MonthlyMetric, SolutionInfo, Transaction,
    };
    use crate::error::AnalyticsError;
    use chrono::NaiveDate;

    fn create_test_customer(id: &str, sector: &str, revenue: f64, status: &str) -> Customer {
        Customer {
            id: id.to_string(),
            company_name: format!("Empresa {}", id),
            cnpj: None,
            plan: "Standard".to_string(),
            monthly_revenue: revenue,
            delay_days: 0,
            last_billed: None,
            channel: "whatsapp".to_string(),
            score: 700,
            status: status.to_string(),
            sector: sector.to_string(),
            region: "centro".to_string(),
            contract_type: "mensal".to_string(),
        }
    }

    fn create_test_transaction(customer_id: &str, original: f64, paid: Option<f64>) -> Transaction {
        Transaction {
            id: None,
            customer_id: customer_id.to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            original_value: original,
            paid_value: paid,
            payment_date: None,
            service_type: None,
            payment_method: None,
            interest: None,
            status: None,
            accrual_month: None,
        }
    }

    fn create_test_metric(month: &str) -> MonthlyMetric {
        MonthlyMetric {
            month: month.to_string(),
            recurring_revenue: None,
            revenue: 850000.0,
            delinquency_rate: 14.89,
            cac: 1516.38,
            ltv: 40811.11,
            churn_rate: 8.44,
            average_ticket: 25000.0,
            new_clients: None,
            active_clients: 30,
            gross_margin: 62.5,
        }
    }

    fn create_test_context() -> CompanyContext {
        CompanyContext {
            company: CompanyInfo {
                name: "LavandeRio".to_string(),
                founded: "2018".to_string(),
                headquarters: None,
                branches: None,
                employees: None,
            },
            business: BusinessInfo {
                model: "B2B Lavanderia Especializada".to_string(),
                segments: vec!["Hotelaria".to_string(), "Saúde".to_string()],
                daily_capacity: "2.5 toneladas de roupas".to_string(),
                territory: None,
            },
            solution: SolutionInfo {
                implemented: "Setembro 2023".to_string(),
                modules: vec!["Análise Preditiva".to_string(), "Gestão de Risco".to_string()],
            },
        }
    }

    fn sample_datasets() -> Datasets {
        Datasets {
            customers: vec![
                create_test_customer("C1", "hotelaria", 40000.0, "ativo"),
                create_test_customer("C2", "saude", 20000.0, "inadimplente"),
                create_test_customer("C3", "hotelaria", 10000.0, "ativo"),
            ],
            transactions: vec![
                create_test_transaction("C1", 1000.0, Some(1000.0)),
                create_test_transaction("C1", 1000.0, None),
                create_test_transaction("C2", 500.0, Some(250.0)),
            ],
            metrics: vec![create_test_metric("2023-12"), create_test_metric("2024-01")],
            context: create_test_context(),
        }
    }

    #[test]
    fn test_knowledge_base_order() {
        let kb = KnowledgeBase::build(&sample_datasets());
        let kinds: Vec<KnowledgeKind> = kb.items().iter().map(|i| i.kind).collect();

        assert_eq!(
            kinds,
            vec![
                KnowledgeKind::CustomerProfile,
                KnowledgeKind::CustomerProfile,
                KnowledgeKind::CustomerProfile,
                KnowledgeKind::SectorAnalysis,
                KnowledgeKind::SectorAnalysis,
                KnowledgeKind::MonthlyMetrics,
                KnowledgeKind::MonthlyMetrics,
                KnowledgeKind::CompanyContext,
            ]
        );
    }

    #[test]
    fn test_customer_profile_payment_rate() {
        let kb = KnowledgeBase::build(&sample_datasets());
        let profile = &kb.items()[0].content;

        assert!(profile.contains("Cliente: Empresa C1 (C1)"));
        assert!(profile.contains("Faturamento Mensal: R$ 40,000.00"));
        assert!(profile.contains("Total faturado R$ 2,000.00, Taxa de pagamento: 50.0%"));

        let no_transactions = &kb.items()[2].content;
        assert!(no_transactions.contains("Taxa de pagamento: 0.0%"));
    }

    #[test]
    fn test_sector_analysis_block() {
        let kb = KnowledgeBase::build(&sample_datasets());
        let hotelaria = &kb.items()[3];

        assert_eq!(hotelaria.metadata["setor"], json!("hotelaria"));
        assert!(hotelaria.content.starts_with("Análise do Setor Hotelaria:"));
        assert!(hotelaria.content.contains("Total de clientes: 2"));
        assert!(hotelaria.content.contains("Faturamento total: R$ 50,000.00"));
        assert!(hotelaria.content.contains("Ticket médio: R$ 25,000.00"));
    }

    #[test]
    fn test_target_kinds() {
        assert_eq!(target_kinds("Qual a inadimplência?"), vec![KnowledgeKind::MonthlyMetrics]);
        assert_eq!(
            target_kinds("clientes por SETOR"),
            vec![KnowledgeKind::CustomerProfile, KnowledgeKind::SectorAnalysis]
        );
        assert_eq!(target_kinds("bom dia"), DEFAULT_TARGETS.to_vec());
        assert_eq!(
            target_kinds("Situação da LavandeRio"),
            vec![KnowledgeKind::CompanyContext, KnowledgeKind::MonthlyMetrics]
        );
    }

    #[test]
    fn test_context_limited_to_three_blocks() {
        let kb = KnowledgeBase::build(&sample_datasets());
        let context = kb.context_for_query("faturamento dos clientes");

        assert!(context.starts_with(CONTEXT_HEADER));
        assert_eq!(context.matches("Cliente: ").count(), 3);
        assert!(!context.contains("Análise do Setor"));
    }

    #[test]
    fn test_context_for_company_keyword() {
        let kb = KnowledgeBase::build(&sample_datasets());
        let context = kb.context_for_query("fale sobre a lavanderio");

        assert!(context.contains("LavandeRio - Informações Gerais:"));
        assert!(context.contains("Segmentos Atendidos: Hotelaria, Saúde"));
        assert!(context.contains("Análise Preditiva, Gestão de Risco"));
    }

    #[test]
    fn test_fallback_to_general_summary() {
        let mut datasets = sample_datasets();
        datasets.metrics.clear();
        let kb = KnowledgeBase::build(&datasets);

        // only metrics are targeted and there are none
        let context = kb.context_for_query("receita");
        assert_eq!(context, kb.general_summary());
        assert!(context.contains("Total de clientes: 3"));
        assert!(context.contains("Clientes ativos: 2"));
        assert!(context.contains("Clientes inadimplentes: 1"));
        assert!(context.contains("Taxa de inadimplência: N/A%"));
        assert!(context.contains("- hotelaria, saude"));
    }

    #[test]
    fn test_general_summary_uses_latest_metric() {
        let kb = KnowledgeBase::build(&sample_datasets());
        assert!(kb.general_summary().contains("Taxa de inadimplência: 14.89%"));
        assert!(kb.general_summary().contains("Faturamento mensal: R$ 70,000.00"));
    }

    #[test]
    fn test_rag_context_with_loader() {
        let context = rag_context("tendência", || Ok(sample_datasets()));
        assert!(context.contains("Métricas 2023-12:"));
        assert!(context.contains("Taxa Inadimplência: 14.9%"));

        let failed = rag_context("tendência", || Err(AnalyticsError::EmptyDataset("metricas")));
        assert!(failed.starts_with("Erro no sistema RAG:"));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
