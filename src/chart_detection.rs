// 🧭 Chart Detection - decide whether a text answer is worth plotting
//
// Four pattern families are matched against the lower-cased content and query.
// A family scores one point per pattern found in either text.

use crate::charts::ChartKind;
use crate::error::{AnalyticsError, Result};
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

const TEMPORAL_PATTERNS: &[&str] = &[
    r"m[eê]s a m[eê]s",
    r"ao longo do tempo",
    r"evolu[çc][aã]o",
    r"tend[eê]ncia",
    r"hist[óo]rico",
    r"crescimento",
    r"queda",
    r"varia[çc][aã]o",
    r"janeiro|fevereiro|março|abril|maio|junho|julho|agosto|setembro|outubro|novembro|dezembro",
    r"2018|2019|2020|2021|2022|2023|2024",
    r"trimestre|semestre|anual",
    r"duas linhas",
    r"múltiplas linhas",
    r"faturamento.*inadimpl",
    r"inadimpl.*faturamento",
    r"receita.*inadimpl",
    r"inadimpl.*receita",
    r"pagamentos.*data de vencimento",
    r"n[úu]mero de pagamentos.*data",
    r"data de pagamento",
    r"pago.*por m[eê]s",
    r"faturamento.*por m[eê]s",
    r"faturamento.*mensal",
    r"receita.*mensal",
    r"faturamento.*em 202[0-9]",
    r"receita.*em 202[0-9]",
    // several money amounts usually mean a series
    r"r\$.*\d+.*r\$.*\d+",
];

const DISTRIBUTION_PATTERNS: &[&str] = &[
    r"distribu[íi][çc][aã]o",
    r"por setor",
    r"por regi[aã]o",
    r"por tipo",
    r"por categoria",
    r"segmenta[çc][aã]o",
    r"participa[çc][aã]o",
    r"propor[çc][aã]o",
    r"percentual",
    r"porcentagem",
    r"quantidade.*por",
    r"n[úu]mero.*por",
    r"quantas.*empresas",
    r"quantos.*clientes",
];

const RANKING_PATTERNS: &[&str] = &[
    r"ranking",
    r"top \d+",
    r"maiores",
    r"menores",
    r"compara[çc][aã]o",
    r"vs\.|versus",
    r"entre",
    r"ordem",
    r"classifica[çc][aã]o",
];

const NUMERICAL_PATTERNS: &[&str] = &[
    r"r\$\s*[\d.,]+",
    r"\d+[.,]?\d*\s*(mil|milh[õo]es?|k|m)",
    r"\d+[.,]?\d*%",
    r"faturamento",
    r"receita",
    r"valor",
    r"quantidade",
    r"n[úu]mero",
];

const EXPLICIT_CHART_KEYWORDS: &[&str] = &[
    "gráfico",
    "grafico",
    "chart",
    "visualiza",
    "mostra",
    "plota",
    "desenha",
];

pub const CHARTABLE_THRESHOLD: f64 = 40.0;
const SHORT_CONTENT_CHARS: usize = 100;
const WEAK_SIGNAL_FACTOR: f64 = 0.6;
const EXPLICIT_REQUEST_BONUS: f64 = 20.0;
const EXPLICIT_REQUEST_CAP: f64 = 95.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDetection {
    pub is_chartable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartKind>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_title: Option<String>,
}

struct PatternFamilies {
    temporal: RegexSet,
    distribution: RegexSet,
    ranking: RegexSet,
    numerical: RegexSet,
}

impl PatternFamilies {
    fn compile() -> std::result::Result<Self, regex::Error> {
        Ok(PatternFamilies {
            temporal: RegexSet::new(TEMPORAL_PATTERNS)?,
            distribution: RegexSet::new(DISTRIBUTION_PATTERNS)?,
            ranking: RegexSet::new(RANKING_PATTERNS)?,
            numerical: RegexSet::new(NUMERICAL_PATTERNS)?,
        })
    }
}

fn families() -> Result<&'static PatternFamilies> {
    static FAMILIES: OnceLock<std::result::Result<PatternFamilies, regex::Error>> =
        OnceLock::new();

    FAMILIES
        .get_or_init(PatternFamilies::compile)
        .as_ref()
        .map_err(|e| AnalyticsError::Pattern(e.clone()))
}

/// Number of patterns in the set found in either text
fn family_score(set: &RegexSet, content: &str, query: &str) -> usize {
    let in_content = set.matches(content);
    let in_query = set.matches(query);

    (0..set.len())
        .filter(|&i| in_content.matched(i) || in_query.matched(i))
        .count()
}

pub fn detect_chartable_content(content: &str, query: &str) -> Result<ChartDetection> {
    let families = families()?;
    let normalized_content = content.to_lowercase();
    let normalized_query = query.to_lowercase();

    let temporal = family_score(&families.temporal, &normalized_content, &normalized_query);
    let distribution =
        family_score(&families.distribution, &normalized_content, &normalized_query);
    let ranking = family_score(&families.ranking, &normalized_content, &normalized_query);
    let numerical = family_score(&families.numerical, &normalized_content, &normalized_query);

    let (chart_type, mut confidence, title) = if temporal > 0 && numerical > 0 {
        let kind = if temporal > 2 {
            ChartKind::Area
        } else {
            ChartKind::Line
        };
        (
            Some(kind),
            (((temporal + numerical) * 15) as f64).min(90.0),
            Some("Evolução Temporal"),
        )
    } else if distribution > 0 && numerical > 0 {
        (
            Some(ChartKind::Pie),
            (((distribution + numerical) * 12) as f64).min(85.0),
            Some("Distribuição por Categoria"),
        )
    } else if ranking > 0 && numerical > 0 {
        (
            Some(ChartKind::Bar),
            (((ranking + numerical) * 10) as f64).min(80.0),
            Some("Ranking e Comparações"),
        )
    } else {
        (None, 0.0, None)
    };

    let explicit_request = EXPLICIT_CHART_KEYWORDS
        .iter()
        .any(|keyword| normalized_query.contains(keyword));

    if explicit_request && chart_type.is_some() {
        confidence = (confidence + EXPLICIT_REQUEST_BONUS).min(EXPLICIT_REQUEST_CAP);
    }

    if content.chars().count() < SHORT_CONTENT_CHARS || numerical == 0 {
        confidence *= WEAK_SIGNAL_FACTOR;
    }

    debug!(
        temporal,
        distribution,
        ranking,
        numerical,
        confidence,
        "Chart detection scores"
    );

    Ok(ChartDetection {
        is_chartable: confidence > CHARTABLE_THRESHOLD && chart_type.is_some(),
        chart_type,
        confidence,
        suggested_title: title.map(str::to_string),
    })
}
