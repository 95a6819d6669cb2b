use serde::Serialize;
use std::collections::BTreeMap;

/// Category assigned to buildings whose usage is not recorded ("other")
pub const FALLBACK_CATEGORY: &str = "기타";

/// Coefficient used for any category missing from the table
pub const DEFAULT_COEFFICIENT: f64 = 0.080;

/// Per-unit-area emission coefficients by building usage category
const STANDARD_FACTORS: &[(&str, f64)] = &[
    ("공동주택", 0.08),
    ("공장", 0.065),
    ("관광휴게시설", 0.114),
    ("교육연구및복지시설", 0.047),
    ("교육연구시설", 0.047),
    ("교정및군사시설", 0.059),
    ("근린생활시설", 0.080),
    ("노유자시설", 0.047),
    ("단독주택", 0.080),
    ("동.식물 관련시설", 0.059),
    ("묘지관련시설", 0.059),
    ("문화및집회시설", 0.065),
    ("방송통신시설", 0.065),
    ("분뇨.쓰레기처리시설", 0.095),
    ("수련시설", 0.059),
    ("숙박시설", 0.093),
    ("업무시설", 0.060),
    ("운동시설", 0.059),
    ("운수시설", 0.059),
    ("위락시설", 0.114),
    ("위험물저장및처리시설", 0.095),
    ("의료시설", 0.123),
    ("자동차관련시설", 0.046),
    ("제1종근린생활시설", 0.080),
    ("제2종근린생활시설", 0.080),
    ("종교시설", 0.032),
    ("창고시설", 0.046),
    ("판매및영업시설", 0.080),
    ("판매시설", 0.080),
    (FALLBACK_CATEGORY, 0.080),
];

/// Immutable category -> coefficient mapping
///
/// Built once at startup and handed to the estimator and to scenario
/// sessions, which need it again for interactive recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmissionFactors {
    factors: BTreeMap<String, f64>,
}

impl EmissionFactors {
    /// The reference table of 29 usage categories plus the fallback entry
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD_FACTORS.iter().map(|(k, v)| (k.to_string(), *v)))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            factors: pairs.into_iter().collect(),
        }
    }

    /// Coefficient for a category, `DEFAULT_COEFFICIENT` when unknown
    pub fn coefficient(&self, category: &str) -> f64 {
        self.factors
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_COEFFICIENT)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.factors.contains_key(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.factors.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self::standard()
    }
}
