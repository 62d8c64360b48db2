use crate::stats::{DiffStats, ScoreStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance header for a two-judge comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonMetadata {
    pub generated_at_utc: String,
    pub judge_a_file: String,
    pub judge_b_file: String,
    pub judge_a_model: Option<String>,
    pub judge_b_model: Option<String>,
    pub protocol: String,
    pub comparison: String,
}

/// Row coverage of the two datasets and their overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coverage {
    pub judge_a_total_rows: usize,
    pub judge_a_success_rows: usize,
    pub judge_b_total_rows: usize,
    pub judge_b_success_rows: usize,
    pub overlap_rows: usize,
    pub missing_in_a: Vec<i64>,
    pub missing_in_b: Vec<i64>,
}

/// Agreement on the 1-5 preference score across overlapping rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceSummary {
    pub exact_match_rate: Option<f64>,
    pub group_match_rate: Option<f64>,
    pub mean_abs_diff: Option<f64>,
    pub correlation: Option<f64>,
    pub distribution_a: BTreeMap<String, usize>,
    pub distribution_b: BTreeMap<String, usize>,
    pub count: usize,
}

/// Behavior tag agreement for one answer side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSideSummary {
    pub match_rate: Option<f64>,
    pub distribution_a: BTreeMap<String, usize>,
    pub distribution_b: BTreeMap<String, usize>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorTagSummary {
    #[serde(rename = "ref")]
    pub reference: TagSideSummary,
    pub model: TagSideSummary,
}

/// Per-dimension agreement for one answer side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionSideSummary {
    pub mean_a: Option<f64>,
    pub mean_b: Option<f64>,
    pub mean_abs_diff: Option<f64>,
    pub exact_match_rate: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionSummary {
    #[serde(rename = "ref")]
    pub reference: DimensionSideSummary,
    pub model: DimensionSideSummary,
}

/// Agreement on one derived metric (ref AI, model AI, or CS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiCsMetricSummary {
    pub mean_a: Option<f64>,
    pub mean_b: Option<f64>,
    pub mean_abs_diff: Option<f64>,
    pub correlation: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiCsSummary {
    pub ref_ai: AiCsMetricSummary,
    pub model_ai: AiCsMetricSummary,
    pub cs: AiCsMetricSummary,
}

/// Complete output of the two-judge comparison, serialized to the
/// `<prefix>_summary.json` artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub metadata: ComparisonMetadata,
    pub coverage: Coverage,
    pub preference: PreferenceSummary,
    pub behavior_tags: BehaviorTagSummary,
    pub dimensions: BTreeMap<String, DimensionSummary>,
    pub ai_cs: AiCsSummary,
}

/// Provenance header for a single-run analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_timestamp: String,
    pub evaluation_file: String,
    pub canonical_file: String,
    pub total_evaluations: usize,
    pub successful: usize,
    pub protocol: String,
    pub metrics_version: String,
}

/// AI/CS aggregates over one run. The headline `cs_mean` and its reading
/// are only present when any record had a complete dimension set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub ref_ai: Option<ScoreStats>,
    pub model_ai: Option<ScoreStats>,
    pub cs: Option<ScoreStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cs_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cs_interpretation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    #[serde(rename = "ref")]
    pub reference: Option<ScoreStats>,
    pub model: Option<ScoreStats>,
    pub difference: Option<DiffStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceDistribution {
    pub distribution: BTreeMap<String, usize>,
    pub ref_strong: usize,
    pub ref_slight: usize,
    pub equal: usize,
    pub model_slight: usize,
    pub model_strong: usize,
    pub total: usize,
    pub ref_preferred: usize,
    pub model_preferred: usize,
    pub ref_preferred_pct: f64,
    pub model_preferred_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorTagCounts {
    pub ref_tags: BTreeMap<String, usize>,
    pub model_tags: BTreeMap<String, usize>,
}

/// Overlap between the evaluated rows and the canonical question set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalComparison {
    pub total_evaluations: usize,
    pub matched_records: usize,
    pub unmatched_rowindex: Vec<i64>,
    pub evaluation_coverage: f64,
}

/// Complete output of the single-run analysis, serialized to the results
/// JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub metadata: AnalysisMetadata,
    pub metrics: MetricsSummary,
    pub dimension_analysis: BTreeMap<String, DimensionAnalysis>,
    pub preference_distribution: Option<PreferenceDistribution>,
    pub behavior_tags: BehaviorTagCounts,
    pub canonical_comparison: CanonicalComparison,
}
