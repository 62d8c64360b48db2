use crate::loader::{self, IndexedSet, LoadError};
use crate::models::{
    AnalysisMetadata, AnalysisResults, BehaviorTagCounts, CanonicalComparison, DimensionAnalysis,
    MetricsSummary, PreferenceDistribution,
};
use crate::record::{DIMENSIONS, EvalRecord};
use crate::report;
use crate::stats;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Fixed data layout of an evaluation run, relative to the working directory.
const EVALUATION_FILE: &str = "data/evaluated/gpt4o_mini_anchor5_817_full_20260106_001318.jsonl";
const CANONICAL_FILE: &str = "data/processed/20260105_817_qna_answers_with_rowindex.jsonl";
const RESULTS_FILE: &str = "anchor5_analysis_results.json";

/// Analyze the fixed single-run evaluation file: print the report to stdout
/// and write the results JSON.
pub fn run() -> Result<()> {
    let records = loader::load_jsonl(Path::new(EVALUATION_FILE))
        .with_context(|| format!("failed to load evaluation file {EVALUATION_FILE}"))?;
    let index = loader::index_records(&records);

    // A missing canonical file degrades to zero coverage instead of
    // aborting the whole analysis.
    let canonical = match load_canonical(Path::new(CANONICAL_FILE)) {
        Ok(canonical) => canonical,
        Err(LoadError::NotFound { path, .. }) => {
            warn!(path = %path.display(), "canonical file missing, coverage will be empty");
            BTreeMap::new()
        }
        Err(err) => return Err(err).context("failed to load canonical file"),
    };

    let results = analyze_records(&index, &canonical, EVALUATION_FILE, CANONICAL_FILE);

    println!("{}", report::build_analysis_report(&results));

    let json = serde_json::to_string_pretty(&results).context("failed to serialize results")?;
    std::fs::write(RESULTS_FILE, json)
        .with_context(|| format!("failed to write results {RESULTS_FILE}"))?;
    info!(path = RESULTS_FILE, "wrote analysis results");

    Ok(())
}

/// Canonical question rows keyed by row identifier, falling back to the
/// 1-based file position for rows without one.
pub fn load_canonical(path: &Path) -> Result<BTreeMap<i64, EvalRecord>, LoadError> {
    let records = loader::load_jsonl(path)?;
    Ok(records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| (rec.row_index().unwrap_or(i as i64 + 1), rec))
        .collect())
}

/// Aggregate one indexed evaluation run into the full analysis structure.
pub fn analyze_records(
    index: &IndexedSet,
    canonical: &BTreeMap<i64, EvalRecord>,
    evaluation_file: &str,
    canonical_file: &str,
) -> AnalysisResults {
    let records: Vec<&EvalRecord> = index.by_row.values().collect();

    AnalysisResults {
        metadata: AnalysisMetadata {
            analysis_timestamp: Utc::now().to_rfc3339(),
            evaluation_file: evaluation_file.to_string(),
            canonical_file: canonical_file.to_string(),
            total_evaluations: index.total,
            successful: index.successful,
            protocol: "Anchor-5 (CPTRed-2025)".to_string(),
            metrics_version: "AI/CS (Epistemic Awareness Index / Compression Signal)".to_string(),
        },
        metrics: aggregate_metrics(&records),
        dimension_analysis: aggregate_dimensions(&records),
        preference_distribution: preference_distribution(&records),
        behavior_tags: behavior_tags(&records),
        canonical_comparison: compare_to_canonical(index, canonical),
    }
}

/// AI/CS aggregates. Only records with all seven dimensions scored on both
/// sides contribute.
fn aggregate_metrics(records: &[&EvalRecord]) -> MetricsSummary {
    let mut ref_ai = Vec::new();
    let mut model_ai = Vec::new();
    let mut cs = Vec::new();
    for record in records {
        if let Some(aics) = record.ai_cs() {
            ref_ai.push(aics.ref_ai);
            model_ai.push(aics.model_ai);
            cs.push(aics.cs);
        }
    }

    let cs_mean = stats::mean(&cs);
    let cs_interpretation = cs_mean.map(|m| {
        if m > 0.0 {
            "Model shows MORE awareness".to_string()
        } else {
            "Reference shows MORE awareness".to_string()
        }
    });

    MetricsSummary {
        ref_ai: stats::summarize(&ref_ai),
        model_ai: stats::summarize(&model_ai),
        cs: stats::summarize(&cs),
        cs_mean,
        cs_interpretation,
    }
}

fn aggregate_dimensions(records: &[&EvalRecord]) -> BTreeMap<String, DimensionAnalysis> {
    let mut out = BTreeMap::new();
    for dim in DIMENSIONS {
        let mut ref_scores = Vec::new();
        let mut model_scores = Vec::new();
        for record in records {
            let (ref_map, model_map) = record.extract_scores();
            if let Some(&v) = ref_map.get(dim) {
                ref_scores.push(v);
            }
            if let Some(&v) = model_map.get(dim) {
                model_scores.push(v);
            }
        }
        out.insert(
            dim.to_string(),
            DimensionAnalysis {
                reference: stats::summarize(&ref_scores),
                model: stats::summarize(&model_scores),
                difference: stats::diff_stats(&ref_scores, &model_scores),
            },
        );
    }
    out
}

fn preference_distribution(records: &[&EvalRecord]) -> Option<PreferenceDistribution> {
    let preferences: Vec<i64> = records.iter().filter_map(|r| r.preference()).collect();
    if preferences.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &p in &preferences {
        *counts.entry(p).or_insert(0) += 1;
    }
    let count = |p: i64| counts.get(&p).copied().unwrap_or(0);

    let total = preferences.len();
    let ref_preferred = count(1) + count(2);
    let model_preferred = count(4) + count(5);

    Some(PreferenceDistribution {
        distribution: counts
            .iter()
            .map(|(p, n)| (p.to_string(), *n))
            .collect(),
        ref_strong: count(1),
        ref_slight: count(2),
        equal: count(3),
        model_slight: count(4),
        model_strong: count(5),
        total,
        ref_preferred,
        model_preferred,
        ref_preferred_pct: ref_preferred as f64 / total as f64 * 100.0,
        model_preferred_pct: model_preferred as f64 / total as f64 * 100.0,
    })
}

fn behavior_tags(records: &[&EvalRecord]) -> BehaviorTagCounts {
    let mut ref_tags: BTreeMap<String, usize> = BTreeMap::new();
    let mut model_tags: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        if let Some(tag) = record.tag_ref() {
            *ref_tags.entry(tag.to_string()).or_insert(0) += 1;
        }
        if let Some(tag) = record.tag_model() {
            *model_tags.entry(tag.to_string()).or_insert(0) += 1;
        }
    }
    BehaviorTagCounts {
        ref_tags,
        model_tags,
    }
}

fn compare_to_canonical(
    index: &IndexedSet,
    canonical: &BTreeMap<i64, EvalRecord>,
) -> CanonicalComparison {
    let matched: Vec<i64> = canonical
        .keys()
        .filter(|row| index.by_row.contains_key(*row))
        .copied()
        .collect();
    let unmatched: Vec<i64> = canonical
        .keys()
        .filter(|row| !index.by_row.contains_key(*row))
        .copied()
        .collect();

    let coverage = if canonical.is_empty() {
        0.0
    } else {
        matched.len() as f64 / canonical.len() as f64 * 100.0
    };
    info!(
        matched = matched.len(),
        canonical = canonical.len(),
        "compared evaluations to canonical rows"
    );

    CanonicalComparison {
        total_evaluations: index.total,
        matched_records: matched.len(),
        unmatched_rowindex: unmatched,
        evaluation_coverage: coverage,
    }
}
