use crate::models::{AnalysisResults, ComparisonSummary};
use crate::record::DIMENSIONS;
use crate::stats::ScoreStats;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Unavailable marker used wherever a statistic is undefined.
const UNAVAILABLE: &str = "n/a";

/// Render an optional rate as a percentage with one decimal place.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => UNAVAILABLE.to_string(),
    }
}

/// Render an optional value at full precision.
pub fn format_opt<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => UNAVAILABLE.to_string(),
    }
}

/// Markdown report for a two-judge comparison. Absent statistics render as
/// the unavailable marker; nothing here can fail.
pub fn build_comparison_report(summary: &ComparisonSummary) -> String {
    let meta = &summary.metadata;
    let coverage = &summary.coverage;
    let preference = &summary.preference;
    let behavior = &summary.behavior_tags;
    let ai_cs = &summary.ai_cs;

    let mut lines: Vec<String> = Vec::new();
    lines.push("# Phase 2C Judge Comparison Report".to_string());
    lines.push(String::new());
    lines.push(format!("Generated: {}", meta.generated_at_utc));
    lines.push(format!(
        "Judge A: {}",
        meta.judge_a_model.as_deref().unwrap_or(UNAVAILABLE)
    ));
    lines.push(format!(
        "Judge B: {}",
        meta.judge_b_model.as_deref().unwrap_or(UNAVAILABLE)
    ));
    lines.push(String::new());

    lines.push("## Coverage".to_string());
    lines.push(format!("- Judge A total rows: {}", coverage.judge_a_total_rows));
    lines.push(format!(
        "- Judge A success rows: {}",
        coverage.judge_a_success_rows
    ));
    lines.push(format!("- Judge B total rows: {}", coverage.judge_b_total_rows));
    lines.push(format!(
        "- Judge B success rows: {}",
        coverage.judge_b_success_rows
    ));
    lines.push(format!("- Overlap rows: {}", coverage.overlap_rows));
    lines.push(format!("- Missing in A: {}", coverage.missing_in_a.len()));
    lines.push(format!("- Missing in B: {}", coverage.missing_in_b.len()));
    lines.push(String::new());

    lines.push("## Preference Agreement".to_string());
    lines.push(format!(
        "- Exact match rate: {}",
        format_pct(preference.exact_match_rate)
    ));
    lines.push(format!(
        "- Grouped match rate: {}",
        format_pct(preference.group_match_rate)
    ));
    lines.push(format!(
        "- Mean absolute diff: {}",
        format_opt(&preference.mean_abs_diff)
    ));
    lines.push(format!(
        "- Correlation: {}",
        format_opt(&preference.correlation)
    ));
    lines.push(format!("- Count: {}", preference.count));
    lines.push(String::new());

    lines.push("## Behavior Tag Agreement".to_string());
    lines.push(format!(
        "- Ref tag match rate: {}",
        format_pct(behavior.reference.match_rate)
    ));
    lines.push(format!("- Ref tag count: {}", behavior.reference.count));
    lines.push(format!(
        "- Model tag match rate: {}",
        format_pct(behavior.model.match_rate)
    ));
    lines.push(format!("- Model tag count: {}", behavior.model.count));
    lines.push(String::new());

    lines.push("## AI/CS Agreement".to_string());
    lines.push("| Metric | Mean A | Mean B | Mean Abs Diff | Correlation | Count |".to_string());
    lines.push("| --- | --- | --- | --- | --- | --- |".to_string());
    for (name, metric) in [
        ("ref_ai", &ai_cs.ref_ai),
        ("model_ai", &ai_cs.model_ai),
        ("cs", &ai_cs.cs),
    ] {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            name,
            format_opt(&metric.mean_a),
            format_opt(&metric.mean_b),
            format_opt(&metric.mean_abs_diff),
            format_opt(&metric.correlation),
            metric.count
        ));
    }
    lines.push(String::new());

    lines.push("## Dimension Agreement".to_string());
    lines.push(
        "| Dimension | Ref mean A | Ref mean B | Ref mean abs diff | Ref match rate \
         | Model mean A | Model mean B | Model mean abs diff | Model match rate |"
            .to_string(),
    );
    lines.push("| --- | --- | --- | --- | --- | --- | --- | --- | --- |".to_string());
    for dim in DIMENSIONS {
        let Some(entry) = summary.dimensions.get(dim) else {
            continue;
        };
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            dim,
            format_opt(&entry.reference.mean_a),
            format_opt(&entry.reference.mean_b),
            format_opt(&entry.reference.mean_abs_diff),
            format_pct(entry.reference.exact_match_rate),
            format_opt(&entry.model.mean_a),
            format_opt(&entry.model.mean_b),
            format_opt(&entry.model.mean_abs_diff),
            format_pct(entry.model.exact_match_rate),
        ));
    }
    lines.push(String::new());

    lines.push("## Inputs".to_string());
    lines.push(format!("- Judge A file: {}", meta.judge_a_file));
    lines.push(format!("- Judge B file: {}", meta.judge_b_file));

    lines.join("\n")
}

fn push_score_stats(lines: &mut Vec<String>, label: &str, stats: &ScoreStats) {
    lines.push(format!("{label}:"));
    lines.push(format!(
        "  Mean: {:.4}, Median: {:.4}, StDev: {:.4}",
        stats.mean, stats.median, stats.stdev
    ));
    lines.push(format!("  Range: [{:.4}, {:.4}]", stats.min, stats.max));
}

fn push_tag_counts(lines: &mut Vec<String>, counts: &BTreeMap<String, usize>) {
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (tag, count) in entries {
        lines.push(format!("  {tag}: {count}"));
    }
}

/// Plain-text report for a single-run analysis, printed to stdout.
pub fn build_analysis_report(results: &AnalysisResults) -> String {
    let mut lines: Vec<String> = Vec::new();
    let rule = "=".repeat(80);

    lines.push(rule.clone());
    lines.push("ANCHOR-5 JUDGE EVALUATIONS ANALYSIS REPORT (CPTRed-2025 Metrics)".to_string());
    lines.push(format!("Generated: {}", results.metadata.analysis_timestamp));
    lines.push(rule.clone());

    lines.push(String::new());
    lines.push("📊 OVERVIEW".to_string());
    lines.push(format!(
        "Total Evaluations: {}",
        results.metadata.total_evaluations
    ));
    lines.push(format!("Successful: {}", results.metadata.successful));
    lines.push(format!(
        "Canonical Records Evaluated: {}",
        results.canonical_comparison.matched_records
    ));
    lines.push(format!(
        "Coverage: {:.1}%",
        results.canonical_comparison.evaluation_coverage
    ));

    lines.push(String::new());
    lines.push("📈 EPISTEMIC AWARENESS METRICS (CPTRed-2025)".to_string());
    let metrics = &results.metrics;
    match &metrics.ref_ai {
        Some(stats) => push_score_stats(&mut lines, "Reference AI (Awareness Index)", stats),
        None => lines.push(format!("Reference AI (Awareness Index): {UNAVAILABLE}")),
    }
    match &metrics.model_ai {
        Some(stats) => push_score_stats(&mut lines, "Model AI (Awareness Index)", stats),
        None => lines.push(format!("Model AI (Awareness Index): {UNAVAILABLE}")),
    }
    match &metrics.cs {
        Some(stats) => {
            push_score_stats(&mut lines, "Compression Signal (CS = model_ai - ref_ai)", stats);
            lines.push(format!(
                "  Interpretation: {}",
                metrics.cs_interpretation.as_deref().unwrap_or(UNAVAILABLE)
            ));
        }
        None => lines.push(format!(
            "Compression Signal (CS = model_ai - ref_ai): {UNAVAILABLE}"
        )),
    }

    if let Some(prefs) = &results.preference_distribution {
        lines.push(String::new());
        lines.push("⭐ PREFERENCE SCORES".to_string());
        lines.push(format!(
            "Reference Preferred: {} ({:.1}%)",
            prefs.ref_preferred, prefs.ref_preferred_pct
        ));
        lines.push(format!("Equal: {}", prefs.equal));
        lines.push(format!(
            "Model Preferred: {} ({:.1}%)",
            prefs.model_preferred, prefs.model_preferred_pct
        ));
    }

    lines.push(String::new());
    lines.push("🏷️  BEHAVIOR TAGS - REFERENCE ANSWERS".to_string());
    push_tag_counts(&mut lines, &results.behavior_tags.ref_tags);
    lines.push(String::new());
    lines.push("🏷️  BEHAVIOR TAGS - MODEL ANSWERS".to_string());
    push_tag_counts(&mut lines, &results.behavior_tags.model_tags);

    lines.push(String::new());
    lines.push("🔍 EPISTEMIC DIMENSIONS (Mean Scores)".to_string());
    lines.push(format!(
        "{:<20} {:<15} {:<15} {:<10}",
        "Dimension", "Reference", "Model", "Diff"
    ));
    lines.push("-".repeat(60));
    for dim in DIMENSIONS {
        let Some(entry) = results.dimension_analysis.get(dim) else {
            continue;
        };
        let ref_mean = entry
            .reference
            .as_ref()
            .map(|s| format!("{:.2}", s.mean))
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        let model_mean = entry
            .model
            .as_ref()
            .map(|s| format!("{:.2}", s.mean))
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        let diff = entry
            .difference
            .as_ref()
            .map(|d| format!("{:.2}", d.mean_diff))
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        lines.push(format!("{dim:<20} {ref_mean:<15} {model_mean:<15} {diff:<10}"));
    }

    lines.push(String::new());
    lines.push(rule);
    lines.join("\n")
}
