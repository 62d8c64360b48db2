use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Expected artifacts where any one of the alternatives satisfies the check.
const REQUIRED_ANY: [&[&str]; 2] = [
    &[
        "manuscript/20260208 Judge-Mediated Mapping of Epistemic Structures in TruthfulQA An Exploratory Study with the CPT Anchor-5 Protocol v15.md",
        "manuscript/20260128 Measuring Textual Markers of Epistemic Stance v4.md",
    ],
    &[
        "20260106_REPLICATION_GUIDELINES.md",
        "REPLICATION_GUIDELINES.md",
    ],
];

/// Expected artifacts that must exist exactly as named.
const REQUIRED: [&str; 11] = [
    "additional/20260106_anchor5_analysis_results.json",
    "data/evaluated/20260114_anchor5_analysis_summary.md",
    "data/evaluated/20260114_anchor5_analysis_results.json",
    "data/evaluated/20260119_haiku_replication_run/20260119_anchor5_analysis_summary.md",
    "data/evaluated/20260119_haiku_replication_run/20260119_anchor5_analysis_results.json",
    "data/evaluated/20260119_haiku_replication_run/20260120_anchor5_analysis_comparison_report.md",
    "data/evaluated/phase2c/20260125_gpt4o_mini_vs_haiku_report.md",
    "data/evaluated/phase2c/20260125_all_4_runs_table_overview.md",
    "data/evaluated/phase2c/20260125_gpt4o_mini_vs_haiku_summary.json",
    "data/evaluated/20260123_Haiku_4_5/20260125_Haiku_4_5_completed_latest_merged_summary.json",
    "data/evaluated/20260123_Haiku_4_5/20260125_all_817_runs_table_overview.md",
];

/// Verify the expected analysis bundle under the current directory and
/// print its headline metrics.
pub fn run() -> Result<()> {
    run_in(Path::new("."))
}

fn require_any(root: &Path, alternatives: &[&str]) -> Result<()> {
    if alternatives.iter().any(|rel| root.join(rel).exists()) {
        return Ok(());
    }
    bail!("missing expected file: {}", alternatives.join(" or "));
}

fn require_exists(root: &Path, rel: &str) -> Result<()> {
    if root.join(rel).exists() {
        return Ok(());
    }
    bail!("missing expected file: {rel}");
}

fn load_json(root: &Path, rel: &str) -> Result<Value> {
    let path = root.join(rel);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Format a scalar the way the summaries are inspected by hand: floats at
/// six decimal places, everything else verbatim.
fn fmt_value(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => format!("{:.6}", n.as_f64().unwrap_or_default()),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Null => "n/a".to_string(),
        other => other.to_string(),
    }
}

fn field<'a>(value: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = value;
    for key in path {
        current = current
            .get(key)
            .ok_or_else(|| anyhow!("missing field {}", path.join(".")))?;
    }
    Ok(current)
}

fn field_f64(value: &Value, path: &[&str]) -> Result<f64> {
    field(value, path)?
        .as_f64()
        .ok_or_else(|| anyhow!("field {} is not a number", path.join(".")))
}

fn print_metric(label: &str, value: Result<&Value>) -> Result<()> {
    let value = value?;
    println!("{label}: {}", fmt_value(value));
    Ok(())
}

fn run_in(root: &Path) -> Result<()> {
    for alternatives in REQUIRED_ANY {
        require_any(root, alternatives)?;
    }
    for rel in REQUIRED {
        require_exists(root, rel)?;
    }
    info!("all expected bundle files present");

    let gpt = load_json(root, "additional/20260106_anchor5_analysis_results.json")?;
    let haiku = load_json(root, "data/evaluated/20260114_anchor5_analysis_results.json")?;
    let haiku_rep = load_json(
        root,
        "data/evaluated/20260119_haiku_replication_run/20260119_anchor5_analysis_results.json",
    )?;
    let judge_cmp = load_json(
        root,
        "data/evaluated/phase2c/20260125_gpt4o_mini_vs_haiku_summary.json",
    )?;
    let haiku45 = load_json(
        root,
        "data/evaluated/20260123_Haiku_4_5/20260125_Haiku_4_5_completed_latest_merged_summary.json",
    )?;

    println!("OK: all expected files present");

    println!("\n== GPT-4o-mini run (Phase 2A aggregate) ==");
    print_metric("ref_ai.mean", field(&gpt, &["metrics", "ref_ai", "mean"]))?;
    print_metric("model_ai.mean", field(&gpt, &["metrics", "model_ai", "mean"]))?;
    print_metric("cs.mean", field(&gpt, &["metrics", "cs", "mean"]))?;
    print_metric(
        "model_preferred_pct",
        field(&gpt, &["preference_distribution", "model_preferred_pct"]),
    )?;

    println!("\n== Claude Haiku 3.5 run (Phase 2B aggregate) ==");
    print_metric("ref_ai.mean", field(&haiku, &["metrics", "ref_ai", "mean"]))?;
    print_metric(
        "model_ai.mean",
        field(&haiku, &["metrics", "model_ai", "mean"]),
    )?;
    print_metric("cs.mean", field(&haiku, &["metrics", "cs", "mean"]))?;
    print_metric(
        "model_preferred_pct",
        field(&haiku, &["preference_distribution", "model_preferred_pct"]),
    )?;

    println!("\n== Haiku 3.5 replication (20260119 aggregate) ==");
    print_metric("successful", field(&haiku_rep, &["metadata", "successful"]))?;
    print_metric(
        "ref_ai.mean",
        field(&haiku_rep, &["metrics", "ref_ai", "mean"]),
    )?;
    print_metric(
        "model_ai.mean",
        field(&haiku_rep, &["metrics", "model_ai", "mean"]),
    )?;
    print_metric("cs.mean", field(&haiku_rep, &["metrics", "cs", "mean"]))?;

    println!("\n== Haiku replication deltas (20260119 - 20260114) ==");
    for metric in ["ref_ai", "model_ai", "cs"] {
        let delta = field_f64(&haiku_rep, &["metrics", metric, "mean"])?
            - field_f64(&haiku, &["metrics", metric, "mean"])?;
        println!("{metric}.mean delta: {delta:.6}");
    }

    println!("\n== Judge comparison (GPT-4o-mini vs Haiku 3.5 aggregate) ==");
    print_metric(
        "group_match_rate",
        field(&judge_cmp, &["preference", "group_match_rate"]),
    )?;
    print_metric(
        "exact_match_rate",
        field(&judge_cmp, &["preference", "exact_match_rate"]),
    )?;
    print_metric(
        "cs.mean_a (GPT-4o-mini)",
        field(&judge_cmp, &["ai_cs", "cs", "mean_a"]),
    )?;
    print_metric(
        "cs.mean_b (Haiku 3.5)",
        field(&judge_cmp, &["ai_cs", "cs", "mean_b"]),
    )?;

    println!("\n== Haiku 4.5 run (aggregate summary) ==");
    for key in ["judge_model", "total_records", "successful", "success_rate"] {
        let value = haiku45.get(key).unwrap_or(&Value::Null);
        println!("{key}: {}", fmt_value(value));
    }
    let empty = Value::Object(serde_json::Map::new());
    let dims = haiku45.get("dimension_scores").unwrap_or(&empty);
    // Print a stable subset.
    for key in [
        "visibility_ref_avg",
        "visibility_model_avg",
        "self_reflexivity_ref_avg",
        "self_reflexivity_model_avg",
    ] {
        if let Some(value) = dims.get(key) {
            println!("{key}: {}", fmt_value(value));
        }
    }

    Ok(())
}
