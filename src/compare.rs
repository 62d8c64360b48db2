use crate::loader::{self, IndexedSet};
use crate::models::{
    AiCsMetricSummary, AiCsSummary, BehaviorTagSummary, ComparisonMetadata, ComparisonSummary,
    Coverage, DimensionSideSummary, DimensionSummary, PreferenceSummary, TagSideSummary,
};
use crate::record::{DIMENSIONS, EvalRecord};
use crate::stats;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paired per-row observations for one answer side of one dimension.
#[derive(Default)]
struct PairedValues {
    a: Vec<f64>,
    b: Vec<f64>,
}

impl PairedValues {
    fn push(&mut self, a: f64, b: f64) {
        self.a.push(a);
        self.b.push(b);
    }

    fn dimension_side(&self) -> DimensionSideSummary {
        DimensionSideSummary {
            mean_a: stats::mean(&self.a),
            mean_b: stats::mean(&self.b),
            mean_abs_diff: stats::mean_abs_diff(&self.a, &self.b),
            exact_match_rate: stats::exact_match_rate(&self.a, &self.b),
            count: self.a.len(),
        }
    }

    fn ai_cs_metric(&self) -> AiCsMetricSummary {
        AiCsMetricSummary {
            mean_a: stats::mean(&self.a),
            mean_b: stats::mean(&self.b),
            mean_abs_diff: stats::mean_abs_diff(&self.a, &self.b),
            correlation: stats::pearson(&self.a, &self.b),
            count: self.a.len(),
        }
    }
}

fn count_into(counter: &mut BTreeMap<String, usize>, key: impl ToString) {
    *counter.entry(key.to_string()).or_insert(0) += 1;
}

/// Compare two judge evaluation files row by row.
///
/// Loads and indexes both files, restricts every agreement statistic to the
/// rows present in both, and reports which rows each side is missing.
pub fn compare_judges(judge_a_path: &Path, judge_b_path: &Path) -> Result<ComparisonSummary> {
    let records_a = loader::load_jsonl(judge_a_path)
        .with_context(|| format!("failed to load judge A file {}", judge_a_path.display()))?;
    let records_b = loader::load_jsonl(judge_b_path)
        .with_context(|| format!("failed to load judge B file {}", judge_b_path.display()))?;

    let metadata = ComparisonMetadata {
        generated_at_utc: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        judge_a_file: judge_a_path.display().to_string(),
        judge_b_file: judge_b_path.display().to_string(),
        judge_a_model: loader::judge_model(&records_a),
        judge_b_model: loader::judge_model(&records_b),
        protocol: "Anchor-5".to_string(),
        comparison: "Phase 2C judge agreement".to_string(),
    };

    let index_a = loader::index_records(&records_a);
    let index_b = loader::index_records(&records_b);

    Ok(build_summary(metadata, &index_a, &index_b))
}

fn build_summary(
    metadata: ComparisonMetadata,
    index_a: &IndexedSet,
    index_b: &IndexedSet,
) -> ComparisonSummary {
    // BTreeMap keys iterate sorted, so all three lists come out ordered.
    let overlap: Vec<i64> = index_a
        .by_row
        .keys()
        .filter(|row| index_b.by_row.contains_key(*row))
        .copied()
        .collect();
    let missing_in_a: Vec<i64> = index_b
        .by_row
        .keys()
        .filter(|row| !index_a.by_row.contains_key(*row))
        .copied()
        .collect();
    let missing_in_b: Vec<i64> = index_a
        .by_row
        .keys()
        .filter(|row| !index_b.by_row.contains_key(*row))
        .copied()
        .collect();

    info!(
        overlap = overlap.len(),
        missing_in_a = missing_in_a.len(),
        missing_in_b = missing_in_b.len(),
        "aligned judge datasets"
    );

    let mut pref_a: Vec<f64> = Vec::new();
    let mut pref_b: Vec<f64> = Vec::new();
    let mut pref_group_a = Vec::new();
    let mut pref_group_b = Vec::new();
    let mut pref_counts_a = BTreeMap::new();
    let mut pref_counts_b = BTreeMap::new();

    let mut tag_sides: [(fn(&EvalRecord) -> Option<&str>, PairedTags); 2] = [
        (EvalRecord::tag_ref, PairedTags::default()),
        (EvalRecord::tag_model, PairedTags::default()),
    ];

    let mut dim_ref: BTreeMap<&str, PairedValues> = BTreeMap::new();
    let mut dim_model: BTreeMap<&str, PairedValues> = BTreeMap::new();

    let mut ref_ai = PairedValues::default();
    let mut model_ai = PairedValues::default();
    let mut cs = PairedValues::default();

    for row in &overlap {
        let rec_a = &index_a.by_row[row];
        let rec_b = &index_b.by_row[row];

        if let (Some(pa), Some(pb)) = (rec_a.preference(), rec_b.preference()) {
            pref_a.push(pa as f64);
            pref_b.push(pb as f64);
            count_into(&mut pref_counts_a, pa);
            count_into(&mut pref_counts_b, pb);
            if let (Some(ga), Some(gb)) = (rec_a.preference_group(), rec_b.preference_group()) {
                pref_group_a.push(ga);
                pref_group_b.push(gb);
            }
        }

        for (accessor, paired) in tag_sides.iter_mut() {
            if let (Some(ta), Some(tb)) = (accessor(rec_a), accessor(rec_b)) {
                paired.push(ta, tb);
            }
        }

        let (ref_scores_a, model_scores_a) = rec_a.extract_scores();
        let (ref_scores_b, model_scores_b) = rec_b.extract_scores();
        for dim in DIMENSIONS {
            if let (Some(&va), Some(&vb)) = (ref_scores_a.get(dim), ref_scores_b.get(dim)) {
                dim_ref.entry(dim).or_default().push(va, vb);
            }
            if let (Some(&va), Some(&vb)) = (model_scores_a.get(dim), model_scores_b.get(dim)) {
                dim_model.entry(dim).or_default().push(va, vb);
            }
        }

        if let (Some(aics_a), Some(aics_b)) = (rec_a.ai_cs(), rec_b.ai_cs()) {
            ref_ai.push(aics_a.ref_ai, aics_b.ref_ai);
            model_ai.push(aics_a.model_ai, aics_b.model_ai);
            cs.push(aics_a.cs, aics_b.cs);
        }
    }

    let mut dimensions = BTreeMap::new();
    for dim in DIMENSIONS {
        dimensions.insert(
            dim.to_string(),
            DimensionSummary {
                reference: dim_ref.remove(dim).unwrap_or_default().dimension_side(),
                model: dim_model.remove(dim).unwrap_or_default().dimension_side(),
            },
        );
    }

    let [(_, tags_ref), (_, tags_model)] = tag_sides;

    ComparisonSummary {
        metadata,
        coverage: Coverage {
            judge_a_total_rows: index_a.total,
            judge_a_success_rows: index_a.successful,
            judge_b_total_rows: index_b.total,
            judge_b_success_rows: index_b.successful,
            overlap_rows: overlap.len(),
            missing_in_a,
            missing_in_b,
        },
        preference: PreferenceSummary {
            exact_match_rate: stats::exact_match_rate(&pref_a, &pref_b),
            group_match_rate: stats::exact_match_rate(&pref_group_a, &pref_group_b),
            mean_abs_diff: stats::mean_abs_diff(&pref_a, &pref_b),
            correlation: stats::pearson(&pref_a, &pref_b),
            distribution_a: pref_counts_a,
            distribution_b: pref_counts_b,
            count: pref_a.len(),
        },
        behavior_tags: BehaviorTagSummary {
            reference: tags_ref.summary(),
            model: tags_model.summary(),
        },
        dimensions,
        ai_cs: AiCsSummary {
            ref_ai: ref_ai.ai_cs_metric(),
            model_ai: model_ai.ai_cs_metric(),
            cs: cs.ai_cs_metric(),
        },
    }
}

/// Paired per-row behavior tags for one answer side.
#[derive(Default)]
struct PairedTags {
    a: Vec<String>,
    b: Vec<String>,
    counts_a: BTreeMap<String, usize>,
    counts_b: BTreeMap<String, usize>,
}

impl PairedTags {
    fn push(&mut self, a: &str, b: &str) {
        count_into(&mut self.counts_a, a);
        count_into(&mut self.counts_b, b);
        self.a.push(a.to_string());
        self.b.push(b.to_string());
    }

    fn summary(self) -> TagSideSummary {
        TagSideSummary {
            match_rate: stats::exact_match_rate(&self.a, &self.b),
            count: self.a.len(),
            distribution_a: self.counts_a,
            distribution_b: self.counts_b,
        }
    }
}

/// Write the summary JSON and Markdown report next to the output prefix.
pub fn write_outputs(
    summary: &ComparisonSummary,
    report: &str,
    output_prefix: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let summary_path = PathBuf::from(format!("{}_summary.json", output_prefix.display()));
    let report_path = PathBuf::from(format!("{}_report.md", output_prefix.display()));

    let json = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    std::fs::write(&summary_path, json)
        .with_context(|| format!("failed to write summary {}", summary_path.display()))?;
    std::fs::write(&report_path, report)
        .with_context(|| format!("failed to write report {}", report_path.display()))?;

    Ok((summary_path, report_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn judge_file(rows: &[(i64, i64, &str, f64)]) -> NamedTempFile {
        // (RowIndex, preference, tag, dimension score for all 7 dims)
        let mut file = NamedTempFile::new().unwrap();
        for (row, pref, tag, score) in rows {
            let mut obj = serde_json::Map::new();
            obj.insert("RowIndex".to_string(), serde_json::json!(row));
            obj.insert("preference".to_string(), serde_json::json!(pref));
            obj.insert("tag_ref".to_string(), serde_json::json!(tag));
            obj.insert("tag_model".to_string(), serde_json::json!(tag));
            obj.insert("judge_model".to_string(), serde_json::json!("test-judge"));
            for dim in DIMENSIONS {
                obj.insert(format!("{dim}_ref"), serde_json::json!(score));
                obj.insert(format!("{dim}_model"), serde_json::json!(score));
            }
            writeln!(file, "{}", serde_json::Value::Object(obj)).unwrap();
        }
        file
    }

    #[test]
    fn test_overlap_and_missing_rows() {
        let a = judge_file(&[(1, 3, "DIRECT", 1.0), (2, 3, "DIRECT", 1.0), (3, 3, "DIRECT", 1.0)]);
        let b = judge_file(&[(2, 3, "DIRECT", 1.0), (3, 3, "DIRECT", 1.0), (4, 3, "DIRECT", 1.0)]);

        let summary = compare_judges(a.path(), b.path()).unwrap();
        assert_eq!(summary.coverage.overlap_rows, 2);
        assert_eq!(summary.coverage.missing_in_a, vec![4]);
        assert_eq!(summary.coverage.missing_in_b, vec![1]);
        assert_eq!(summary.metadata.judge_a_model.as_deref(), Some("test-judge"));
    }

    #[test]
    fn test_preference_disagreement_rates() {
        // Identical dimension scores; one row's preference differs 3 vs 4,
        // which also lands in different groups (equal vs model).
        let a = judge_file(&[(1, 3, "DIRECT", 1.0), (2, 3, "DIRECT", 1.0), (3, 3, "DIRECT", 1.0)]);
        let b = judge_file(&[(1, 3, "DIRECT", 1.0), (2, 3, "DIRECT", 1.0), (3, 4, "DIRECT", 1.0)]);

        let summary = compare_judges(a.path(), b.path()).unwrap();
        let pref = &summary.preference;
        assert_eq!(pref.count, 3);
        assert!((pref.exact_match_rate.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((pref.group_match_rate.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((pref.mean_abs_diff.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(pref.distribution_a.get("3"), Some(&3));
        assert_eq!(pref.distribution_b.get("4"), Some(&1));

        // Dimension scores agree exactly on both sides.
        for dim in DIMENSIONS {
            let summary_dim = &summary.dimensions[dim];
            assert_eq!(summary_dim.reference.exact_match_rate, Some(1.0));
            assert_eq!(summary_dim.model.exact_match_rate, Some(1.0));
            assert_eq!(summary_dim.reference.count, 3);
        }
    }

    #[test]
    fn test_ai_cs_pairs_require_complete_records() {
        let a = judge_file(&[(1, 3, "DIRECT", 2.0)]);
        // Judge B is missing one model dimension on the only overlapping row.
        let mut file = NamedTempFile::new().unwrap();
        let mut obj = serde_json::Map::new();
        obj.insert("RowIndex".to_string(), serde_json::json!(1));
        for dim in DIMENSIONS {
            obj.insert(format!("{dim}_ref"), serde_json::json!(2.0));
        }
        obj.insert("reality_model".to_string(), serde_json::json!(0.0));
        writeln!(file, "{}", serde_json::Value::Object(obj)).unwrap();

        let summary = compare_judges(a.path(), file.path()).unwrap();
        assert_eq!(summary.ai_cs.cs.count, 0);
        assert_eq!(summary.ai_cs.cs.mean_a, None);
        // The ref side of every dimension still pairs.
        assert_eq!(summary.dimensions["reality"].reference.count, 1);
        assert_eq!(summary.dimensions["reality"].model.count, 1);
        assert_eq!(summary.dimensions["knowledge"].model.count, 0);
    }

    #[test]
    fn test_zero_variance_correlation_is_absent() {
        let a = judge_file(&[(1, 3, "DIRECT", 1.0), (2, 3, "DIRECT", 1.0)]);
        let b = judge_file(&[(1, 3, "DIRECT", 1.0), (2, 3, "DIRECT", 1.0)]);
        let summary = compare_judges(a.path(), b.path()).unwrap();
        assert_eq!(summary.preference.correlation, None);
        assert_eq!(summary.ai_cs.ref_ai.correlation, None);
    }

    #[test]
    fn test_write_outputs_round_trip() {
        let a = judge_file(&[(1, 2, "CLARIFY", 1.0)]);
        let b = judge_file(&[(1, 4, "REFUSE", 2.0)]);
        let summary = compare_judges(a.path(), b.path()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run1");
        let (summary_path, report_path) =
            write_outputs(&summary, "# report\n", &prefix).unwrap();
        assert!(summary_path.ends_with("run1_summary.json"));
        assert!(report_path.ends_with("run1_report.md"));

        let loaded: ComparisonSummary =
            serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
        assert_eq!(loaded.coverage.overlap_rows, 1);
        assert_eq!(loaded.preference.exact_match_rate, Some(0.0));
        assert_eq!(loaded.behavior_tags.reference.match_rate, Some(0.0));
    }
}
