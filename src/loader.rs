use crate::record::EvalRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: invalid JSON record")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a JSONL file into an ordered list of records. Blank lines are
/// skipped; any other line that is not a JSON object aborts the load.
pub fn load_jsonl(path: &Path) -> Result<Vec<EvalRecord>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let map: serde_json::Map<String, Value> =
            serde_json::from_str(line).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
        records.push(EvalRecord::new(map));
    }

    info!(path = %path.display(), records = records.len(), "loaded JSONL");
    Ok(records)
}

/// Records deduplicated by row identifier, with the counts the raw stream
/// produced along the way.
#[derive(Debug, Default)]
pub struct IndexedSet {
    pub by_row: BTreeMap<i64, EvalRecord>,
    pub total: usize,
    pub successful: usize,
}

/// True when a duplicate should be resolved in favor of the record already
/// indexed: both carry timestamps and the candidate's is not newer.
fn keep_existing(existing: &EvalRecord, candidate: &EvalRecord) -> bool {
    match (existing.timestamp(), candidate.timestamp()) {
        (Some(existing_ts), Some(candidate_ts)) => candidate_ts <= existing_ts,
        _ => false,
    }
}

/// Deduplicate records by row identifier.
///
/// Counting policy, applied uniformly: every record counts toward `total`;
/// a record without a parseable integer row identifier is neither indexed
/// nor counted successful; a record is successful only when its success
/// flag is exactly true or absent. Duplicates resolve by latest timestamp,
/// falling back to the later-seen record when either timestamp is missing.
pub fn index_records(records: &[EvalRecord]) -> IndexedSet {
    let mut set = IndexedSet::default();
    for record in records {
        set.total += 1;
        let Some(row) = record.row_index() else {
            continue;
        };
        if !record.is_success() {
            continue;
        }
        set.successful += 1;
        match set.by_row.entry(row) {
            Entry::Occupied(mut slot) => {
                if !keep_existing(slot.get(), record) {
                    slot.insert(record.clone());
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }
    }
    set
}

/// First judge model name reported by a successful record, if any.
pub fn judge_model(records: &[EvalRecord]) -> Option<String> {
    records
        .iter()
        .find(|r| r.is_success() && r.judge_model().is_some())
        .and_then(|r| r.judge_model())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(value: Value) -> EvalRecord {
        match value {
            Value::Object(map) => EvalRecord::new(map),
            _ => panic!("test record must be a JSON object"),
        }
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_load_jsonl_skips_blank_lines() {
        let file = write_temp("{\"RowIndex\": 1}\n\n  \n{\"RowIndex\": 2}\n");
        let records = load_jsonl(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].row_index(), Some(2));
    }

    #[test]
    fn test_load_jsonl_missing_file() {
        let err = load_jsonl(Path::new("/nonexistent/evals.jsonl")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_load_jsonl_reports_bad_line_number() {
        let file = write_temp("{\"RowIndex\": 1}\nnot json\n");
        let err = load_jsonl(file.path()).unwrap_err();
        match err {
            LoadError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_index_counting_policy() {
        let records = vec![
            record(json!({"RowIndex": 1})),
            record(json!({"RowIndex": "2"})),
            record(json!({"note": "no row id"})),
            record(json!({"RowIndex": 3, "success": false})),
        ];
        let set = index_records(&records);
        assert_eq!(set.total, 4);
        assert_eq!(set.successful, 2);
        let rows: Vec<i64> = set.by_row.keys().copied().collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn test_index_duplicate_keeps_latest_timestamp() {
        let early = json!({"RowIndex": 7, "preference": 1, "timestamp": "2026-01-01T00:00:00"});
        let late = json!({"RowIndex": 7, "preference": 5, "timestamp": "2026-01-02T00:00:00"});

        for (first, second) in [(&early, &late), (&late, &early)] {
            let records = vec![record(first.clone()), record(second.clone())];
            let set = index_records(&records);
            assert_eq!(set.by_row[&7].preference(), Some(5));
        }
    }

    #[test]
    fn test_index_duplicate_without_timestamp_keeps_later_seen() {
        let records = vec![
            record(json!({"RowIndex": 7, "preference": 1, "timestamp": "2026-01-02T00:00:00"})),
            record(json!({"RowIndex": 7, "preference": 3})),
        ];
        let set = index_records(&records);
        assert_eq!(set.by_row[&7].preference(), Some(3));
    }

    #[test]
    fn test_judge_model_skips_failed_records() {
        let records = vec![
            record(json!({"judge_model": "judge-a", "success": false})),
            record(json!({"judge_model": "judge-b"})),
        ];
        assert_eq!(judge_model(&records), Some("judge-b".to_string()));
        assert_eq!(judge_model(&[]), None);
    }
}
