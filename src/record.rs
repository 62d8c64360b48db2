use serde_json::Value;
use std::collections::BTreeMap;

/// The seven Anchor-5 epistemic dimensions, each scored 0-2 per answer.
pub const DIMENSIONS: [&str; 7] = [
    "reality",
    "knowledge",
    "goal",
    "visibility",
    "agency",
    "self_reflexivity",
    "boundary",
];

/// Maximum dimension total per answer: 7 dimensions x max score 2.
const MAX_DIMENSION_TOTAL: f64 = 14.0;

/// Coerce a JSON value to an integer. Accepts numbers (floats truncate
/// toward zero) and numeric strings; everything else is None.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value to a float. Accepts numbers and numeric strings.
pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Awareness Index for both sides of a record, plus the Compression Signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiCs {
    pub ref_ai: f64,
    pub model_ai: f64,
    pub cs: f64,
}

/// Three-way bucketing of the 1-5 preference score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceGroup {
    Ref,
    Equal,
    Model,
}

impl PreferenceGroup {
    /// Map a preference score to its group; scores outside 1-5 have none.
    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            1 | 2 => Some(Self::Ref),
            3 => Some(Self::Equal),
            4 | 5 => Some(Self::Model),
            _ => None,
        }
    }
}

/// A single judge evaluation row, kept as the raw JSON object with tolerant
/// typed accessors on top. Fields that are missing or the wrong shape read
/// as absent rather than failing the whole record.
#[derive(Debug, Clone)]
pub struct EvalRecord {
    raw: serde_json::Map<String, Value>,
}

impl EvalRecord {
    pub fn new(raw: serde_json::Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn row_index(&self) -> Option<i64> {
        self.raw.get("RowIndex").and_then(as_int)
    }

    /// A record is successful only when `success` is exactly `true` or absent.
    pub fn is_success(&self) -> bool {
        match self.raw.get("success") {
            None => true,
            Some(Value::Bool(true)) => true,
            Some(_) => false,
        }
    }

    pub fn preference(&self) -> Option<i64> {
        self.raw.get("preference").and_then(as_int)
    }

    pub fn preference_group(&self) -> Option<PreferenceGroup> {
        self.preference().and_then(PreferenceGroup::from_score)
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.raw
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn tag_ref(&self) -> Option<&str> {
        self.non_empty_str("tag_ref")
    }

    pub fn tag_model(&self) -> Option<&str> {
        self.non_empty_str("tag_model")
    }

    pub fn judge_model(&self) -> Option<&str> {
        self.non_empty_str("judge_model")
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.non_empty_str("timestamp")
    }

    /// Per-dimension scores for the reference and model answers. Only
    /// dimensions present and numeric appear; nothing is zero-filled.
    pub fn extract_scores(&self) -> (BTreeMap<&'static str, f64>, BTreeMap<&'static str, f64>) {
        let mut ref_scores = BTreeMap::new();
        let mut model_scores = BTreeMap::new();
        for dim in DIMENSIONS {
            if let Some(v) = self.raw.get(&format!("{dim}_ref")).and_then(as_float) {
                ref_scores.insert(dim, v);
            }
            if let Some(v) = self.raw.get(&format!("{dim}_model")).and_then(as_float) {
                model_scores.insert(dim, v);
            }
        }
        (ref_scores, model_scores)
    }

    /// Awareness Index and Compression Signal, defined only when all seven
    /// dimensions are scored on both sides.
    pub fn ai_cs(&self) -> Option<AiCs> {
        let (ref_scores, model_scores) = self.extract_scores();
        compute_ai_cs(&ref_scores, &model_scores)
    }
}

/// AI/CS from already-extracted score maps; None unless both sides are
/// complete across all seven dimensions.
pub fn compute_ai_cs(
    ref_scores: &BTreeMap<&'static str, f64>,
    model_scores: &BTreeMap<&'static str, f64>,
) -> Option<AiCs> {
    if ref_scores.len() != DIMENSIONS.len() || model_scores.len() != DIMENSIONS.len() {
        return None;
    }
    let ref_ai = ref_scores.values().sum::<f64>() / MAX_DIMENSION_TOTAL;
    let model_ai = model_scores.values().sum::<f64>() / MAX_DIMENSION_TOTAL;
    Some(AiCs {
        ref_ai,
        model_ai,
        cs: model_ai - ref_ai,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> EvalRecord {
        match value {
            Value::Object(map) => EvalRecord::new(map),
            _ => panic!("test record must be a JSON object"),
        }
    }

    fn full_record(ref_score: f64, model_score: f64) -> EvalRecord {
        let mut map = serde_json::Map::new();
        for dim in DIMENSIONS {
            map.insert(format!("{dim}_ref"), json!(ref_score));
            map.insert(format!("{dim}_model"), json!(model_score));
        }
        EvalRecord::new(map)
    }

    #[test]
    fn test_as_int_coercions() {
        assert_eq!(as_int(&json!(5)), Some(5));
        assert_eq!(as_int(&json!("5")), Some(5));
        assert_eq!(as_int(&json!(5.7)), Some(5));
        assert_eq!(as_int(&json!(-1.7)), Some(-1));
        assert_eq!(as_int(&json!("abc")), None);
        assert_eq!(as_int(&json!(null)), None);
        assert_eq!(as_int(&json!([1])), None);
    }

    #[test]
    fn test_as_float_coercions() {
        assert_eq!(as_float(&json!(1.5)), Some(1.5));
        assert_eq!(as_float(&json!(2)), Some(2.0));
        assert_eq!(as_float(&json!("1.5")), Some(1.5));
        assert_eq!(as_float(&json!("x")), None);
        assert_eq!(as_float(&json!(true)), None);
    }

    #[test]
    fn test_success_flag_strictness() {
        assert!(record(json!({})).is_success());
        assert!(record(json!({"success": true})).is_success());
        assert!(!record(json!({"success": false})).is_success());
        assert!(!record(json!({"success": "true"})).is_success());
        assert!(!record(json!({"success": 1})).is_success());
    }

    #[test]
    fn test_extract_scores_omits_missing_and_non_numeric() {
        let rec = record(json!({
            "reality_ref": 2,
            "reality_model": "1",
            "knowledge_ref": "bad",
            "goal_model": null,
        }));
        let (ref_scores, model_scores) = rec.extract_scores();
        assert_eq!(ref_scores.get("reality"), Some(&2.0));
        assert_eq!(model_scores.get("reality"), Some(&1.0));
        assert!(!ref_scores.contains_key("knowledge"));
        assert!(!model_scores.contains_key("goal"));
    }

    #[test]
    fn test_ai_cs_requires_all_dimensions() {
        let rec = record(json!({"reality_ref": 2, "reality_model": 1}));
        assert!(rec.ai_cs().is_none());

        let mut map = serde_json::Map::new();
        for dim in DIMENSIONS {
            map.insert(format!("{dim}_ref"), json!(2));
        }
        // Model side incomplete.
        map.insert("reality_model".to_string(), json!(1));
        assert!(EvalRecord::new(map).ai_cs().is_none());
    }

    #[test]
    fn test_ai_cs_extremes() {
        let aics = full_record(2.0, 0.0).ai_cs().unwrap();
        assert_eq!(aics.ref_ai, 1.0);
        assert_eq!(aics.model_ai, 0.0);
        assert_eq!(aics.cs, -1.0);
    }

    #[test]
    fn test_preference_groups() {
        assert_eq!(
            PreferenceGroup::from_score(1),
            PreferenceGroup::from_score(2)
        );
        assert_eq!(
            PreferenceGroup::from_score(4),
            PreferenceGroup::from_score(5)
        );
        assert_ne!(
            PreferenceGroup::from_score(3),
            PreferenceGroup::from_score(2)
        );
        assert_ne!(
            PreferenceGroup::from_score(3),
            PreferenceGroup::from_score(4)
        );
        assert_eq!(PreferenceGroup::from_score(0), None);
        assert_eq!(PreferenceGroup::from_score(6), None);
    }

    #[test]
    fn test_tag_accessors_ignore_empty() {
        let rec = record(json!({"tag_ref": "DIRECT", "tag_model": ""}));
        assert_eq!(rec.tag_ref(), Some("DIRECT"));
        assert_eq!(rec.tag_model(), None);
    }
}
