//! Total coercion rules from loosely typed model JSON into pipeline types.

use serde_json::{Map, Value};

use crate::types::{AnalyzerResult, FALLBACK_EXPLANATION, TriageVerdict, UNKNOWN_LEVEL};

/// Coerce any JSON value into a list of non-empty trimmed strings.
///
/// - string: one element when non-blank
/// - array: each element stringified (nested values as JSON text), nulls and
///   blanks dropped
/// - anything else: empty
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => non_blank(s).into_iter().collect(),
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    }
}

/// Text of a JSON value, trimmed, or `None` when null or blank.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_blank(s),
        other => non_blank(&other.to_string()),
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Build an [`AnalyzerResult`] from extractor output.
///
/// `None` (nothing recoverable) gives the empty result. `diagnosis` is read
/// when `diagnoses` is absent.
pub fn analyzer_result(object: Option<&Map<String, Value>>) -> AnalyzerResult {
    let Some(object) = object else {
        return AnalyzerResult::default();
    };

    AnalyzerResult {
        symptoms: string_list(object.get("symptoms")),
        risk_factors: string_list(object.get("risk_factors")),
        diagnoses: string_list(object.get("diagnoses").or_else(|| object.get("diagnosis"))),
    }
}

/// Build a [`TriageVerdict`] from an extracted object.
pub fn triage_verdict(object: &Map<String, Value>) -> TriageVerdict {
    let triage_level = object
        .get("triage_level")
        .and_then(scalar_text)
        .unwrap_or_else(|| UNKNOWN_LEVEL.to_string());
    let explanation = object
        .get("explanation")
        .and_then(scalar_text)
        .unwrap_or_else(|| FALLBACK_EXPLANATION.to_string());

    TriageVerdict {
        triage_level,
        explanation,
        recommendations: string_list(object.get("recommendations")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn string_becomes_single_element() {
        let map = object(json!({"symptoms": "  fever  ", "risk_factors": "   "}));
        let result = analyzer_result(Some(&map));
        assert_eq!(result.symptoms, vec!["fever"]);
        assert!(result.risk_factors.is_empty());
    }

    #[test]
    fn list_elements_are_stringified_and_filtered() {
        let map = object(json!({"symptoms": ["cough", "", null, 3, true, " ", {"k": "v"}]}));
        let result = analyzer_result(Some(&map));
        assert_eq!(result.symptoms, vec!["cough", "3", "true", r#"{"k":"v"}"#]);
    }

    #[test]
    fn other_shapes_become_empty() {
        let map = object(json!({"symptoms": 42, "risk_factors": null, "diagnoses": {"a": 1}}));
        assert_eq!(analyzer_result(Some(&map)), AnalyzerResult::default());
        assert_eq!(analyzer_result(None), AnalyzerResult::default());
    }

    #[test]
    fn singular_diagnosis_is_accepted() {
        let map = object(json!({"diagnosis": ["angina"]}));
        assert_eq!(analyzer_result(Some(&map)).diagnoses, vec!["angina"]);

        let both = object(json!({"diagnoses": ["flu"], "diagnosis": ["angina"]}));
        assert_eq!(analyzer_result(Some(&both)).diagnoses, vec!["flu"]);
    }

    #[test]
    fn verdict_defaults_fill_missing_fields() {
        let verdict = triage_verdict(&object(json!({"triage_level": "  ", "explanation": null})));
        assert_eq!(verdict.triage_level, UNKNOWN_LEVEL);
        assert_eq!(verdict.explanation, FALLBACK_EXPLANATION);
        assert!(verdict.recommendations.is_empty());
    }

    #[test]
    fn verdict_accepts_numeric_level_and_string_recommendation() {
        let verdict = triage_verdict(&object(json!({
            "triage_level": 2,
            "explanation": " Chest pain with risk factors. ",
            "recommendations": "Obtain ECG"
        })));
        assert_eq!(verdict.triage_level, "2");
        assert_eq!(verdict.explanation, "Chest pain with risk factors.");
        assert_eq!(verdict.recommendations, vec!["Obtain ECG"]);
    }
}
