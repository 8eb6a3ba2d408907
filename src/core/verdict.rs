// src/core/verdict.rs — Parse model responses into structured verdicts

use serde::Deserialize;

use super::types::Verdict;
use crate::infra::errors::GavelError;

/// A verdict extracted from a model response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub verdict: Verdict,
    pub reasoning: String,
}

#[derive(Deserialize)]
struct VerdictObject {
    verdict: String,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Extract a verdict from raw model output.
///
/// Two passes:
/// 1. Strict: find a JSON object carrying a `verdict` key anywhere in the
///    text (models wrap replies in prose and code fences routinely).
/// 2. Fallback: scan for the first literal `pass`/`fail`/`inconclusive`
///    token, case-insensitive, and keep the whole response as reasoning.
///
/// A structured object with an unrecognized verdict value is an error, not
/// a fall-through; the raw text rides along for diagnostics.
pub fn parse(raw: &str) -> Result<ParsedVerdict, GavelError> {
    if let Some(obj) = extract_json_object(raw) {
        let verdict = Verdict::parse(&obj.verdict).ok_or_else(|| GavelError::Parse {
            message: format!("unrecognized verdict value '{}'", obj.verdict),
            raw: raw.to_string(),
        })?;
        return Ok(ParsedVerdict {
            verdict,
            reasoning: obj.reasoning.unwrap_or_default(),
        });
    }

    if let Some(verdict) = scan_keywords(raw) {
        return Ok(ParsedVerdict {
            verdict,
            reasoning: raw.trim().to_string(),
        });
    }

    Err(GavelError::Parse {
        message: "no verdict object or keyword found".into(),
        raw: raw.to_string(),
    })
}

/// Find the first balanced JSON object in the text that deserializes to a
/// verdict object. Tolerates surrounding prose and markdown fences.
fn extract_json_object(raw: &str) -> Option<VerdictObject> {
    let bytes = raw.as_bytes();
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                if let Some(s) = start {
                    depth -= 1;
                    if depth == 0 {
                        let candidate = &raw[s..=i];
                        if let Ok(obj) = serde_json::from_str::<VerdictObject>(candidate) {
                            return Some(obj);
                        }
                        // Not a verdict object; keep scanning past it.
                        start = None;
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// First verdict token by position in the text, case-insensitive.
fn scan_keywords(raw: &str) -> Option<Verdict> {
    let lower = raw.to_ascii_lowercase();
    let candidates = [
        ("pass", Verdict::Pass),
        ("fail", Verdict::Fail),
        ("inconclusive", Verdict::Inconclusive),
    ];

    candidates
        .iter()
        .filter_map(|(token, verdict)| lower.find(token).map(|pos| (pos, *verdict)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, verdict)| verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_clean_json() {
        let out = parse(r#"{"verdict": "pass", "reasoning": "Correct."}"#).unwrap();
        assert_eq!(out.verdict, Verdict::Pass);
        assert_eq!(out.reasoning, "Correct.");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let raw = r#"{"verdict":"pass","reasoning":"Looks right."}"#;
        assert_eq!(parse(raw).unwrap(), parse(raw).unwrap());
    }

    #[test]
    fn test_parse_json_in_code_fence() {
        let raw = "Here is my assessment:\n```json\n{\"verdict\": \"fail\", \"reasoning\": \"Wrong units.\"}\n```\nHope that helps.";
        let out = parse(raw).unwrap();
        assert_eq!(out.verdict, Verdict::Fail);
        assert_eq!(out.reasoning, "Wrong units.");
    }

    #[test]
    fn test_parse_json_with_prose_braces_before() {
        let raw = "Config was {A: 1}. {\"verdict\": \"inconclusive\", \"reasoning\": \"Ambiguous.\"}";
        let out = parse(raw).unwrap();
        assert_eq!(out.verdict, Verdict::Inconclusive);
    }

    #[test]
    fn test_parse_missing_reasoning_key() {
        let out = parse(r#"{"verdict": "pass"}"#).unwrap();
        assert_eq!(out.verdict, Verdict::Pass);
        assert_eq!(out.reasoning, "");
    }

    #[test]
    fn test_parse_case_insensitive_verdict_value() {
        let out = parse(r#"{"verdict": "PASS", "reasoning": "ok"}"#).unwrap();
        assert_eq!(out.verdict, Verdict::Pass);
    }

    #[test]
    fn test_unknown_verdict_value_is_error() {
        let err = parse(r#"{"verdict": "meh", "reasoning": "?"}"#).unwrap_err();
        match err {
            GavelError::Parse { raw, .. } => assert!(raw.contains("meh")),
            other => panic!("expected Parse error, got {other}"),
        }
    }

    #[test]
    fn test_keyword_fallback_in_prose() {
        let raw = "I believe this should fail because the answer contradicts itself.";
        let out = parse(raw).unwrap();
        assert_eq!(out.verdict, Verdict::Fail);
        assert_eq!(out.reasoning, raw);
    }

    #[test]
    fn test_keyword_fallback_first_match_wins() {
        // "pass" appears before "fail" in the text
        let out = parse("This could pass, though one check did fail.").unwrap();
        assert_eq!(out.verdict, Verdict::Pass);
    }

    #[test]
    fn test_keyword_fallback_case_insensitive() {
        let out = parse("INCONCLUSIVE - not enough context.").unwrap();
        assert_eq!(out.verdict, Verdict::Inconclusive);
    }

    #[test]
    fn test_no_verdict_anywhere_is_error() {
        let err = parse("The answer discusses photosynthesis at length.").unwrap_err();
        match err {
            GavelError::Parse { raw, .. } => assert!(raw.contains("photosynthesis")),
            other => panic!("expected Parse error, got {other}"),
        }
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(parse("").is_err());
    }
}
