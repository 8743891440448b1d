//! Vote parsing from free-form agent output.
//!
//! Agents answer a vote request with text. Three shapes are accepted, tried
//! in order:
//!
//! 1. **JSON** (preferred): `{"suggestion": "...", "confidence": 0.8, "reasoning": "..."}`
//! 2. **Labelled lines**: `SUGGESTION: ...`, `CONFIDENCE: 0.8`, `REASONING: ...`
//! 3. **Plain text**: the first non-empty line becomes the suggestion
//!
//! Confidence may be written as a fraction (`0.8`) or a percentage (`80%`).

use super::vote::Vote;
use crate::agent::AgentId;

/// Parse an agent's response into a [`Vote`].
///
/// `default_confidence` is used when the response carries no readable
/// confidence.
///
/// # Examples
///
/// ```
/// use council_domain::quorum::parsing::parse_vote_output;
///
/// let vote = parse_vote_output("tutor", r#"{"suggestion": "Factor it", "confidence": 0.9}"#, 0.5);
/// assert_eq!(vote.suggestion, "Factor it");
/// assert_eq!(vote.confidence, 0.9);
///
/// let vote = parse_vote_output("tutor", "SUGGESTION: Factor it\nCONFIDENCE: 75%", 0.5);
/// assert_eq!(vote.confidence, 0.75);
/// ```
pub fn parse_vote_output(agent_id: impl Into<AgentId>, output: &str, default_confidence: f64) -> Vote {
    let agent_id = agent_id.into();

    if let Some(vote) = parse_json(&agent_id, output, default_confidence) {
        return vote;
    }
    if let Some(vote) = parse_labelled(&agent_id, output, default_confidence) {
        return vote;
    }

    let suggestion = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    Vote::new(agent_id, suggestion, default_confidence).with_reasoning(output.trim())
}

fn parse_json(agent_id: &AgentId, output: &str, default_confidence: f64) -> Option<Vote> {
    let start = output.find('{')?;
    let end = output[start..].rfind('}')?;
    let parsed: serde_json::Value = serde_json::from_str(&output[start..start + end + 1]).ok()?;

    let suggestion = parsed.get("suggestion").and_then(|v| v.as_str())?.trim();
    let confidence = match parsed.get("confidence") {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => parse_confidence(s),
        _ => None,
    }
    .unwrap_or(default_confidence);
    let reasoning = parsed
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    Some(Vote::new(agent_id.clone(), suggestion, confidence).with_reasoning(reasoning.trim()))
}

fn parse_labelled(agent_id: &AgentId, output: &str, default_confidence: f64) -> Option<Vote> {
    let mut suggestion = None;
    let mut confidence = None;
    let mut reasoning = None;

    for line in output.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match label.trim().to_uppercase().as_str() {
            "SUGGESTION" if suggestion.is_none() => suggestion = Some(value),
            "CONFIDENCE" if confidence.is_none() => confidence = parse_confidence(value),
            "REASONING" if reasoning.is_none() => reasoning = Some(value),
            _ => {}
        }
    }

    let suggestion = suggestion?;
    Some(
        Vote::new(
            agent_id.clone(),
            suggestion,
            confidence.unwrap_or(default_confidence),
        )
        .with_reasoning(reasoning.unwrap_or_default()),
    )
}

/// Read `0.8`, `80%` or `80` (values above 1 are treated as percentages).
fn parse_confidence(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (number, percent) = match trimmed.strip_suffix('%') {
        Some(n) => (n.trim(), true),
        None => (trimmed, false),
    };
    let value: f64 = number.parse().ok()?;
    if percent || value > 1.0 {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_inside_code_block() {
        let output = r#"
Here is my vote:
```json
{"suggestion": "Use dynamic programming", "confidence": 0.82, "reasoning": "Overlapping subproblems"}
```
"#;
        let vote = parse_vote_output("coder", output, 0.5);
        assert_eq!(vote.agent_id.as_str(), "coder");
        assert_eq!(vote.suggestion, "Use dynamic programming");
        assert_eq!(vote.confidence, 0.82);
        assert_eq!(vote.reasoning, "Overlapping subproblems");
    }

    #[test]
    fn test_parse_json_without_confidence_uses_default() {
        let vote = parse_vote_output("a", r#"{"suggestion": "X"}"#, 0.4);
        assert_eq!(vote.confidence, 0.4);
    }

    #[test]
    fn test_parse_labelled_lines() {
        let output = "suggestion: Draw a diagram\nConfidence: 0.7\nREASONING: Visual learners";
        let vote = parse_vote_output("a", output, 0.5);
        assert_eq!(vote.suggestion, "Draw a diagram");
        assert_eq!(vote.confidence, 0.7);
        assert_eq!(vote.reasoning, "Visual learners");
    }

    #[test]
    fn test_parse_percentages() {
        assert_eq!(parse_confidence("85%"), Some(0.85));
        assert_eq!(parse_confidence("60"), Some(0.6));
        assert_eq!(parse_confidence("0.3"), Some(0.3));
        assert_eq!(parse_confidence("high"), None);
    }

    #[test]
    fn test_plain_text_fallback() {
        let vote = parse_vote_output("a", "\n  Start with examples  \nThen theory", 0.5);
        assert_eq!(vote.suggestion, "Start with examples");
        assert_eq!(vote.confidence, 0.5);
    }

    #[test]
    fn test_empty_output() {
        let vote = parse_vote_output("a", "", 0.5);
        assert_eq!(vote.suggestion, "");
    }
}
