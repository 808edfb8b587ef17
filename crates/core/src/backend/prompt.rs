//! Text exchanged with generative backends.

use serde::Deserialize;

use super::backend::BackendError;
use crate::pattern::pattern_store::{parse_record, render_record};
use crate::pattern::{DrumClass, Pattern};

/// JSON object the model is asked to return.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendReply {
    #[serde(default)]
    pub reasoning: String,
    pub pattern: String,
}

/// Full prompt: instructions, spice level, then the current pattern.
pub fn build_prompt(pattern: &Pattern, spice: f32) -> String {
    let legend = DrumClass::legend();
    let mut prompt = format!(
        "You are a drum loop generator. Given a drum pattern and a target \"spice\" level, \
output a variation of it. Keep the core groove and make sure the total loop duration \
stays exactly the same. Understand the groove before varying it.

Return JSON in this exact shape:
{{\"reasoning\": \"\", \"pattern\": \"\"}}

The pattern field holds the drum data in the same CSV format as the input:
DRUM_CLASS,TIMESTAMP,VELOCITY,DELTA_TIME
- DRUM_CLASS: {legend}
- TIMESTAMP: seconds from loop start
- VELOCITY: 0.0-1.0
- DELTA_TIME: seconds until the next hit (last hit: time until loop end)

The last hit's DELTA_TIME must end exactly at the loop duration.

SPICE LEVEL is a float from 0.0 to 1.0:
- 0.0 = minimal variation, very close to the original
- 0.5 = moderate variation
- 1.0 = maximum variation, more creative changes

SPICE LEVEL for this request: {spice:.2}

Input pattern:
"
    );
    prompt.push_str(&describe_pattern(pattern));
    prompt
}

/// Pattern summary and records as shown to the model.
pub fn describe_pattern(pattern: &Pattern) -> String {
    let mut normalized = pattern.clone();
    normalized.recalculate_delta_times();

    let mut lines = vec![
        format!("Loop duration: {:.6} seconds", normalized.loop_duration),
        format!("Total hits: {}", normalized.len()),
        String::new(),
        "Pattern (DRUM_CLASS,TIMESTAMP,VELOCITY,DELTA_TIME):".to_string(),
        format!("# Classes: {}", DrumClass::legend()),
    ];
    lines.extend(normalized.hits.iter().map(render_record));
    lines.join("\n")
}

/// Strip an optional markdown code fence around the JSON body.
pub fn extract_json(text: &str) -> &str {
    let body = if let Some((_, rest)) = text.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some((_, rest)) = text.split_once("```") {
        rest.split("```").next().unwrap_or(rest)
    } else {
        text
    };
    body.trim()
}

pub fn parse_reply(text: &str) -> Result<BackendReply, BackendError> {
    serde_json::from_str(extract_json(text))
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))
}

/// Parse the pattern text from a reply.
///
/// The returned pattern always uses `loop_duration` from the request and
/// recomputes delta times; durations and deltas from the model are ignored.
pub fn parse_pattern(text: &str, loop_duration: f64) -> Result<Pattern, BackendError> {
    let mut hits = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_record(line) {
            Ok(hit) => hits.push(hit),
            Err(e) => log::debug!("Dropping backend record {:?}: {}", line, e),
        }
    }

    if hits.is_empty() {
        return Err(BackendError::EmptyResult);
    }

    Ok(Pattern {
        hits,
        loop_duration,
        source: None,
    }
    .normalized())
}
