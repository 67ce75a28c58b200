//! Salvaging JSON from model replies.
//!
//! Models are asked for bare JSON but regularly wrap it in markdown fences or
//! prose. Four strategies are tried in order and the first that yields valid
//! JSON wins.

use serde_json::Value;

use super::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMethod {
    Direct,
    Markdown,
    Greedy,
    Cleaned,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::Direct => "direct",
            ParseMethod::Markdown => "markdown",
            ParseMethod::Greedy => "greedy",
            ParseMethod::Cleaned => "cleaned",
        }
    }
}

pub fn extract_json(text: &str) -> Result<(Value, ParseMethod), LlmError> {
    let strategies: [(ParseMethod, fn(&str) -> Option<Value>); 4] = [
        (ParseMethod::Direct, parse_direct),
        (ParseMethod::Markdown, parse_fenced),
        (ParseMethod::Greedy, parse_greedy),
        (ParseMethod::Cleaned, parse_cleaned),
    ];

    for (method, strategy) in strategies {
        if let Some(value) = strategy(text) {
            tracing::debug!("Parsed AI reply using {} method", method.as_str());
            return Ok((value, method));
        }
        tracing::debug!("{} parse failed", method.as_str());
    }

    Err(LlmError::Parse("All parsing strategies failed".to_string()))
}

fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

/// Contents of the first fenced block, with or without a `json` tag.
fn parse_fenced(text: &str) -> Option<Value> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.find("```")?;
    serde_json::from_str(rest[..end].trim()).ok()
}

/// From the first opening bracket to the last matching closing bracket.
fn parse_greedy(text: &str) -> Option<Value> {
    let open = text.find(['{', '['])?;
    let close_char = if text[open..].starts_with('{') { '}' } else { ']' };
    let close = text.rfind(close_char)?;
    if close < open {
        return None;
    }
    serde_json::from_str(&text[open..=close]).ok()
}

/// Drop every fence marker, then any text outside the outermost brackets.
fn parse_cleaned(text: &str) -> Option<Value> {
    let stripped = text.replace("```json", "").replace("```", "");
    let open = stripped.find(['{', '['])?;
    let close = stripped.rfind(['}', ']'])?;
    if close < open {
        return None;
    }
    serde_json::from_str(stripped[open..=close].trim()).ok()
}
