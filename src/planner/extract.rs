/// Layered extraction of structured data from free-form model output
///
/// Models are asked to return only JSON but routinely wrap it in prose or
/// markdown fences. Extraction is an explicit, ordered list of named
/// strategies tried in sequence; the first one that parses wins. The order is
/// a documented contract, covered by tests.

use serde_json::Value;

/// Named extraction strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The entire response is valid JSON
    WholeResponse,
    /// A fenced block tagged ```json
    TaggedFence,
    /// Any fenced block
    AnyFence,
    /// The first balanced brace-delimited substring
    BalancedBraces,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::WholeResponse => "whole-response",
            Strategy::TaggedFence => "tagged-fence",
            Strategy::AnyFence => "any-fence",
            Strategy::BalancedBraces => "balanced-braces",
        }
    }

    const ORDER: [Strategy; 4] = [
        Strategy::WholeResponse,
        Strategy::TaggedFence,
        Strategy::AnyFence,
        Strategy::BalancedBraces,
    ];

    fn candidates(&self, text: &str) -> Vec<String> {
        match self {
            Strategy::WholeResponse => vec![text.trim().to_string()],
            Strategy::TaggedFence => fenced_blocks(text, true),
            Strategy::AnyFence => fenced_blocks(text, false),
            Strategy::BalancedBraces => balanced_braces(text).into_iter().collect(),
        }
    }
}

/// Try each strategy in order; return the first JSON object that parses
///
/// Fence strategies yield every matching block, so a non-JSON fence earlier
/// in the text does not mask a parseable one after it.
pub fn extract_json(text: &str) -> Option<(Strategy, Value)> {
    for strategy in Strategy::ORDER {
        for candidate in strategy.candidates(text) {
            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                if value.is_object() {
                    tracing::debug!("Extracted plan via {} strategy", strategy.name());
                    return Some((strategy, value));
                }
            }
        }
    }
    None
}

/// Bodies of all markdown fences, optionally requiring a `json` tag
fn fenced_blocks(text: &str, require_json_tag: bool) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find("```") {
        let open = search_from + rel;
        let after_ticks = &text[open + 3..];
        let Some(newline) = after_ticks.find('\n') else {
            break;
        };
        let tag = after_ticks[..newline].trim();

        let body_start = newline + 1;
        let body = &after_ticks[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };

        let tag_matches = if require_json_tag {
            tag.eq_ignore_ascii_case("json")
        } else {
            true
        };
        if tag_matches {
            blocks.push(body[..close].trim().to_string());
        }

        search_from = open + 3 + body_start + close + 3;
    }
    blocks
}

/// First balanced `{...}` substring, tracking strings and escapes
fn balanced_braces(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
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
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
