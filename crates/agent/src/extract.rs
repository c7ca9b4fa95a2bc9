//! Extracting a persistable script from the assistant's final answer.
//!
//! The output contract asks the model for one fenced JavaScript block plus
//! a `Name:` line. Both are treated as best-effort: a missing name falls
//! back to a default, and an answer with no usable fence simply produces
//! no script.

use regex_lite::Regex;
use std::sync::LazyLock;

const DEFAULT_NAME: &str = "Generated Script";
const MAX_DESCRIPTION_LEN: usize = 280;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\r?\n(.*?)```").expect("fence pattern is valid")
});
static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^name:[ \t]*(.+)$").expect("name pattern is valid"));

/// A script pulled out of an assistant answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedScript {
    pub name: String,
    pub code: String,
    /// The answer's prose, with the code fence removed.
    pub description: String,
}

/// Extract the first JavaScript (or untagged) fenced block from `text`,
/// together with its display name and surrounding prose. Returns `None`
/// when the answer carries no usable code.
pub fn extract_script(text: &str) -> Option<ExtractedScript> {
    let (range, code) = FENCE.captures_iter(text).find_map(|caps| {
        let tag = caps.get(1)?.as_str();
        if !matches!(tag, "" | "javascript" | "js") {
            return None;
        }
        let whole = caps.get(0)?;
        let code = caps.get(2)?.as_str().trim();
        if code.is_empty() {
            return None;
        }
        Some((whole.range(), code.to_string()))
    })?;

    let name = NAME_LINE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let mut prose = String::with_capacity(text.len() - range.len());
    prose.push_str(&text[..range.start]);
    prose.push_str(&text[range.end..]);
    let prose = prose.trim();
    let description = if prose.is_empty() {
        name.clone()
    } else {
        truncate_chars(prose, MAX_DESCRIPTION_LEN)
    };

    Some(ExtractedScript {
        name,
        code,
        description,
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}
