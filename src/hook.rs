//! Post-tool hook: spots error output from other tools and nudges the
//! assistant towards `fixhive_search_cases`.
//!
//! The assistant host pipes `{"tool_name": ..., "tool_output": ...}` on
//! stdin after each tool call. Nothing is stored or uploaded; the hook only
//! prints a notice when the output looks like an error.

use std::io::{Read, Write};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[allow(clippy::expect_used)]
static ERROR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)error:|exception:|traceback|failed:|fatal:|cannot find|undefined is not|is not defined|syntaxerror|typeerror|referenceerror",
    )
    .expect("valid error pattern")
});

#[derive(Debug, Deserialize)]
struct HookInput {
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_output: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub detected: bool,
    pub message: &'static str,
    pub hint: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookNotice {
    pub fixhive: Detection,
}

/// True when `output` contains any known error marker.
pub fn looks_like_error(output: &str) -> bool {
    ERROR_PATTERN.is_match(output)
}

/// Inspects one hook payload. Blank or malformed input yields `None`, as does
/// output with no error marker.
pub fn inspect(input: &str) -> Option<HookNotice> {
    if input.trim().is_empty() {
        return None;
    }
    let hook: HookInput = serde_json::from_str(input).ok()?;

    let output = match &hook.tool_output {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if !looks_like_error(&output) {
        return None;
    }

    tracing::info!(
        tool = hook.tool_name.as_deref().unwrap_or("unknown"),
        "Potential error detected"
    );
    Some(HookNotice {
        fixhive: Detection {
            detected: true,
            message: "FixHive detected a potential error. Use fixhive_search_cases to find solutions.",
            hint: "Normalize the error message before searching for better results.",
        },
    })
}

/// Reads the hook payload from `reader` and writes a notice line to `writer`
/// if one is warranted.
pub fn run<R: Read, W: Write>(mut reader: R, mut writer: W) -> anyhow::Result<()> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    if let Some(notice) = inspect(&input) {
        serde_json::to_writer(&mut writer, &notice)?;
        writeln!(writer)?;
        writer.flush()?;
    }
    Ok(())
}
