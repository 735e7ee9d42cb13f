//! Transcript rendering — turns a trajectory into linear text for a prompt.
//!
//! Rendering never fails. Structured trajectories become a tagged
//! conversation log; every other shape falls back to JSON.

use std::io;

use serde::Serialize;
use serde_json::Value;

use crate::trajectory::{Trajectory, Turn, turns};

pub const PROFILE_HEADER: &str = "=== Agent Profile ===";
pub const HISTORY_HEADER: &str = "=== Conversation History ===";

/// Render a parsed trajectory as transcript text.
pub fn format_conversation_history(value: &Value) -> String {
    match Trajectory::classify(value) {
        Trajectory::Text(text) => text.to_string(),
        Trajectory::Opaque(value) => to_pretty_json(value),
        Trajectory::Structured { profile, rounds } => {
            let mut parts: Vec<String> = Vec::new();

            if let Some(profile) = profile {
                parts.push(format!("{PROFILE_HEADER}\n{profile}\n"));
            }
            parts.push(HISTORY_HEADER.to_string());

            parts.extend(turns(rounds).filter_map(|turn| render_turn(&turn)));
            parts.join("\n")
        }
    }
}

/// One turn as a transcript block, or `None` when it has nothing to show.
fn render_turn(turn: &Turn<'_>) -> Option<String> {
    match turn {
        Turn::User { content } => content.map(|c| format!("\n[USER]: {}", text_of(c))),
        Turn::Environment { content } => {
            content.map(|c| format!("\n[ENVIRONMENT]: {}", text_of(c)))
        }
        Turn::Agent { fields } => {
            if fields.is_empty() {
                return None;
            }
            let lines: Vec<String> = fields
                .iter()
                .map(|(key, value)| {
                    format!("[{}]: {}", key.to_uppercase(), text_of(value).trim())
                })
                .collect();
            Some(format!("\n[AGENT]:\n{}", lines.join("\n")))
        }
        Turn::Other { label, raw } => Some(format!(
            "\n[{}]: {}",
            label.to_uppercase(),
            to_compact_json(*raw)
        )),
    }
}

/// Text form of a value: strings verbatim, everything else as compact JSON.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => to_compact_json(other),
    }
}

/// Indented JSON (two spaces), non-ASCII kept as-is.
pub fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Single-line JSON with a space after `,` and `:`.
pub fn to_compact_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if value.serialize(&mut ser).is_err() {
        return String::new();
    }
    // serde_json only ever writes UTF-8
    String::from_utf8(buf).unwrap_or_default()
}

/// `{"a": 1, "b": [1, 2]}` rather than serde_json's `{"a":1,"b":[1,2]}`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
