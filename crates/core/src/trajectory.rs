//! Trajectory domain model.
//!
//! A trajectory file is loosely shaped JSON. Rather than probing it ad hoc,
//! the value is classified once into [`Trajectory`], and each turn of a
//! structured trajectory into a [`Turn`] with a closed set of roles plus a
//! catch-all. Everything borrows from the parsed value; nothing is copied
//! until the transcript is rendered.

use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The shape of a parsed trajectory, decided in a fixed precedence order:
/// text, then array, then any other non-object, then an object without an
/// array `contents`, and finally the structured case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trajectory<'a> {
    /// Already-rendered text; used verbatim.
    Text(&'a str),

    /// Anything without a recognized shape; rendered as pretty JSON.
    Opaque(&'a Value),

    /// `{"profile": ..., "contents": [[turn, ...], ...]}`
    Structured {
        /// The profile, trimmed. `None` when absent, not text, or blank.
        profile: Option<&'a str>,
        rounds: &'a [Value],
    },
}

impl<'a> Trajectory<'a> {
    /// Classify a parsed trajectory value.
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(text) => Trajectory::Text(text),
            Value::Array(_) => Trajectory::Opaque(value),
            Value::Object(map) => match map.get("contents") {
                Some(Value::Array(rounds)) => Trajectory::Structured {
                    profile: map
                        .get("profile")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|p| !p.is_empty()),
                    rounds,
                },
                // A profile alone is not enough; the whole object falls back.
                _ => Trajectory::Opaque(value),
            },
            _ => Trajectory::Opaque(value),
        }
    }
}

/// Iterate the turns of a structured trajectory in order.
///
/// Rounds that are not arrays and turns that are not objects are skipped.
pub fn turns<'a>(rounds: &'a [Value]) -> impl Iterator<Item = Turn<'a>> + 'a {
    rounds
        .iter()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_object)
        .map(Turn::from_object)
}

/// Who produced a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Agent,
    Environment,
    /// Any other role, carrying its text form (`"none"` when null or absent).
    Other(String),
}

impl TurnRole {
    /// Read the role from a turn's `role` field.
    pub fn of(role: Option<&Value>) -> Self {
        match role {
            Some(Value::String(role)) => match role.as_str() {
                "user" => TurnRole::User,
                "agent" => TurnRole::Agent,
                "environment" => TurnRole::Environment,
                other => TurnRole::Other(other.to_string()),
            },
            None | Some(Value::Null) => TurnRole::Other("none".into()),
            Some(other) => TurnRole::Other(crate::transcript::to_compact_json(other)),
        }
    }
}

/// One turn of a round, with its role-dependent payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn<'a> {
    /// `content` is `None` when the field is not present.
    User { content: Option<&'a Value> },

    /// Every present field except `role`, in input order.
    Agent { fields: Vec<(&'a str, &'a Value)> },

    Environment { content: Option<&'a Value> },

    /// Unrecognized role: the label and the untouched turn.
    Other {
        label: String,
        raw: &'a Map<String, Value>,
    },
}

impl<'a> Turn<'a> {
    pub fn from_object(turn: &'a Map<String, Value>) -> Self {
        match TurnRole::of(turn.get("role")) {
            TurnRole::User => Turn::User {
                content: present_field(turn, "content"),
            },
            TurnRole::Agent => Turn::Agent {
                fields: turn
                    .iter()
                    .filter(|(key, value)| key.as_str() != "role" && is_present(value))
                    .map(|(key, value)| (key.as_str(), value))
                    .collect(),
            },
            TurnRole::Environment => Turn::Environment {
                content: present_field(turn, "content"),
            },
            TurnRole::Other(label) => Turn::Other { label, raw: turn },
        }
    }
}

/// A field counts as present when it is non-null and, if text, non-empty.
///
/// Non-text values such as `0`, `false` or `[]` are present.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

fn present_field<'a>(turn: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    turn.get(key).filter(|value| is_present(value))
}

/// Read and parse a trajectory file. The path `-` reads standard input.
pub fn load_trajectory(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?
    };

    tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded trajectory");

    serde_json::from_str(&text).map_err(|source| Error::InvalidTrajectory {
        path: path.to_path_buf(),
        source,
    })
}
