//! Capability configuration supplied by the harness at build time.
//!
//! `answers` may arrive pre-parsed (a JSON array) or as a string containing
//! a serialized JSON array; both normalize to extra rules appended after
//! the built-ins. Welcome entries are strings or payload objects. Parse
//! failures are build-time errors and nothing is partially applied.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::message::ResponsePayload;
use crate::rules::{Producer, Rule};

/// Configuration bag recognized by the connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    /// Extra answer rules, merged after the built-ins: a JSON array or a
    /// string containing a serialized JSON array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<serde_json::Value>,

    /// Messages sent when a session starts: strings or payload objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_messages: Option<serde_json::Value>,

    /// Base delivery delay in milliseconds.
    pub response_delay_ms: u64,

    /// Added to the process-wide slowdown after every handled message.
    pub response_delay_increase_ms: u64,
}

/// One configured answer: trigger phrase(s) and a static output.
#[derive(Debug, Clone, Deserialize)]
struct AnswerEntry {
    input: OneOrMany,
    output: AnswerOutput,
}

/// A single trigger phrase normalizes to a one-element set.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AnswerOutput {
    Text(String),
    Payload(ResponsePayload),
}

/// Parse the extra answers into rules (empty when the capability is absent).
pub fn parse_extra_rules(caps: &Capabilities) -> Result<Vec<Rule>> {
    let entries: Vec<AnswerEntry> = match &caps.answers {
        None => return Ok(Vec::new()),
        Some(serde_json::Value::String(raw)) => {
            serde_json::from_str(raw).context("parsing answers capability from JSON string")?
        }
        Some(value @ serde_json::Value::Array(_)) => {
            serde_json::from_value(value.clone()).context("parsing answers capability array")?
        }
        Some(other) => bail!(
            "answers capability must be a JSON array or a serialized array, got {}",
            json_kind(other)
        ),
    };

    let mut rules = Vec::with_capacity(entries.len());
    for entry in entries {
        let triggers = match entry.input {
            OneOrMany::One(phrase) => vec![phrase],
            OneOrMany::Many(phrases) => phrases,
        };
        if triggers.is_empty() || triggers.iter().any(|t| t.trim().is_empty()) {
            bail!("answer entries need at least one non-empty trigger phrase");
        }
        let payload = match entry.output {
            AnswerOutput::Text(text) => ResponsePayload::text(text),
            AnswerOutput::Payload(payload) => payload,
        };
        rules.push(Rule::new(triggers, Producer::Static(payload)));
    }
    Ok(rules)
}

/// Parse welcome entries into producers (strings become text payloads).
pub fn parse_welcome_producers(caps: &Capabilities) -> Result<Vec<Producer>> {
    let entries: Vec<serde_json::Value> = match &caps.welcome_messages {
        None => return Ok(Vec::new()),
        Some(serde_json::Value::String(raw)) => serde_json::from_str(raw)
            .context("parsing welcomeMessages capability from JSON string")?,
        Some(serde_json::Value::Array(items)) => items.clone(),
        Some(other) => bail!(
            "welcomeMessages capability must be a JSON array, got {}",
            json_kind(other)
        ),
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            serde_json::Value::String(text) => Ok(Producer::Static(ResponsePayload::text(text))),
            value @ serde_json::Value::Object(_) => {
                let payload: ResponsePayload = serde_json::from_value(value)
                    .context("parsing welcomeMessages payload entry")?;
                Ok(Producer::Static(payload))
            }
            other => bail!(
                "welcome entries must be strings or payload objects, got {}",
                json_kind(other)
            ),
        })
        .collect()
}

/// Parse-check the whole bag without applying anything.
pub fn validate(caps: &Capabilities) -> Result<()> {
    parse_extra_rules(caps)?;
    parse_welcome_producers(caps)?;
    Ok(())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
