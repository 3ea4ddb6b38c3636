//! Two-phase trigger matching over the rule table.
//!
//! Phase 1 compares the whole inbound text against every trigger in table
//! order, using the table's match mode. Phase 2 runs only when phase 1
//! found nothing and the text has more than one whitespace token: a rule
//! matches when any trigger, lowercased, starts with the lowercased first
//! token of the inbound text. First match wins in both phases; absent or
//! blank input matches nothing. No side effects.

use crate::rules::{Rule, RuleTable};

/// Exact-phase comparison variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Trigger equals the inbound text, both lowercased.
    #[default]
    Exact,
    /// Inbound text starts with the trigger, case sensitive.
    Prefix,
}

/// Select the first rule matching `text`, or None.
pub fn match_rule<'a>(table: &'a RuleTable, text: Option<&str>) -> Option<&'a Rule> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    let mode = table.mode();
    let lowered = text.to_lowercase();

    for rule in table.rules() {
        let hit = rule.triggers.iter().any(|t| match mode {
            MatchMode::Exact => t.to_lowercase() == lowered,
            MatchMode::Prefix => text.starts_with(t.as_str()),
        });
        if hit {
            return Some(rule);
        }
    }

    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;
    tokens.next()?; // fallback needs more than one token
    let first = first.to_lowercase();
    table
        .rules()
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| t.to_lowercase().starts_with(&first)))
}
