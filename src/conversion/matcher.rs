//! Longest-match unit recognition.

use tracing::trace;

use super::units::{UnitDefinition, UnitRegistry};

/// A unit whose pattern matched the start of the input
#[derive(Debug, Clone)]
pub struct MatchCandidate<'r> {
    pub unit: &'r UnitDefinition,
    /// Text captured by the `number` group
    pub number_text: String,
    /// Text captured by the `unit_name` group
    pub unit_name_text: String,
}

impl MatchCandidate<'_> {
    /// Length of the matched unit name in characters
    pub fn unit_name_len(&self) -> usize {
        self.unit_name_text.chars().count()
    }
}

/// Try a single unit against the start of `text`
pub fn match_unit<'r>(unit: &'r UnitDefinition, text: &str) -> Option<MatchCandidate<'r>> {
    let captures = unit.pattern().captures(text)?;
    let number_text = captures.name("number").map_or("", |m| m.as_str());
    let unit_name_text = captures.name("unit_name").map_or("", |m| m.as_str());

    trace!(
        unit = %unit.name(),
        number = %number_text,
        unit_name = %unit_name_text,
        "Unit pattern matched"
    );

    Some(MatchCandidate {
        unit,
        number_text: number_text.to_string(),
        unit_name_text: unit_name_text.to_string(),
    })
}

/// Find the unit at the start of `text`
///
/// Every unit is tried in declaration order. Among the matches the one with
/// the longest `unit_name` capture wins; on equal length the earlier unit is
/// kept. A match with an empty unit name is never selected.
pub fn find_matching_unit<'r>(registry: &'r UnitRegistry, text: &str) -> Option<MatchCandidate<'r>> {
    registry
        .iter()
        .filter_map(|unit| match_unit(unit, text))
        .fold(None, |best: Option<MatchCandidate<'r>>, candidate| {
            let best_len = best.as_ref().map_or(0, MatchCandidate::unit_name_len);
            if candidate.unit_name_len() > best_len {
                Some(candidate)
            } else {
                best
            }
        })
}
