//! # Unit Conversion Module
//!
//! Recognises a quantity with an imperial/US unit at the start of a command
//! argument (`98.6F`, `12 inches`, `2 cups`) and converts it to metric.
//!
//! ## Pipeline
//!
//! ```text
//! args text ──► matcher (anchored patterns, longest unit name wins)
//!           ──► number parser (`,` or `.` as decimal separator)
//!           ──► unit conversion (one or more labelled values)
//!           ──► reply text, one line per value
//! ```
//!
//! Every failure becomes a user-facing message; nothing in here panics or
//! propagates past [`handle_conversion_command`].

pub mod engine;
pub mod matcher;
pub mod number;
pub mod units;

use std::fmt;
use std::time::Instant;

use tracing::debug;

pub use engine::{convert, ConversionResult};
pub use matcher::{find_matching_unit, MatchCandidate};
pub use number::parse_number;
pub use units::{Converted, UnitDefinition, UnitRegistry, UNIT_REGISTRY};

use crate::observability;

/// Reasons a conversion request could not be answered
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// No unit pattern matched the start of the input
    NoUnitMatch,
    /// A pattern matched but the number capture was empty
    MissingNumberCapture,
    /// The captured number is not a valid float
    NumberFormat(String),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::NoUnitMatch => write!(f, "couldn't find a valid unit to convert"),
            ConversionError::MissingNumberCapture => write!(f, "couldn't find a valid number"),
            ConversionError::NumberFormat(raw) => {
                write!(f, "couldn't parse number (`{}`) as float", raw)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

impl ConversionError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::NoUnitMatch => "no_unit_match",
            ConversionError::MissingNumberCapture => "missing_number",
            ConversionError::NumberFormat(_) => "number_format",
        }
    }
}

/// Match and convert the unit at the start of `text`
pub fn convert_text(
    registry: &UnitRegistry,
    text: &str,
) -> Result<ConversionResult, ConversionError> {
    let candidate =
        find_matching_unit(registry, text.trim()).ok_or(ConversionError::NoUnitMatch)?;
    convert(&candidate)
}

/// Reply text for the conversion command, given everything after the command token
pub fn handle_conversion_command(args_text: &str) -> String {
    handle_conversion_command_with(&UNIT_REGISTRY, args_text)
}

/// Same as [`handle_conversion_command`] against a custom registry
pub fn handle_conversion_command_with(registry: &UnitRegistry, args_text: &str) -> String {
    let _span = observability::conversion_span(args_text).entered();
    let start = Instant::now();

    match convert_text(registry, args_text) {
        Ok(result) => {
            debug!(unit = %result.unit, lines = result.lines.len(), "Conversion succeeded");
            observability::record_conversion_metrics(&result.unit, "success", start.elapsed());
            result.to_string()
        }
        Err(e) => {
            debug!(error = %e, input = %args_text, "Conversion failed");
            observability::record_conversion_metrics("none", e.kind(), start.elapsed());
            e.to_string()
        }
    }
}

/// Newline-separated names of the built-in units, in declaration order
pub fn list_supported_units() -> String {
    list_units(&UNIT_REGISTRY)
}

pub fn list_units(registry: &UnitRegistry) -> String {
    registry.names().collect::<Vec<_>>().join("\n")
}
