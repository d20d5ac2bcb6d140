//! Turns a matched unit into formatted reply lines.

use std::fmt;

use super::matcher::MatchCandidate;
use super::number::parse_number;
use super::units::Converted;
use super::ConversionError;

/// Formatted output of one conversion, one line per converted value
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    /// Name of the unit that was converted
    pub unit: String,
    pub lines: Vec<String>,
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Parse the captured number and run the unit's conversion
pub fn convert(candidate: &MatchCandidate<'_>) -> Result<ConversionResult, ConversionError> {
    if candidate.number_text.trim().is_empty() {
        return Err(ConversionError::MissingNumberCapture);
    }

    let value = parse_number(&candidate.number_text)?;
    let lines = candidate
        .unit
        .convert(value)
        .iter()
        .map(Converted::format)
        .collect();

    Ok(ConversionResult {
        unit: candidate.unit.name().to_string(),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::units::UNIT_REGISTRY;

    fn candidate(unit: &str, number: &str, unit_name: &str) -> MatchCandidate<'static> {
        MatchCandidate {
            unit: UNIT_REGISTRY.get(unit).unwrap(),
            number_text: number.to_string(),
            unit_name_text: unit_name.to_string(),
        }
    }

    #[test]
    fn test_convert_formats_every_output_in_order() {
        let result = convert(&candidate("teaspoon", "2", "tsp")).unwrap();
        assert_eq!(result.unit, "teaspoon");
        assert_eq!(result.lines, vec!["8.36gram", "10.00ml"]);
        assert_eq!(result.to_string(), "8.36gram\n10.00ml");
    }

    #[test]
    fn test_missing_number_capture() {
        let err = convert(&candidate("pound", "", "lb")).unwrap_err();
        assert_eq!(err, ConversionError::MissingNumberCapture);
        assert_eq!(err.to_string(), "couldn't find a valid number");
    }

    #[test]
    fn test_malformed_number() {
        let err = convert(&candidate("pound", "1.2.3", "lb")).unwrap_err();
        assert_eq!(err.to_string(), "couldn't parse number (`1.2.3`) as float");
    }

    #[test]
    fn test_negative_temperature() {
        let result = convert(&candidate("fahrenheit", "-40", "F")).unwrap();
        assert_eq!(result.to_string(), "-40.00°C");
    }
}
