//! Numeric literal parsing for captured quantities.

use super::ConversionError;

/// Parse a captured number such as `12`, `-3.5` or `12,5` into an `f64`.
///
/// A comma is accepted as decimal separator and normalized to a period
/// before parsing. Digit runs too large for an `f64` parse to infinity.
pub fn parse_number(text: &str) -> Result<f64, ConversionError> {
    let normalized = text.trim().replace(',', ".");

    normalized
        .parse::<f64>()
        .map_err(|_| ConversionError::NumberFormat(text.to_string()))
}
