//! # Unit Registry
//!
//! Hand-authored measurement units recognised by the conversion command.
//! Each [`UnitDefinition`] pairs an anchored recognition pattern with a pure
//! conversion function returning one or more labelled values.
//!
//! Every pattern has the same shape:
//!
//! ```regex
//! (?i)^(?P<number>[+-]?\d+(?:[,.]\d+)?)\s*(?P<unit_name>...)
//! ```
//!
//! Within one unit the alternation lists longer spellings first, so that a
//! single pattern captures `inches` rather than stopping at `in`. Overlaps
//! between different units (`5 ft` is also `5 f`ahrenheit) are resolved by
//! the matcher, which keeps the longest `unit_name` capture.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Shared numeric prefix: optional sign, digits, optional `,`/`.` fraction
pub const NUMBER_PATTERN: &str = r"[+-]?\d+(?:[,.]\d+)?";

/// Conversion function of a unit
pub type ConvertFn = fn(f64) -> Vec<Converted>;

/// A single converted value with the label appended after it
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub value: f64,
    pub label: String,
}

impl Converted {
    pub fn new(value: f64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }

    /// Render as `<value with 2 decimals><label>`, e.g. `30.48cm`
    pub fn format(&self) -> String {
        format!("{:.2}{}", self.value, self.label)
    }
}

/// A named unit with its recognition pattern and conversion
#[derive(Debug, Clone)]
pub struct UnitDefinition {
    name: String,
    pattern: Regex,
    convert: ConvertFn,
}

impl UnitDefinition {
    /// Build a unit from the alternation matching its spellings
    ///
    /// The alternation is wrapped into the anchored pattern exposing the
    /// `number` and `unit_name` groups.
    pub fn new(name: &str, unit_name_pattern: &str, convert: ConvertFn) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?i)^(?P<number>{})\s*(?P<unit_name>{})",
            NUMBER_PATTERN, unit_name_pattern
        ))?;

        Ok(Self {
            name: name.to_string(),
            pattern,
            convert,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn convert(&self, value: f64) -> Vec<Converted> {
        (self.convert)(value)
    }
}

/// Grams per cup for each supported ingredient, in reply order
pub const CUP_DENSITIES: [(&str, f64); 13] = [
    ("butter", 227.0),
    ("all-purpose flour", 125.0),
    ("bread flour", 136.0),
    ("cocoa powder", 85.0),
    ("powdered sugar", 120.0),
    ("rolled oats", 95.0),
    ("granulated sugar", 200.0),
    ("brown sugar", 220.0),
    ("long-grain rice", 185.0),
    ("short-grain rice", 200.0),
    ("honey/molasses/syrup", 340.0),
    ("water", 237.0),
    ("whole milk", 249.0),
];

fn fahrenheit_to_celsius(value: f64) -> Vec<Converted> {
    vec![Converted::new((value - 32.0) * 5.0 / 9.0, "°C")]
}

fn inches_to_centimeters(value: f64) -> Vec<Converted> {
    vec![Converted::new(value * 2.54, "cm")]
}

fn pounds_to_grams(value: f64) -> Vec<Converted> {
    vec![Converted::new(value * 453.59237, "gram")]
}

// Fluid ounces first, then avoirdupois ounces
fn ounces_to_metric(value: f64) -> Vec<Converted> {
    vec![
        Converted::new(value * 29.57353, "ml"),
        Converted::new(value * 28.34952, "gram"),
    ]
}

fn feet_to_meters(value: f64) -> Vec<Converted> {
    vec![Converted::new(value * 0.3048, "m")]
}

fn cups_to_grams(value: f64) -> Vec<Converted> {
    CUP_DENSITIES
        .iter()
        .map(|(ingredient, grams_per_cup)| {
            Converted::new(value * grams_per_cup, format!(" gram ({})", ingredient))
        })
        .collect()
}

fn tablespoons_to_metric(value: f64) -> Vec<Converted> {
    vec![
        Converted::new(value * 15.0, "gram"),
        Converted::new(value * 14.7867648, "ml"),
    ]
}

fn teaspoons_to_metric(value: f64) -> Vec<Converted> {
    vec![
        Converted::new(value * 4.18, "gram"),
        Converted::new(value * 5.0, "ml"),
    ]
}

/// Ordered, immutable collection of unit definitions
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: Vec<UnitDefinition>,
}

impl UnitRegistry {
    /// Create a registry from definitions in declaration order
    ///
    /// Unit names are keys and must be unique.
    pub fn new(units: Vec<UnitDefinition>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for unit in &units {
            if !seen.insert(unit.name()) {
                return Err(AppError::Config(format!(
                    "duplicate unit name '{}' in unit registry",
                    unit.name()
                )));
            }
        }

        Ok(Self { units })
    }

    /// The built-in set of units offered by the bot
    pub fn builtin() -> AppResult<Self> {
        let units = vec![
            UnitDefinition::new("fahrenheit", "°?F", fahrenheit_to_celsius)?,
            UnitDefinition::new("inches", r#"inches|inch|in|""#, inches_to_centimeters)?,
            UnitDefinition::new("pound", "pounds|pound|lbs|lb", pounds_to_grams)?,
            UnitDefinition::new("ounces", r"ounces|fl\.?\s*oz|oz", ounces_to_metric)?,
            UnitDefinition::new("feet", "feet|ft", feet_to_meters)?,
            UnitDefinition::new("cups", "endgegner|cups|cup", cups_to_grams)?,
            UnitDefinition::new("tablespoon", "tablespoons|tablespoon|tbsp", tablespoons_to_metric)?,
            UnitDefinition::new("teaspoon", "teaspoons|teaspoon|tsp", teaspoons_to_metric)?,
        ];

        let registry = Self::new(units)?;
        info!(unit_count = registry.len(), "Built-in unit registry compiled");
        Ok(registry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.units.iter()
    }

    pub fn get(&self, name: &str) -> Option<&UnitDefinition> {
        self.units.iter().find(|unit| unit.name() == name)
    }

    /// Unit names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(UnitDefinition::name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

// Compiled once, shared read-only by every handler
lazy_static! {
    pub static ref UNIT_REGISTRY: UnitRegistry =
        UnitRegistry::builtin().expect("Built-in unit patterns should be valid");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_order() {
        let names: Vec<&str> = UNIT_REGISTRY.names().collect();
        assert_eq!(
            names,
            vec![
                "fahrenheit",
                "inches",
                "pound",
                "ounces",
                "feet",
                "cups",
                "tablespoon",
                "teaspoon"
            ]
        );
    }

    #[test]
    fn test_patterns_expose_named_groups_and_anchor() {
        for unit in UNIT_REGISTRY.iter() {
            let names: Vec<&str> = unit.pattern().capture_names().flatten().collect();
            assert_eq!(names, vec!["number", "unit_name"], "unit {}", unit.name());
            assert!(unit.pattern().as_str().starts_with("(?i)^"));
        }
    }

    #[test]
    fn test_pattern_only_matches_at_start() {
        let inches = UNIT_REGISTRY.get("inches").unwrap();
        assert!(inches.pattern().is_match("12 inches"));
        assert!(!inches.pattern().is_match("about 12 inches"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let a = UnitDefinition::new("feet", "ft", feet_to_meters).unwrap();
        let b = UnitDefinition::new("feet", "feet", feet_to_meters).unwrap();
        assert!(matches!(
            UnitRegistry::new(vec![a, b]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_conversion_formulas() {
        let celsius = fahrenheit_to_celsius(212.0);
        assert_eq!(celsius, vec![Converted::new(100.0, "°C")]);

        let ounces = ounces_to_metric(1.0);
        assert_eq!(ounces[0].label, "ml");
        assert_eq!(ounces[1].label, "gram");

        let cups = cups_to_grams(1.0);
        assert_eq!(cups.len(), 13);
        assert_eq!(cups[0].format(), "227.00 gram (butter)");
        assert_eq!(cups[12].format(), "249.00 gram (whole milk)");
    }

    #[test]
    fn test_converted_format_rounds_to_two_decimals() {
        assert_eq!(Converted::new(30.48, "cm").format(), "30.48cm");
        assert_eq!(Converted::new(14.7867648, "ml").format(), "14.79ml");
        assert_eq!(Converted::new(15.0, "gram").format(), "15.00gram");
    }
}
