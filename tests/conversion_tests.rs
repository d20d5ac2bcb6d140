//! # Conversion Tests Module
//!
//! End-to-end tests of the conversion command: matching, number parsing and
//! reply formatting against the built-in unit registry.

#[cfg(test)]
mod tests {
    use cure_freedom_bot::conversion::{
        convert_text, handle_conversion_command, handle_conversion_command_with,
        list_supported_units, list_units, ConversionError, Converted, UnitDefinition,
        UnitRegistry,
    };
    use cure_freedom_bot::conversion::units::CUP_DENSITIES;

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(handle_conversion_command("98.6F"), "37.00°C");
        assert_eq!(handle_conversion_command("98.6°F"), "37.00°C");
        assert_eq!(handle_conversion_command("98.6f"), "37.00°C");
        assert_eq!(handle_conversion_command("-40 F"), "-40.00°C");
        assert_eq!(handle_conversion_command("212°f"), "100.00°C");
    }

    #[test]
    fn test_documented_examples() {
        assert_eq!(handle_conversion_command("12 inches"), "30.48cm");
        assert_eq!(handle_conversion_command("1 tbsp"), "15.00gram\n14.79ml");
        assert_eq!(handle_conversion_command("3 oz"), "88.72ml\n85.05gram");
        assert_eq!(handle_conversion_command("6 ft"), "1.83m");
        assert_eq!(handle_conversion_command("2 lb"), "907.18gram");
    }

    #[test]
    fn test_no_unit_match_replies() {
        assert_eq!(
            handle_conversion_command("xyz"),
            "couldn't find a valid unit to convert"
        );
        assert_eq!(
            handle_conversion_command("lb"),
            "couldn't find a valid unit to convert"
        );
        assert_eq!(
            handle_conversion_command(""),
            "couldn't find a valid unit to convert"
        );
        // The quantity has to come first
        assert_eq!(
            handle_conversion_command("about 5 ft"),
            "couldn't find a valid unit to convert"
        );
    }

    #[test]
    fn test_comma_decimal_separator() {
        assert_eq!(
            handle_conversion_command("12,5 lb"),
            handle_conversion_command("12.5 lb")
        );
        assert_eq!(handle_conversion_command("12,5 lb"), "5669.90gram");
    }

    #[test]
    fn test_overflowing_number_converts_to_infinity() {
        let huge = "9".repeat(400);
        assert_eq!(handle_conversion_command(&format!("{} lb", huge)), "infgram");
        assert_eq!(handle_conversion_command(&format!("{}F", huge)), "inf°C");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(handle_conversion_command("  12 inches  "), "30.48cm");
    }

    #[test]
    fn test_longest_unit_name_wins() {
        // `f` of fahrenheit also matches the start of `ft`, `feet` and `fl.oz`
        assert_eq!(handle_conversion_command("100 ft"), "30.48m");
        assert_eq!(handle_conversion_command("100 feet"), "30.48m");
        assert_eq!(handle_conversion_command("1 fl.oz"), "29.57ml\n28.35gram");
        assert_eq!(handle_conversion_command("5 fl oz"), "147.87ml\n141.75gram");
        assert_eq!(handle_conversion_command("5 fl. oz"), "147.87ml\n141.75gram");
        assert_eq!(handle_conversion_command("10 inch"), "25.40cm");
        assert_eq!(handle_conversion_command("10\""), "25.40cm");
    }

    #[test]
    fn test_cups_reply_lists_every_ingredient() {
        let reply = handle_conversion_command("2 cups");
        let lines: Vec<&str> = reply.lines().collect();

        assert_eq!(lines.len(), 13);
        for (line, (ingredient, grams_per_cup)) in lines.iter().zip(CUP_DENSITIES.iter()) {
            let expected = format!("{:.2} gram ({})", 2.0 * grams_per_cup, ingredient);
            assert_eq!(*line, expected);
        }
        assert_eq!(lines[0], "454.00 gram (butter)");
        assert_eq!(lines[12], "498.00 gram (whole milk)");
    }

    #[test]
    fn test_endgegner_alias() {
        assert_eq!(
            handle_conversion_command("1 endgegner"),
            handle_conversion_command("1 cup")
        );
    }

    #[test]
    fn test_teaspoon_conversion() {
        assert_eq!(handle_conversion_command("2 tsp"), "8.36gram\n10.00ml");
        assert_eq!(handle_conversion_command("2 TEASPOONS"), "8.36gram\n10.00ml");
    }

    #[test]
    fn test_list_supported_units_is_stable() {
        let first = list_supported_units();
        let second = list_supported_units();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "fahrenheit\ninches\npound\nounces\nfeet\ncups\ntablespoon\nteaspoon"
        );
    }

    fn ine_to_nothing(value: f64) -> Vec<Converted> {
        vec![Converted::new(value, "ine")]
    }

    fn inch_to_cm(value: f64) -> Vec<Converted> {
        vec![Converted::new(value * 2.54, "cm")]
    }

    #[test]
    fn test_custom_registry_prefers_longer_unit() {
        let registry = UnitRegistry::new(vec![
            UnitDefinition::new("inches", "in", inch_to_cm).unwrap(),
            UnitDefinition::new("ine", "ine", ine_to_nothing).unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_conversion_command_with(&registry, "5ine"), "5.00ine");
        assert_eq!(handle_conversion_command_with(&registry, "5in"), "12.70cm");
        assert_eq!(list_units(&registry), "inches\nine");
    }

    #[test]
    fn test_convert_text_errors() {
        let registry = UnitRegistry::builtin().unwrap();
        assert_eq!(
            convert_text(&registry, "hello").unwrap_err(),
            ConversionError::NoUnitMatch
        );

        let result = convert_text(&registry, "3 oz").unwrap();
        assert_eq!(result.unit, "ounces");
        assert_eq!(result.lines, vec!["88.72ml", "85.05gram"]);
    }

    #[test]
    fn test_duplicate_unit_names_rejected() {
        let result = UnitRegistry::new(vec![
            UnitDefinition::new("inches", "in", inch_to_cm).unwrap(),
            UnitDefinition::new("inches", "inch", inch_to_cm).unwrap(),
        ]);
        assert!(result.is_err());
    }
}
