//! Numeric field extraction from loosely structured status pages.
//!
//! Panels expose their readings as XML-ish or JSON-ish text. The extractor does not parse
//! the markup; it locates the field name and reads the number that follows it, skipping
//! the punctuation that typically separates a name from its value (`>`, `:`, `=`, quotes,
//! whitespace).

/// Returns the first number associated with `field`, scanning occurrences in order.
///
/// `None` when the field is absent, or when no occurrence is followed by a finite number.
pub fn extract_field(payload: &str, field: &str) -> Option<f64> {
    if field.is_empty() {
        return None;
    }

    payload
        .match_indices(field)
        .filter(|(start, _)| {
            let before = payload[..*start].chars().next_back();
            let after = payload[start + field.len()..].chars().next();
            !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
        })
        .find_map(|(start, _)| number_after(&payload[start + field.len()..]))
}

/// Characters that extend a field name, so a match flanked by one is part of another name.
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn number_after(rest: &str) -> Option<f64> {
    let rest = rest.trim_start_matches(is_separator);
    let end = rest
        .char_indices()
        .find(|(_, c)| !is_number_char(*c))
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());

    rest[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn is_separator(c: char) -> bool {
    matches!(c, '>' | ':' | '=' | '"' | '\'') || c.is_whitespace()
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_xml_element() {
        let payload = "<line1>x</line1>\n<OutputPower>99</OutputPower>\n<line3>x</line3>";
        assert_eq!(extract_field(payload, "OutputPower"), Some(99.0));
    }

    #[test]
    fn reads_decimal_and_negative_values() {
        assert_eq!(
            extract_field("<OutputPower>0.75</OutputPower>", "OutputPower"),
            Some(0.75)
        );
        assert_eq!(
            extract_field("<OutputPower>-1.5</OutputPower>", "OutputPower"),
            Some(-1.5)
        );
    }

    #[test]
    fn reads_json_and_key_value_styles() {
        assert_eq!(
            extract_field(r#"{"OutputPower": 1.25, "x": 2}"#, "OutputPower"),
            Some(1.25)
        );
        assert_eq!(extract_field("OutputPower=3", "OutputPower"), Some(3.0));
    }

    #[test]
    fn skips_occurrences_without_a_value() {
        let payload = "<!-- OutputPower in kW -->\n<OutputPower>0.4</OutputPower>";
        assert_eq!(extract_field(payload, "OutputPower"), Some(0.4));
    }

    #[test]
    fn ignores_longer_names_containing_the_field() {
        let prefixed = "<MaxOutputPower>5</MaxOutputPower>\n<OutputPower>0.4</OutputPower>";
        assert_eq!(extract_field(prefixed, "OutputPower"), Some(0.4));

        let suffixed = "<OutputPower2>9</OutputPower2>\n<OutputPower>0.4</OutputPower>";
        assert_eq!(extract_field(suffixed, "OutputPower"), Some(0.4));

        let snake = r#"{"max_OutputPower": 5, "OutputPower_peak": 7}"#;
        assert_eq!(extract_field(snake, "OutputPower"), None);
    }

    #[test]
    fn missing_or_malformed_field_is_none() {
        assert_eq!(extract_field("<Voltage>230</Voltage>", "OutputPower"), None);
        assert_eq!(
            extract_field("<OutputPower>n/a</OutputPower>", "OutputPower"),
            None
        );
        assert_eq!(extract_field("<OutputPower></OutputPower>", "OutputPower"), None);
        assert_eq!(extract_field("<OutputPower>1e999</OutputPower>", "OutputPower"), None);
        assert_eq!(extract_field("anything", ""), None);
    }
}
