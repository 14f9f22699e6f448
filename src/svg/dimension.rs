//! SVG length resolution
//!
//! Converts a root element's `width`/`height` (or its `viewBox`) into pixels
//! at 96 px per inch.

use std::fmt;
use std::str::FromStr;

use crate::errors::{DimensionError, DimensionResult};
use crate::svg::secure_xml::Element;

/// Pixels per CSS inch
pub const PX_PER_INCH: f64 = 96.0;

/// Which dimension of an element to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl Axis {
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
        }
    }

    /// Position of this axis inside `min-x min-y width height`
    fn view_box_index(self) -> usize {
        match self {
            Self::Width => 2,
            Self::Height => 3,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// Absolute length units accepted in `width`/`height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    In,
    Mm,
    Cm,
    Pt,
    Pc,
}

impl LengthUnit {
    /// Conversion factor from this unit to pixels
    pub fn px_factor(self) -> f64 {
        match self {
            Self::Px => 1.0,
            Self::In => PX_PER_INCH,
            Self::Mm => PX_PER_INCH / 25.4,
            Self::Cm => PX_PER_INCH / 2.54,
            Self::Pt => PX_PER_INCH / 72.0,
            Self::Pc => PX_PER_INCH / 6.0,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "px" => Ok(Self::Px),
            "in" => Ok(Self::In),
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "pt" => Ok(Self::Pt),
            "pc" => Ok(Self::Pc),
            _ => Err(()),
        }
    }
}

/// Resolve `width` or `height` of an element to pixels, falling back to the
/// `viewBox` when the attribute is absent or blank.
pub fn resolve_dimension(element: &Element<'_>, axis: Axis) -> DimensionResult<f64> {
    let raw = element.attribute(axis.attribute_name())?.unwrap_or_default();
    let view_box = element.attribute("viewBox")?;
    resolve_value(&raw, view_box.as_deref(), axis)
}

/// Resolve a raw attribute value against an optional `viewBox`
pub fn resolve_value(raw: &str, view_box: Option<&str>, axis: Axis) -> DimensionResult<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return view_box_dimension(view_box, axis);
    }

    if let Some(percent) = value.strip_suffix('%') {
        let percent = parse_number(percent.trim(), axis, raw)?;
        let reference = view_box_dimension(view_box, axis)?;
        return Ok(percent / 100.0 * reference);
    }

    parse_length(value, axis)
}

/// Parse `<number><unit>` into pixels. A bare number is taken as pixels.
pub fn parse_length(value: &str, axis: Axis) -> DimensionResult<f64> {
    let value = value.trim();
    if let Ok(number) = value.parse::<f64>() {
        return finite(number, axis, value);
    }

    let split = value
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map(|(index, _)| index);

    let Some(split) = split.filter(|&index| index > 0) else {
        return Err(invalid_number(axis, value));
    };
    let (number, unit) = value.split_at(split);
    let number = parse_number(number.trim_end(), axis, value)?;

    let unit = unit
        .to_ascii_lowercase()
        .parse::<LengthUnit>()
        .map_err(|_| DimensionError::UnsupportedUnit {
            attribute: axis.to_string(),
            value: value.to_string(),
            unit: unit.to_string(),
        })?;

    Ok(number * unit.px_factor())
}

fn view_box_dimension(view_box: Option<&str>, axis: Axis) -> DimensionResult<f64> {
    let Some(view_box) = view_box.filter(|v| !v.trim().is_empty()) else {
        return Err(DimensionError::MissingViewBox {
            attribute: axis.to_string(),
        });
    };

    let components: Vec<&str> = view_box
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .collect();
    if components.len() < 4 {
        return Err(DimensionError::MalformedViewBox {
            value: view_box.to_string(),
            found: components.len(),
        });
    }

    parse_number(components[axis.view_box_index()], axis, view_box)
}

fn parse_number(number: &str, axis: Axis, value: &str) -> DimensionResult<f64> {
    number
        .parse::<f64>()
        .map_err(|_| invalid_number(axis, value))
        .and_then(|n| finite(n, axis, value))
}

fn finite(number: f64, axis: Axis, value: &str) -> DimensionResult<f64> {
    if number.is_finite() {
        Ok(number)
    } else {
        Err(invalid_number(axis, value))
    }
}

fn invalid_number(axis: Axis, value: &str) -> DimensionError {
    DimensionError::InvalidNumber {
        attribute: axis.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::secure_xml::SecureXmlParser;
    use rstest::rstest;

    fn resolve(svg: &str, axis: Axis) -> DimensionResult<f64> {
        let doc = SecureXmlParser::new().parse(svg, true).unwrap();
        resolve_dimension(&doc.root(), axis)
    }

    #[rstest]
    #[case("10in", 960.0)]
    #[case("10mm", 37.795_275_590_551_18)]
    #[case("10cm", 377.952_755_905_511_8)]
    #[case("10pt", 13.333_333_333_333_334)]
    #[case("10pc", 160.0)]
    #[case("10px", 10.0)]
    #[case("10", 10.0)]
    #[case(" 12.5 ", 12.5)]
    #[case("1e1px", 10.0)]
    #[case("10 px", 10.0)]
    fn test_units_convert_to_pixels(#[case] value: &str, #[case] expected: f64) {
        let svg = format!(r#"<svg width="{value}" height="1"/>"#);
        let width = resolve(&svg, Axis::Width).unwrap();
        assert!((width - expected).abs() < 1e-9, "{value} -> {width}");
    }

    #[test]
    fn test_rounded_unit_values() {
        assert_eq!(resolve(r#"<svg width="10mm"/>"#, Axis::Width).unwrap().round(), 38.0);
        assert_eq!(resolve(r#"<svg width="10pt"/>"#, Axis::Width).unwrap().round(), 13.0);
    }

    #[test]
    fn test_percentage_of_view_box() {
        let svg = r#"<svg width="50%" height="25%" viewBox="0 0 500 400"/>"#;
        assert_eq!(resolve(svg, Axis::Width).unwrap(), 250.0);
        assert_eq!(resolve(svg, Axis::Height).unwrap(), 100.0);
    }

    #[test]
    fn test_missing_attribute_uses_view_box() {
        let svg = r#"<svg viewBox="0 0 500 500"/>"#;
        assert_eq!(resolve(svg, Axis::Width).unwrap(), 500.0);

        let svg = r#"<svg width="  " viewBox="10,20,300,150"/>"#;
        assert_eq!(resolve(svg, Axis::Width).unwrap(), 300.0);
        assert_eq!(resolve(svg, Axis::Height).unwrap(), 150.0);
    }

    #[test]
    fn test_unsupported_unit() {
        let err = resolve(r#"<svg width="10xy"/>"#, Axis::Width).unwrap_err();
        assert_eq!(
            err,
            DimensionError::UnsupportedUnit {
                attribute: "width".to_string(),
                value: "10xy".to_string(),
                unit: "xy".to_string(),
            }
        );
        // Relative units are not supported either
        assert!(matches!(
            resolve(r#"<svg width="2em"/>"#, Axis::Width),
            Err(DimensionError::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_invalid_numbers() {
        for value in ["abc", "px", "1.2.3px", "%", "x%", "NaN", "inf"] {
            let svg = format!(r#"<svg width="{value}" viewBox="0 0 1 1"/>"#);
            assert!(
                matches!(resolve(&svg, Axis::Width), Err(DimensionError::InvalidNumber { .. })),
                "expected {value:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_missing_view_box() {
        assert_eq!(
            resolve("<svg/>", Axis::Height).unwrap_err(),
            DimensionError::MissingViewBox {
                attribute: "height".to_string()
            }
        );
        assert!(matches!(
            resolve(r#"<svg width="50%"/>"#, Axis::Width),
            Err(DimensionError::MissingViewBox { .. })
        ));
    }

    #[test]
    fn test_short_view_box() {
        assert_eq!(
            resolve(r#"<svg viewBox="0 0 500"/>"#, Axis::Width).unwrap_err(),
            DimensionError::MalformedViewBox {
                value: "0 0 500".to_string(),
                found: 3,
            }
        );
        assert!(matches!(
            resolve(r#"<svg width="10%" viewBox="0 0"/>"#, Axis::Width),
            Err(DimensionError::MalformedViewBox { found: 2, .. })
        ));
    }
}
