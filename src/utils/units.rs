use crate::error::{ProcessingError, Result};
use crate::utils::constants::{CM_PER_INCH, DERIVED_PRECISION, INCHES_PER_FOOT, KG_PER_POUND};
use regex::Regex;
use std::sync::OnceLock;

static HEIGHT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn height_pattern() -> &'static Regex {
    HEIGHT_PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*(\d+)\s*['’]\s*(\d{1,2})\s*(?:"|''|”|″)?\s*$"#)
            .expect("height pattern is a valid regex")
    })
}

/// A height in feet and inches.
///
/// Only [`parse_height`] builds one, so the total in inches always fits a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Height {
    feet: u32,
    inches: u32,
}

impl Height {
    pub fn feet(&self) -> u32 {
        self.feet
    }

    pub fn inches(&self) -> u32 {
        self.inches
    }

    pub fn total_inches(&self) -> u32 {
        self.feet * INCHES_PER_FOOT + self.inches
    }

    /// Centimetres rounded to one decimal place.
    pub fn to_centimetres(&self) -> f64 {
        round_to(self.total_inches() as f64 * CM_PER_INCH, DERIVED_PRECISION)
    }
}

/// Parse a feet/inches height such as `6'2"`.
///
/// # Examples
/// ```
/// use roster_splitter::utils::parse_height;
///
/// let height = parse_height("6'2\"").unwrap();
/// assert_eq!(height.total_inches(), 74);
/// ```
pub fn parse_height(raw: &str) -> Result<Height> {
    let captures = height_pattern()
        .captures(raw)
        .ok_or_else(|| ProcessingError::HeightParse {
            raw: raw.to_string(),
            reason: "expected feet and inches such as 6'2\"".to_string(),
        })?;

    let feet = captures[1]
        .parse::<u32>()
        .map_err(|e| ProcessingError::HeightParse {
            raw: raw.to_string(),
            reason: format!("invalid feet value: {}", e),
        })?;
    let inches = captures[2]
        .parse::<u32>()
        .map_err(|e| ProcessingError::HeightParse {
            raw: raw.to_string(),
            reason: format!("invalid inches value: {}", e),
        })?;

    if inches >= INCHES_PER_FOOT {
        return Err(ProcessingError::HeightParse {
            raw: raw.to_string(),
            reason: format!("inches must be below {}, got {}", INCHES_PER_FOOT, inches),
        });
    }

    feet.checked_mul(INCHES_PER_FOOT)
        .and_then(|whole| whole.checked_add(inches))
        .ok_or_else(|| ProcessingError::HeightParse {
            raw: raw.to_string(),
            reason: format!("{} feet is out of range", feet),
        })?;

    Ok(Height { feet, inches })
}

/// Convert a feet/inches height string to centimetres, one decimal place.
pub fn height_to_cm(raw: &str) -> Result<f64> {
    Ok(parse_height(raw)?.to_centimetres())
}

/// Convert pounds to kilograms, one decimal place.
pub fn pounds_to_kg(pounds: f64) -> f64 {
    round_to(pounds * KG_PER_POUND, DERIVED_PRECISION)
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_height() {
        assert_eq!(parse_height("6'2\"").unwrap(), Height { feet: 6, inches: 2 });
        assert_eq!(
            parse_height("5'11\"").unwrap(),
            Height {
                feet: 5,
                inches: 11
            }
        );
        assert_eq!(parse_height(" 6' 0\" ").unwrap(), Height { feet: 6, inches: 0 });
        assert_eq!(parse_height("6'1''").unwrap(), Height { feet: 6, inches: 1 });
        assert_eq!(parse_height("6'3").unwrap(), Height { feet: 6, inches: 3 });
    }

    #[test]
    fn test_multi_digit_feet() {
        let height = parse_height("10'0\"").unwrap();
        assert_eq!(height.feet, 10);
        assert_eq!(height.total_inches(), 120);
    }

    #[test]
    fn test_invalid_heights() {
        for raw in ["", "6ft 2in", "6'", "6'2\"x", "'2\"", "74", "6'123\""] {
            match parse_height(raw) {
                Err(ProcessingError::HeightParse { raw: reported, .. }) => {
                    assert_eq!(reported, raw)
                }
                other => panic!("expected HeightParse for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_rejects_feet_that_overflow_inches() {
        for raw in ["999999999'0\"", "357913942'0\""] {
            match parse_height(raw) {
                Err(ProcessingError::HeightParse { raw: reported, reason }) => {
                    assert_eq!(reported, raw);
                    assert!(reason.contains("out of range"));
                }
                other => panic!("expected HeightParse for {:?}, got {:?}", raw, other),
            }
            assert!(height_to_cm(raw).is_err());
        }

        // Largest feet value whose total still fits
        let height = parse_height("357913941'0\"").unwrap();
        assert_eq!(height.total_inches(), 4_294_967_292);
    }

    #[test]
    fn test_inches_out_of_range() {
        let err = parse_height("6'12\"").unwrap_err();
        assert!(err.to_string().contains("inches must be below 12"));
    }

    #[test]
    fn test_height_to_cm() {
        assert_eq!(height_to_cm("6'0\"").unwrap(), 182.9);
        // 74 in * 2.54 = 187.96
        assert_eq!(height_to_cm("6'2\"").unwrap(), 188.0);
        assert_eq!(height_to_cm("5'9\"").unwrap(), 175.3);
    }

    #[test]
    fn test_pounds_to_kg() {
        assert_eq!(pounds_to_kg(200.0), 90.7);
        assert_eq!(pounds_to_kg(180.0), 81.6);
        assert_eq!(pounds_to_kg(0.0), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.25, 1), 1.3);
        assert_eq!(round_to(-1.25, 1), -1.3);
        assert_eq!(round_to(187.96, 1), 188.0);
    }
}
