use std::fmt;

/// Money is represented as integer minor units to avoid floating-point
/// precision issues. For INR, 1 rupee = 100 paise, so ₹50.00 = 5000 paise.
pub type Paise = i64;

/// Currency recorded when a caller doesn't specify one.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Format paise as a human-readable decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_paise(paise: Paise) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal string into paise.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_paise(input: &str) -> Result<Paise, ParsePaiseError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParsePaiseError::InvalidFormat)?;
            let paise = units * 100;
            Ok(if negative { -paise } else { paise })
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParsePaiseError::InvalidFormat)?
            };

            // Pad or truncate the fractional part to 2 digits
            let decimal_str = parts[1];
            let decimal_paise: i64 = match decimal_str.len() {
                0 => 0,
                1 => {
                    decimal_str
                        .parse::<i64>()
                        .map_err(|_| ParsePaiseError::InvalidFormat)?
                        * 10
                }
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParsePaiseError::InvalidFormat)?,
                _ => decimal_str[..2]
                    .parse()
                    .map_err(|_| ParsePaiseError::InvalidFormat)?,
            };

            let paise = units * 100 + decimal_paise;
            Ok(if negative { -paise } else { paise })
        }
        _ => Err(ParsePaiseError::InvalidFormat),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePaiseError {
    InvalidFormat,
}

impl fmt::Display for ParsePaiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePaiseError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParsePaiseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_paise() {
        assert_eq!(format_paise(5000), "50.00");
        assert_eq!(format_paise(1234), "12.34");
        assert_eq!(format_paise(1), "0.01");
        assert_eq!(format_paise(0), "0.00");
        assert_eq!(format_paise(-5000), "-50.00");
    }

    #[test]
    fn test_parse_paise() {
        assert_eq!(parse_paise("50.00"), Ok(5000));
        assert_eq!(parse_paise("50"), Ok(5000));
        assert_eq!(parse_paise("12.34"), Ok(1234));
        assert_eq!(parse_paise("12.5"), Ok(1250));
        assert_eq!(parse_paise("0.01"), Ok(1));
        assert_eq!(parse_paise(".50"), Ok(50));
        assert_eq!(parse_paise("-50.00"), Ok(-5000));
        assert_eq!(parse_paise("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_paise_invalid() {
        assert!(parse_paise("abc").is_err());
        assert!(parse_paise("12.34.56").is_err());
    }
}
