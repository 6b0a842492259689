//! Arbitrary-precision decimal numbers as DynamoDB stores them.
//!
//! A [`Number`] keeps its significant digits as text together with the
//! decimal exponent of the most significant digit, so values up to 38
//! significant digits and magnitudes between 1e-130 and 1e125 survive
//! without loss. Parsing rejects anything outside those bounds with the
//! service's exact wording.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Most significant digits a number may carry.
pub const MAX_SIGNIFICANT_DIGITS: usize = 38;
/// Largest allowed exponent of the most significant digit.
pub const MAX_EXPONENT: i64 = 125;
/// Smallest allowed exponent of the most significant digit.
pub const MIN_EXPONENT: i64 = -130;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("numeric pattern is valid")
});

/// Reasons a number token is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    /// The token is the empty string.
    #[error("The parameter cannot be converted to a numeric value")]
    Empty,
    /// The token is not a decimal literal.
    #[error("The parameter cannot be converted to a numeric value: {0}")]
    Malformed(String),
    /// Magnitude above 1e125.
    #[error(
        "Number overflow. Attempting to store a number with magnitude larger than supported range"
    )]
    Overflow,
    /// Magnitude below 1e-130.
    #[error(
        "Number underflow. Attempting to store a number with magnitude smaller than supported range"
    )]
    Underflow,
    /// More than 38 significant digits.
    #[error("Attempting to store more than 38 significant digits in a Number")]
    TooManyDigits,
}

/// A validated decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number {
    negative: bool,
    /// Significant digits without leading or trailing zeros; empty for zero.
    digits: String,
    /// Exponent of the most significant digit.
    exponent: i64,
}

impl Number {
    /// Parse and range-check a number token.
    pub fn parse(text: &str) -> Result<Self, NumberError> {
        if text.is_empty() {
            return Err(NumberError::Empty);
        }
        if !NUMERIC.is_match(text) {
            return Err(NumberError::Malformed(text.to_owned()));
        }

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (mantissa, explicit_exp) = match unsigned.find(['e', 'E']) {
            Some(pos) => (&unsigned[..pos], parse_exponent(&unsigned[pos + 1..])),
            None => (unsigned, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        let all_digits: String = int_part.chars().chain(frac_part.chars()).collect();
        let trimmed_leading = all_digits.trim_start_matches('0');
        let digits = trimmed_leading.trim_end_matches('0').to_owned();

        if digits.is_empty() {
            return Ok(Self::zero());
        }

        let leading_zeros = to_i64(all_digits.len() - trimmed_leading.len());
        let exponent = explicit_exp
            .saturating_add(to_i64(int_part.len()))
            .saturating_sub(leading_zeros)
            .saturating_sub(1);

        if exponent > MAX_EXPONENT {
            return Err(NumberError::Overflow);
        }
        if exponent < MIN_EXPONENT {
            return Err(NumberError::Underflow);
        }
        if digits.len() > MAX_SIGNIFICANT_DIGITS {
            return Err(NumberError::TooManyDigits);
        }

        Ok(Self {
            negative,
            digits,
            exponent,
        })
    }

    fn zero() -> Self {
        Self {
            negative: false,
            digits: String::new(),
            exponent: 0,
        }
    }

    /// Returns `true` for zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Number of significant digits (zero counts as one).
    #[must_use]
    pub fn significant_digits(&self) -> usize {
        self.digits.len().max(1)
    }

    /// Storage size in bytes used for item size accounting.
    #[must_use]
    pub fn storage_size(&self) -> u64 {
        self.significant_digits().div_ceil(2) as u64 + 1
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.exponent
            .cmp(&other.exponent)
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => {
                return if other.negative {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
            (false, true) => {
                return if self.negative {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            (false, false) => {}
        }
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Canonical fixed-point rendering, e.g. `1e3` becomes `1000` and `-0.50` becomes `-0.5`.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.negative {
            f.write_str("-")?;
        }
        let len = to_i64(self.digits.len());
        if self.exponent < 0 {
            f.write_str("0.")?;
            for _ in 0..(-self.exponent - 1) {
                f.write_str("0")?;
            }
            f.write_str(&self.digits)
        } else if self.exponent + 1 >= len {
            f.write_str(&self.digits)?;
            for _ in 0..(self.exponent + 1 - len) {
                f.write_str("0")?;
            }
            Ok(())
        } else {
            let split = usize::try_from(self.exponent + 1).unwrap_or(self.digits.len());
            write!(f, "{}.{}", &self.digits[..split], &self.digits[split..])
        }
    }
}

fn parse_exponent(text: &str) -> i64 {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX / 2);
    if negative { -magnitude } else { magnitude }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
