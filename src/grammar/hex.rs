//! Hex digits, digit sequences and the inclusive range expander.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, RangeViolation};

// ------------------------------- Digits ----------------------------------- //

/// One hexadecimal digit. Declaration order is the digit ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HexDigit {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
    D9,
    A,
    B,
    C,
    D,
    E,
    F,
}

const DIGITS: [HexDigit; 16] = {
    use HexDigit::*;
    [D0, D1, D2, D3, D4, D5, D6, D7, D8, D9, A, B, C, D, E, F]
};

impl HexDigit {
    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(16).map(|v| DIGITS[v as usize])
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Upper-case digit character.
    pub fn as_char(self) -> char {
        match self {
            HexDigit::D0 => '0',
            HexDigit::D1 => '1',
            HexDigit::D2 => '2',
            HexDigit::D3 => '3',
            HexDigit::D4 => '4',
            HexDigit::D5 => '5',
            HexDigit::D6 => '6',
            HexDigit::D7 => '7',
            HexDigit::D8 => '8',
            HexDigit::D9 => '9',
            HexDigit::A => 'A',
            HexDigit::B => 'B',
            HexDigit::C => 'C',
            HexDigit::D => 'D',
            HexDigit::E => 'E',
            HexDigit::F => 'F',
        }
    }

    /// Next digit, and whether incrementing overflowed into the next position.
    /// `9` steps to `A`; `F` wraps to `0` with a carry.
    pub fn successor(self) -> (HexDigit, bool) {
        match self {
            HexDigit::F => (HexDigit::D0, true),
            d => (DIGITS[d as usize + 1], false),
        }
    }
}

impl fmt::Display for HexDigit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------- Digit sequences ----------------------------- //

/// Most-significant digit first. Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DigitSeq(Vec<HexDigit>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDigitsError {
    #[error("empty hex digit sequence")]
    Empty,
    #[error("`{found}` is not a hex digit (in `{text}`)")]
    NotHex { text: String, found: char },
}

impl DigitSeq {
    pub fn new(digits: Vec<HexDigit>) -> Result<Self, ParseDigitsError> {
        if digits.is_empty() {
            return Err(ParseDigitsError::Empty);
        }
        Ok(DigitSeq(digits))
    }

    pub fn digits(&self) -> &[HexDigit] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ripple-carry increment from the last digit. A carry out of the
    /// leading digit wraps the whole sequence to zeros.
    pub fn successor(&self) -> DigitSeq {
        let mut digits = self.0.clone();
        for slot in digits.iter_mut().rev() {
            let (next, carry) = slot.successor();
            *slot = next;
            if !carry {
                break;
            }
        }
        DigitSeq(digits)
    }
}

impl FromStr for DigitSeq {
    type Err = ParseDigitsError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let digits = text
            .chars()
            .map(|c| HexDigit::from_char(c).ok_or_else(|| ParseDigitsError::NotHex {
                text: text.to_string(),
                found: c,
            }))
            .collect::<Result<Vec<_>, _>>()?;
        DigitSeq::new(digits)
    }
}

impl TryFrom<String> for DigitSeq {
    type Error = ParseDigitsError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<DigitSeq> for String {
    fn from(seq: DigitSeq) -> String {
        seq.to_string()
    }
}

impl fmt::Display for DigitSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

// -------------------------------- Ranges ---------------------------------- //

/// Enumerate `low..=high` in digit order.
///
/// Both bounds must have the same number of digits and `low <= high`;
/// anything else is rejected before enumeration starts.
pub fn expand_range(low: &DigitSeq, high: &DigitSeq) -> Result<Vec<DigitSeq>, CompileError> {
    let violation = if low.len() != high.len() {
        Some(RangeViolation::LengthMismatch)
    } else if low > high {
        Some(RangeViolation::Descending)
    } else {
        None
    };
    if let Some(violation) = violation {
        return Err(CompileError::InvalidRange {
            low: low.to_string(),
            high: high.to_string(),
            violation,
        });
    }

    let mut out = Vec::new();
    let mut cursor = low.clone();
    while cursor != *high {
        let next = cursor.successor();
        out.push(cursor);
        cursor = next;
    }
    out.push(cursor);
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> DigitSeq {
        s.parse().unwrap()
    }

    fn range(low: &str, high: &str) -> Vec<String> {
        expand_range(&seq(low), &seq(high))
            .unwrap()
            .iter()
            .map(DigitSeq::to_string)
            .collect()
    }

    #[test]
    fn digit_successor_skips_from_nine_to_a() {
        assert_eq!(HexDigit::D8.successor(), (HexDigit::D9, false));
        assert_eq!(HexDigit::D9.successor(), (HexDigit::A, false));
        assert_eq!(HexDigit::E.successor(), (HexDigit::F, false));
        assert_eq!(HexDigit::F.successor(), (HexDigit::D0, true));
    }

    #[test]
    fn sequence_successor_propagates_carry() {
        assert_eq!(seq("0F").successor(), seq("10"));
        assert_eq!(seq("1FF").successor(), seq("200"));
        assert_eq!(seq("A9").successor(), seq("AA"));
        assert_eq!(seq("FF").successor(), seq("00"));
    }

    #[test]
    fn parses_lower_case_and_rejects_garbage() {
        assert_eq!(seq("0a").to_string(), "0A");
        assert_eq!("".parse::<DigitSeq>(), Err(ParseDigitsError::Empty));
        assert!(matches!(
            "4G".parse::<DigitSeq>(),
            Err(ParseDigitsError::NotHex { found: 'G', .. })
        ));
    }

    #[test]
    fn single_digit_range() {
        assert_eq!(range("1", "3"), ["1", "2", "3"]);
    }

    #[test]
    fn range_crosses_carry() {
        assert_eq!(range("0E", "11"), ["0E", "0F", "10", "11"]);
        assert_eq!(range("8", "B"), ["8", "9", "A", "B"]);
    }

    #[test]
    fn degenerate_range_yields_bound_once() {
        assert_eq!(range("7F", "7F"), ["7F"]);
    }

    #[test]
    fn full_width_range_is_exhaustive() {
        let all = expand_range(&seq("00"), &seq("FF")).unwrap();
        assert_eq!(all.len(), 256);
        assert_eq!(all.last(), Some(&seq("FF")));
    }

    #[test]
    fn malformed_bounds_are_rejected() {
        let err = expand_range(&seq("1"), &seq("10")).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidRange { violation: RangeViolation::LengthMismatch, .. }
        ));

        let err = expand_range(&seq("3"), &seq("1")).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidRange { violation: RangeViolation::Descending, .. }
        ));
    }
}
