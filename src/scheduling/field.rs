//! Cron field expression parsing and matching
//!
//! A field is a comma-separated list of atoms over one time unit. All
//! syntax validation happens once, at construction, so matching afterwards
//! is a pure function over already-typed atoms. Malformed atoms are hard
//! errors, never silent non-matches.

use crate::errors::{CronResult, CronSyntaxError};

/// One comma-separated term within a cron field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldAtom {
    /// `*` - matches every value
    Any,
    /// `N` - exact value
    Exact(u32),
    /// `A-B` - inclusive range, A < B
    Range { start: u32, end: u32 },
    /// `*/M` - values divisible by the step
    Step { step: u32 },
    /// `A-B/M` - values in the range whose offset from A is divisible by M
    RangeStep { start: u32, end: u32, step: u32 },
}

impl FieldAtom {
    fn matches(self, value: u32) -> bool {
        match self {
            FieldAtom::Any => true,
            FieldAtom::Exact(n) => value == n,
            FieldAtom::Range { start, end } => start <= value && value <= end,
            FieldAtom::Step { step } => value % step == 0,
            FieldAtom::RangeStep { start, end, step } => {
                start <= value && value <= end && (value - start) % step == 0
            }
        }
    }
}

/// Parsed representation of one cron field
///
/// A value matches the field if any atom matches it (logical OR across the
/// comma-separated parts).
///
/// The matcher is value-agnostic: callers supply months zero-based
/// (0 = January), weekdays 0-6 with Sunday = 0, day-of-month 1-31, and
/// hour/minute/second in their natural ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronFieldExpression {
    atoms: Vec<FieldAtom>,
}

impl CronFieldExpression {
    /// Parse a field expression such as `"*/5,30-40,59"`.
    pub fn parse(field: &str) -> CronResult<Self> {
        if field.is_empty() {
            return Err(CronSyntaxError::Empty {
                field: field.to_string(),
            });
        }
        let atoms = field
            .split(',')
            .map(|atom| parse_atom(field, atom))
            .collect::<CronResult<Vec<_>>>()?;
        Ok(Self { atoms })
    }

    /// Field containing the single wildcard atom.
    pub fn any() -> Self {
        Self {
            atoms: vec![FieldAtom::Any],
        }
    }

    /// True if any atom of this field matches the value.
    pub fn matches(&self, value: u32) -> bool {
        self.atoms.iter().any(|atom| atom.matches(value))
    }
}

fn parse_atom(field: &str, atom: &str) -> CronResult<FieldAtom> {
    if atom.is_empty() {
        return Err(CronSyntaxError::Empty {
            field: field.to_string(),
        });
    }

    if atom == "*" {
        return Ok(FieldAtom::Any);
    }

    if let Some((range_part, step_part)) = atom.split_once('/') {
        let step = parse_bound(atom, step_part)?;
        if step == 0 {
            return Err(CronSyntaxError::ZeroStep {
                atom: atom.to_string(),
            });
        }
        if range_part == "*" {
            return Ok(FieldAtom::Step { step });
        }
        let (start, end) = parse_range(field, atom, range_part)?;
        return Ok(FieldAtom::RangeStep { start, end, step });
    }

    if atom.contains('-') {
        let (start, end) = parse_range(field, atom, atom)?;
        return Ok(FieldAtom::Range { start, end });
    }

    if atom.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(FieldAtom::Exact(parse_bound(atom, atom)?));
    }

    Err(CronSyntaxError::UnrecognizedAtom {
        field: field.to_string(),
        atom: atom.to_string(),
    })
}

fn parse_range(field: &str, atom: &str, range: &str) -> CronResult<(u32, u32)> {
    let Some((start, end)) = range.split_once('-') else {
        return Err(CronSyntaxError::UnrecognizedAtom {
            field: field.to_string(),
            atom: atom.to_string(),
        });
    };
    let start = parse_bound(atom, start)?;
    let end = parse_bound(atom, end)?;
    if start >= end {
        return Err(CronSyntaxError::InvalidRange { start, end });
    }
    Ok((start, end))
}

fn parse_bound(atom: &str, bound: &str) -> CronResult<u32> {
    bound.parse().map_err(|_| CronSyntaxError::InvalidBound {
        atom: atom.to_string(),
        bound: bound.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matches_everything() {
        let field = CronFieldExpression::parse("*").unwrap();
        for value in 0..60 {
            assert!(field.matches(value));
        }
    }

    #[test]
    fn test_exact_value() {
        let field = CronFieldExpression::parse("17").unwrap();
        assert!(field.matches(17));
        assert!(!field.matches(16));
        assert!(!field.matches(18));
    }

    #[test]
    fn test_inclusive_range() {
        let field = CronFieldExpression::parse("10-20").unwrap();
        assert!(!field.matches(9));
        assert!(field.matches(10));
        assert!(field.matches(15));
        assert!(field.matches(20));
        assert!(!field.matches(21));
    }

    #[test]
    fn test_stepped_wildcard() {
        let field = CronFieldExpression::parse("*/15").unwrap();
        assert!(field.matches(0));
        assert!(field.matches(15));
        assert!(field.matches(30));
        assert!(field.matches(45));
        assert!(!field.matches(7));
        assert!(!field.matches(16));
    }

    #[test]
    fn test_step_of_one_is_equivalent_to_wildcard() {
        let stepped = CronFieldExpression::parse("*/1").unwrap();
        let wildcard = CronFieldExpression::parse("*").unwrap();
        for value in 0..60 {
            assert_eq!(stepped.matches(value), wildcard.matches(value));
        }
    }

    #[test]
    fn test_stepped_range_is_anchored_at_lower_bound() {
        let field = CronFieldExpression::parse("0-5/3").unwrap();
        assert!(field.matches(0));
        assert!(field.matches(3));
        for value in [1, 2, 4, 5, 6, 9] {
            assert!(!field.matches(value), "value {value} should not match");
        }

        // Anchor is the lower bound, not zero
        let field = CronFieldExpression::parse("1-10/3").unwrap();
        assert!(field.matches(1));
        assert!(field.matches(4));
        assert!(field.matches(7));
        assert!(field.matches(10));
        assert!(!field.matches(3));
        assert!(!field.matches(9));
    }

    #[test]
    fn test_comma_list_is_logical_or() {
        let field = CronFieldExpression::parse("5,10-12,*/20").unwrap();
        assert!(field.matches(5));
        assert!(field.matches(11));
        assert!(field.matches(40));
        assert!(!field.matches(6));
        assert!(!field.matches(13));
    }

    #[test]
    fn test_matching_is_deterministic() {
        let field = CronFieldExpression::parse("3,7-9,*/25").unwrap();
        for value in 0..60 {
            let first = field.matches(value);
            for _ in 0..10 {
                assert_eq!(field.matches(value), first);
            }
        }
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        for (start, end) in [(5, 5), (20, 10), (59, 0)] {
            let result = CronFieldExpression::parse(&format!("{start}-{end}"));
            assert_eq!(
                result,
                Err(CronSyntaxError::InvalidRange { start, end }),
                "{start}-{end} should be rejected"
            );
        }
        assert!(matches!(
            CronFieldExpression::parse("20-10/2"),
            Err(CronSyntaxError::InvalidRange { start: 20, end: 10 })
        ));
    }

    #[test]
    fn test_non_numeric_bound_is_rejected() {
        assert!(matches!(
            CronFieldExpression::parse("a-5"),
            Err(CronSyntaxError::InvalidBound { .. })
        ));
        assert!(matches!(
            CronFieldExpression::parse("*/x"),
            Err(CronSyntaxError::InvalidBound { .. })
        ));
    }

    #[test]
    fn test_unrecognized_shapes_are_rejected() {
        for atom in ["**", "5/2", "?", "1..5"] {
            assert!(
                CronFieldExpression::parse(atom).is_err(),
                "'{atom}' should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_step_is_rejected() {
        assert!(matches!(
            CronFieldExpression::parse("*/0"),
            Err(CronSyntaxError::ZeroStep { .. })
        ));
        assert!(matches!(
            CronFieldExpression::parse("1-10/0"),
            Err(CronSyntaxError::ZeroStep { .. })
        ));
    }

    #[test]
    fn test_malformed_atom_anywhere_fails_the_whole_field() {
        // A valid atom earlier in the list must not mask the bad one
        assert!(CronFieldExpression::parse("1,2,bogus").is_err());
        assert!(CronFieldExpression::parse("*,9-3").is_err());
        assert!(CronFieldExpression::parse("1,,2").is_err());
    }

    #[test]
    fn test_empty_field_is_rejected() {
        assert!(matches!(
            CronFieldExpression::parse(""),
            Err(CronSyntaxError::Empty { .. })
        ));
    }
}
