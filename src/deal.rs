//! Loading deals from text, and turning user-supplied seeds into numbers.
//!
//! Deal files hold one column per line, cards listed bottom to top:
//!   r3 g7 f b2
//! Rules:
//!   * everything after a '#' on a line is ignored
//!   * a line that is only a comment is skipped
//!   * a blank line is an empty column
//!   * trailing blank lines are dropped; missing columns are empty

use std::fs;
use std::path::Path;

use log::debug;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::card::Card;
use crate::error::SolverError;
use crate::tableau::Tableau;

/// Parse deal text into a fresh layout. No invariant is checked here;
/// `Engine::initial_state` validates.
pub fn parse_deal(text: &str) -> Result<Tableau, SolverError> {
    let mut columns: Vec<Vec<Card>> = Vec::new();
    for line in text.lines() {
        let content = match line.split_once('#') {
            Some((before, _)) if before.trim().is_empty() => continue,
            Some((before, _)) => before,
            None => line,
        };
        let column = content
            .split_whitespace()
            .map(Card::parse)
            .collect::<Result<Vec<_>, _>>()?;
        columns.push(column);
    }
    while columns.last().is_some_and(Vec::is_empty) {
        columns.pop();
    }
    Tableau::from_columns(columns)
}

/// Read and parse a deal file.
pub fn load_deal(path: &Path) -> Result<Tableau, SolverError> {
    let text = fs::read_to_string(path).map_err(|source| SolverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tab = parse_deal(&text)?;
    debug!("loaded {} card(s) from {}", tab.card_count(), path.display());
    Ok(tab)
}

/// Turn a seed string into a `u64`.
///
/// Whitespace and the separators `_ , . -` are ignored, so `"1_000_000"`
/// and `"1,000,000"` are the same seed. Any non-negative decimal is
/// accepted; values wider than 64 bits are folded by XOR-ing their 64-bit
/// limbs. A leading `-` is rejected rather than treated as a separator.
pub fn normalize_seed(s: &str) -> Result<u64, SolverError> {
    let invalid = |reason: &str| SolverError::InvalidSeed {
        seed: s.to_string(),
        reason: reason.to_string(),
    };

    if s.trim_start().starts_with('-') {
        return Err(invalid("seed must be a non-negative decimal number"));
    }

    let cleaned: String = s
        .chars()
        .filter(|&ch| !(ch.is_whitespace() || matches!(ch, '_' | ',' | '.' | '-')))
        .collect();
    if cleaned.is_empty() {
        return Err(invalid("empty seed"));
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("seed must be a non-negative decimal number"));
    }

    let n = BigUint::parse_bytes(cleaned.as_bytes(), 10).ok_or_else(|| invalid("not a decimal number"))?;
    Ok(n.to_u64()
        .unwrap_or_else(|| n.to_u64_digits().into_iter().fold(0, |acc, limb| acc ^ limb)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;

    #[test]
    fn parse_columns_bottom_to_top() {
        let tab = parse_deal("r3 g7 f b2\n\nG G\n").unwrap();
        assert_eq!(tab.columns[0].len(), 4);
        assert_eq!(tab.columns[0][0], Card::numbered(Suit::Red, 3));
        assert_eq!(tab.columns[0][3], Card::numbered(Suit::Black, 2));
        assert!(tab.columns[1].is_empty());
        assert_eq!(tab.columns[2], vec![Card::color(Suit::Green); 2]);
        assert!(tab.flower_present);
    }

    #[test]
    fn comments_are_ignored() {
        let text = "# a deal\nr1 r2 # two reds\n# between\nr3\n\n\n";
        let tab = parse_deal(text).unwrap();
        assert_eq!(tab.columns[0].len(), 2);
        assert_eq!(tab.columns[1], vec![Card::numbered(Suit::Red, 3)]);
        assert_eq!(tab.card_count(), 3);
    }

    #[test]
    fn indented_comment_lines_are_skipped() {
        let tab = parse_deal("r1\n  # note\n\t#tab\nr2\n").unwrap();
        assert_eq!(tab.columns[0], vec![Card::numbered(Suit::Red, 1)]);
        assert_eq!(tab.columns[1], vec![Card::numbered(Suit::Red, 2)]);
        assert_eq!(tab.card_count(), 2);
    }

    #[test]
    fn full_deal_with_indented_header_keeps_eight_columns() {
        let plain = std::fs::read_to_string("test/case1.txt").unwrap();
        let text = format!("   # indented header\n{plain}");
        assert_eq!(parse_deal(&text).unwrap(), parse_deal(&plain).unwrap());
    }

    #[test]
    fn bad_token_is_reported() {
        let err = parse_deal("r1 x9").unwrap_err();
        assert!(matches!(err, SolverError::InvalidCardFormat { ref token } if token == "x9"));
    }

    #[test]
    fn nine_columns_are_rejected() {
        let text = "r1\n".repeat(9);
        assert!(matches!(parse_deal(&text), Err(SolverError::TooManyColumns { found: 9 })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_deal(Path::new("no/such/deal.txt")).unwrap_err();
        assert!(matches!(err, SolverError::Io { .. }));
    }

    #[test]
    fn seeds_ignore_separators() {
        assert_eq!(normalize_seed("0").unwrap(), 0);
        assert_eq!(normalize_seed(" 1_000,000 ").unwrap(), 1_000_000);
        assert_eq!(normalize_seed("18446744073709551615").unwrap(), u64::MAX);
        assert_eq!(normalize_seed("1-000").unwrap(), 1000);
    }

    #[test]
    fn wide_seeds_fold_into_u64() {
        // 2^64 + 5: limbs are [5, 1].
        assert_eq!(normalize_seed("18446744073709551621").unwrap(), 5 ^ 1);
    }

    #[test]
    fn bad_seeds_are_rejected() {
        for bad in ["", "  ", "12a", "ms12", "-5", " -1_000"] {
            assert!(
                matches!(normalize_seed(bad), Err(SolverError::InvalidSeed { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
