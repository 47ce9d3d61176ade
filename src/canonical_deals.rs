//! Fixed layouts with known outcomes, used in tests and by `--demo`.
//!
//! Goals:
//!   * Provide a plain, valid 40-card deal with no particular structure.
//!   * Provide small deals whose solutions can be worked out by hand, so
//!     search results can be checked move by move.
//!   * Provide a deal with no legal move at all, so exhaustion is testable
//!     without relying on the search to prove it.
//!
//! Columns are written bottom to top, like the deal-file format.

use crate::card::{Card, MAX_RANK, NUM_SUITS, Suit, full_deck};
use crate::tableau::{NUM_COLS, Tableau};

const SORTED_CARDS_PER_COLUMN: usize = 5;

fn numbered(suit: Suit, rank: u8) -> Card {
    Card::numbered(suit, rank)
}

fn red(rank: u8) -> Card {
    numbered(Suit::Red, rank)
}

/// Every color collected, so the buffer has no room left. Only the red
/// suit is still in play; green and black are done.
fn red_endgame(columns: Vec<Vec<Card>>, red_foundation: u8) -> Tableau {
    let mut tab = Tableau::new_empty();
    for (slot, cards) in tab.columns.iter_mut().zip(columns) {
        *slot = cards;
    }
    tab.collected = [true; NUM_SUITS];
    tab.buffer_capacity = 0;
    tab.foundations = [red_foundation, MAX_RANK, MAX_RANK];
    tab
}

/// Deal `deck` five cards per column.
fn deal_in_fives(deck: &[Card]) -> Tableau {
    let mut tab = Tableau::new_empty();
    for (slot, chunk) in tab.columns.iter_mut().zip(deck.chunks(SORTED_CARDS_PER_COLUMN)) {
        *slot = chunk.to_vec();
    }
    tab.flower_present = true;
    tab
}

/// The full deck in suit-major order, dealt five cards per column.
pub fn sorted_deal() -> Tableau {
    deal_in_fives(&full_deck())
}

/// The full deck shuffled with `seed` and dealt five cards per column.
///
/// Same seed, same deal.
pub fn shuffled_deal(seed: u64) -> Tableau {
    let mut deck = full_deck();
    fastrand::Rng::with_seed(seed).shuffle(&mut deck);
    deal_in_fives(&deck)
}

/// A full deal won by collecting the three colors and letting the
/// cascade play everything else.
///
/// Numbered cards are laid in three rows such that the n-th card in
/// (rank, suit) order always sits directly under the (n - 8)-th:
/// ```text
/// top     R  R  R  R  G  G  G  G
///         B  B  B  B  f  r1 g1 b1
///         r2 g2 b2 r3 g3 b3 r4 g4
///         b4 r5 g5 b5 r6 g6 b6 r7
/// bottom  g7 b7 r8 g8 b8 r9 g9 b9
/// ```
pub fn easy_win_deal() -> Tableau {
    let ordered: Vec<Card> = (1..=MAX_RANK)
        .flat_map(|rank| Suit::ALL.map(|suit| numbered(suit, rank)))
        .collect();

    let mut tab = Tableau::new_empty();
    for (j, col) in tab.columns.iter_mut().enumerate() {
        col.extend([ordered[19 + j], ordered[11 + j], ordered[3 + j]]);
        col.push(match j {
            0..=3 => Card::color(Suit::Black),
            4 => Card::FLOWER,
            _ => ordered[j - 5],
        });
        col.push(Card::color(if j < 4 { Suit::Red } else { Suit::Green }));
    }
    tab.flower_present = true;
    tab
}

/// Red needs 7, 8, 9 and r8 covers r7; one relocation frees it.
///
/// The only non-forced move is r8 to the empty third column, after which
/// the cascade scores r7, r8 and r9.
pub fn nearly_solved_deal() -> Tableau {
    red_endgame(vec![vec![red(7), red(8)], vec![red(9)]], 6)
}

/// Red needs 7, 8, 9 and all three are reachable in order, so the
/// cascade alone wins: three forced scores and no choice.
pub fn cascading_deal() -> Tableau {
    red_endgame(vec![vec![red(8), red(7)], vec![red(9)]], 6)
}

/// Red only, r1 buried under r9, every column occupied and no buffer
/// room. Same-suit cards never stack, so no move exists.
pub fn deadlocked_deal() -> Tableau {
    let mut columns: Vec<Vec<Card>> = (2..MAX_RANK).map(|rank| vec![red(rank)]).collect();
    columns.push(vec![red(1), red(MAX_RANK)]);
    debug_assert_eq!(columns.len(), NUM_COLS);
    red_endgame(columns, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CARDS_PER_DECK;
    use crate::moves::candidate_moves;

    #[test]
    fn canonical_deals_are_valid() {
        for (name, tab) in [
            ("sorted", sorted_deal()),
            ("easy_win", easy_win_deal()),
            ("nearly_solved", nearly_solved_deal()),
            ("cascading", cascading_deal()),
            ("deadlocked", deadlocked_deal()),
            ("shuffled", shuffled_deal(7)),
        ] {
            if let Err(err) = tab.validate() {
                panic!("{name} deal is invalid: {err}");
            }
        }
    }

    #[test]
    fn full_deals_hold_every_card() {
        assert_eq!(sorted_deal().card_count(), CARDS_PER_DECK);
        let easy = easy_win_deal();
        assert_eq!(easy.card_count(), CARDS_PER_DECK);
        assert!(easy.columns.iter().all(|col| col.len() == 5));
    }

    #[test]
    fn shuffled_deals_depend_only_on_seed() {
        assert_eq!(shuffled_deal(3), shuffled_deal(3));
        assert_ne!(shuffled_deal(3), shuffled_deal(4));
        assert_eq!(shuffled_deal(3).card_count(), CARDS_PER_DECK);
    }

    #[test]
    fn easy_win_layout_matches_picture() {
        let tab = easy_win_deal();
        let row = |depth: usize| -> String {
            tab.columns
                .iter()
                .map(|col| col[col.len() - 1 - depth].short_str())
                .collect::<Vec<_>>()
                .join(" ")
        };
        assert_eq!(row(0), "R R R R G G G G");
        assert_eq!(row(1), "B B B B f r1 g1 b1");
        assert_eq!(row(2), "r2 g2 b2 r3 g3 b3 r4 g4");
        assert_eq!(row(4), "g7 b7 r8 g8 b8 r9 g9 b9");
    }

    #[test]
    fn deadlocked_deal_has_no_candidate_moves() {
        let (important, other) = candidate_moves(&deadlocked_deal());
        assert!(important.is_empty());
        assert!(other.is_empty());
    }

    #[test]
    fn nearly_solved_deal_has_a_single_candidate() {
        let (important, other) = candidate_moves(&nearly_solved_deal());
        assert!(important.is_empty());
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].to_string(), "r8 at column 1 to column 3");
    }
}
