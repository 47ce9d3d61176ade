//! The card layout: columns, buffer, foundations and collection flags.
//
//! A `Tableau` is pure layout. Search bookkeeping (move history, locks,
//! visited lineage) lives in `crate::game::GameState`.

use core::fmt;

use itertools::Itertools;

use crate::card::{COLOR_CARDS_PER_SUIT, Card, Kind, MAX_RANK, NUM_SUITS, Suit};
use crate::error::{InvalidState, Invariant, SolverError};

/// Number of columns in the layout.
pub const NUM_COLS: usize = 8;
/// Number of buffer slots before any color is collected.
pub const BUFFER_SLOTS: usize = 3;

/// A place a card can be taken from or put to.
///
/// Indices are 0-based internally and printed 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    Column(u8),
    Buffer(u8),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Position::Column(i) => write!(f, "column {}", i + 1),
            Position::Buffer(i) => write!(f, "buffer {}", i + 1),
        }
    }
}

/// Complete layout at a point in time.
///
/// `columns` are stored bottom to top: the last element is the exposed
/// card. `buffer` has fixed slots so that a `Position::Buffer` keeps
/// referring to the same card while other slots change.
///
/// The derived `PartialEq` is structural (column order matters). Search
/// identity is the canonical key in `crate::game`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tableau {
    pub columns: [Vec<Card>; NUM_COLS],
    pub buffer: [Option<Card>; BUFFER_SLOTS],
    pub buffer_capacity: u8,
    /// Highest rank on each suit's foundation, 0 for empty.
    pub foundations: [u8; NUM_SUITS],
    pub collected: [bool; NUM_SUITS],
    pub flower_present: bool,
}

impl Default for Tableau {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl Tableau {
    pub fn new_empty() -> Self {
        Tableau {
            columns: Default::default(),
            buffer: [None; BUFFER_SLOTS],
            buffer_capacity: BUFFER_SLOTS as u8,
            foundations: [0; NUM_SUITS],
            collected: [false; NUM_SUITS],
            flower_present: false,
        }
    }

    /// Build a fresh deal from column contents (bottom to top).
    ///
    /// Missing trailing columns are left empty. `flower_present` is derived
    /// from whether the flower appears anywhere.
    pub fn from_columns(columns: Vec<Vec<Card>>) -> Result<Self, SolverError> {
        if columns.len() > NUM_COLS {
            return Err(SolverError::TooManyColumns {
                found: columns.len(),
            });
        }
        let mut tab = Tableau::new_empty();
        for (slot, cards) in tab.columns.iter_mut().zip(columns) {
            *slot = cards;
        }
        let flower_present = tab.cards_in_play().any(|(_, c)| c.is_flower());
        tab.flower_present = flower_present;
        Ok(tab)
    }

    /// All three foundations complete.
    pub fn is_win(&self) -> bool {
        self.foundations.iter().all(|&f| f == MAX_RANK)
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.iter().flatten().count()
    }

    pub fn has_buffer_space(&self) -> bool {
        self.buffer_len() < self.buffer_capacity as usize
    }

    /// First empty buffer slot, if capacity allows another card.
    pub fn free_buffer_slot(&self) -> Option<u8> {
        if !self.has_buffer_space() {
            return None;
        }
        self.buffer
            .iter()
            .position(Option::is_none)
            .map(|i| i as u8)
    }

    /// The movable card at `pos`, if any.
    pub fn top(&self, pos: Position) -> Option<Card> {
        match pos {
            Position::Column(i) => self.columns.get(i as usize)?.last().copied(),
            Position::Buffer(i) => self.buffer.get(i as usize).copied().flatten(),
        }
    }

    /// Remove and return the movable card at `pos`.
    pub fn take(&mut self, pos: Position) -> Option<Card> {
        match pos {
            Position::Column(i) => self.columns.get_mut(i as usize)?.pop(),
            Position::Buffer(i) => self.buffer.get_mut(i as usize)?.take(),
        }
    }

    /// Put `card` on top of `pos`. Buffer slots are overwritten; callers
    /// only target empty slots.
    pub fn place(&mut self, pos: Position, card: Card) {
        match pos {
            Position::Column(i) => self.columns[i as usize].push(card),
            Position::Buffer(i) => {
                debug_assert!(self.buffer[i as usize].is_none());
                self.buffer[i as usize] = Some(card);
            }
        }
    }

    /// Every card that can currently be picked up: column tops and buffer.
    pub fn visible_cards(&self) -> impl Iterator<Item = (Position, Card)> + '_ {
        let tops = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(i, col)| col.last().map(|&c| (Position::Column(i as u8), c)));
        tops.chain(self.buffer_cards())
    }

    pub fn buffer_cards(&self) -> impl Iterator<Item = (Position, Card)> + '_ {
        self.buffer
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|c| (Position::Buffer(i as u8), c)))
    }

    /// Every card still in play, with the position of the pile holding it.
    pub fn cards_in_play(&self) -> impl Iterator<Item = (Position, Card)> + '_ {
        let column_cards = self.columns.iter().enumerate().flat_map(|(i, col)| {
            col.iter().map(move |&c| (Position::Column(i as u8), c))
        });
        column_cards.chain(self.buffer_cards())
    }

    pub fn card_count(&self) -> usize {
        self.cards_in_play().count()
    }

    /// Number of cards stacked above the first occurrence of `card`, or
    /// `Some(0)` if it sits in the buffer. `None` if it is not in play.
    pub fn dig_depth(&self, card: Card) -> Option<usize> {
        if self.buffer.contains(&Some(card)) {
            return Some(0);
        }
        self.columns
            .iter()
            .filter_map(|col| col.iter().position(|&c| c == card).map(|i| col.len() - i - 1))
            .min()
    }

    /// Check the layout invariants.
    ///
    /// Run once on a freshly loaded deal; every legal transition preserves
    /// them afterwards.
    pub fn validate(&self) -> Result<(), InvalidState> {
        self.validate_buffer()?;
        self.validate_flower()?;
        self.validate_color_groups()?;
        self.validate_ranks()
    }

    fn validate_buffer(&self) -> Result<(), InvalidState> {
        let collected = self.collected.iter().filter(|&&c| c).count();
        let expected_capacity = BUFFER_SLOTS - collected;
        if self.buffer_capacity as usize != expected_capacity {
            return Err(InvalidState {
                invariant: Invariant::BufferCapacity,
                detail: format!(
                    "buffer capacity is {} but {} color(s) are collected (expected {})",
                    self.buffer_capacity, collected, expected_capacity
                ),
            });
        }
        let len = self.buffer_len();
        if len > self.buffer_capacity as usize {
            return Err(InvalidState {
                invariant: Invariant::BufferCapacity,
                detail: format!(
                    "buffer holds {} card(s) [{}] but capacity is {}",
                    len,
                    self.buffer_cards().map(|(_, c)| c).join(" "),
                    self.buffer_capacity
                ),
            });
        }
        Ok(())
    }

    fn validate_flower(&self) -> Result<(), InvalidState> {
        let flowers: Vec<Position> = self
            .cards_in_play()
            .filter(|(_, c)| c.is_flower())
            .map(|(p, _)| p)
            .collect();
        let expected = usize::from(self.flower_present);
        if flowers.len() != expected {
            return Err(InvalidState {
                invariant: Invariant::FlowerPresence,
                detail: format!(
                    "flower_present is {} but found {} flower card(s){}",
                    self.flower_present,
                    flowers.len(),
                    describe_positions(&flowers)
                ),
            });
        }
        Ok(())
    }

    fn validate_color_groups(&self) -> Result<(), InvalidState> {
        for suit in Suit::ALL {
            let color = Card::color(suit);
            let found: Vec<Position> = self
                .cards_in_play()
                .filter(|&(_, c)| c == color)
                .map(|(p, _)| p)
                .collect();
            let collected = self.collected[suit.index()];
            let ok = match found.len() {
                COLOR_CARDS_PER_SUIT => !collected,
                0 => collected,
                _ => false,
            };
            if !ok {
                return Err(InvalidState {
                    invariant: Invariant::ColorGroups,
                    detail: format!(
                        "{}: expected {} in play or collected, found {} (collected = {}){}",
                        color,
                        COLOR_CARDS_PER_SUIT,
                        found.len(),
                        collected,
                        describe_positions(&found)
                    ),
                });
            }
        }
        Ok(())
    }

    fn validate_ranks(&self) -> Result<(), InvalidState> {
        for suit in Suit::ALL {
            let foundation = self.foundations[suit.index()];
            let mut counts = [0usize; MAX_RANK as usize + 1];
            for rank in 1..=foundation.min(MAX_RANK) {
                counts[rank as usize] += 1;
            }
            for (_, card) in self.cards_in_play() {
                if card.kind() == Kind::Numbered(suit) {
                    if let Some(rank) = card.rank() {
                        counts[rank as usize] += 1;
                    }
                }
            }

            let missing: Vec<u8> = (1..=MAX_RANK).filter(|&r| counts[r as usize] == 0).collect();
            let duplicated: Vec<u8> = (1..=MAX_RANK).filter(|&r| counts[r as usize] > 1).collect();
            if foundation > MAX_RANK || !missing.is_empty() || !duplicated.is_empty() {
                let in_play = self
                    .cards_in_play()
                    .filter(|&(_, c)| c.kind() == Kind::Numbered(suit))
                    .map(|(p, c)| format!("{c}@{p}"))
                    .join(", ");
                return Err(InvalidState {
                    invariant: Invariant::ContiguousRanks,
                    detail: format!(
                        "suit {}: foundation {}, in play [{}]\n  missing ranks: {:?}\n  duplicated ranks: {:?}",
                        suit.short_char(),
                        foundation,
                        in_play,
                        missing,
                        duplicated
                    ),
                });
            }
        }
        Ok(())
    }
}

fn describe_positions(positions: &[Position]) -> String {
    if positions.is_empty() {
        String::new()
    } else {
        format!(" at {}", positions.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical_deals;

    fn cards(tokens: &str) -> Vec<Card> {
        tokens
            .split_whitespace()
            .map(|t| Card::parse(t).unwrap())
            .collect()
    }

    #[test]
    fn from_columns_derives_flower_and_pads_columns() {
        let tab = Tableau::from_columns(vec![cards("r1 f"), cards("g2")]).unwrap();
        assert!(tab.flower_present);
        assert_eq!(tab.columns[1], cards("g2"));
        assert!(tab.columns[2..].iter().all(Vec::is_empty));
        assert_eq!(tab.buffer_capacity, 3);

        let no_flower = Tableau::from_columns(vec![cards("r1 g2")]).unwrap();
        assert!(!no_flower.flower_present);
    }

    #[test]
    fn too_many_columns_is_rejected() {
        let err = Tableau::from_columns(vec![Vec::new(); NUM_COLS + 1]).unwrap_err();
        assert!(matches!(err, SolverError::TooManyColumns { found: 9 }));
    }

    #[test]
    fn top_take_and_place() {
        let mut tab = Tableau::from_columns(vec![cards("r1 r2")]).unwrap();
        let col = Position::Column(0);
        assert_eq!(tab.top(col), Some(Card::numbered(Suit::Red, 2)));

        let card = tab.take(col).unwrap();
        let slot = tab.free_buffer_slot().unwrap();
        tab.place(Position::Buffer(slot), card);
        assert_eq!(tab.buffer_len(), 1);
        assert_eq!(tab.top(col), Some(Card::numbered(Suit::Red, 1)));
        assert_eq!(tab.visible_cards().count(), 2);
    }

    #[test]
    fn full_buffer_has_no_free_slot() {
        let mut tab = Tableau::new_empty();
        tab.buffer_capacity = 2;
        tab.buffer = [Some(Card::color(Suit::Red)), None, Some(Card::color(Suit::Green))];
        assert_eq!(tab.free_buffer_slot(), None);
        tab.buffer_capacity = 3;
        assert_eq!(tab.free_buffer_slot(), Some(1));
    }

    #[test]
    fn dig_depth_prefers_shallowest_copy() {
        let tab = Tableau::from_columns(vec![cards("r1 g5 b3"), cards("g2 r4")]).unwrap();
        assert_eq!(tab.dig_depth(Card::numbered(Suit::Red, 1)), Some(2));
        assert_eq!(tab.dig_depth(Card::numbered(Suit::Red, 4)), Some(0));
        assert_eq!(tab.dig_depth(Card::numbered(Suit::Red, 9)), None);
    }

    #[test]
    fn canonical_deal_is_valid() {
        let tab = canonical_deals::sorted_deal();
        assert_eq!(tab.validate(), Ok(()));
        assert_eq!(tab.card_count(), crate::card::CARDS_PER_DECK);
    }

    #[test]
    fn missing_color_card_is_reported() {
        let mut tab = canonical_deals::sorted_deal();
        let color = Card::color(Suit::Green);
        let col = tab.columns.iter_mut().find(|c| c.contains(&color)).unwrap();
        let idx = col.iter().position(|&c| c == color).unwrap();
        col.remove(idx);

        let err = tab.validate().unwrap_err();
        assert_eq!(err.invariant, Invariant::ColorGroups);
        assert!(err.detail.contains("found 3"), "{}", err.detail);
    }

    #[test]
    fn rank_gap_is_reported() {
        let mut tab = canonical_deals::sorted_deal();
        let r5 = Card::numbered(Suit::Red, 5);
        for col in tab.columns.iter_mut() {
            col.retain(|&c| c != r5);
        }

        let err = tab.validate().unwrap_err();
        assert_eq!(err.invariant, Invariant::ContiguousRanks);
        assert!(err.detail.contains("missing ranks: [5]"), "{}", err.detail);
    }

    #[test]
    fn stray_flower_is_reported() {
        let mut tab = canonical_deals::sorted_deal();
        tab.flower_present = false;
        let err = tab.validate().unwrap_err();
        assert_eq!(err.invariant, Invariant::FlowerPresence);
    }

    #[test]
    fn overfull_buffer_is_reported() {
        let mut tab = Tableau::new_empty();
        tab.collected[0] = true;
        tab.buffer_capacity = 2;
        tab.buffer = [Some(Card::numbered(Suit::Green, 1)); BUFFER_SLOTS];
        let err = tab.validate().unwrap_err();
        assert_eq!(err.invariant, Invariant::BufferCapacity);
        assert!(err.detail.contains("holds 3"), "{}", err.detail);
    }

    #[test]
    fn capacity_must_track_collected_colors() {
        let mut tab = Tableau::new_empty();
        tab.buffer_capacity = 1;
        let err = tab.validate().unwrap_err();
        assert_eq!(err.invariant, Invariant::BufferCapacity);
    }
}
