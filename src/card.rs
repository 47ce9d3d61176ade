//! Card, Suit, and Kind types for the 40-card SHENZHEN deck.
//!
//! - `Card` is a compact 1-byte representation (0..=30).
//! - `Suit` and `Kind` give human-readable structure on top of that.
//!
//! The deck has three suits (red, green, black). Each suit has numbered
//! cards 1..=9 and four identical "color" cards that carry no rank and are
//! collected as a group. A single flower card completes the deck.

use core::fmt;

use crate::error::SolverError;

/// Number of suits (and therefore foundations and color groups).
pub const NUM_SUITS: usize = 3;
/// Highest rank of a numbered card.
pub const MAX_RANK: u8 = 9;
/// How many identical color cards exist per suit.
pub const COLOR_CARDS_PER_SUIT: usize = 4;
/// Number of cards in a full deal: 27 numbered, 12 color, 1 flower.
pub const CARDS_PER_DECK: usize = NUM_SUITS * MAX_RANK as usize + NUM_SUITS * COLOR_CARDS_PER_SUIT + 1;

const FIRST_COLOR_INDEX: u8 = (NUM_SUITS as u8) * MAX_RANK;
const FLOWER_INDEX: u8 = FIRST_COLOR_INDEX + NUM_SUITS as u8;

/// A card represented compactly as an index in 0..=30.
///
/// The mapping is:
/// ```text
/// numbered:  index = suit * 9 + (rank - 1)     0..=26
/// color:     index = 27 + suit                 27..=29
/// flower:    index = 30
/// ```
/// The four color cards of a suit share one index; they are
/// indistinguishable in play.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Card(pub u8);

/// The three suits, doubling as the three colors.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Suit {
    Red = 0,
    Green = 1,
    Black = 2,
}

/// What sort of card a `Card` is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Kind {
    /// Ranked card that goes to its suit's foundation.
    Numbered(Suit),
    /// Unranked card collected in a group of four.
    Color(Suit),
    /// The single flower card, removed as soon as it is exposed.
    Flower,
}

impl Card {
    /// The flower card.
    pub const FLOWER: Card = Card(FLOWER_INDEX);

    /// Create a numbered card. `rank` must be in 1..=9.
    #[inline]
    pub fn numbered(suit: Suit, rank: u8) -> Self {
        debug_assert!((1..=MAX_RANK).contains(&rank));
        Card(suit as u8 * MAX_RANK + rank - 1)
    }

    /// Create the color card of a suit.
    #[inline]
    pub fn color(suit: Suit) -> Self {
        Card(FIRST_COLOR_INDEX + suit as u8)
    }

    /// Return the raw 0..=30 index of this card.
    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn kind(self) -> Kind {
        if self.0 < FIRST_COLOR_INDEX {
            Kind::Numbered(Suit::from_u8(self.0 / MAX_RANK))
        } else if self.0 < FLOWER_INDEX {
            Kind::Color(Suit::from_u8(self.0 - FIRST_COLOR_INDEX))
        } else {
            Kind::Flower
        }
    }

    /// Rank in 1..=9 for numbered cards, `None` otherwise.
    #[inline]
    pub fn rank(self) -> Option<u8> {
        match self.kind() {
            Kind::Numbered(_) => Some(self.0 % MAX_RANK + 1),
            Kind::Color(_) | Kind::Flower => None,
        }
    }

    /// Suit of a numbered or color card; the flower has none.
    #[inline]
    pub fn suit(self) -> Option<Suit> {
        match self.kind() {
            Kind::Numbered(suit) | Kind::Color(suit) => Some(suit),
            Kind::Flower => None,
        }
    }

    #[inline]
    pub fn is_flower(self) -> bool {
        self.0 == FLOWER_INDEX
    }

    #[inline]
    pub fn is_color(self) -> bool {
        matches!(self.kind(), Kind::Color(_))
    }

    /// Parse a deal-file token such as `r3`, `G` or `f`.
    ///
    /// Lowercase suit letter plus a digit is a numbered card, an uppercase
    /// suit letter alone is that suit's color card, and `f` is the flower.
    pub fn parse(token: &str) -> Result<Self, SolverError> {
        let invalid = || SolverError::InvalidCardFormat {
            token: token.to_string(),
        };

        let mut chars = token.chars();
        let first = chars.next().ok_or_else(invalid)?;
        let second = chars.next();
        if chars.next().is_some() {
            return Err(invalid());
        }

        match (first, second) {
            ('f', None) => Ok(Card::FLOWER),
            (c, None) if c.is_ascii_uppercase() => {
                let suit = Suit::from_char(c.to_ascii_lowercase()).ok_or_else(invalid)?;
                Ok(Card::color(suit))
            }
            (c, Some(d)) => {
                let suit = Suit::from_char(c).ok_or_else(invalid)?;
                match d.to_digit(10) {
                    Some(rank @ 1..=9) => Ok(Card::numbered(suit, rank as u8)),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }

    /// Short string like "r3", "G", "f".
    pub fn short_str(self) -> String {
        match self.kind() {
            Kind::Numbered(suit) => format!("{}{}", suit.short_char(), self.0 % MAX_RANK + 1),
            Kind::Color(suit) => suit.short_char().to_ascii_uppercase().to_string(),
            Kind::Flower => "f".to_string(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_str())
    }
}

impl Suit {
    /// All suits in a fixed, reproducible order.
    pub const ALL: [Suit; NUM_SUITS] = [Suit::Red, Suit::Green, Suit::Black];

    /// Construct a suit from a small integer 0..=2.
    ///
    /// # Panics
    ///
    /// Panics if `v >= 3`.
    #[inline]
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Suit::Red,
            1 => Suit::Green,
            2 => Suit::Black,
            _ => panic!("invalid suit: {v}"),
        }
    }

    /// Index into per-suit arrays (foundations, collected flags).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'r' => Some(Suit::Red),
            'g' => Some(Suit::Green),
            'b' => Some(Suit::Black),
            _ => None,
        }
    }

    /// Single-character representation: 'r', 'g', or 'b'.
    #[inline]
    pub fn short_char(self) -> char {
        match self {
            Suit::Red => 'r',
            Suit::Green => 'g',
            Suit::Black => 'b',
        }
    }
}

/// Helper for column rules: can `upper` be placed on `lower`?
///
/// True if both are numbered, `upper` is exactly one rank lower than
/// `lower`, and the suits differ.
#[inline]
pub fn is_one_lower_other_suit(upper: Card, lower: Card) -> bool {
    match (upper.kind(), lower.kind()) {
        (Kind::Numbered(us), Kind::Numbered(ls)) => {
            us != ls && upper.rank().map(|r| r + 1) == lower.rank()
        }
        _ => false,
    }
}

/// Every card of a full deal, in suit-major order (numbered, then color),
/// flower last.
pub fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(CARDS_PER_DECK);
    for suit in Suit::ALL {
        for rank in 1..=MAX_RANK {
            deck.push(Card::numbered(suit, rank));
        }
        for _ in 0..COLOR_CARDS_PER_SUIT {
            deck.push(Card::color(suit));
        }
    }
    deck.push(Card::FLOWER);
    deck
}
