//! Move representation and the transition engine.
//
//! This module defines the closed `Move` type, the legality model
//! (`check_move`), in-place application on a `Tableau`, the position locks
//! that stop the search from shuffling the same card back and forth, and
//! the `Engine` that turns a `GameState` into its successors:
//!   - `take_action` applies one move to a fresh copy of a state,
//!   - `auto_proceed` runs the forced-move cascade,
//!   - `get_successors` enumerates, applies and memoizes every candidate.

use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use fxhash::FxHashSet;
use log::{trace, warn};
use thiserror::Error;

use crate::card::{COLOR_CARDS_PER_SUIT, Card, Kind, MAX_RANK, Suit, is_one_lower_other_suit};
use crate::error::SolverError;
use crate::game::{GameState, StateKey};
use crate::memo::SuccessorCache;
use crate::tableau::{NUM_COLS, Position, Tableau};

/// A single move.
///
/// Auto-proceed moves use the same variants, so a solution replays from
/// the initial deal without re-running the cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    /// Move the top card of a column or a buffer slot to a column or an
    /// empty buffer slot.
    Relocate {
        card: Card,
        source: Position,
        dest: Position,
    },
    /// Put the top card of a column or a buffer slot on its foundation.
    Score { card: Card, source: Position },
    /// Remove all four visible color cards of a suit, or the flower.
    Collect { card: Card },
}

impl Move {
    /// Apply the move to `tab` in place and return the positions it took
    /// cards from or put cards on.
    ///
    /// Callers check legality first (`check_move`); applying an illegal
    /// move leaves the layout in an unspecified but memory-safe state.
    pub fn apply(&self, tab: &mut Tableau) -> Vec<Position> {
        match *self {
            Move::Relocate { source, dest, .. } => {
                if let Some(card) = tab.take(source) {
                    tab.place(dest, card);
                }
                vec![source, dest]
            }

            Move::Score { card, source } => {
                tab.take(source);
                if let (Some(suit), Some(rank)) = (card.suit(), card.rank()) {
                    tab.foundations[suit.index()] = rank;
                }
                vec![source]
            }

            Move::Collect { card } if card.is_flower() => {
                let found = tab
                    .visible_cards()
                    .find(|&(_, c)| c.is_flower())
                    .map(|(p, _)| p);
                if let Some(pos) = found {
                    tab.take(pos);
                }
                tab.flower_present = false;
                found.into_iter().collect()
            }

            Move::Collect { card } => {
                let positions: Vec<Position> = tab
                    .visible_cards()
                    .filter(|&(_, c)| c == card)
                    .map(|(p, _)| p)
                    .collect();
                for &pos in &positions {
                    tab.take(pos);
                }
                if let Some(suit) = card.suit() {
                    tab.collected[suit.index()] = true;
                }
                tab.buffer_capacity = tab.buffer_capacity.saturating_sub(1);
                positions
            }
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Relocate { card, source, dest } => write!(f, "{card} at {source} to {dest}"),
            Move::Score { card, source } => write!(f, "{card} at {source} to goal"),
            Move::Collect { card } => write!(f, "collect {card}"),
        }
    }
}

/// Why a move cannot be applied to a layout.
///
/// Only `Locked` is expected during search; the rest mean the generator
/// proposed something it should not have.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("{pos} is empty")]
    EmptySource { pos: Position },
    #[error("expected {expected} on top of {pos}, found {found}")]
    WrongCard {
        pos: Position,
        expected: Card,
        found: Card,
    },
    #[error("{pos} is locked")]
    Locked { pos: Position },
    #[error("{card} cannot be stacked on {onto}")]
    BadStack { card: Card, onto: Card },
    #[error("no buffer room for {card}")]
    BufferFull { card: Card },
    #[error("{card} is not next on its foundation")]
    NotNext { card: Card },
    #[error("{card} cannot be collected")]
    NotCollectable { card: Card },
    #[error("{card} cannot move from {pos} to itself")]
    SameSlot { card: Card, pos: Position },
}

/// Pairs of positions that may not be the source of a relocation.
///
/// Relocating P to Q locks both. The pair is released as soon as any later
/// move touches either of them. Each pair is stored in both directions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Locks(BTreeMap<Position, Position>);

impl Locks {
    pub fn lock(&mut self, a: Position, b: Position) {
        self.touch(a);
        self.touch(b);
        self.0.insert(a, b);
        self.0.insert(b, a);
    }

    /// Release the pair `pos` belongs to, if any.
    pub fn touch(&mut self, pos: Position) {
        if let Some(partner) = self.0.remove(&pos) {
            self.0.remove(&partner);
        }
    }

    pub fn is_locked(&self, pos: Position) -> bool {
        self.0.contains_key(&pos)
    }

    pub fn partner(&self, pos: Position) -> Option<Position> {
        self.0.get(&pos).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Update the locks after `mv` touched `touched`.
    ///
    /// Removing the flower never counts as touching its column.
    pub fn record(&mut self, mv: &Move, touched: &[Position]) {
        match *mv {
            Move::Relocate { source, dest, .. } => self.lock(source, dest),
            Move::Collect { card } if card.is_flower() => {}
            Move::Score { .. } | Move::Collect { .. } => {
                for &pos in touched {
                    self.touch(pos);
                }
            }
        }
    }
}

fn expect_top(tab: &Tableau, pos: Position, card: Card) -> Result<(), IllegalMove> {
    match tab.top(pos) {
        None => Err(IllegalMove::EmptySource { pos }),
        Some(found) if found != card => Err(IllegalMove::WrongCard {
            pos,
            expected: card,
            found,
        }),
        Some(_) => Ok(()),
    }
}

/// Check `mv` against the rules and the current locks.
pub fn check_move(tab: &Tableau, locks: &Locks, mv: &Move) -> Result<(), IllegalMove> {
    match *mv {
        Move::Relocate { card, source, dest } => {
            expect_top(tab, source, card)?;
            if source == dest {
                return Err(IllegalMove::SameSlot { card, pos: source });
            }
            if locks.is_locked(source) {
                return Err(IllegalMove::Locked { pos: source });
            }
            match dest {
                Position::Column(_) => match tab.top(dest) {
                    Some(onto) if !is_one_lower_other_suit(card, onto) => {
                        Err(IllegalMove::BadStack { card, onto })
                    }
                    _ => Ok(()),
                },
                Position::Buffer(slot) => {
                    let slot_free = tab.buffer.get(slot as usize) == Some(&None);
                    // A buffer-to-buffer move frees the slot it fills.
                    let room = tab.has_buffer_space() || matches!(source, Position::Buffer(_));
                    if slot_free && room {
                        Ok(())
                    } else {
                        Err(IllegalMove::BufferFull { card })
                    }
                }
            }
        }

        Move::Score { card, source } => {
            expect_top(tab, source, card)?;
            match (card.suit(), card.rank()) {
                (Some(suit), Some(rank)) if tab.foundations[suit.index()] + 1 == rank => Ok(()),
                _ => Err(IllegalMove::NotNext { card }),
            }
        }

        Move::Collect { card } => {
            if can_collect(tab, card) {
                Ok(())
            } else {
                Err(IllegalMove::NotCollectable { card })
            }
        }
    }
}

fn can_collect(tab: &Tableau, card: Card) -> bool {
    match card.kind() {
        Kind::Flower => tab.columns.iter().any(|col| col.last() == Some(&Card::FLOWER)),
        Kind::Color(suit) => {
            if tab.collected[suit.index()] {
                return false;
            }
            let visible = tab.visible_cards().filter(|&(_, c)| c == card).count();
            let in_buffer = tab.buffer_cards().filter(|&(_, c)| c == card).count();
            let remaining = tab.buffer_len() - in_buffer;
            visible == COLOR_CARDS_PER_SUIT && remaining < tab.buffer_capacity as usize
        }
        Kind::Numbered(_) => false,
    }
}

/// The next forced move, if any: the exposed flower, otherwise the next
/// card of a suit that is furthest behind when it can be picked up.
fn forced_move(tab: &Tableau) -> Option<Move> {
    if tab.flower_present && can_collect(tab, Card::FLOWER) {
        return Some(Move::Collect { card: Card::FLOWER });
    }
    let lowest = tab.foundations.iter().copied().min()?;
    if lowest >= MAX_RANK {
        return None;
    }
    Suit::ALL
        .into_iter()
        .filter(|suit| tab.foundations[suit.index()] == lowest)
        .find_map(|suit| {
            let next = Card::numbered(suit, lowest + 1);
            tab.visible_cards()
                .find(|&(_, c)| c == next)
                .map(|(source, card)| Move::Score { card, source })
        })
}

/// Candidate moves from a layout, split into (important, other).
///
/// Candidates respect the stacking, buffer and foundation rules but not
/// the locks; `Engine::take_action` rejects locked sources.
pub fn candidate_moves(tab: &Tableau) -> (Vec<Move>, Vec<Move>) {
    let mut important = Vec::new();
    let mut other = Vec::new();

    for (source, card) in tab.visible_cards() {
        if let (Some(suit), Some(rank)) = (card.suit(), card.rank()) {
            if tab.foundations[suit.index()] + 1 == rank {
                important.push(Move::Score { card, source });
            }
        }
    }
    for suit in Suit::ALL {
        let color = Card::color(suit);
        if can_collect(tab, color) {
            important.push(Move::Collect { card: color });
        }
    }

    // Every empty column is equivalent, so only the first is offered.
    let first_empty = tab.columns.iter().position(Vec::is_empty);
    let free_slot = tab.free_buffer_slot();

    for (source, card) in tab.visible_cards() {
        if card.is_flower() {
            continue;
        }
        for dst in 0..NUM_COLS {
            let dest = Position::Column(dst as u8);
            if dest == source {
                continue;
            }
            let ok = match tab.columns[dst].last() {
                Some(&onto) => is_one_lower_other_suit(card, onto),
                // A lone card moving to an empty column changes nothing.
                None => {
                    Some(dst) == first_empty
                        && !matches!(source, Position::Column(i) if tab.columns[i as usize].len() == 1)
                }
            };
            if ok {
                other.push(Move::Relocate { card, source, dest });
            }
        }
        if let (Position::Column(_), Some(slot)) = (source, free_slot) {
            other.push(Move::Relocate {
                card,
                source,
                dest: Position::Buffer(slot),
            });
        }
    }

    (important, other)
}

/// One edge of the search graph.
#[derive(Clone, Debug)]
pub struct Successor {
    pub action: Move,
    pub state: GameState,
}

/// Successors of a state, deduplicated by canonical identity.
#[derive(Clone, Debug, Default)]
pub struct Successors {
    /// Reached through a `Score` or `Collect`.
    pub important: Vec<Successor>,
    /// Reached through a relocation.
    pub other: Vec<Successor>,
}

impl Successors {
    pub fn len(&self) -> usize {
        self.important.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.important.is_empty() && self.other.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Successor> {
        self.important.iter().chain(&self.other)
    }
}

/// Transition engine for one search run.
///
/// Owns the successor cache so tests and repeated runs can start clean.
#[derive(Debug, Default)]
pub struct Engine {
    cache: SuccessorCache,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a freshly loaded layout and run the cascade on it.
    pub fn initial_state(&self, tableau: Tableau) -> Result<GameState, SolverError> {
        tableau.validate()?;
        Ok(self.auto_proceed(&GameState::new(tableau)))
    }

    /// Apply `mv` to a copy of `state`.
    ///
    /// Returns `None` when the source is locked or when the resulting
    /// layout is already on the state's lineage.
    pub fn take_action(&self, state: &GameState, mv: Move) -> Option<GameState> {
        match check_move(state.tableau(), state.locks(), &mv) {
            Ok(()) => {}
            Err(err @ IllegalMove::Locked { .. }) => {
                trace!("rejected {mv}: {err}");
                return None;
            }
            Err(err) => {
                if cfg!(debug_assertions) {
                    panic!("generated illegal move {mv}: {err}");
                }
                warn!("skipping illegal move {mv}: {err}");
                return None;
            }
        }

        let mut tableau = state.tableau().clone();
        let touched = mv.apply(&mut tableau);
        let mut locks = state.locks().clone();
        locks.record(&mv, &touched);
        let mut solution = state.solution().to_vec();
        solution.push(mv);

        let mut next = GameState::from_parts(tableau, solution, locks, state.visited().clone());
        if state.visited().contains(next.fingerprint()) {
            trace!("rejected {mv}: layout already seen on this line");
            return None;
        }
        next.record_visited();
        Some(self.auto_proceed(&next))
    }

    /// Run the forced-move cascade until nothing is forced.
    ///
    /// Returns a clone of `state` when no move is forced, so running it
    /// twice is the same as running it once.
    pub fn auto_proceed(&self, state: &GameState) -> GameState {
        let Some(first) = forced_move(state.tableau()) else {
            return state.clone();
        };

        let mut tableau = state.tableau().clone();
        let mut locks = state.locks().clone();
        let mut solution = state.solution().to_vec();
        let mut next = Some(first);
        while let Some(mv) = next {
            trace!("auto: {mv}");
            let touched = mv.apply(&mut tableau);
            locks.record(&mv, &touched);
            solution.push(mv);
            next = forced_move(&tableau);
        }

        let mut state = GameState::from_parts(tableau, solution, locks, state.visited().clone());
        state.record_visited();
        state
    }

    /// Every state reachable from `state` in one move (plus its cascade).
    ///
    /// Memoized by canonical identity for the lifetime of the engine.
    pub fn get_successors(&mut self, state: &GameState) -> Rc<Successors> {
        if let Some(hit) = self.cache.get(state.key()) {
            return hit;
        }

        let (important_moves, other_moves) = candidate_moves(state.tableau());
        let mut seen: FxHashSet<StateKey> = FxHashSet::default();
        let important = self.expand(state, important_moves, &mut seen);
        let other = self.expand(state, other_moves, &mut seen);

        let successors = Rc::new(Successors { important, other });
        self.cache.insert(state.key().clone(), Rc::clone(&successors));
        successors
    }

    fn expand(&self, state: &GameState, moves: Vec<Move>, seen: &mut FxHashSet<StateKey>) -> Vec<Successor> {
        moves
            .into_iter()
            .filter_map(|action| {
                let next = self.take_action(state, action)?;
                seen.insert(next.key().clone())
                    .then_some(Successor { action, state: next })
            })
            .collect()
    }

    pub fn cache(&self) -> &SuccessorCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
