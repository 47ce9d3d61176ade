//! Search-level state: a layout plus the history that produced it.
//
//! This module defines `GameState`, which wraps a `Tableau` with:
//!   - the sequence of moves applied so far (`solution`)
//!   - the position locks created by recent relocations
//!   - the lineage of canonical fingerprints already seen on this path
//!   - a cached canonical key and 64-bit fingerprint for identity.
//!
//! Identity ignores everything except the canonical projection of the
//! layout: column order, buffer slot order, history and locks do not matter.

use std::hash::{Hash, Hasher};

use crate::card::Card;
use crate::memo::Lineage;
use crate::moves::{Locks, Move};
use crate::tableau::Tableau;

/// Why a search stopped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TerminationReason {
    /// All three foundations reached 9 in some branch.
    Win,
    /// The frontier emptied without reaching the goal.
    LossNoMoreMoves,
    /// The search stopped because a configured node limit was hit.
    MaxNodesReached,
    /// The cheapest frontier entry was already at the depth limit.
    MaxDepthReached,
}

/// 64-bit FNV-1a parameters.
const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Mix a single byte into an FNV-1a hash.
#[inline]
fn fnv1a_mix_byte(mut h: u64, byte: u8) -> u64 {
    h ^= byte as u64;
    h = h.wrapping_mul(FNV_PRIME);
    h
}

/// Canonical, order-independent serialization of a layout.
///
/// Two layouts have equal keys iff they hold the same multiset of columns,
/// the same multiset of buffer cards, the same foundations and the same
/// flower presence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey(Box<[u8]>);

impl StateKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 64-bit FNV-1a hash of the key bytes.
    pub fn fingerprint(&self) -> u64 {
        self.0.iter().fold(FNV_OFFSET_BASIS, |h, &b| fnv1a_mix_byte(h, b))
    }
}

/// Tag bytes separating the sections of a key.
const TAG_COLUMNS: u8 = 0xC0;
const TAG_BUFFER: u8 = 0xB0;
const TAG_FOUNDATIONS: u8 = 0xF0;

/// Compute the canonical key of a layout.
///
/// Columns are compared as card slices and sorted, each one is written
/// length-prefixed; buffer cards are sorted. Collected flags and buffer
/// capacity are implied by which color cards remain, so they are left out.
pub fn canonical_key(tab: &Tableau) -> StateKey {
    let mut columns: Vec<&[Card]> = tab.columns.iter().map(Vec::as_slice).collect();
    columns.sort_unstable();

    let mut buffer: Vec<u8> = tab.buffer.iter().flatten().map(|c| c.index()).collect();
    buffer.sort_unstable();

    let cards: usize = columns.iter().map(|c| c.len()).sum();
    let mut bytes = Vec::with_capacity(cards + columns.len() + buffer.len() + 8);

    bytes.push(TAG_COLUMNS);
    for col in columns {
        bytes.push(col.len() as u8);
        bytes.extend(col.iter().map(|c| c.index()));
    }

    bytes.push(TAG_BUFFER);
    bytes.push(buffer.len() as u8);
    bytes.extend_from_slice(&buffer);

    bytes.push(TAG_FOUNDATIONS);
    bytes.extend_from_slice(&tab.foundations);
    bytes.push(u8::from(tab.flower_present));

    StateKey(bytes.into_boxed_slice())
}

/// Fingerprint of a layout without keeping the key around.
pub fn fingerprint(tab: &Tableau) -> u64 {
    canonical_key(tab).fingerprint()
}

/// A node of the search graph.
///
/// Never mutated once published: the transition engine always builds a
/// fresh value, so the cached key stays consistent with the tableau.
#[derive(Clone, Debug)]
pub struct GameState {
    tableau: Tableau,
    /// Moves from the initial deal to this position, forced moves included.
    solution: Vec<Move>,
    locks: Locks,
    visited: Lineage,
    key: StateKey,
    fingerprint: u64,
}

impl GameState {
    /// Wrap a layout with an empty history. Its own fingerprint becomes
    /// the first entry of the lineage.
    pub fn new(tableau: Tableau) -> Self {
        let mut state = GameState::from_parts(tableau, Vec::new(), Locks::default(), Lineage::default());
        state.record_visited();
        state
    }

    pub(crate) fn from_parts(tableau: Tableau, solution: Vec<Move>, locks: Locks, visited: Lineage) -> Self {
        let key = canonical_key(&tableau);
        let fingerprint = key.fingerprint();
        GameState {
            tableau,
            solution,
            locks,
            visited,
            key,
            fingerprint,
        }
    }

    /// Add this state's fingerprint to its own lineage, if not yet there.
    pub(crate) fn record_visited(&mut self) {
        if !self.visited.contains(self.fingerprint) {
            self.visited = self.visited.with(self.fingerprint);
        }
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    pub fn solution(&self) -> &[Move] {
        &self.solution
    }

    pub fn into_solution(self) -> Vec<Move> {
        self.solution
    }

    pub fn locks(&self) -> &Locks {
        &self.locks
    }

    pub fn visited(&self) -> &Lineage {
        &self.visited
    }

    pub fn key(&self) -> &StateKey {
        &self.key
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Number of moves that have been applied.
    pub fn move_count(&self) -> usize {
        self.solution.len()
    }

    pub fn is_goal(&self) -> bool {
        self.tableau.is_win()
    }
}

impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for GameState {}

impl Hash for GameState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
