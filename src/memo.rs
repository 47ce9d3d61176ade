//! Per-run bookkeeping shared between the engine and the search drivers:
//! the lineage of fingerprints carried by each state, and the memoized
//! successor lists.

use std::rc::Rc;

use fxhash::FxHashMap;

use crate::game::StateKey;
use crate::moves::Successors;

#[derive(Debug)]
struct Link {
    fingerprint: u64,
    parent: Option<Rc<Link>>,
}

/// Fingerprints of every state on the path that produced a state.
///
/// Persistent singly linked list: extending a lineage shares the parent's
/// links, so each transition costs one allocation instead of a copy of the
/// whole set. A lineage is never modified after it is built.
#[derive(Clone, Debug, Default)]
pub struct Lineage {
    head: Option<Rc<Link>>,
}

impl Lineage {
    pub fn contains(&self, fingerprint: u64) -> bool {
        self.iter().any(|fp| fp == fingerprint)
    }

    /// A new lineage with `fingerprint` added on top of this one.
    #[must_use]
    pub fn with(&self, fingerprint: u64) -> Lineage {
        Lineage {
            head: Some(Rc::new(Link {
                fingerprint,
                parent: self.head.clone(),
            })),
        }
    }

    /// Newest fingerprint first.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let mut cur = self.head.as_deref();
        std::iter::from_fn(move || {
            let link = cur?;
            cur = link.parent.as_deref();
            Some(link.fingerprint)
        })
    }
}

impl Drop for Lineage {
    // Unlink iteratively; deep lineages would otherwise recurse once per link.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(link) = next {
            match Rc::try_unwrap(link) {
                Ok(mut link) => next = link.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// Successor lists memoized by canonical state identity.
#[derive(Debug, Default)]
pub struct SuccessorCache {
    map: FxHashMap<StateKey, Rc<Successors>>,
    hits: u64,
    misses: u64,
}

impl SuccessorCache {
    pub fn get(&mut self, key: &StateKey) -> Option<Rc<Successors>> {
        let found = self.map.get(key).cloned();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, key: StateKey, successors: Rc<Successors>) {
        self.map.insert(key, successors);
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lineage_extends_without_touching_parent() {
        let root = Lineage::default().with(1);
        let left = root.with(2);
        let right = root.with(3);

        assert!(left.contains(1) && left.contains(2) && !left.contains(3));
        assert!(right.contains(1) && right.contains(3) && !right.contains(2));
        assert_eq!(root.iter().count(), 1);
        assert_eq!(left.iter().collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn deep_lineage_drops_cleanly() {
        let mut lineage = Lineage::default();
        for fp in 0..200_000u64 {
            lineage = lineage.with(fp);
        }
        assert_eq!(lineage.iter().count(), 200_000);
        assert!(lineage.contains(0));
        drop(lineage);
    }

    #[test]
    fn shared_tail_survives_dropping_a_branch() {
        let root = Lineage::default().with(7).with(8);
        let branch = root.with(9);
        drop(branch);
        assert_eq!(root.iter().collect::<Vec<_>>(), vec![8, 7]);
    }
}
