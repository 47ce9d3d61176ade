use core::fmt;

/// Counters collected during one search run.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct SearchStats {
    /// States popped from the frontier and expanded.
    pub nodes_expanded: u64,
    /// Successor states handed back by the engine.
    pub states_generated: u64,
    /// Successors dropped because their layout was already seen this run.
    pub duplicates_pruned: u64,
    /// Successor lookups answered by the memo cache.
    pub cache_hits: u64,
    /// Successor lookups that had to expand the state.
    pub cache_misses: u64,
    /// Entries in the memo cache when the run ended.
    pub cached_states: usize,
    pub max_frontier: usize,
    pub max_depth_reached: usize,
}

impl SearchStats {
    pub fn record_expansion(&mut self, depth: usize) {
        self.nodes_expanded += 1;
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }

    pub fn record_frontier(&mut self, len: usize) {
        self.max_frontier = self.max_frontier.max(len);
    }

    /// Fold the counters of another attempt into this one.
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes_expanded += other.nodes_expanded;
        self.states_generated += other.states_generated;
        self.duplicates_pruned += other.duplicates_pruned;
        self.cache_hits += other.cache_hits;
        self.cache_misses += other.cache_misses;
        self.cached_states = self.cached_states.max(other.cached_states);
        self.max_frontier = self.max_frontier.max(other.max_frontier);
        self.max_depth_reached = self.max_depth_reached.max(other.max_depth_reached);
    }

    pub fn prune_rate(&self) -> f64 {
        if self.states_generated == 0 {
            0.0
        } else {
            self.duplicates_pruned as f64 / self.states_generated as f64
        }
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expanded {}, generated {}, pruned {} ({:.1}%), cache hits {}/{} ({} cached), max frontier {}, max depth {}",
            self.nodes_expanded,
            self.states_generated,
            self.duplicates_pruned,
            self.prune_rate() * 100.0,
            self.cache_hits,
            self.cache_hits + self.cache_misses,
            self.cached_states,
            self.max_frontier,
            self.max_depth_reached
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_counts_and_keeps_peaks() {
        let mut a = SearchStats {
            nodes_expanded: 3,
            states_generated: 10,
            duplicates_pruned: 5,
            max_frontier: 7,
            ..Default::default()
        };
        let b = SearchStats {
            nodes_expanded: 2,
            states_generated: 10,
            max_frontier: 4,
            max_depth_reached: 9,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.nodes_expanded, 5);
        assert_eq!(a.max_frontier, 7);
        assert_eq!(a.max_depth_reached, 9);
        assert!((a.prune_rate() - 0.25).abs() < 1e-9);
    }
}
