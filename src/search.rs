//! Search strategies over the state graph produced by `moves::Engine`.
//!
//! Two drivers share the same engine contract:
//!   - `dfs`: exhaustive depth-first search with a run-wide seen-set,
//!   - `a_star`: best-first search on `g + heuristic`, with a depth cutoff
//!     and a capped, randomly sampled fan-out.
//!
//! `solve` dispatches on `SearchConfig::method`; the best-first driver is
//! wrapped in `solve_with_retries`, which reseeds after a failed attempt.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use clap::ValueEnum;
use fxhash::FxHashSet;
use log::{Level, debug, info, log_enabled};

use crate::card::{Card, MAX_RANK, Suit};
use crate::display::render_tableau;
use crate::game::{GameState, StateKey, TerminationReason};
use crate::moves::{Engine, Move, Successor, Successors};
use crate::stats::SearchStats;
use crate::tableau::Tableau;

/// Rough length of a full solution, used to pad the heuristic so that it
/// shrinks with every card or color group removed.
pub const ASSUMED_SOLUTION_LENGTH: u32 = 29;

/// Which search driver to run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Method {
    #[default]
    Dfs,
    #[value(name = "a_star")]
    AStar,
}

/// Knobs for a search run.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub method: Method,
    /// Best-first search gives up once the cheapest entry is this deep.
    pub max_depth: u32,
    pub seed: u64,
    /// How many seeds best-first search tries before giving up.
    pub attempts: u32,
    /// Hard cap on expanded nodes, for either driver.
    pub max_nodes: Option<u64>,
    /// Successors kept per expansion in best-first search.
    pub fan_out: usize,
    /// Dump every expanded board at debug level.
    pub verbose: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            method: Method::Dfs,
            max_depth: 200,
            seed: 0,
            attempts: 5,
            max_nodes: None,
            fan_out: 3,
            verbose: false,
        }
    }
}

/// Result of a search run.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub termination: TerminationReason,
    /// The goal state on a win.
    pub final_state: Option<GameState>,
    pub stats: SearchStats,
    /// Seed of the attempt that produced this outcome.
    pub seed: u64,
}

impl SearchOutcome {
    fn finish(
        termination: TerminationReason,
        final_state: Option<GameState>,
        mut stats: SearchStats,
        engine: &Engine,
        cache_before: (u64, u64),
        seed: u64,
    ) -> Self {
        let cache = engine.cache();
        stats.cache_hits = cache.hits() - cache_before.0;
        stats.cache_misses = cache.misses() - cache_before.1;
        stats.cached_states = cache.len();
        SearchOutcome {
            termination,
            final_state,
            stats,
            seed,
        }
    }

    pub fn is_win(&self) -> bool {
        self.termination == TerminationReason::Win
    }

    /// Moves from the initial deal to the goal, forced moves included.
    pub fn solution(&self) -> Option<&[Move]> {
        self.final_state.as_ref().map(GameState::solution)
    }
}

fn log_expansion(state: &GameState, label: &str) {
    if log_enabled!(Level::Debug) {
        debug!(
            "{label}: {} move(s) so far\n{}",
            state.move_count(),
            render_tableau(state.tableau())
        );
    }
}

/// Exhaustive depth-first search.
///
/// Identities are marked as seen when generated, not when expanded, so no
/// layout is ever pushed twice. Important successors are pushed last and
/// therefore expanded first.
pub fn dfs(engine: &mut Engine, start: &GameState, config: &SearchConfig) -> SearchOutcome {
    let cache_before = (engine.cache().hits(), engine.cache().misses());
    let mut stats = SearchStats::default();
    let mut seen: FxHashSet<StateKey> = FxHashSet::default();
    seen.insert(start.key().clone());
    let mut stack = vec![start.clone()];

    while let Some(state) = stack.pop() {
        if state.is_goal() {
            return SearchOutcome::finish(TerminationReason::Win, Some(state), stats, engine, cache_before, config.seed);
        }
        if config.max_nodes.is_some_and(|limit| stats.nodes_expanded >= limit) {
            return SearchOutcome::finish(
                TerminationReason::MaxNodesReached,
                None,
                stats,
                engine,
                cache_before,
                config.seed,
            );
        }

        stats.record_expansion(state.move_count());
        if config.verbose {
            log_expansion(&state, "dfs");
        }

        let successors = engine.get_successors(&state);
        for succ in successors.other.iter().rev().chain(successors.important.iter().rev()) {
            stats.states_generated += 1;
            if seen.insert(succ.state.key().clone()) {
                stack.push(succ.state.clone());
            } else {
                stats.duplicates_pruned += 1;
            }
        }
        stats.record_frontier(stack.len());
    }

    SearchOutcome::finish(TerminationReason::LossNoMoreMoves, None, stats, engine, cache_before, config.seed)
}

/// Estimated number of moves left.
///
/// Padding (`ASSUMED_SOLUTION_LENGTH` minus cards scored and colors
/// collected) plus how many cards cover the next card of the suit that is
/// furthest behind. A card in the buffer is not covered.
pub fn heuristic(tab: &Tableau) -> u32 {
    let scored: u32 = tab.foundations.iter().map(|&f| u32::from(f)).sum();
    let collected = tab.collected.iter().filter(|&&c| c).count() as u32;
    let padding = ASSUMED_SOLUTION_LENGTH.saturating_sub(scored + collected);

    let behind = Suit::ALL
        .into_iter()
        .min_by_key(|suit| tab.foundations[suit.index()]);
    let dig = match behind {
        Some(suit) if tab.foundations[suit.index()] < MAX_RANK => {
            let next = Card::numbered(suit, tab.foundations[suit.index()] + 1);
            tab.dig_depth(next).unwrap_or(0) as u32
        }
        _ => 0,
    };

    padding + dig
}

/// Frontier entry for best-first search. The heap pops the lowest `f`,
/// then the deepest `g`, then the oldest entry.
#[derive(Debug)]
struct Frontier {
    f: u32,
    g: u32,
    order: u64,
    state: GameState,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| self.g.cmp(&other.g))
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Successors kept for one best-first expansion.
///
/// More than `fan_out` important successors: keep only those. Otherwise
/// keep all of them and top up with randomly sampled relocations.
fn select_fan_out<'a>(successors: &'a Successors, fan_out: usize, rng: &mut fastrand::Rng) -> Vec<&'a Successor> {
    if successors.important.len() > fan_out {
        return successors.important.iter().collect();
    }
    let wanted = fan_out - successors.important.len();
    let mut picks: Vec<usize> = (0..successors.other.len()).collect();
    rng.shuffle(&mut picks);
    picks.truncate(wanted);

    successors
        .important
        .iter()
        .chain(picks.into_iter().map(|i| &successors.other[i]))
        .collect()
}

/// Best-first search on `f = g + heuristic`, where `g` counts search
/// steps (forced cascade moves are free).
///
/// Gives up with `MaxDepthReached` as soon as the cheapest entry is at
/// `max_depth` without being the goal.
pub fn a_star(engine: &mut Engine, start: &GameState, config: &SearchConfig, seed: u64) -> SearchOutcome {
    let cache_before = (engine.cache().hits(), engine.cache().misses());
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut stats = SearchStats::default();
    let mut seen: FxHashSet<StateKey> = FxHashSet::default();
    seen.insert(start.key().clone());

    let mut order = 0u64;
    let mut heap = BinaryHeap::new();
    heap.push(Frontier {
        f: heuristic(start.tableau()),
        g: 0,
        order,
        state: start.clone(),
    });

    while let Some(Frontier { f, g, state, .. }) = heap.pop() {
        if state.is_goal() {
            return SearchOutcome::finish(TerminationReason::Win, Some(state), stats, engine, cache_before, seed);
        }
        if g >= config.max_depth {
            debug!("cheapest entry is at depth {g} (f = {f}), giving up");
            return SearchOutcome::finish(
                TerminationReason::MaxDepthReached,
                None,
                stats,
                engine,
                cache_before,
                seed,
            );
        }
        if config.max_nodes.is_some_and(|limit| stats.nodes_expanded >= limit) {
            return SearchOutcome::finish(TerminationReason::MaxNodesReached, None, stats, engine, cache_before, seed);
        }

        stats.record_expansion(g as usize);
        if config.verbose {
            log_expansion(&state, &format!("a_star f = {f}, g = {g}"));
        }

        let successors = engine.get_successors(&state);
        for succ in select_fan_out(&successors, config.fan_out, &mut rng) {
            stats.states_generated += 1;
            if !seen.insert(succ.state.key().clone()) {
                stats.duplicates_pruned += 1;
                continue;
            }
            order += 1;
            let g = g + 1;
            heap.push(Frontier {
                f: g + heuristic(succ.state.tableau()),
                g,
                order,
                state: succ.state.clone(),
            });
        }
        stats.record_frontier(heap.len());
    }

    SearchOutcome::finish(TerminationReason::LossNoMoreMoves, None, stats, engine, cache_before, seed)
}

/// Best-first search, retried with `seed + 1`, `seed + 2`, ... until a win
/// or `config.attempts` runs. The returned stats cover every attempt.
pub fn solve_with_retries(engine: &mut Engine, start: &GameState, config: &SearchConfig) -> SearchOutcome {
    let attempts = config.attempts.max(1);
    let mut outcome = a_star(engine, start, config, config.seed);
    let mut total = outcome.stats;

    for attempt in 1..attempts {
        if outcome.is_win() {
            break;
        }
        info!(
            "attempt {}/{} with seed {} ended with {:?}, retrying",
            attempt, attempts, outcome.seed, outcome.termination
        );
        let seed = config.seed.wrapping_add(u64::from(attempt));
        outcome = a_star(engine, start, config, seed);
        total.merge(&outcome.stats);
    }

    outcome.stats = total;
    outcome
}

/// Run the driver selected by `config.method`.
pub fn solve(engine: &mut Engine, start: &GameState, config: &SearchConfig) -> SearchOutcome {
    info!("searching with {:?} (seed {})", config.method, config.seed);
    let outcome = match config.method {
        Method::Dfs => dfs(engine, start, config),
        Method::AStar => solve_with_retries(engine, start, config),
    };
    info!("search finished: {:?}; {}", outcome.termination, outcome.stats);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical_deals;

    fn start(tab: Tableau) -> (Engine, GameState) {
        let engine = Engine::new();
        let state = engine.initial_state(tab).unwrap();
        (engine, state)
    }

    #[test]
    fn goal_ignores_what_is_left_on_the_board() {
        let mut tab = canonical_deals::sorted_deal();
        tab.foundations = [MAX_RANK; 3];
        assert!(GameState::new(tab.clone()).is_goal());

        for suit in 0..3 {
            let mut short = tab.clone();
            short.foundations[suit] = MAX_RANK - 1;
            assert!(!GameState::new(short).is_goal());
        }
    }

    #[test]
    fn dfs_finds_the_single_relocation() {
        let (mut engine, state) = start(canonical_deals::nearly_solved_deal());
        let outcome = dfs(&mut engine, &state, &SearchConfig::default());

        assert!(outcome.is_win());
        let lines: Vec<String> = outcome.solution().unwrap().iter().map(Move::to_string).collect();
        assert_eq!(
            lines,
            [
                "r8 at column 1 to column 3",
                "r7 at column 1 to goal",
                "r8 at column 3 to goal",
                "r9 at column 2 to goal",
            ]
        );
        assert_eq!(outcome.stats.nodes_expanded, 1);
    }

    #[test]
    fn stats_count_memo_lookups_per_run() {
        let (mut engine, state) = start(canonical_deals::nearly_solved_deal());
        let first = dfs(&mut engine, &state, &SearchConfig::default()).stats;
        assert_eq!((first.cache_hits, first.cache_misses, first.cached_states), (0, 1, 1));

        let second = dfs(&mut engine, &state, &SearchConfig::default()).stats;
        assert_eq!((second.cache_hits, second.cache_misses, second.cached_states), (1, 0, 1));
    }

    #[test]
    fn dfs_reports_exhaustion() {
        let (mut engine, state) = start(canonical_deals::deadlocked_deal());
        let outcome = dfs(&mut engine, &state, &SearchConfig::default());
        assert_eq!(outcome.termination, TerminationReason::LossNoMoreMoves);
        assert!(outcome.solution().is_none());
        assert_eq!(outcome.stats.nodes_expanded, 1);
    }

    #[test]
    fn dfs_node_cap() {
        let (mut engine, state) = start(canonical_deals::sorted_deal());
        let config = SearchConfig {
            max_nodes: Some(1),
            ..Default::default()
        };
        let outcome = dfs(&mut engine, &state, &config);
        assert_eq!(outcome.termination, TerminationReason::MaxNodesReached);
        assert_eq!(outcome.stats.nodes_expanded, 1);
    }

    #[test]
    fn zero_depth_gives_up_without_expanding() {
        let (mut engine, state) = start(canonical_deals::nearly_solved_deal());
        let config = SearchConfig {
            method: Method::AStar,
            max_depth: 0,
            ..Default::default()
        };
        let outcome = a_star(&mut engine, &state, &config, 0);
        assert_eq!(outcome.termination, TerminationReason::MaxDepthReached);
        assert_eq!(outcome.stats.nodes_expanded, 0);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn a_star_solves_easy_deal() {
        let (mut engine, state) = start(canonical_deals::easy_win_deal());
        let config = SearchConfig {
            method: Method::AStar,
            ..Default::default()
        };
        let outcome = solve(&mut engine, &state, &config);
        assert!(outcome.is_win());
        let collects = outcome
            .solution()
            .unwrap()
            .iter()
            .filter(|mv| matches!(mv, Move::Collect { .. }))
            .count();
        assert_eq!(collects, 4, "three colors and the flower");
    }

    #[test]
    fn retries_advance_the_seed() {
        let (mut engine, state) = start(canonical_deals::deadlocked_deal());
        let config = SearchConfig {
            method: Method::AStar,
            seed: 41,
            attempts: 3,
            ..Default::default()
        };
        let outcome = solve_with_retries(&mut engine, &state, &config);
        assert_eq!(outcome.termination, TerminationReason::LossNoMoreMoves);
        assert_eq!(outcome.seed, 43);
        assert_eq!(outcome.stats.nodes_expanded, 3);
    }

    #[test]
    fn heuristic_counts_cover_and_progress() {
        let tab = canonical_deals::nearly_solved_deal();
        // 6 + 9 + 9 scored, 3 colors collected: padding is 2; r7 under r8.
        assert_eq!(heuristic(&tab), 2 + 1);

        let mut buffered = tab.clone();
        buffered.columns[0].pop();
        buffered.buffer_capacity = 1;
        buffered.buffer[0] = Some(Card::numbered(Suit::Red, 8));
        assert_eq!(heuristic(&buffered), 2);

        let mut scored = tab.clone();
        scored.columns[0] = vec![Card::numbered(Suit::Red, 8)];
        scored.foundations[0] = 7;
        assert_eq!(heuristic(&scored), 1);
    }

    #[test]
    fn frontier_pops_lowest_f_then_deepest() {
        let state = GameState::new(Tableau::new_empty());
        let entry = |f, g, order| Frontier {
            f,
            g,
            order,
            state: state.clone(),
        };
        let mut heap = BinaryHeap::from(vec![entry(5, 1, 0), entry(3, 1, 1), entry(3, 2, 2), entry(3, 2, 3)]);
        let popped: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|e| e.order)).collect();
        assert_eq!(popped, vec![2, 3, 1, 0]);
    }
}
