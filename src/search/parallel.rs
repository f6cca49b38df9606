//! Parallel IDA*: a shallow breadth first frontier is split into tasks, each searched depth
//! first by a worker until one of them finds a solution.

use super::{allowed_moves, push_children, push_children_with, root, Node};
use crate::error::{ConfigError, TableError};
use crate::moves::{Moves, CAPACITY};
use crate::phase::Phase;

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

/// How frontier tasks are distributed to lanes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Schedule {
    /// Lane `t` takes the `t`th contiguous block of tasks.
    #[default]
    Static,
    /// Task `i` goes to lane `i % n_lane`.
    RoundRobin,
    /// Tasks are handed out one at a time, most promising first, to whichever lane is free.
    Pull,
}

impl FromStr for Schedule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "static" | "simple" => Ok(Schedule::Static),
            "round_robin" | "linear" => Ok(Schedule::RoundRobin),
            "pull" | "best" => Ok(Schedule::Pull),
            _ => Err(ConfigError::UnknownSchedule(s.to_string())),
        }
    }
}

/// Parameters of a parallel search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelOptions {
    /// Number of lanes searching tasks
    pub n_lane: usize,
    /// Target number of frontier nodes
    pub frontier_size: usize,
    /// Distribution of tasks
    pub schedule: Schedule,
    /// Longest solution searched for
    pub max_moves: usize,
    /// Number of plies using symmetry pruning
    pub sym_n_moves: usize,
}

/// Expand `root` breadth first, one layer at a time, until the layer has at least
/// `frontier_size` nodes or reaches depth `bound`. Every node has depth `depth` in the result,
/// where `depth` is returned along with the nodes.
pub fn expand_frontier<P: Phase>(
    phase: &P,
    start: &P::Cube,
    sym_n_moves: usize,
    root: Node<P::State, P::Hint>,
    bound: usize,
    frontier_size: usize,
) -> (Vec<Node<P::State, P::Hint>>, usize) {
    let mut layer = vec![root];
    let mut depth = 0;
    while depth < bound && !layer.is_empty() && layer.len() < frontier_size {
        let mut next = Vec::new();
        for a in &layer {
            let mask = allowed_moves(phase, start, sym_n_moves, a);
            let first = next.len();
            push_children(phase, a, mask, bound, &mut next);
            next[first..].reverse();
        }
        layer = next;
        depth += 1;
    }
    (layer, depth)
}

/// Order tasks and split them between lanes. Lane `t` processes `tasks[split[t]..split[t + 1]]`.
/// With [`Schedule::Pull`] the split is only used by executors that can't share a cursor, as a
/// greedy balance of the estimated task sizes.
pub(crate) fn schedule_tasks(
    schedule: Schedule,
    slack: &[usize],
    n_lane: usize,
) -> (Vec<usize>, Vec<usize>) {
    let n = slack.len();
    match schedule {
        Schedule::Static => ((0..n).collect(), (0..=n_lane).map(|t| t * n / n_lane).collect()),
        Schedule::RoundRobin => {
            let tasks = (0..n_lane)
                .flat_map(|t| (t..n).step_by(n_lane))
                .collect();
            let mut sp = vec![0];
            for t in 0..n_lane {
                let len = if t < n { (n - t).div_ceil(n_lane) } else { 0 };
                sp.push(sp[t] + len);
            }
            (tasks, sp)
        }
        Schedule::Pull => {
            let mut order: Vec<usize> = (0..n).collect();
            // larger slack, larger subtree
            order.sort_by_key(|&i| std::cmp::Reverse(slack[i]));
            let mut load = vec![0usize; n_lane];
            let mut lanes = vec![Vec::new(); n_lane];
            for i in order {
                let t = (0..n_lane).min_by_key(|&t| load[t]).unwrap_or(0);
                load[t] += 1usize << (2 * slack[i]).min(60);
                lanes[t].push(i);
            }
            let mut sp = vec![0];
            for lane in &lanes {
                sp.push(sp[sp.len() - 1] + lane.len());
            }
            (lanes.concat(), sp)
        }
    }
}

/// Search the subtree of `a` for a solution of exactly `bound` moves, stopping early when
/// `stop` is raised. Raises `stop` on success.
pub(crate) fn dfs_one<P: Phase>(
    phase: &P,
    start: &P::Cube,
    sym_n_moves: usize,
    a: Node<P::State, P::Hint>,
    bound: usize,
    stop: &AtomicBool,
    count: &mut u64,
) -> Option<Moves> {
    let distance = |s: &P::State, h: &P::Hint| phase.distance_hint(s, h);
    dfs_one_with(phase, start, sym_n_moves, a, bound, &distance, stop, count)
}

/// Same as [`dfs_one`], bounding distances with `distance`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn dfs_one_with<P: Phase>(
    phase: &P,
    start: &P::Cube,
    sym_n_moves: usize,
    a: Node<P::State, P::Hint>,
    bound: usize,
    distance: &impl Fn(&P::State, &P::Hint) -> (usize, P::Hint),
    stop: &AtomicBool,
    count: &mut u64,
) -> Option<Moves> {
    let mut stack = Vec::with_capacity(phase.base().len() * CAPACITY);
    stack.push(a);
    while !stop.load(Ordering::Relaxed) {
        let Some(b) = stack.pop() else {
            break;
        };
        *count += 1;
        if b.moves.len() == bound {
            if phase.is_start(&b.state) {
                stop.store(true, Ordering::Relaxed);
                return Some(b.moves);
            }
            continue;
        }
        let mask = allowed_moves(phase, start, sym_n_moves, &b);
        push_children_with(phase, &b, mask, bound, distance, &mut stack);
    }
    None
}

/// The frontier of one bound, ready to be searched by lanes.
pub(crate) struct Bound<S, H> {
    pub nodes: Vec<Node<S, H>>,
    pub tasks: Vec<usize>,
    pub split: Vec<usize>,
}

/// Runs `search_bound` for every bound from the distance of `cube` up to `options.max_moves`,
/// until it finds a solution. Frontier nodes already at the bound are checked directly.
pub(crate) fn deepen<P: Phase, E>(
    phase: &P,
    cube: &P::Cube,
    options: &ParallelOptions,
    mut search_bound: impl FnMut(usize, Bound<P::State, P::Hint>) -> Result<(Option<Moves>, u64), E>,
) -> Result<Option<Moves>, E> {
    let begin = Instant::now();
    let max_moves = options.max_moves.min(CAPACITY);
    let (root, d) = root(phase, cube);
    let n_lane = options.n_lane.max(1);
    for bound in d.min(max_moves)..=max_moves {
        let layer_begin = Instant::now();
        let (nodes, depth) = expand_frontier(
            phase,
            cube,
            options.sym_n_moves,
            root,
            bound,
            options.frontier_size,
        );
        debug!("parallel_ida_star: bound={bound}, frontier={}, depth={depth}", nodes.len());

        let (found, count) = if depth == bound {
            let found = nodes.iter().find(|a| phase.is_start(&a.state)).map(|a| a.moves);
            (found, nodes.len() as u64)
        } else {
            let slack: Vec<usize> = nodes
                .iter()
                .map(|a| {
                    let d = phase.distance_hint(&a.state, &a.hint).0;
                    bound - depth - d.min(bound - depth)
                })
                .collect();
            let (tasks, split) = schedule_tasks(options.schedule, &slack, n_lane);
            search_bound(bound, Bound { nodes, tasks, split })?
        };

        let what = if found.is_some() { "found" } else { "complete" };
        info!(
            "parallel_ida_star: {what}, n_moves={bound}, count={count}, layer_time={:.3}s, total_time={:.3}s",
            layer_begin.elapsed().as_secs_f64(),
            begin.elapsed().as_secs_f64()
        );
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Search for an optimal solution of `cube` with `options.n_lane` worker threads. Returns `None`
/// when there's no solution of at most `options.max_moves` moves.
pub fn search_threaded<P: Phase>(
    phase: &P,
    cube: &P::Cube,
    options: &ParallelOptions,
) -> Result<Option<Moves>, TableError> {
    let n_lane = options.n_lane.max(1);
    let pool = ThreadPoolBuilder::new().num_threads(n_lane).build()?;
    deepen(phase, cube, options, |bound, b| {
        let stop = AtomicBool::new(false);
        let cursor = AtomicUsize::new(0);
        let results: Vec<(Option<Moves>, u64)> = pool.install(|| {
            (0..n_lane)
                .into_par_iter()
                .map(|t| {
                    let mut count = 0;
                    let mut next = {
                        let mut i = b.split[t];
                        let end = b.split[t + 1];
                        let (stop, cursor, tasks) = (&stop, &cursor, &b.tasks);
                        move || {
                            if stop.load(Ordering::Relaxed) {
                                return None;
                            }
                            if options.schedule == Schedule::Pull {
                                tasks.get(cursor.fetch_add(1, Ordering::Relaxed)).copied()
                            } else if i < end {
                                i += 1;
                                Some(tasks[i - 1])
                            } else {
                                None
                            }
                        }
                    };
                    while let Some(j) = next() {
                        let found = dfs_one(
                            phase,
                            cube,
                            options.sym_n_moves,
                            b.nodes[j],
                            bound,
                            &stop,
                            &mut count,
                        );
                        if found.is_some() {
                            return (found, count);
                        }
                    }
                    (None, count)
                })
                .collect()
        });
        let count = results.iter().map(|r| r.1).sum();
        Ok((results.into_iter().find_map(|r| r.0), count))
    })
}
