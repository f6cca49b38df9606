//! Pruning tables storing the distance of every state to the start state modulo 3.
//!
//! Entries take two bits, with 3 marking states not reached yet. The table is built by a
//! layered breadth first search which labels states concurrently through compare-and-set, so
//! the order in which workers process their ranges never changes the result. Since the
//! distances of neighbouring states differ by at most one, the distance modulo 3 of a neighbour
//! together with the exact distance of the current state determines the exact distance of the
//! neighbour, see [`PruningTable::next_distance`].

use crate::error::TableError;
use crate::table::{split, Persist, TwoBitArray};

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use std::io::{self, Read, Write};
use std::time::Instant;

/// Label of states whose distance isn't known yet.
pub const UNKNOWN: u8 = 3;

/// A state space whose states are numbered densely, as consumed by the table builder.
pub trait RankedSpace: Sync {
    /// A state of the space.
    type State: Copy + Send + Sync;

    /// Number of states, ranks are in `0..n_states()`.
    fn n_states(&self) -> usize;

    /// Number of moves, the length of the output of `adjacent`.
    fn n_moves(&self) -> usize;

    /// The start (solved) state.
    fn start(&self) -> Self::State;

    /// The rank of a state.
    fn rank(&self, state: &Self::State) -> usize;

    /// A state with the given rank.
    fn unrank(&self, index: usize) -> Self::State;

    /// The result of applying move `m` to `state`.
    fn step(&self, state: &Self::State, m: usize) -> Self::State;

    /// The result of applying each move to `state`. `out` has length `n_moves()`.
    fn adjacent(&self, state: &Self::State, out: &mut [Self::State]) {
        for (m, o) in out.iter_mut().enumerate() {
            *o = self.step(state, m);
        }
    }

    /// The ranks of every state equivalent to `state` (which has rank `index`), sorted and
    /// without duplicates. Equivalent states always share their distance.
    fn equivalents(&self, _state: &Self::State, index: usize, out: &mut Vec<usize>) {
        out.clear();
        out.push(index);
    }

    /// Whether `state` is the start state.
    fn is_start(&self, state: &Self::State) -> bool {
        self.rank(state) == self.rank(&self.start())
    }
}

/// When the builder expands a layer forward (from the last layer to unknown neighbours) and when
/// it scans backward (from unknown states to neighbours in the last layer). A forward scan visits
/// every state carrying the label of the last layer, which includes earlier layers with the same
/// residue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SwitchRule {
    /// Forward while the states labelled like the last layer are no more than the unknown states
    #[default]
    Balanced,
    /// Always forward
    Forward,
    /// Always backward
    Backward,
}

impl SwitchRule {
    fn forward(self, with_last_label: usize, remaining: usize) -> bool {
        match self {
            SwitchRule::Balanced => with_last_label <= remaining,
            SwitchRule::Forward => true,
            SwitchRule::Backward => false,
        }
    }
}

/// Parameters of a table build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BfsOptions {
    /// Number of worker threads
    pub n_thread: usize,
    /// Direction of each layer
    pub switch: SwitchRule,
}

impl BfsOptions {
    /// Build with `n_thread` workers and the default switch rule.
    pub fn new(n_thread: usize) -> Self {
        BfsOptions {
            n_thread,
            switch: SwitchRule::default(),
        }
    }
}

/// Whether any entry of word `w` equals `label`.
fn has_label(w: u64, label: u8) -> bool {
    let x = w ^ !crate::table::repeat_word(label);
    (x >> 1) & x & 0x5555_5555_5555_5555 != 0
}

/// Distance of a state labelled `label`, given `cur`, the exact distance of one of its
/// neighbours.
pub fn next_distance(label: u8, cur: usize) -> usize {
    match (label as usize + 3 - cur % 3) % 3 {
        0 => cur,
        1 => cur + 1,
        _ => cur - 1,
    }
}

/// Distances modulo 3 of every state of a space.
#[derive(Debug, PartialEq)]
pub struct PruningTable {
    labels: TwoBitArray,
    layers: Vec<usize>,
}

impl PruningTable {
    /// Wrap labels produced elsewhere.
    pub fn from_labels(labels: TwoBitArray) -> Self {
        PruningTable {
            labels,
            layers: Vec::new(),
        }
    }

    /// Build the table of `space` by breadth first search from its start state.
    pub fn build<S: RankedSpace>(space: &S, options: BfsOptions) -> Result<Self, TableError> {
        let n = space.n_states();
        let n_thread = options.n_thread.max(1);
        let pool = ThreadPoolBuilder::new().num_threads(n_thread).build()?;
        let labels = TwoBitArray::new(n, UNKNOWN);
        let sp = split(n, n_thread);
        info!("bfs: n_state={n}, n_thread={n_thread}");

        let start = space.start();
        let mut alt = Vec::new();
        space.equivalents(&start, space.rank(&start), &mut alt);
        let count_start = set_batch(&labels, &alt, 0);

        let mut layers = vec![count_start];
        let mut by_residue = [count_start, 0, 0];
        let mut total = count_start;
        let mut depth = 1;
        let begin = Instant::now();
        while total != n {
            let layer_begin = Instant::now();
            let prev = ((depth - 1) % 3) as u8;
            let cur = (depth % 3) as u8;
            let forward = options.switch.forward(by_residue[prev as usize], n - total);
            debug!("bfs: depth={depth}, forward={forward}");

            let labels = &labels;
            let sp = &sp;
            let (count_distinct, count) = pool.install(|| {
                (0..n_thread)
                    .into_par_iter()
                    .map(|t| {
                        if forward {
                            expand_forward(space, labels, sp[t], sp[t + 1], prev, cur)
                        } else {
                            expand_backward(space, labels, sp[t], sp[t + 1], prev, cur)
                        }
                    })
                    .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
            });

            info!(
                "bfs: depth={depth}, count_distinct={count_distinct}, count={count}, time={:.3}s",
                layer_begin.elapsed().as_secs_f64()
            );
            if count == 0 {
                return Err(TableError::Disconnected {
                    labeled: total,
                    total: n,
                });
            }
            layers.push(count);
            by_residue[cur as usize] += count;
            total += count;
            depth += 1;
        }
        info!(
            "bfs: complete, depth={}, time={:.3}s",
            depth - 1,
            begin.elapsed().as_secs_f64()
        );

        Ok(PruningTable { labels, layers })
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table has no states.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The label of state `index`.
    pub fn get(&self, index: usize) -> u8 {
        self.labels.get(index)
    }

    /// The labels.
    pub fn labels(&self) -> &TwoBitArray {
        &self.labels
    }

    /// Number of states at each depth, as found when building. Empty for tables loaded from a
    /// cache.
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    /// Update a distance given the next state (fast). `cur` is the exact distance of a neighbour
    /// of the state at `index`.
    pub fn next_distance(&self, index: usize, cur: usize) -> usize {
        next_distance(self.get(index), cur)
    }

    /// Compute the exact distance of a state by walking towards the start (slow).
    pub fn exact_distance<S: RankedSpace>(&self, space: &S, state: &S::State) -> usize {
        let mut a = *state;
        let mut buf = vec![a; space.n_moves()];
        let mut d = 0;
        while !space.is_start(&a) {
            // label - 1 but underflow
            let goal = (self.get(space.rank(&a)) + 2) % 3;
            space.adjacent(&a, &mut buf);
            a = *buf
                .iter()
                .find(|b| self.get(space.rank(b)) == goal)
                .expect("pruning table has no neighbour one step closer to the start");
            d += 1;
        }
        d
    }
}

impl Persist for PruningTable {
    fn persisted_len(&self) -> usize {
        self.labels.len()
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        self.labels.write_to(w)
    }

    fn read_from(r: &mut dyn Read) -> io::Result<Self> {
        Ok(PruningTable::from_labels(TwoBitArray::read_from(r)?))
    }
}

/// Label a batch of equivalent states. The batch belongs to whoever labels its first entry, the
/// others then can't have been labelled by anyone else. Returns the number of states labelled.
fn set_batch(labels: &TwoBitArray, batch: &[usize], label: u8) -> usize {
    if !labels.compare_and_set(batch[0], UNKNOWN, label) {
        return 0;
    }
    for &k in &batch[1..] {
        assert!(
            labels.compare_and_set(k, UNKNOWN, label),
            "equivalent state {k} labelled separately"
        );
    }
    batch.len()
}

fn expand_forward<S: RankedSpace>(
    space: &S,
    labels: &TwoBitArray,
    lo: usize,
    hi: usize,
    prev: u8,
    cur: u8,
) -> (usize, usize) {
    let mut count_distinct = 0;
    let mut count = 0;
    let mut alt = Vec::new();
    let mut buf = vec![space.start(); space.n_moves()];
    let mut i = lo;
    while i < hi {
        let end = ((i / TwoBitArray::PER_WORD + 1) * TwoBitArray::PER_WORD).min(hi);
        if has_label(labels.word(i / TwoBitArray::PER_WORD), prev) {
            for j in i..end {
                if labels.get(j) != prev {
                    continue;
                }
                space.adjacent(&space.unrank(j), &mut buf);
                for b in &buf {
                    let k = space.rank(b);
                    if labels.get(k) == UNKNOWN {
                        space.equivalents(b, k, &mut alt);
                        let c = set_batch(labels, &alt, cur);
                        if c > 0 {
                            count_distinct += 1;
                            count += c;
                        }
                    }
                }
            }
        }
        i = end;
    }
    (count_distinct, count)
}

fn expand_backward<S: RankedSpace>(
    space: &S,
    labels: &TwoBitArray,
    lo: usize,
    hi: usize,
    prev: u8,
    cur: u8,
) -> (usize, usize) {
    let mut count_distinct = 0;
    let mut count = 0;
    let mut alt = Vec::new();
    let mut buf = vec![space.start(); space.n_moves()];
    let mut i = lo;
    while i < hi {
        let end = ((i / TwoBitArray::PER_WORD + 1) * TwoBitArray::PER_WORD).min(hi);
        if has_label(labels.word(i / TwoBitArray::PER_WORD), UNKNOWN) {
            for j in i..end {
                if labels.get(j) != UNKNOWN {
                    continue;
                }
                let a = space.unrank(j);
                space.adjacent(&a, &mut buf);
                if buf.iter().any(|b| labels.get(space.rank(b)) == prev) {
                    space.equivalents(&a, j, &mut alt);
                    let c = set_batch(labels, &alt, cur);
                    if c > 0 {
                        count_distinct += 1;
                        count += c;
                    }
                }
            }
        }
        i = end;
    }
    (count_distinct, count)
}
