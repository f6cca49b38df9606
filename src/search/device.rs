//! Searching on an accelerator: each lane runs the depth first routine of the threaded search
//! over its share of the frontier. The tables of the phase are copied to the device once. The
//! frontier of each bound is copied as move sequences before launching, and lanes rebuild their
//! nodes from the start. Lanes only read labels from the device copies of the tables.

use super::parallel::{deepen, dfs_one_with, ParallelOptions};
use super::{root, Node};
use crate::error::DeviceError;
use crate::moves::{Moves, CAPACITY};
use crate::phase::Phase;
use crate::table::TwoBitView;

use log::debug;
use rayon::prelude::*;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An accelerator with its own memory.
pub trait Device: Sync {
    /// A block of device memory.
    type Buffer: Send + Sync;

    /// Allocate `len` bytes.
    fn allocate(&self, len: usize) -> Result<Self::Buffer, DeviceError>;

    /// Release a buffer.
    fn free(&self, buffer: Self::Buffer);

    /// Set every byte of a buffer to zero.
    fn zero(&self, buffer: &mut Self::Buffer);

    /// Copy host memory to the device. The lengths must match.
    fn copy_to_device(&self, dst: &mut Self::Buffer, src: &[u8]) -> Result<(), DeviceError>;

    /// Copy device memory to the host. The lengths must match.
    fn copy_from_device(&self, dst: &mut [u8], src: &Self::Buffer) -> Result<(), DeviceError>;

    /// The contents of a buffer as seen by a kernel.
    fn view<'a>(&self, buffer: &'a Self::Buffer) -> &'a [u8];

    /// Run `kernel` once per lane and collect the lane results.
    fn launch<R: Send>(&self, n_lane: usize, kernel: impl Fn(usize) -> R + Sync + Send) -> Vec<R>;
}

/// A device backed by host memory, running lanes on the rayon thread pool.
#[derive(Debug)]
pub struct HostDevice {
    limit: usize,
    used: AtomicUsize,
}

impl HostDevice {
    /// A device without a memory limit.
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// A device holding at most `limit` bytes at once.
    pub fn with_limit(limit: usize) -> Self {
        HostDevice {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    /// Bytes currently allocated.
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for HostDevice {
    type Buffer = Vec<u8>;

    fn allocate(&self, len: usize) -> Result<Vec<u8>, DeviceError> {
        self.used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                used.checked_add(len).filter(|&u| u <= self.limit)
            })
            .map_err(|_| DeviceError::Allocation(len))?;
        Ok(vec![0; len])
    }

    fn free(&self, buffer: Vec<u8>) {
        self.used.fetch_sub(buffer.len(), Ordering::Relaxed);
    }

    fn zero(&self, buffer: &mut Vec<u8>) {
        buffer.fill(0);
    }

    fn copy_to_device(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<(), DeviceError> {
        if dst.len() != src.len() {
            return Err(DeviceError::SizeMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        dst.copy_from_slice(src);
        Ok(())
    }

    fn copy_from_device(&self, dst: &mut [u8], src: &Vec<u8>) -> Result<(), DeviceError> {
        if dst.len() != src.len() {
            return Err(DeviceError::SizeMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        dst.copy_from_slice(src);
        Ok(())
    }

    fn view<'a>(&self, buffer: &'a Vec<u8>) -> &'a [u8] {
        buffer
    }

    fn launch<R: Send>(&self, n_lane: usize, kernel: impl Fn(usize) -> R + Sync + Send) -> Vec<R> {
        (0..n_lane).into_par_iter().map(kernel).collect()
    }
}

/// A buffer which is released when dropped.
struct Owned<'d, D: Device> {
    device: &'d D,
    buffer: Option<D::Buffer>,
}

impl<'d, D: Device> Owned<'d, D> {
    fn upload(device: &'d D, bytes: &[u8]) -> Result<Self, DeviceError> {
        let mut buffer = device.allocate(bytes.len())?;
        if let Err(e) = device.copy_to_device(&mut buffer, bytes) {
            device.free(buffer);
            return Err(e);
        }
        Ok(Owned {
            device,
            buffer: Some(buffer),
        })
    }

    fn view(&self) -> &[u8] {
        match &self.buffer {
            Some(b) => self.device.view(b),
            None => &[],
        }
    }
}

impl<D: Device> Drop for Owned<'_, D> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.device.free(buffer);
        }
    }
}

fn words_to_bytes(words: &[usize]) -> Vec<u8> {
    words.iter().flat_map(|&w| (w as u64).to_le_bytes()).collect()
}

fn word_at(bytes: &[u8], i: usize) -> usize {
    let mut b = [0; 8];
    b.copy_from_slice(&bytes[8 * i..8 * i + 8]);
    u64::from_le_bytes(b) as usize
}

/// Bytes per move sequence: the length, then one byte per move.
const RECORD: usize = 1 + CAPACITY;

fn moves_to_bytes<S, H>(nodes: &[Node<S, H>]) -> Vec<u8> {
    let mut bytes = vec![0; nodes.len() * RECORD];
    for (a, r) in nodes.iter().zip(bytes.chunks_exact_mut(RECORD)) {
        let moves = a.moves.as_slice();
        r[0] = moves.len() as u8;
        r[1..=moves.len()].copy_from_slice(moves);
    }
    bytes
}

fn moves_at(bytes: &[u8], i: usize) -> Moves {
    let r = &bytes[i * RECORD..(i + 1) * RECORD];
    Moves::from_slice(&r[1..=r[0] as usize])
}

/// The node reached by applying `moves` to `root`.
fn replay<P: Phase>(
    phase: &P,
    root: Node<P::State, P::Hint>,
    moves: &Moves,
    distance: &impl Fn(&P::State, &P::Hint) -> (usize, P::Hint),
) -> Node<P::State, P::Hint> {
    moves.iter().fold(root, |a, m| {
        let state = phase.step(&a.state, m);
        let (_, hint) = distance(&state, &a.hint);
        Node {
            state,
            hint,
            moves: a.moves.push(m),
        }
    })
}

/// Copy the labels of every pruning table of `phase` to the device, checking the copies read
/// back identical.
fn upload_tables<'d, P: Phase, D: Device>(
    device: &'d D,
    phase: &P,
) -> Result<Vec<Owned<'d, D>>, DeviceError> {
    phase
        .tables()
        .into_iter()
        .map(|t| -> Result<Owned<'d, D>, DeviceError> {
            let image = t.labels().to_image();
            let owned = Owned::upload(device, &image)?;
            let mut back = vec![0; image.len()];
            if let Some(b) = &owned.buffer {
                device.copy_from_device(&mut back, b)?;
            }
            debug!("device: table of {} bytes uploaded", image.len());
            assert!(back == image, "table image changed on the device");
            Ok(owned)
        })
        .collect()
}

/// Search for an optimal solution of `cube` with `options.n_lane` device lanes.
pub fn search_device<P: Phase, D: Device>(
    device: &D,
    phase: &P,
    cube: &P::Cube,
    options: &ParallelOptions,
) -> Result<Option<Moves>, DeviceError> {
    let tables = upload_tables(device, phase)?;
    let n_lane = options.n_lane.max(1);
    let (start, _) = root(phase, cube);
    let found = deepen(phase, cube, options, |bound, b| {
        let nodes = Owned::upload(device, &moves_to_bytes(&b.nodes))?;
        let tasks = Owned::upload(device, &words_to_bytes(&b.tasks))?;
        let split = Owned::upload(device, &words_to_bytes(&b.split))?;
        let stop = AtomicBool::new(false);
        let results = device.launch(n_lane, |t| {
            let views: Vec<TwoBitView<'_>> =
                tables.iter().map(|o| TwoBitView::new(o.view())).collect();
            let distance = |s: &P::State, h: &P::Hint| phase.distance_hint_with(s, h, &views);
            let (nodes, tasks, split) = (nodes.view(), tasks.view(), split.view());
            let mut count = 0;
            for i in word_at(split, t)..word_at(split, t + 1) {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let a = replay(phase, start, &moves_at(nodes, word_at(tasks, i)), &distance);
                let found = dfs_one_with(
                    phase,
                    cube,
                    options.sym_n_moves,
                    a,
                    bound,
                    &distance,
                    &stop,
                    &mut count,
                );
                if found.is_some() {
                    return (found, count);
                }
            }
            (None, count)
        });
        let count = results.iter().map(|r| r.1).sum();
        Ok((results.into_iter().find_map(|r| r.0), count))
    });
    drop(tables);
    found
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_buffers_roundtrip() {
        let device = HostDevice::new();
        let data: Vec<u8> = (0..=255).collect();
        let mut buffer = device.allocate(data.len()).unwrap();
        device.copy_to_device(&mut buffer, &data).unwrap();
        let mut back = vec![0; data.len()];
        device.copy_from_device(&mut back, &buffer).unwrap();
        assert_eq!(back, data);
        device.zero(&mut buffer);
        device.copy_from_device(&mut back, &buffer).unwrap();
        assert!(back.iter().all(|&b| b == 0));
        device.free(buffer);
        assert_eq!(device.used(), 0);
    }

    #[test]
    fn size_mismatch() {
        let device = HostDevice::new();
        let mut buffer = device.allocate(4).unwrap();
        assert_eq!(
            device.copy_to_device(&mut buffer, &[1, 2, 3]),
            Err(DeviceError::SizeMismatch { src: 3, dst: 4 })
        );
    }

    #[test]
    fn allocation_limit() {
        let device = HostDevice::with_limit(100);
        let a = device.allocate(60).unwrap();
        assert_eq!(device.allocate(50), Err(DeviceError::Allocation(50)));
        device.free(a);
        assert!(device.allocate(100).is_ok());
    }

    #[test]
    fn owned_buffers_are_released() {
        let device = HostDevice::new();
        {
            let words = words_to_bytes(&[3, 1, 4]);
            let owned = Owned::upload(&device, &words).unwrap();
            assert_eq!(word_at(owned.view(), 2), 4);
            assert_eq!(device.used(), 24);
        }
        assert_eq!(device.used(), 0);
    }

    #[test]
    fn move_records_keep_sequences() {
        let nodes = [
            Node {
                state: (),
                hint: (),
                moves: Moves::new(),
            },
            Node {
                state: (),
                hint: (),
                moves: Moves::from_slice(&[4, 0, 17]),
            },
        ];
        let bytes = moves_to_bytes(&nodes);
        assert_eq!(bytes.len(), 2 * RECORD);
        assert_eq!(moves_at(&bytes, 0), Moves::new());
        assert_eq!(moves_at(&bytes, 1).as_slice(), [4, 0, 17]);
    }

    #[test]
    fn launch_runs_every_lane() {
        let device = HostDevice::new();
        assert_eq!(device.launch(5, |t| t * t), [0, 1, 4, 9, 16]);
    }
}
