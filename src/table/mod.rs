//! Compact tables shared between threads.

pub(crate) mod cache;

pub use cache::{Persist, TableCache};

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// An array of 2-bit values packed 32 to a 64-bit word, which can be updated concurrently.
///
/// Entry `i` lives in word `i / 32` at bit offset `i % 32 * 2`.
pub struct TwoBitArray {
    len: usize,
    words: Box<[AtomicU64]>,
}

/// Word with every entry set to `value`.
pub fn repeat_word(value: u8) -> u64 {
    (value as u64 & 3) * 0x5555_5555_5555_5555
}

impl TwoBitArray {
    /// Number of entries per word.
    pub const PER_WORD: usize = 32;

    /// An array of `len` entries, all set to `value`.
    pub fn new(len: usize, value: u8) -> Self {
        let w = repeat_word(value);
        let words = (0..len.div_ceil(Self::PER_WORD))
            .map(|_| AtomicU64::new(w))
            .collect();
        TwoBitArray { len, words }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of words.
    pub fn n_words(&self) -> usize {
        self.words.len()
    }

    /// Read entry `i`.
    pub fn get(&self, i: usize) -> u8 {
        let w = self.words[i / Self::PER_WORD].load(Ordering::Relaxed);
        ((w >> (i % Self::PER_WORD * 2)) & 3) as u8
    }

    /// Set entry `i` to `new` if it currently holds `old`. Returns whether the entry was set.
    pub fn compare_and_set(&self, i: usize, old: u8, new: u8) -> bool {
        let word = &self.words[i / Self::PER_WORD];
        let shift = i % Self::PER_WORD * 2;
        let mut cur = word.load(Ordering::Relaxed);
        loop {
            if (cur >> shift) & 3 != old as u64 {
                return false;
            }
            let next = (cur & !(3 << shift)) | ((new as u64 & 3) << shift);
            match word.compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(x) => cur = x,
            }
        }
    }

    /// Set every entry to `value`.
    pub fn fill(&mut self, value: u8) {
        let w = repeat_word(value);
        for word in self.words.iter_mut() {
            *word.get_mut() = w;
        }
    }

    /// The raw word `w`, holding entries `32 * w .. 32 * w + 32`.
    pub fn word(&self, w: usize) -> u64 {
        self.words[w].load(Ordering::Relaxed)
    }

    /// Number of entries holding `value`.
    pub fn count(&self, value: u8) -> usize {
        (0..self.len).filter(|&i| self.get(i) == value).count()
    }

    /// The byte image written by [`Persist::write_to`]: the length, then every word, little
    /// endian.
    pub fn to_image(&self) -> Vec<u8> {
        let mut image = Vec::with_capacity(8 + 8 * self.n_words());
        image.extend_from_slice(&(self.len as u64).to_le_bytes());
        for w in 0..self.n_words() {
            image.extend_from_slice(&self.word(w).to_le_bytes());
        }
        image
    }
}

/// Read only access to the byte image of a [`TwoBitArray`], wherever the bytes live.
#[derive(Clone, Copy, Debug)]
pub struct TwoBitView<'a> {
    len: usize,
    words: &'a [u8],
}

impl<'a> TwoBitView<'a> {
    /// View an image produced by [`TwoBitArray::to_image`].
    pub fn new(image: &'a [u8]) -> Self {
        assert!(image.len() >= 8, "two bit image without a header");
        let mut b = [0; 8];
        b.copy_from_slice(&image[..8]);
        TwoBitView {
            len: u64::from_le_bytes(b) as usize,
            words: &image[8..],
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read entry `i`.
    pub fn get(&self, i: usize) -> u8 {
        let at = i / TwoBitArray::PER_WORD * 8;
        let mut b = [0; 8];
        b.copy_from_slice(&self.words[at..at + 8]);
        ((u64::from_le_bytes(b) >> (i % TwoBitArray::PER_WORD * 2)) & 3) as u8
    }
}

impl Persist for TwoBitArray {
    fn persisted_len(&self) -> usize {
        self.len
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(&self.to_image())
    }

    fn read_from(r: &mut dyn Read) -> io::Result<Self> {
        let len = cache::read_u64(r)? as usize;
        let words = cache::read_words(r, len.div_ceil(Self::PER_WORD))?;
        Ok(TwoBitArray {
            len,
            words: words.into_iter().map(AtomicU64::new).collect(),
        })
    }
}

impl PartialEq for TwoBitArray {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && (0..self.n_words()).all(|w| self.word(w) == other.word(w))
    }
}

impl std::fmt::Debug for TwoBitArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwoBitArray")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Split `len` entries into `n` contiguous ranges that start on word boundaries, so that no two
/// ranges share a word. Range `t` is `split[t]..split[t + 1]`.
pub fn split(len: usize, n: usize) -> Vec<usize> {
    let words = len.div_ceil(TwoBitArray::PER_WORD);
    let div = words / n;
    let rem = words % n;
    let mut sp = vec![0; n + 1];
    for i in 0..n {
        let size = (div + usize::from(i < rem)) * TwoBitArray::PER_WORD;
        sp[i + 1] = (sp[i] + size).min(len);
    }
    sp
}
