//! A keyed load/compute/save cache for precomputed tables.

use crate::error::TableError;

use log::info;

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

/// A table that can be stored as a little endian byte image.
pub trait Persist: Sized {
    /// The main dimension of the table, checked against the expected size when loading.
    fn persisted_len(&self) -> usize;

    /// Write the byte image.
    fn write_to(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Read a byte image written by `write_to`.
    fn read_from(r: &mut dyn Read) -> io::Result<Self>;
}

pub(crate) fn read_u64(r: &mut dyn Read) -> io::Result<u64> {
    let mut buf = [0; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_words(r: &mut dyn Read, n: usize) -> io::Result<Vec<u64>> {
    let mut buf = vec![0; n * 8];
    r.read_exact(&mut buf)?;
    Ok(buf
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

macro_rules! persist_vec {
    ($($t:ty),*) => {$(
        impl Persist for Vec<$t> {
            fn persisted_len(&self) -> usize {
                self.len()
            }

            fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
                w.write_all(&(self.len() as u64).to_le_bytes())?;
                for x in self {
                    w.write_all(&x.to_le_bytes())?;
                }
                Ok(())
            }

            fn read_from(r: &mut dyn Read) -> io::Result<Self> {
                const SIZE: usize = std::mem::size_of::<$t>();
                let len = read_u64(r)? as usize;
                let mut buf = vec![0; len * SIZE];
                r.read_exact(&mut buf)?;
                Ok(buf
                    .chunks_exact(SIZE)
                    .map(|c| {
                        let mut b = [0; SIZE];
                        b.copy_from_slice(c);
                        <$t>::from_le_bytes(b)
                    })
                    .collect())
            }
        }
    )*};
}

persist_vec!(u8, u16, u32, u64);

/// Loads tables from a directory, computing and saving the ones that are missing. A cache
/// without a directory computes every table.
#[derive(Clone, Debug, Default)]
pub struct TableCache {
    dir: Option<PathBuf>,
}

impl TableCache {
    /// A cache storing one file per key under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TableCache {
            dir: Some(dir.into()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        TableCache { dir: None }
    }

    /// Return the table stored under `key`, or build it and store it. A stored table whose main
    /// dimension isn't `expected_len` is rejected.
    pub fn load_or_compute<T: Persist>(
        &self,
        key: &str,
        expected_len: usize,
        build: impl FnOnce() -> Result<T, TableError>,
    ) -> Result<T, TableError> {
        let io_err = |source| TableError::Io {
            key: key.to_string(),
            source,
        };

        let Some(dir) = &self.dir else {
            return compute(key, build);
        };
        let path = dir.join(key);

        if path.exists() {
            let mut r = BufReader::new(File::open(&path).map_err(io_err)?);
            let table = T::read_from(&mut r).map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => TableError::Corrupt {
                    key: key.to_string(),
                },
                _ => io_err(e),
            })?;
            if table.persisted_len() != expected_len {
                return Err(TableError::Corrupt {
                    key: key.to_string(),
                });
            }
            info!("load {key} ok");
            return Ok(table);
        }

        let table = compute(key, build)?;
        fs::create_dir_all(dir).map_err(io_err)?;
        let tmp = dir.join(format!("{key}.tmp"));
        let mut w = BufWriter::new(File::create(&tmp).map_err(io_err)?);
        table.write_to(&mut w).map_err(io_err)?;
        w.flush().map_err(io_err)?;
        drop(w);
        fs::rename(&tmp, &path).map_err(io_err)?;
        info!("save {key} ok");
        Ok(table)
    }
}

fn compute<T>(key: &str, build: impl FnOnce() -> Result<T, TableError>) -> Result<T, TableError> {
    let start = Instant::now();
    let table = build()?;
    info!(
        "compute {key} ok, time={:.3}s",
        start.elapsed().as_secs_f64()
    );
    Ok(table)
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cube-search-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test_log::test]
    fn computes_once() {
        let dir = scratch_dir("computes-once");
        let cache = TableCache::new(&dir);
        let mut calls = 0;
        let a: Vec<u16> = cache
            .load_or_compute("t", 3, || {
                calls += 1;
                Ok(vec![1, 2, 3])
            })
            .unwrap();
        let b: Vec<u16> = cache
            .load_or_compute("t", 3, || {
                calls += 1;
                Ok(vec![])
            })
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(calls, 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_wrong_size() {
        let dir = scratch_dir("wrong-size");
        let cache = TableCache::new(&dir);
        let _: Vec<u32> = cache.load_or_compute("t", 2, || Ok(vec![7, 8])).unwrap();
        let r: Result<Vec<u32>, _> = cache.load_or_compute("t", 5, || Ok(vec![0; 5]));
        assert!(matches!(r, Err(TableError::Corrupt { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn disabled_always_computes() {
        let cache = TableCache::disabled();
        let a: Vec<u8> = cache.load_or_compute("t", 1, || Ok(vec![9])).unwrap();
        assert_eq!(a, vec![9]);
    }
}
