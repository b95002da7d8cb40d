//! Binary persistence for [`DistanceMatrix`].
//!
//! # Binary Layout
//!
//! All multi-byte values are little-endian.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic: `"TRM"` + format version byte |
//! | 4 | 8 | Frame count `n_frames` (u64) |
//! | 12 | 8 | Sieve value (u64) |
//! | 20 | 8 | Stored element count (u64) |
//! | 28 | 1 | Sieve rule: 0 = stride, 1 = random |
//! | 29 | 8 | Sieve seed (u64, 0 for stride) |
//! | 37 | `n_frames` | Exclusion flags, one byte (0 or 1) per frame |
//! | 37 + `n_frames` | 8 * count | Distances (f64) in storage order |
//!
//! Only the sieve parameters are written; the selected frames are recomputed
//! on load, which is why sieve selection must be deterministic.
//!
//! Loading reads and checks the fixed header against the file length before
//! anything proportional to the file is allocated; the payload is then
//! streamed straight into the distance buffer. Saving writes a temporary file
//! next to the target and renames it into place, so an interrupted save never
//! clobbers an existing matrix.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::distance::DistanceMatrix;
use super::sieve::{Sieve, SieveParams, SieveRule};
use super::triangle::{self, TriangleStore};
use super::util;
use crate::error::{Error, Result};

/// Magic bytes: `"TRM"` followed by the format version.
pub const MATRIX_MAGIC: [u8; 4] = [b'T', b'R', b'M', 1];

/// Size of everything before the exclusion flags.
pub const HEADER_LEN: usize = 4 + 8 + 8 + 8 + 1 + 8;

const RULE_STRIDE: u8 = 0;
const RULE_RANDOM: u8 = 1;

/// Decoded fixed-size header.
#[derive(Debug)]
struct Header {
    n_frames: usize,
    params: SieveParams,
    n_elements: usize,
}

#[inline]
fn u64_at(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

fn to_usize(value: u64, field: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::Format(format!("{field} {value} does not fit in memory")))
}

impl Header {
    fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self> {
        if bytes[0..4] != MATRIX_MAGIC {
            return Err(Error::Format(format!(
                "bad magic {:?}, expected {:?}",
                &bytes[0..4],
                MATRIX_MAGIC
            )));
        }

        let n_frames = to_usize(u64_at(bytes, 4), "frame count")?;
        let sieve = to_usize(u64_at(bytes, 12), "sieve")?;
        let n_elements = to_usize(u64_at(bytes, 20), "element count")?;
        let seed = u64_at(bytes, 29);
        let rule = match bytes[28] {
            RULE_STRIDE => SieveRule::Stride,
            RULE_RANDOM => SieveRule::Random { seed },
            tag => return Err(Error::Format(format!("unknown sieve rule tag {tag}"))),
        };

        if n_frames <= 1 {
            return Err(Error::Format(format!("frame count {n_frames} is below 2")));
        }
        if sieve == 0 {
            return Err(Error::Format("sieve value is 0".to_string()));
        }

        Ok(Self {
            n_frames,
            params: SieveParams { sieve, rule },
            n_elements,
        })
    }

    /// Check the declared counts against each other and the file length.
    fn validate(&self, file_len: u64) -> Result<usize> {
        let n_reduced = self.params.selected_count(self.n_frames);
        let expected = triangle::element_count(n_reduced).ok_or_else(|| {
            Error::Format(format!("{n_reduced} selected frames overflow the element count"))
        })?;
        if self.n_elements != expected {
            return Err(Error::SizeMismatch {
                what: "element count",
                expected: expected as u64,
                found: self.n_elements as u64,
            });
        }

        let expected_len = self
            .n_elements
            .checked_mul(8)
            .and_then(|payload| payload.checked_add(self.n_frames))
            .and_then(|body| body.checked_add(HEADER_LEN))
            .ok_or_else(|| Error::Format("declared sizes overflow".to_string()))?;
        if file_len != expected_len as u64 {
            return Err(Error::SizeMismatch {
                what: "file length",
                expected: expected_len as u64,
                found: file_len,
            });
        }
        Ok(n_reduced)
    }
}

impl DistanceMatrix {
    /// Write the matrix to `path`, atomically replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        self.write_to(BufWriter::new(tmp.as_file_mut()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            path = %path.display(),
            n_frames = self.n_frames(),
            sieve = self.sieve_value(),
            n_elements = self.n_elements(),
            "saved distance matrix"
        );
        Ok(())
    }

    /// Encode the matrix into `w`.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        let (tag, seed) = match self.sieve_rule() {
            SieveRule::Stride => (RULE_STRIDE, 0),
            SieveRule::Random { seed } => (RULE_RANDOM, seed),
        };

        w.write_all(&MATRIX_MAGIC)?;
        w.write_all(&(self.n_frames() as u64).to_le_bytes())?;
        w.write_all(&(self.sieve_value() as u64).to_le_bytes())?;
        w.write_all(&(self.n_elements() as u64).to_le_bytes())?;
        w.write_all(&[tag])?;
        w.write_all(&seed.to_le_bytes())?;

        let flags: Vec<u8> = self.ignore.iter().map(|&ig| u8::from(ig)).collect();
        w.write_all(&flags)?;
        for value in self.store.elements() {
            w.write_all(&value.to_le_bytes())?;
        }
        w.flush()?;
        Ok(())
    }

    /// Read a matrix previously written by [`DistanceMatrix::save`].
    ///
    /// `verbose` only affects logging: 0 logs nothing but failures, 1 adds a
    /// summary, 2 and above add the header fields.
    pub fn load(path: impl AsRef<Path>, verbose: u8) -> Result<Self> {
        let path = path.as_ref();
        let result = File::open(path).map_err(Error::from).and_then(|file| {
            let len = file.metadata()?.len();
            Self::read_from(BufReader::new(file), len, verbose)
        });

        match &result {
            Ok(m) if verbose > 0 => {
                tracing::info!(
                    path = %path.display(),
                    n_frames = m.n_frames(),
                    n_reduced = m.n_reduced(),
                    "loaded distance matrix"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot load distance matrix");
            }
        }
        result
    }

    /// Replace `self` with the matrix stored at `path`.
    ///
    /// The file is fully validated first; on any error `self` is unchanged.
    pub fn reload(&mut self, path: impl AsRef<Path>, verbose: u8) -> Result<()> {
        *self = Self::load(path, verbose)?;
        Ok(())
    }

    /// Decode a matrix from an in-memory file image.
    pub fn from_bytes(bytes: &[u8], verbose: u8) -> Result<Self> {
        Self::read_from(bytes, bytes.len() as u64, verbose)
    }

    /// Decode a matrix from `r`, which must yield exactly `len` bytes.
    ///
    /// The header is validated against `len` before the exclusion flags or
    /// distances are allocated.
    pub fn read_from<R: Read>(mut r: R, len: u64, verbose: u8) -> Result<Self> {
        if len < HEADER_LEN as u64 {
            return Err(Error::Format(format!("{len} bytes is too short for a header")));
        }
        let mut head = [0u8; HEADER_LEN];
        r.read_exact(&mut head)?;

        let header = Header::parse(&head)?;
        if verbose > 1 {
            tracing::debug!(?header, len, "matrix file header");
        }
        let n_reduced = header.validate(len)?;

        let mut flags = util::try_filled(header.n_frames, 0u8, "n_frames")?;
        r.read_exact(&mut flags)?;
        let ignore = flags
            .iter()
            .enumerate()
            .map(|(frame, &flag)| match flag {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(Error::Format(format!(
                    "exclusion flag {other} for frame {frame} is not 0 or 1"
                ))),
            })
            .collect::<Result<Vec<bool>>>()?;
        drop(flags);

        let mut elements = util::try_with_capacity(header.n_elements, "n_elements")?;
        let mut buf = [0u8; 8];
        for _ in 0..header.n_elements {
            r.read_exact(&mut buf)?;
            elements.push(f64::from_le_bytes(buf));
        }

        let sieve = Sieve::new(header.n_frames, header.params)?;
        debug_assert_eq!(sieve.len(), n_reduced);

        Ok(Self {
            sieve,
            store: TriangleStore::from_elements(n_reduced, elements),
            ignore,
        })
    }
}
