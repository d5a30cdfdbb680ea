// Reference database: in-memory FASTA sequences plus per-sequence stats.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::fastq::ByteLineReader;

/// One reference sequence. Immutable once the database is built.
#[derive(Debug)]
pub struct RefSeq {
    pub name: String,
    pub seq: Vec<u8>,
    /// Count of G/C bases, cached at parse time.
    pub gc: u64,
}

impl RefSeq {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn gc_percent(&self) -> f64 {
        if self.seq.is_empty() {
            0.0
        } else {
            self.gc as f64 / self.seq.len() as f64 * 100.0
        }
    }
}

/// The parsed reference database, shared read-only across workers.
#[derive(Debug)]
pub struct RefDb {
    pub seqs: Vec<RefSeq>,
}

impl RefDb {
    /// Parse a (possibly gzip-compressed) multi-FASTA.
    ///
    /// Two passes over the file: the first counts header records so the
    /// sequence table can be sized up front, the second fills names and
    /// bases. Bases are uppercased unless `mask_lower` is set. Headers are
    /// truncated at the first whitespace and must be unique; every
    /// sequence must be at least `k` bases long.
    pub fn from_fasta(path: &Path, k: usize, mask_lower: bool) -> Result<Self> {
        let mut reader = ByteLineReader::open(path)?;
        let mut line = Vec::new();
        let mut header_count = 0usize;
        while reader.read_line(&mut line)? {
            if line.first() == Some(&b'>') {
                header_count += 1;
            }
        }
        if header_count == 0 {
            return Err(Error::EmptyDatabase);
        }

        let mut seqs: Vec<RefSeq> = Vec::with_capacity(header_count);
        let mut reader = ByteLineReader::open(path)?;
        while reader.read_line(&mut line)? {
            if line.first() == Some(&b'>') {
                let name_end = line[1..]
                    .iter()
                    .position(|b| b.is_ascii_whitespace())
                    .map_or(line.len(), |i| i + 1);
                let name = String::from_utf8_lossy(&line[1..name_end]).into_owned();
                seqs.push(RefSeq {
                    name,
                    seq: Vec::new(),
                    gc: 0,
                });
            } else if let Some(cur) = seqs.last_mut() {
                for &b in &line {
                    // GC% is a composition statistic, case-insensitive
                    // regardless of how the stored bases keep their case
                    let upper = b.to_ascii_uppercase();
                    if upper == b'G' || upper == b'C' {
                        cur.gc += 1;
                    }
                    cur.seq.push(if mask_lower { b } else { upper });
                }
            }
        }

        let mut seen = HashSet::with_capacity(seqs.len());
        for s in &seqs {
            if !seen.insert(s.name.as_str()) {
                return Err(Error::DuplicateHeader(s.name.clone()));
            }
            if s.len() < k {
                return Err(Error::SequenceTooShort {
                    name: s.name.clone(),
                    len: s.len(),
                    k,
                });
            }
        }

        let db = RefDb { seqs };
        log::info!("database composition:");
        for s in &db.seqs {
            log::info!("  [*] {};bp:{};GC:{:.2}", s.name, s.len(), s.gc_percent());
        }
        Ok(db)
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }
}
