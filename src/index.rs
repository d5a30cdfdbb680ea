// Seed index: a sorted bucket table keyed by positional base-4 k-mer
// fingerprints over the reference database.

use crate::refdb::RefDb;

/// Fingerprint value meaning "window contains a non-ACGT base"; never
/// stored in the index.
pub const SENTINEL: u32 = u32::MAX;

/// Positional base-4 encoding of the first `k` bytes of `window`
/// (A=0, C=1, G=2, T=3, leftmost base most significant). Returns
/// [`SENTINEL`] as soon as any other byte is seen. Valid results are
/// strictly below 4^k, which fits u32 for every supported k (max 15).
pub fn fingerprint(window: &[u8], k: usize) -> u32 {
    let mut h: u32 = 0;
    for &b in &window[..k] {
        let digit = match b {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' => 3,
            _ => return SENTINEL,
        };
        h = (h << 2) | digit;
    }
    h
}

/// One occurrence of a fingerprint in the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPos {
    pub seq: u32,
    pub offset: u32,
}

/// All occurrences of one fingerprint, ordered by (seq, offset).
#[derive(Debug)]
pub struct Bucket {
    pub id: u32,
    pub positions: Vec<SeedPos>,
}

/// The sorted fingerprint table. Immutable after construction and shared
/// read-only across workers.
#[derive(Debug)]
pub struct SeedIndex {
    pub k: usize,
    buckets: Vec<Bucket>,
}

impl SeedIndex {
    /// Build the index over every k-window of the database.
    ///
    /// The triple stream is generated in (seq, offset) order and sorted
    /// with a stable sort on the fingerprint alone, so positions inside a
    /// bucket stay (seq, offset)-ordered; the paired-end same-sequence
    /// scan depends on that.
    pub fn build(db: &RefDb, k: usize) -> Self {
        let mut triples: Vec<(u32, SeedPos)> = Vec::new();
        for (i, rs) in db.seqs.iter().enumerate() {
            if rs.len() < k {
                continue;
            }
            for offset in 0..=rs.len() - k {
                let fp = fingerprint(&rs.seq[offset..], k);
                if fp == SENTINEL {
                    continue;
                }
                triples.push((
                    fp,
                    SeedPos {
                        seq: i as u32,
                        offset: offset as u32,
                    },
                ));
            }
        }
        triples.sort_by_key(|&(fp, _)| fp);

        let mut buckets: Vec<Bucket> = Vec::new();
        for (fp, pos) in triples {
            match buckets.last_mut() {
                Some(b) if b.id == fp => b.positions.push(pos),
                _ => buckets.push(Bucket {
                    id: fp,
                    positions: vec![pos],
                }),
            }
        }

        log::info!(
            "{} fingerprints were produced over {} sequences",
            buckets.len(),
            db.len()
        );
        SeedIndex { k, buckets }
    }

    /// Binary search on the fingerprint.
    pub fn lookup(&self, fp: u32) -> Option<&Bucket> {
        self.buckets
            .binary_search_by_key(&fp, |b| b.id)
            .ok()
            .map(|i| &self.buckets[i])
    }

    pub fn bucket(&self, i: usize) -> &Bucket {
        &self.buckets[i]
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn lookup_idx(&self, fp: u32) -> Option<usize> {
        self.buckets.binary_search_by_key(&fp, |b| b.id).ok()
    }
}
