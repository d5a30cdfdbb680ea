// Seed/extend primitives: fingerprint probing of the read and ungapped
// Hamming verification against the reference.

use crate::index::{fingerprint, SeedIndex, SeedPos, SENTINEL};
use crate::refdb::RefSeq;

/// Reverse complement. A<->T and C<->G swap; anything else is copied
/// verbatim into the reversed output.
pub fn revcomp(src: &[u8]) -> Vec<u8> {
    src.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            other => other,
        })
        .collect()
}

fn mismatch_budget(max_pct: u32, len: usize) -> u32 {
    (max_pct as usize * len / 100) as u32
}

/// Ungapped comparison with a percentage mismatch budget.
///
/// Returns `1 + mismatches` on acceptance (1 is a perfect match, higher is
/// worse) or `None` as soon as the running count exceeds
/// `max_pct * len / 100`. Positions where the *reference* base is N are
/// skipped entirely when `ignore_n` is set.
pub fn verify_scored(reference: &[u8], read: &[u8], ignore_n: bool, max_pct: u32) -> Option<u32> {
    let budget = mismatch_budget(max_pct, read.len());
    let mut mismatches = 0u32;
    for (r, q) in reference.iter().zip(read.iter()) {
        if ignore_n && *r == b'N' {
            continue;
        }
        if r != q {
            mismatches += 1;
            if mismatches > budget {
                return None;
            }
        }
    }
    Some(1 + mismatches)
}

/// Accept/reject flavour of [`verify_scored`]; the two agree on every
/// input by construction.
pub fn verify(reference: &[u8], read: &[u8], ignore_n: bool, max_pct: u32) -> bool {
    verify_scored(reference, read, ignore_n, max_pct).is_some()
}

/// A successful seed probe: the bucket index and the read cursor at which
/// the k-mer hit.
#[derive(Debug, Clone, Copy)]
pub struct SeedHit {
    pub bucket: usize,
    pub cursor: usize,
}

/// Slide a k-window from `cursor` in steps of `step` until a fingerprint
/// present in the index is found. Windows containing non-ACGT bases and
/// fingerprints without a bucket are skipped. Returns `None` once the
/// cursor passes `len - k`; the caller must advance the returned cursor
/// by at least `step` before re-entering, which keeps every search loop
/// strictly progressing.
pub fn seed(index: &SeedIndex, read: &[u8], mut cursor: usize, step: usize) -> Option<SeedHit> {
    let k = index.k;
    if read.len() < k {
        return None;
    }
    let last = read.len() - k;
    while cursor <= last {
        let fp = fingerprint(&read[cursor..], k);
        if fp != SENTINEL {
            if let Some(bucket) = index.lookup_idx(fp) {
                return Some(SeedHit { bucket, cursor });
            }
        }
        cursor += step;
    }
    None
}

/// Alignment start implied by anchoring the read's k-mer at `cursor` on a
/// reference occurrence. `None` when the start would be negative, when the
/// sequence is shorter than the read, or when the read would run off the
/// end of the sequence.
pub fn anchor_start(pos: SeedPos, cursor: usize, read_len: usize, rs: &RefSeq) -> Option<usize> {
    let offset = pos.offset as usize;
    if offset < cursor {
        return None;
    }
    let start = offset - cursor;
    if rs.len() < read_len || start + read_len > rs.len() {
        return None;
    }
    Some(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refdb::{RefDb, RefSeq};

    fn db_of(seqs: &[&str]) -> RefDb {
        RefDb {
            seqs: seqs
                .iter()
                .enumerate()
                .map(|(i, s)| RefSeq {
                    name: format!("s{i}"),
                    seq: s.as_bytes().to_vec(),
                    gc: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn revcomp_involution() {
        for s in [&b"ACGT"[..], b"AACGTACGTACGTACG", b"GATTACA"] {
            assert_eq!(revcomp(&revcomp(s)), s);
        }
        assert_eq!(revcomp(b"AACG"), b"CGTT");
    }

    #[test]
    fn revcomp_passes_unknown_bases_through() {
        assert_eq!(revcomp(b"ANGT"), b"ACNT");
    }

    #[test]
    fn verify_zero_budget_is_exact_equality() {
        assert_eq!(verify_scored(b"ACGTACGT", b"ACGTACGT", false, 0), Some(1));
        assert_eq!(verify_scored(b"ACGTACGT", b"ACGAACGT", false, 0), None);
    }

    #[test]
    fn verify_budget_is_floored_percentage() {
        // 20 bases at 15% -> floor(3.0) = 3 mismatches allowed
        let reference = b"AAAAAAAAAAAAAAAAAAAA";
        let three_off = b"TTTAAAAAAAAAAAAAAAAA";
        let four_off = b"TTTTAAAAAAAAAAAAAAAA";
        assert_eq!(verify_scored(reference, three_off, false, 15), Some(4));
        assert_eq!(verify_scored(reference, four_off, false, 15), None);
    }

    #[test]
    fn verify_skips_reference_n_when_asked() {
        let reference = b"ACGTNNGT";
        let read = b"ACGTTTGT";
        assert!(!verify(reference, read, false, 10));
        assert!(verify(reference, read, true, 0));
    }

    #[test]
    fn both_verify_flavours_agree() {
        let reference = b"ACGTACGTACGTACGTACGA";
        let read = b"ACGTACGTACGTACGTACGT";
        for pct in [0, 4, 5, 15, 99] {
            assert_eq!(
                verify(reference, read, false, pct),
                verify_scored(reference, read, false, pct).is_some()
            );
        }
    }

    #[test]
    fn seed_skips_unknown_and_missing_kmers() {
        let db = db_of(&["ACGTACGTACGTACGT"]);
        let idx = crate::index::SeedIndex::build(&db, 9);
        // N in the first window forces a step forward
        let hit = seed(&idx, b"NCGTACGTACGTACGT", 0, 1).unwrap();
        assert_eq!(hit.cursor, 1);
        // absent kmer (poly-G) never hits
        assert!(seed(&idx, b"GGGGGGGGGGGG", 0, 1).is_none());
    }

    #[test]
    fn seed_respects_cursor_limit() {
        let db = db_of(&["ACGTACGTACGTACGT"]);
        let idx = crate::index::SeedIndex::build(&db, 9);
        let read = b"ACGTACGTACGT"; // len 12, k 9 -> cursors 0..=3
        assert!(seed(&idx, read, 4, 1).is_none());
        assert!(seed(&idx, read, 0, 100).is_some()); // step > len still probes 0
        assert!(seed(&idx, b"ACGTACGT", 0, 1).is_none()); // shorter than k
    }

    #[test]
    fn anchor_geometry_rejects_overhangs() {
        let rs = RefSeq {
            name: "s".into(),
            seq: b"ACGTACGTACGTACGT".to_vec(),
            gc: 0,
        };
        let pos = SeedPos { seq: 0, offset: 2 };
        // cursor 3 would start at -1
        assert_eq!(anchor_start(pos, 3, 10, &rs), None);
        assert_eq!(anchor_start(pos, 2, 10, &rs), Some(0));
        // start 2 + read 16 overruns len 16
        assert_eq!(anchor_start(pos, 0, 16, &rs), None);
        // read longer than the sequence
        assert_eq!(anchor_start(pos, 2, 20, &rs), None);
    }
}
