// Placement policies: compose the seed/extend primitives into single- and
// paired-read searches over the shared index.
//
// The nine library modes reduce to two probe geometries (inward, outward)
// crossed with three pairing strategies; strand labels and probe
// construction live with the worker's mode descriptor.

use crate::index::SeedIndex;
use crate::opts::MapOpt;
use crate::refdb::RefDb;
use crate::search::{anchor_start, seed, verify, verify_scored};

/// Mate-order geometry of a paired probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Anchor must start at or before mate end; disjoined mates must sit
    /// on a downstream sequence.
    Inward,
    /// Anchor must start at or after mate end; disjoined mates must sit
    /// on an upstream sequence.
    Outward,
}

/// Pairing strategy, selected once per run from `--disjoin` / `-e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// First verified same-sequence pair satisfying the order constraint.
    FirstHit,
    /// As `FirstHit`, falling back to cross-sequence mates on the correct
    /// side of the anchor when the same sequence yields nothing.
    Disjoin,
    /// Collect up to N same-sequence candidates and keep the one with the
    /// lowest combined mismatch score.
    BestOf(u32),
}

impl Strategy {
    pub fn from_opt(opt: &MapOpt) -> Self {
        if opt.evals > 0 {
            Strategy::BestOf(opt.evals)
        } else if opt.disjoin {
            Strategy::Disjoin
        } else {
            Strategy::FirstHit
        }
    }
}

/// A successful single-end placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleHit {
    pub seq: usize,
    pub start: usize,
    pub end: usize,
}

/// A successful paired placement; interval 1 belongs to the first probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairHit {
    pub seq1: usize,
    pub start1: usize,
    pub end1: usize,
    pub seq2: usize,
    pub start2: usize,
    pub end2: usize,
    pub score: u8,
}

fn order_ok(side: Side, start1: usize, start2: usize, len2: usize) -> bool {
    match side {
        Side::Inward => start1 <= start2 + len2,
        Side::Outward => start1 >= start2 + len2,
    }
}

/// Read-only search context shared by every record of a worker.
pub struct Searcher<'a> {
    index: &'a SeedIndex,
    db: &'a RefDb,
    ignore_n: bool,
    mismatch_pct: u32,
    step: usize,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a SeedIndex, db: &'a RefDb, opt: &MapOpt) -> Self {
        Searcher {
            index,
            db,
            ignore_n: opt.ignore_n,
            mismatch_pct: opt.mismatch_pct,
            step: opt.step,
        }
    }

    /// Place a single read; the first verified anchor wins.
    pub fn place_single(&self, read: &[u8]) -> Option<SingleHit> {
        let mut at = 0;
        while let Some(hit) = seed(self.index, read, at, self.step) {
            at = hit.cursor;
            for pos in &self.index.bucket(hit.bucket).positions {
                let rs = &self.db.seqs[pos.seq as usize];
                let Some(start) = anchor_start(*pos, at, read.len(), rs) else {
                    continue;
                };
                if verify(
                    &rs.seq[start..start + read.len()],
                    read,
                    self.ignore_n,
                    self.mismatch_pct,
                ) {
                    return Some(SingleHit {
                        seq: pos.seq as usize,
                        start,
                        end: start + read.len(),
                    });
                }
            }
            at += self.step;
        }
        None
    }

    /// Place a read pair under the given geometry and strategy. The first
    /// probe is the anchor; interval 1 of the result describes it.
    pub fn place_pair(
        &self,
        probe1: &[u8],
        probe2: &[u8],
        side: Side,
        strategy: Strategy,
    ) -> Option<PairHit> {
        match strategy {
            Strategy::BestOf(n) if n > 0 => self.place_pair_best(probe1, probe2, side, n),
            Strategy::Disjoin => self.pair_search(probe1, probe2, side, true),
            _ => self.pair_search(probe1, probe2, side, false),
        }
    }

    fn pair_search(
        &self,
        probe1: &[u8],
        probe2: &[u8],
        side: Side,
        disjoin: bool,
    ) -> Option<PairHit> {
        let mut at1 = 0;
        while let Some(hit) = seed(self.index, probe1, at1, self.step) {
            at1 = hit.cursor;
            for pos in &self.index.bucket(hit.bucket).positions {
                let seq1 = pos.seq as usize;
                let rs1 = &self.db.seqs[seq1];
                let Some(start1) = anchor_start(*pos, at1, probe1.len(), rs1) else {
                    continue;
                };
                if !verify(
                    &rs1.seq[start1..start1 + probe1.len()],
                    probe1,
                    self.ignore_n,
                    self.mismatch_pct,
                ) {
                    continue;
                }
                if let Some((seq2, start2, score)) =
                    self.mate_search(seq1, start1, probe2, side, disjoin)
                {
                    return Some(PairHit {
                        seq1,
                        start1,
                        end1: start1 + probe1.len(),
                        seq2,
                        start2,
                        end2: start2 + probe2.len(),
                        score,
                    });
                }
            }
            at1 += self.step;
        }
        None
    }

    /// Search the mate probe relative to a verified anchor. Scans the
    /// anchored sequence's contiguous run inside each bucket first; with
    /// disjoin, falls back to sequences on the correct side of the anchor
    /// (downstream for inward, upstream for outward).
    fn mate_search(
        &self,
        anchor_seq: usize,
        anchor_pos: usize,
        mate: &[u8],
        side: Side,
        disjoin: bool,
    ) -> Option<(usize, usize, u8)> {
        let mut at2 = 0;
        while let Some(hit) = seed(self.index, mate, at2, self.step) {
            at2 = hit.cursor;
            let positions = &self.index.bucket(hit.bucket).positions;
            let run_start = positions.partition_point(|p| (p.seq as usize) < anchor_seq);
            let run_end = positions.partition_point(|p| (p.seq as usize) <= anchor_seq);

            for pos in &positions[run_start..run_end] {
                let rs = &self.db.seqs[anchor_seq];
                let Some(start2) = anchor_start(*pos, at2, mate.len(), rs) else {
                    continue;
                };
                if !verify(
                    &rs.seq[start2..start2 + mate.len()],
                    mate,
                    self.ignore_n,
                    self.mismatch_pct,
                ) {
                    continue;
                }
                if order_ok(side, anchor_pos, start2, mate.len()) {
                    return Some((anchor_seq, start2, 0));
                }
            }

            if disjoin {
                let fallback = match side {
                    Side::Inward => &positions[run_end..],
                    Side::Outward => &positions[..run_start],
                };
                for pos in fallback {
                    let seq2 = pos.seq as usize;
                    let rs = &self.db.seqs[seq2];
                    let Some(start2) = anchor_start(*pos, at2, mate.len(), rs) else {
                        continue;
                    };
                    if verify(
                        &rs.seq[start2..start2 + mate.len()],
                        mate,
                        self.ignore_n,
                        self.mismatch_pct,
                    ) {
                        let score = u8::from(seq2 != anchor_seq);
                        return Some((seq2, start2, score));
                    }
                }
            }
            at2 += self.step;
        }
        None
    }

    /// Best-of-N: collect up to `n` same-sequence candidate pairs (one per
    /// verified anchor position), keep the lowest combined Hamming score.
    /// Ties go to the earliest candidate.
    fn place_pair_best(
        &self,
        probe1: &[u8],
        probe2: &[u8],
        side: Side,
        n: u32,
    ) -> Option<PairHit> {
        let mut best: Option<(u32, PairHit)> = None;
        let mut collected = 0u32;
        let mut at1 = 0;
        'outer: while let Some(hit) = seed(self.index, probe1, at1, self.step) {
            at1 = hit.cursor;
            for pos in &self.index.bucket(hit.bucket).positions {
                if collected == n {
                    break 'outer;
                }
                let seq1 = pos.seq as usize;
                let rs1 = &self.db.seqs[seq1];
                let Some(start1) = anchor_start(*pos, at1, probe1.len(), rs1) else {
                    continue;
                };
                let Some(anchor_score) = verify_scored(
                    &rs1.seq[start1..start1 + probe1.len()],
                    probe1,
                    self.ignore_n,
                    self.mismatch_pct,
                ) else {
                    continue;
                };
                let Some((start2, mate_score)) =
                    self.mate_search_scored(seq1, start1, probe2, side)
                else {
                    continue;
                };
                collected += 1;
                let combined = anchor_score + mate_score;
                let candidate = PairHit {
                    seq1,
                    start1,
                    end1: start1 + probe1.len(),
                    seq2: seq1,
                    start2,
                    end2: start2 + probe2.len(),
                    score: 0,
                };
                if best.as_ref().map_or(true, |(s, _)| combined < *s) {
                    best = Some((combined, candidate));
                }
            }
            at1 += self.step;
        }
        best.map(|(_, hit)| hit)
    }

    /// Same-sequence, order-constrained mate search returning the scored
    /// flavour for best-of-N ranking.
    fn mate_search_scored(
        &self,
        anchor_seq: usize,
        anchor_pos: usize,
        mate: &[u8],
        side: Side,
    ) -> Option<(usize, u32)> {
        let mut at2 = 0;
        while let Some(hit) = seed(self.index, mate, at2, self.step) {
            at2 = hit.cursor;
            let positions = &self.index.bucket(hit.bucket).positions;
            let run_start = positions.partition_point(|p| (p.seq as usize) < anchor_seq);
            let run_end = positions.partition_point(|p| (p.seq as usize) <= anchor_seq);
            for pos in &positions[run_start..run_end] {
                let rs = &self.db.seqs[anchor_seq];
                let Some(start2) = anchor_start(*pos, at2, mate.len(), rs) else {
                    continue;
                };
                let Some(score) = verify_scored(
                    &rs.seq[start2..start2 + mate.len()],
                    mate,
                    self.ignore_n,
                    self.mismatch_pct,
                ) else {
                    continue;
                };
                if order_ok(side, anchor_pos, start2, mate.len()) {
                    return Some((start2, score));
                }
            }
            at2 += self.step;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SeedIndex;
    use crate::refdb::{RefDb, RefSeq};
    use crate::search::revcomp;

    fn db_of(seqs: &[(&str, &str)]) -> RefDb {
        RefDb {
            seqs: seqs
                .iter()
                .map(|(name, s)| RefSeq {
                    name: name.to_string(),
                    seq: s.as_bytes().to_vec(),
                    gc: 0,
                })
                .collect(),
        }
    }

    fn opt_with(step: usize, mismatch_pct: u32) -> MapOpt {
        MapOpt {
            step,
            mismatch_pct,
            ..MapOpt::default()
        }
    }

    const MOTIF_A: &str = "ACGTAACGTTGGCATCCTAG";
    const MOTIF_B: &str = "GATTACAGATCTGCAGGTTA";

    /// 100 bp with MOTIF_A at offsets [10, 30) and MOTIF_B at [60, 80).
    fn chr1() -> String {
        format!(
            "{}{}{}{}{}",
            "C".repeat(10),
            MOTIF_A,
            "C".repeat(30),
            MOTIF_B,
            "C".repeat(20)
        )
    }

    #[test]
    fn single_hit_first_anchor_wins() {
        let chr1 = chr1();
        let db = db_of(&[("chr1", chr1.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        let read = &chr1.as_bytes()[10..30];
        let hit = searcher.place_single(read).unwrap();
        assert_eq!(
            hit,
            SingleHit {
                seq: 0,
                start: 10,
                end: 30
            }
        );
        assert!(searcher.place_single(b"TTTTTTTTTTTTTTTTTTTT").is_none());
    }

    #[test]
    fn read_shorter_than_k_never_places() {
        let chr1 = chr1();
        let db = db_of(&[("chr1", chr1.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        assert!(searcher.place_single(b"ACGTAACG").is_none());
    }

    #[test]
    fn inward_pair_respects_mate_order() {
        let chr1 = chr1();
        let db = db_of(&[("chr1", chr1.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        let r1 = &chr1.as_bytes()[10..30];
        let mate_fwd = &chr1.as_bytes()[60..80]; // probe2 = rc(R2) image on forward strand
        let hit = searcher
            .place_pair(r1, mate_fwd, Side::Inward, Strategy::FirstHit)
            .unwrap();
        assert_eq!((hit.start1, hit.end1), (10, 30));
        assert_eq!((hit.start2, hit.end2), (60, 80));
        assert_eq!(hit.score, 0);

        // swapping the probes violates the inward constraint
        assert!(searcher
            .place_pair(mate_fwd, r1, Side::Inward, Strategy::FirstHit)
            .is_none());
    }

    #[test]
    fn outward_pair_is_the_mirror_geometry() {
        let chr1 = chr1();
        let db = db_of(&[("chr1", chr1.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        let downstream = &chr1.as_bytes()[60..80];
        let upstream = &chr1.as_bytes()[10..30];
        let hit = searcher
            .place_pair(downstream, upstream, Side::Outward, Strategy::FirstHit)
            .unwrap();
        assert_eq!((hit.start1, hit.start2), (60, 10));
        assert!(searcher
            .place_pair(upstream, downstream, Side::Outward, Strategy::FirstHit)
            .is_none());
    }

    #[test]
    fn disjoin_places_across_sequences_with_score_one() {
        let chr_a = format!("{}{}{}", "C".repeat(10), MOTIF_A, "C".repeat(10));
        let chr_b = format!("{}{}{}", "G".repeat(10), MOTIF_B, "G".repeat(10));
        let db = db_of(&[("chrA", chr_a.as_str()), ("chrB", chr_b.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        let r1 = &chr_a.as_bytes()[10..30];
        let mate = &chr_b.as_bytes()[10..30];

        assert!(searcher
            .place_pair(r1, mate, Side::Inward, Strategy::FirstHit)
            .is_none());

        let hit = searcher
            .place_pair(r1, mate, Side::Inward, Strategy::Disjoin)
            .unwrap();
        assert_eq!((hit.seq1, hit.seq2), (0, 1));
        assert_eq!(hit.score, 1);

        // inward disjoin only looks downstream: anchor on chrB, mate on chrA
        assert!(searcher
            .place_pair(mate, r1, Side::Inward, Strategy::Disjoin)
            .is_none());
        // outward disjoin looks upstream instead
        let hit = searcher
            .place_pair(mate, r1, Side::Outward, Strategy::Disjoin)
            .unwrap();
        assert_eq!((hit.seq1, hit.seq2), (1, 0));
        assert_eq!(hit.score, 1);
    }

    #[test]
    fn best_of_n_prefers_fewer_mismatches() {
        // two copies of the anchor/mate layout; the first carries two
        // mismatches in the anchor, the second is exact
        let clean = chr1();
        let noisy = clean.replace(MOTIF_A, "ACGTAACGTTGGCATCCGGG");
        let db = db_of(&[("noisy", noisy.as_str()), ("clean", clean.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 25);
        let searcher = Searcher::new(&idx, &db, &opt);
        let r1 = &clean.as_bytes()[10..30];
        let mate = &clean.as_bytes()[60..80];

        // first-hit takes the noisy copy (lower seq index, scanned first)
        let first = searcher
            .place_pair(r1, mate, Side::Inward, Strategy::FirstHit)
            .unwrap();
        assert_eq!(first.seq1, 0);

        // best-of-3 keeps the exact copy
        let best = searcher
            .place_pair(r1, mate, Side::Inward, Strategy::BestOf(3))
            .unwrap();
        assert_eq!(best.seq1, 1);
        assert_eq!((best.start1, best.start2), (10, 60));
    }

    #[test]
    fn best_of_zero_behaves_like_first_hit() {
        let chr1 = chr1();
        let db = db_of(&[("chr1", chr1.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        let r1 = &chr1.as_bytes()[10..30];
        let mate = &chr1.as_bytes()[60..80];
        let a = searcher.place_pair(r1, mate, Side::Inward, Strategy::BestOf(0));
        let b = searcher.place_pair(r1, mate, Side::Inward, Strategy::FirstHit);
        assert_eq!(a, b);
    }

    #[test]
    fn read_and_reference_of_length_exactly_k() {
        let db = db_of(&[("tiny", "ACGTAACGT")]);
        let idx = SeedIndex::build(&db, 9);
        // step far larger than the read: cursor 0 is still probed
        let opt = opt_with(17, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        let hit = searcher.place_single(b"ACGTAACGT").unwrap();
        assert_eq!((hit.start, hit.end), (0, 9));
        assert!(searcher.place_single(b"ACGTAACGA").is_none());
    }

    #[test]
    fn revcomp_probe_round_trip_places() {
        let chr1 = chr1();
        let db = db_of(&[("chr1", chr1.as_str())]);
        let idx = SeedIndex::build(&db, 9);
        let opt = opt_with(1, 0);
        let searcher = Searcher::new(&idx, &db, &opt);
        // a read sequenced off the reverse strand maps via its revcomp
        let reverse_read = revcomp(&chr1.as_bytes()[60..80]);
        assert!(searcher.place_single(&reverse_read).is_none());
        let hit = searcher.place_single(&revcomp(&reverse_read)).unwrap();
        assert_eq!(hit.start, 60);
    }
}
