// One worker: consume an assigned slice of the input stream(s), classify
// each record under the selected library mode, and write three output
// shards. Workers share the read-only index and never communicate.

use std::fs::File;
use std::io::BufWriter;

use crate::error::Result;
use crate::fastq::{FastqReader, FastqRecord};
use crate::index::SeedIndex;
use crate::interval::{trim_name, Bed, Bedpe};
use crate::opts::{LibraryMode, MapOpt};
use crate::partition::Chunk;
use crate::placement::{PairHit, Searcher, Side, SingleHit, Strategy};
use crate::refdb::RefDb;
use crate::search::revcomp;

/// Read-only description of one worker's job.
pub struct WorkerTask<'a> {
    pub id: usize,
    pub opt: &'a MapOpt,
    pub db: &'a RefDb,
    pub index: &'a SeedIndex,
    pub chunk: Chunk,
}

/// Probe construction and strand labels for a paired library mode. The
/// nine modes differ only here; the record loop is shared.
fn search_pair(
    searcher: &Searcher,
    lib: LibraryMode,
    strategy: Strategy,
    r1: &[u8],
    r2: &[u8],
) -> Option<(PairHit, char, char)> {
    match lib {
        LibraryMode::Isf => searcher
            .place_pair(r1, &revcomp(r2), Side::Inward, strategy)
            .map(|h| (h, '+', '-')),
        LibraryMode::Isr => searcher
            .place_pair(r2, &revcomp(r1), Side::Inward, strategy)
            .map(|h| (h, '-', '+')),
        LibraryMode::Iu => search_pair(searcher, LibraryMode::Isf, strategy, r1, r2)
            .or_else(|| search_pair(searcher, LibraryMode::Isr, strategy, r1, r2)),
        LibraryMode::Osf => searcher
            .place_pair(r1, &revcomp(r2), Side::Outward, strategy)
            .map(|h| (h, '-', '+')),
        LibraryMode::Osr => searcher
            .place_pair(r2, &revcomp(r1), Side::Outward, strategy)
            .map(|h| (h, '+', '-')),
        LibraryMode::Ou => search_pair(searcher, LibraryMode::Osf, strategy, r1, r2)
            .or_else(|| search_pair(searcher, LibraryMode::Osr, strategy, r1, r2)),
        _ => None,
    }
}

/// Single-end probe construction. `from_r2` selects the orientation used
/// when the sole input is the R2 file.
fn search_single(
    searcher: &Searcher,
    lib: LibraryMode,
    read: &[u8],
    from_r2: bool,
) -> Option<SingleHit> {
    match lib {
        LibraryMode::Sf => {
            if from_r2 {
                searcher.place_single(&revcomp(read))
            } else {
                searcher.place_single(read)
            }
        }
        LibraryMode::Sr => {
            if from_r2 {
                searcher.place_single(read)
            } else {
                searcher.place_single(&revcomp(read))
            }
        }
        LibraryMode::U => searcher
            .place_single(read)
            .or_else(|| searcher.place_single(&revcomp(read))),
        _ => None,
    }
}

pub fn run_worker(task: &WorkerTask) -> Result<()> {
    if task.opt.lib.is_paired() {
        run_paired(task)
    } else {
        run_single(task)
    }
}

fn run_paired(task: &WorkerTask) -> Result<()> {
    let opt = task.opt;
    let (p1, p2, pbed) = opt.shard_paths(task.id);
    let mut out_r1 = BufWriter::new(File::create(&p1)?);
    let mut out_r2 = BufWriter::new(File::create(&p2)?);
    let mut out_bed = BufWriter::new(File::create(&pbed)?);

    let input_r1 = opt.input_r1.as_ref().expect("validated paired input");
    let input_r2 = opt.input_r2.as_ref().expect("validated paired input");
    let mut fq1 = FastqReader::open(input_r1)?;
    let mut fq2 = FastqReader::open(input_r2)?;
    fq1.seek_to(task.chunk.r1_start)?;
    fq2.seek_to(task.chunk.r2_start)?;

    let searcher = Searcher::new(task.index, task.db, opt);
    let strategy = Strategy::from_opt(opt);
    let mut rec1 = FastqRecord::default();
    let mut rec2 = FastqRecord::default();

    for _ in 0..task.chunk.lines / 4 {
        if !fq1.read_record(&mut rec1)? || !fq2.read_record(&mut rec2)? {
            break;
        }
        let placed = search_pair(&searcher, opt.lib, strategy, &rec1.seq, &rec2.seq);
        if opt.fastq_out && placed.is_some() != opt.diff {
            rec1.write_to(&mut out_r1)?;
            rec2.write_to(&mut out_r2)?;
        }
        if let Some((hit, strand1, strand2)) = placed {
            if opt.bed_out && !opt.diff {
                let bedpe = Bedpe {
                    chrom1: &task.db.seqs[hit.seq1].name,
                    start1: hit.start1 as u32,
                    end1: hit.end1 as u32,
                    chrom2: &task.db.seqs[hit.seq2].name,
                    start2: hit.start2 as u32,
                    end2: hit.end2 as u32,
                    name: trim_name(&rec1.header),
                    score: hit.score,
                    strand1,
                    strand2,
                };
                bedpe.write_tsv(&mut out_bed)?;
            }
        }
    }
    Ok(())
}

fn run_single(task: &WorkerTask) -> Result<()> {
    let opt = task.opt;
    let (p1, p2, pbed) = opt.shard_paths(task.id);
    let from_r2 = opt.input_r1.is_none();
    let (input, shard) = if from_r2 {
        (opt.input_r2.as_ref().expect("validated single input"), p2)
    } else {
        (opt.input_r1.as_ref().expect("validated single input"), p1)
    };
    let mut out_fastq = BufWriter::new(File::create(&shard)?);
    let mut out_bed = BufWriter::new(File::create(&pbed)?);

    let mut fq = FastqReader::open(input)?;
    fq.seek_to(if from_r2 {
        task.chunk.r2_start
    } else {
        task.chunk.r1_start
    })?;

    let searcher = Searcher::new(task.index, task.db, opt);
    let mut rec = FastqRecord::default();

    for _ in 0..task.chunk.lines / 4 {
        if !fq.read_record(&mut rec)? {
            break;
        }
        let placed = search_single(&searcher, opt.lib, &rec.seq, from_r2);
        if opt.fastq_out && placed.is_some() != opt.diff {
            rec.write_to(&mut out_fastq)?;
        }
        if let Some(hit) = placed {
            if opt.bed_out && !opt.diff {
                let bed = Bed {
                    chrom: &task.db.seqs[hit.seq].name,
                    start: hit.start as u32,
                    end: hit.end as u32,
                    name: trim_name(&rec.header),
                };
                bed.write_tsv(&mut out_bed)?;
            }
        }
    }
    Ok(())
}
