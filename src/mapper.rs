// Top-level orchestration: reference in, index up, inputs partitioned,
// workers out, shards merged.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::index::SeedIndex;
use crate::merge::merge_shards;
use crate::opts::MapOpt;
use crate::partition::{partition_paired, partition_single, Chunk};
use crate::refdb::RefDb;
use crate::worker::{run_worker, WorkerTask};

fn partition_inputs(opt: &MapOpt) -> Result<Vec<Chunk>> {
    match (&opt.input_r1, &opt.input_r2) {
        (Some(r1), Some(r2)) if opt.lib.is_paired() => {
            partition_paired(r1, r2, opt.threads)
        }
        (Some(single), None) | (None, Some(single)) => partition_single(single, opt.threads),
        _ => Err(Error::Config(
            "library mode and input files do not match".into(),
        )),
    }
}

/// Run the full mapping pipeline. `opt` must already be validated.
pub fn run(opt: &MapOpt) -> Result<()> {
    let db = RefDb::from_fasta(&opt.db, opt.k, opt.mask_lower)?;
    let index = SeedIndex::build(&db, opt.k);

    log::info!(
        "mapping with mode {} (k={}, step={}, mismatch={}%, evals={}, disjoin={}, threads={})",
        opt.lib,
        opt.k,
        opt.step,
        opt.mismatch_pct,
        opt.evals,
        opt.disjoin,
        opt.threads
    );

    log::info!("buffering input data");
    let chunks = partition_inputs(opt)?;

    let tasks: Vec<WorkerTask> = chunks
        .into_iter()
        .enumerate()
        .map(|(id, chunk)| WorkerTask {
            id,
            opt,
            db: &db,
            index: &index,
            chunk,
        })
        .collect();

    log::info!("starting execution on {} worker(s)", tasks.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build()
        .map_err(|e| Error::Config(format!("failed to build thread pool: {e}")))?;
    pool.install(|| {
        tasks
            .par_iter()
            .map(|task| {
                let out = run_worker(task);
                log::info!("worker {} finished", task.id);
                out
            })
            .collect::<Result<Vec<()>>>()
    })?;

    log::info!("finalizing results");
    merge_shards(opt, opt.threads)?;
    log::info!("done");
    Ok(())
}
