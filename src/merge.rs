// Shard merger: concatenate per-worker shards in worker order into the
// final outputs, then drop empty outputs.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::opts::MapOpt;

/// Concatenate `shards` into `final_path`, deleting each consumed shard.
/// Shards that were never created (single-end modes write only one FASTQ
/// side) are skipped.
fn concat_shards(final_path: &Path, shards: &[PathBuf]) -> Result<()> {
    let mut out = BufWriter::new(File::create(final_path)?);
    for shard in shards {
        let mut f = match File::open(shard) {
            Ok(f) => f,
            Err(_) => continue,
        };
        io::copy(&mut f, &mut out)?;
        drop(f);
        fs::remove_file(shard)?;
    }
    out.flush()?;
    Ok(())
}

fn remove_if_empty(path: &Path) -> Result<()> {
    if fs::metadata(path)?.len() == 0 {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Merge all worker shards into the user-named outputs. Final record
/// order equals the worker-id-ordered concatenation of per-worker output,
/// which equals single-threaded input order.
pub fn merge_shards(opt: &MapOpt, workers: usize) -> Result<()> {
    let mut r1_shards = Vec::with_capacity(workers);
    let mut r2_shards = Vec::with_capacity(workers);
    let mut bed_shards = Vec::with_capacity(workers);
    for t in 0..workers {
        let (r1, r2, bed) = opt.shard_paths(t);
        r1_shards.push(r1);
        r2_shards.push(r2);
        bed_shards.push(bed);
    }

    concat_shards(&opt.output_r1(), &r1_shards)?;
    concat_shards(&opt.output_r2(), &r2_shards)?;
    concat_shards(&opt.output_bed(), &bed_shards)?;

    remove_if_empty(&opt.output_r1())?;
    remove_if_empty(&opt.output_r2())?;
    remove_if_empty(&opt.output_bed())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_in_worker_order_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out").to_string_lossy().into_owned();
        let opt = MapOpt {
            basename: base,
            ..MapOpt::default()
        };

        for t in 0..3 {
            let (r1, _r2, bed) = opt.shard_paths(t);
            fs::write(&r1, format!("worker{t}\n")).unwrap();
            fs::write(&bed, "").unwrap();
        }

        merge_shards(&opt, 3).unwrap();

        let merged = fs::read_to_string(opt.output_r1()).unwrap();
        assert_eq!(merged, "worker0\nworker1\nworker2\n");
        // consumed shards are gone
        for t in 0..3 {
            let (r1, r2, bed) = opt.shard_paths(t);
            assert!(!r1.exists() && !r2.exists() && !bed.exists());
        }
        // outputs that ended up empty are removed
        assert!(!opt.output_r2().exists());
        assert!(!opt.output_bed().exists());
    }
}
