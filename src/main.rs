use clap::Parser;
use std::path::PathBuf;

use sepia::mapper;
use sepia::opts::{LibraryMode, MapOpt};

#[derive(Parser)]
#[command(name = "sepia")]
#[command(about = "Fast ungapped mapping and splitting of sequencing reads", long_about = None)]
#[command(version)]
struct Cli {
    /// Input database in FASTA format (can be gzipped)
    #[arg(short = 'i', value_name = "FASTA", required = true)]
    database: PathBuf,

    /// Reads in forward direction (R1) (can be gzipped)
    #[arg(long = "R1", value_name = "FASTQ")]
    input_r1: Option<PathBuf>,

    /// Reads in reverse direction (R2) (can be gzipped)
    #[arg(long = "R2", value_name = "FASTQ")]
    input_r2: Option<PathBuf>,

    /// Output basename; "_R1.fastq", "_R2.fastq" and ".bed" are appended
    #[arg(short = 'o', value_name = "STR", required = true)]
    output: String,

    /// Library mode: ISF, ISR, IU, OSF, OSR, OU (paired); SF, SR, U (single-end).
    /// I = inward, O = outward, SF/SR = stranded forward/reverse, U = unstranded.
    #[arg(short = 'l', value_name = "MODE", required = true)]
    library: LibraryMode,

    /// When FASTQ output is enabled, write reads that do NOT map to the
    /// database (default: write mapping reads)
    #[arg(long)]
    diff: bool,

    /// Allow R1 and R2 to map to different database sequences; disjoined
    /// pairs carry score 1 in the BEDPE output
    #[arg(long)]
    disjoin: bool,

    /// Do not treat reference Ns as mismatches, simply ignore them
    #[arg(long = "ignore_N")]
    ignore_n: bool,

    /// Do not capitalize lowercase letters in the database
    #[arg(long = "mask-lower")]
    mask_lower: bool,

    /// Do not produce the BED/BEDPE output file
    #[arg(long = "no-bed")]
    no_bed: bool,

    /// Do not produce FASTQ output file(s)
    #[arg(long = "no-fastq")]
    no_fastq: bool,

    /// Do not print log messages to stderr
    #[arg(long)]
    quiet: bool,

    /// Evaluate up to N alternative placements and keep the best match;
    /// 0 stops at the first suitable match
    #[arg(short = 'e', value_name = "INT", default_value = "0")]
    evals: u32,

    /// Kmer size: 9, 11, 13 or 15
    #[arg(short = 'k', value_name = "INT", default_value = "11")]
    kmer: usize,

    /// Max percentage of mismatches allowed during ungapped extension
    #[arg(short = 'm', value_name = "INT", default_value = "15")]
    mismatch: u32,

    /// Step size while sliding over the reads looking for a seed match
    #[arg(short = 's', value_name = "INT", default_value = "17")]
    step: usize,

    /// Number of worker threads
    #[arg(short = 't', value_name = "INT", default_value = "1")]
    threads: usize,
}

fn main() {
    // usage, help and argument errors all exit 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    // cap runaway thread counts at twice the available cores
    let mut threads = cli.threads;
    let max_threads = num_cpus::get() * 2;
    if threads > max_threads {
        log::warn!("thread count {threads} exceeds recommended maximum {max_threads}, capping");
        threads = max_threads;
    }

    let mut opt = MapOpt {
        db: cli.database,
        input_r1: cli.input_r1,
        input_r2: cli.input_r2,
        basename: cli.output,
        lib: cli.library,
        diff: cli.diff,
        disjoin: cli.disjoin,
        ignore_n: cli.ignore_n,
        mask_lower: cli.mask_lower,
        bed_out: !cli.no_bed,
        fastq_out: !cli.no_fastq,
        quiet: cli.quiet,
        evals: cli.evals,
        k: cli.kmer,
        mismatch_pct: cli.mismatch,
        step: cli.step,
        threads,
    };

    if let Err(e) = opt.validate() {
        log::error!("[Error] {e}");
        std::process::exit(1);
    }

    if let Err(e) = mapper::run(&opt) {
        log::error!("[Error] {e}");
        std::process::exit(1);
    }
}
