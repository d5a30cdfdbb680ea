// Mapping options shared by every stage of the engine.
//
// The whole configuration is bundled into one read-only value carried by
// the worker descriptors, so the search primitives never consult globals.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Library orientation contract between R1, R2 and the reference strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryMode {
    /// Inward Stranded Forward: R1 forward, R2 reverse, R1 upstream of R2.
    Isf,
    /// Inward Stranded Reverse: R1 reverse, R2 forward, R1 downstream of R2.
    Isr,
    /// Inward Unstranded: tries ISF, then ISR.
    Iu,
    /// Outward Stranded Forward: R1 downstream of R2.
    Osf,
    /// Outward Stranded Reverse: R1 upstream of R2.
    Osr,
    /// Outward Unstranded: tries OSF, then OSR.
    Ou,
    /// Stranded Forward single-end.
    Sf,
    /// Stranded Reverse single-end.
    Sr,
    /// Unstranded single-end: forward, then reverse complement.
    U,
}

impl LibraryMode {
    /// Paired modes require both input files; single-end modes exactly one.
    pub fn is_paired(self) -> bool {
        matches!(
            self,
            LibraryMode::Isf
                | LibraryMode::Isr
                | LibraryMode::Iu
                | LibraryMode::Osf
                | LibraryMode::Osr
                | LibraryMode::Ou
        )
    }
}

impl FromStr for LibraryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ISF" => Ok(LibraryMode::Isf),
            "ISR" => Ok(LibraryMode::Isr),
            "IU" => Ok(LibraryMode::Iu),
            "OSF" => Ok(LibraryMode::Osf),
            "OSR" => Ok(LibraryMode::Osr),
            "OU" => Ok(LibraryMode::Ou),
            "SF" => Ok(LibraryMode::Sf),
            "SR" => Ok(LibraryMode::Sr),
            "U" => Ok(LibraryMode::U),
            _ => Err(format!(
                "invalid library mode '{s}' (expected one of ISF, ISR, IU, OSF, OSR, OU, SF, SR, U)"
            )),
        }
    }
}

impl fmt::Display for LibraryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LibraryMode::Isf => "ISF",
            LibraryMode::Isr => "ISR",
            LibraryMode::Iu => "IU",
            LibraryMode::Osf => "OSF",
            LibraryMode::Osr => "OSR",
            LibraryMode::Ou => "OU",
            LibraryMode::Sf => "SF",
            LibraryMode::Sr => "SR",
            LibraryMode::U => "U",
        };
        f.write_str(s)
    }
}

/// Full mapping configuration.
#[derive(Debug, Clone)]
pub struct MapOpt {
    /// FASTA reference database (may be gzip-compressed).
    pub db: PathBuf,
    /// Forward-direction reads.
    pub input_r1: Option<PathBuf>,
    /// Reverse-direction reads.
    pub input_r2: Option<PathBuf>,
    /// Output basename; `_R1.fastq`, `_R2.fastq` and `.bed` are appended.
    pub basename: String,
    pub lib: LibraryMode,

    /// Write non-mapping instead of mapping reads to the FASTQ outputs.
    pub diff: bool,
    /// Allow mates to place on different reference sequences.
    pub disjoin: bool,
    /// Skip reference N positions during ungapped comparison.
    pub ignore_n: bool,
    /// Keep lowercase database bases instead of uppercasing them.
    pub mask_lower: bool,
    pub bed_out: bool,
    pub fastq_out: bool,
    pub quiet: bool,

    /// Best-of-N candidate evaluation; 0 means first hit wins.
    pub evals: u32,
    /// K-mer size, one of 9, 11, 13, 15.
    pub k: usize,
    /// Max percentage of mismatches tolerated by the ungapped extension.
    pub mismatch_pct: u32,
    /// Seed cursor step over the read.
    pub step: usize,
    pub threads: usize,
}

impl Default for MapOpt {
    fn default() -> Self {
        MapOpt {
            db: PathBuf::new(),
            input_r1: None,
            input_r2: None,
            basename: String::new(),
            lib: LibraryMode::U,
            diff: false,
            disjoin: false,
            ignore_n: false,
            mask_lower: false,
            bed_out: true,
            fastq_out: true,
            quiet: false,
            evals: 0,
            k: 11,
            mismatch_pct: 15,
            step: 17,
            threads: 1,
        }
    }
}

impl MapOpt {
    /// Semantic validation beyond what the argument parser can express.
    ///
    /// Hard failures return a configuration error; known-benign conflicts
    /// are resolved in place with a warning, matching spec'd behaviour of
    /// warn-and-continue.
    pub fn validate(&mut self) -> Result<()> {
        if !matches!(self.k, 9 | 11 | 13 | 15) {
            return Err(Error::Config(format!(
                "-k must be 9, 11, 13 or 15 (got {})",
                self.k
            )));
        }
        if self.mismatch_pct > 99 {
            return Err(Error::Config(format!(
                "-m must be in 0..=99 (got {})",
                self.mismatch_pct
            )));
        }
        if self.step < 1 {
            return Err(Error::Config("-s must be at least 1".into()));
        }
        if self.threads < 1 {
            return Err(Error::Config("-t must be at least 1".into()));
        }
        if self.lib.is_paired() {
            if self.input_r1.is_none() || self.input_r2.is_none() {
                return Err(Error::Config(format!(
                    "library mode {} requires both -R1 and -R2",
                    self.lib
                )));
            }
        } else {
            match (&self.input_r1, &self.input_r2) {
                (None, None) => {
                    return Err(Error::Config(format!(
                        "library mode {} requires -R1 or -R2",
                        self.lib
                    )));
                }
                (Some(_), Some(_)) => {
                    return Err(Error::Config(format!(
                        "library mode {} accepts a single input file, not both -R1 and -R2",
                        self.lib
                    )));
                }
                _ => {}
            }
        }

        if self.evals > 0 && self.disjoin {
            log::warn!("--disjoin and -e are mutually exclusive; --disjoin forced off");
            self.disjoin = false;
        }
        if self.diff && self.bed_out {
            log::warn!("no BED output will be produced because --diff is enabled");
        }
        if !self.fastq_out && !self.bed_out {
            log::warn!("no output will be produced because --no-fastq and --no-bed are both set");
        }
        Ok(())
    }

    pub fn output_r1(&self) -> PathBuf {
        PathBuf::from(format!("{}_R1.fastq", self.basename))
    }

    pub fn output_r2(&self) -> PathBuf {
        PathBuf::from(format!("{}_R2.fastq", self.basename))
    }

    pub fn output_bed(&self) -> PathBuf {
        PathBuf::from(format!("{}.bed", self.basename))
    }

    /// Shard paths for worker `t`, in (R1, R2, BED) order.
    pub fn shard_paths(&self, t: usize) -> (PathBuf, PathBuf, PathBuf) {
        (
            PathBuf::from(format!("{}_R1.thread{t}", self.basename)),
            PathBuf::from(format!("{}_R2.thread{t}", self.basename)),
            PathBuf::from(format!("{}_BED.thread{t}", self.basename)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_opt(lib: LibraryMode) -> MapOpt {
        MapOpt {
            db: PathBuf::from("db.fa"),
            input_r1: Some(PathBuf::from("r1.fastq")),
            input_r2: Some(PathBuf::from("r2.fastq")),
            basename: "out".into(),
            lib,
            ..MapOpt::default()
        }
    }

    #[test]
    fn library_mode_round_trip() {
        for s in ["ISF", "ISR", "IU", "OSF", "OSR", "OU", "SF", "SR", "U"] {
            let mode: LibraryMode = s.parse().unwrap();
            assert_eq!(mode.to_string(), s);
        }
        assert!("isf".parse::<LibraryMode>().is_err());
        assert!("XX".parse::<LibraryMode>().is_err());
    }

    #[test]
    fn paired_mode_requires_both_inputs() {
        let mut opt = base_opt(LibraryMode::Isf);
        opt.input_r2 = None;
        assert!(opt.validate().is_err());
    }

    #[test]
    fn single_mode_rejects_two_inputs() {
        let mut opt = base_opt(LibraryMode::Sf);
        assert!(opt.validate().is_err());
        opt.input_r2 = None;
        assert!(opt.validate().is_ok());
    }

    #[test]
    fn evals_forces_disjoin_off() {
        let mut opt = base_opt(LibraryMode::Isf);
        opt.disjoin = true;
        opt.evals = 3;
        opt.validate().unwrap();
        assert!(!opt.disjoin);
    }

    #[test]
    fn rejects_bad_k_and_mismatch() {
        let mut opt = base_opt(LibraryMode::Isf);
        opt.k = 12;
        assert!(opt.validate().is_err());
        opt.k = 13;
        opt.mismatch_pct = 100;
        assert!(opt.validate().is_err());
    }

    #[test]
    fn shard_paths_embed_worker_id() {
        let opt = base_opt(LibraryMode::Isf);
        let (r1, r2, bed) = opt.shard_paths(3);
        assert_eq!(r1, PathBuf::from("out_R1.thread3"));
        assert_eq!(r2, PathBuf::from("out_R2.thread3"));
        assert_eq!(bed, PathBuf::from("out_BED.thread3"));
    }
}
