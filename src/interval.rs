// BED / BEDPE interval records.

use std::io::{self, Write};

/// Truncate a FASTQ header at the first whitespace, for use as the
/// interval name field.
pub fn trim_name(header: &[u8]) -> &[u8] {
    let end = header
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(header.len());
    &header[..end]
}

/// Single-end placement, zero-based half-open.
pub struct Bed<'a> {
    pub chrom: &'a str,
    pub start: u32,
    pub end: u32,
    pub name: &'a [u8],
}

impl Bed<'_> {
    pub fn write_tsv(&self, w: &mut impl Write) -> io::Result<()> {
        write!(w, "{}\t{}\t{}\t", self.chrom, self.start, self.end)?;
        w.write_all(self.name)?;
        w.write_all(b"\n")
    }
}

/// Paired placement. `score` is 0 when both mates sit on the same
/// reference sequence, 1 otherwise (cross-sequence placements only occur
/// with disjoin enabled).
pub struct Bedpe<'a> {
    pub chrom1: &'a str,
    pub start1: u32,
    pub end1: u32,
    pub chrom2: &'a str,
    pub start2: u32,
    pub end2: u32,
    pub name: &'a [u8],
    pub score: u8,
    pub strand1: char,
    pub strand2: char,
}

impl Bedpe<'_> {
    pub fn write_tsv(&self, w: &mut impl Write) -> io::Result<()> {
        write!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t",
            self.chrom1, self.start1, self.end1, self.chrom2, self.start2, self.end2
        )?;
        w.write_all(self.name)?;
        writeln!(w, "\t{}\t{}\t{}", self.score, self.strand1, self.strand2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_header_at_first_whitespace() {
        assert_eq!(trim_name(b"@read1 1:N:0"), b"@read1");
        assert_eq!(trim_name(b"@read1\tcomment"), b"@read1");
        assert_eq!(trim_name(b"@read1"), b"@read1");
    }

    #[test]
    fn bed_serialisation() {
        let bed = Bed {
            chrom: "chr1",
            start: 0,
            end: 16,
            name: b"@r1",
        };
        let mut out = Vec::new();
        bed.write_tsv(&mut out).unwrap();
        assert_eq!(out, b"chr1\t0\t16\t@r1\n");
    }

    #[test]
    fn bedpe_serialisation() {
        let bedpe = Bedpe {
            chrom1: "chr1",
            start1: 10,
            end1: 30,
            chrom2: "chr1",
            start2: 60,
            end2: 80,
            name: b"@pair",
            score: 0,
            strand1: '+',
            strand2: '-',
        };
        let mut out = Vec::new();
        bedpe.write_tsv(&mut out).unwrap();
        assert_eq!(out, b"chr1\t10\t30\tchr1\t60\t80\t@pair\t0\t+\t-\n");
    }
}
