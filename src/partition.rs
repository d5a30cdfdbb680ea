// Work partitioner: divide the input stream(s) into record-aligned byte
// chunks so each worker consumes a disjoint contiguous slice.

use std::path::Path;

use crate::error::Result;
use crate::fastq::ByteLineReader;

/// One worker's slice of the input. Offsets are decompressed byte
/// positions; `lines` is the number of input lines the worker consumes
/// from each file (always a multiple of 4 except possibly for ragged
/// trailing input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub r1_start: u64,
    pub r2_start: u64,
    pub lines: u64,
}

/// Partition a single input file into `n` chunks. Both start offsets of
/// each chunk refer to the same file.
pub fn partition_single(path: &Path, n: usize) -> Result<Vec<Chunk>> {
    let (starts, lines) = walk_boundaries(path, n)?;
    Ok(starts
        .iter()
        .zip(&lines)
        .map(|(&start, &lines)| Chunk {
            r1_start: start,
            r2_start: start,
            lines,
        })
        .collect())
}

/// Partition a paired input. R1 drives the byte targets; R2 boundaries
/// are derived by walking R2 until its line count matches each chunk's,
/// which keeps the two files record-synchronised.
pub fn partition_paired(r1: &Path, r2: &Path, n: usize) -> Result<Vec<Chunk>> {
    let (r1_starts, lines) = walk_boundaries(r1, n)?;
    let r2_starts = synced_starts(r2, &lines)?;
    Ok(r1_starts
        .iter()
        .zip(&r2_starts)
        .zip(&lines)
        .map(|((&r1_start, &r2_start), &lines)| Chunk {
            r1_start,
            r2_start,
            lines,
        })
        .collect())
}

/// Walk `path` once to measure its decompressed size and line count, then
/// again recording up to n−1 chunk boundaries: the first line end at or
/// past each byte target k·(size/n) where the running line count is a
/// multiple of 4. The final chunk's line count is whatever remains, set
/// explicitly rather than inferred from EOF.
fn walk_boundaries(path: &Path, n: usize) -> Result<(Vec<u64>, Vec<u64>)> {
    let mut reader = ByteLineReader::open(path)?;
    let mut line = Vec::new();
    let mut total_lines = 0u64;
    while reader.read_line(&mut line)? {
        total_lines += 1;
    }
    let size = reader.byte_pos();

    let approx = size / n as u64;
    let mut reader = ByteLineReader::open(path)?;
    let mut target = approx;
    let mut boundaries: Vec<u64> = Vec::with_capacity(n.saturating_sub(1));
    let mut chunk_lines: Vec<u64> = Vec::with_capacity(n);
    let mut lines_in_chunk = 0u64;
    let mut line_no = 0u64;
    while reader.read_line(&mut line)? {
        line_no += 1;
        lines_in_chunk += 1;
        if boundaries.len() + 1 < n && reader.byte_pos() >= target && line_no % 4 == 0 {
            boundaries.push(reader.byte_pos());
            chunk_lines.push(lines_in_chunk);
            lines_in_chunk = 0;
            target += approx;
        }
    }
    chunk_lines.push(total_lines - chunk_lines.iter().sum::<u64>());

    let mut starts = Vec::with_capacity(n);
    let mut lines = Vec::with_capacity(n);
    for t in 0..n {
        starts.push(if t == 0 {
            0
        } else {
            *boundaries.get(t - 1).unwrap_or(&size)
        });
        lines.push(*chunk_lines.get(t).unwrap_or(&0));
    }
    Ok((starts, lines))
}

/// Walk a mate file recording the byte offset at which its line count
/// reaches each chunk's line count in turn.
fn synced_starts(path: &Path, lines: &[u64]) -> Result<Vec<u64>> {
    let mut reader = ByteLineReader::open(path)?;
    let mut line = Vec::new();
    let mut boundaries = Vec::with_capacity(lines.len().saturating_sub(1));
    let mut lines_in_chunk = 0u64;
    let mut i = 0;
    while i + 1 < lines.len() && reader.read_line(&mut line)? {
        lines_in_chunk += 1;
        if lines_in_chunk == lines[i] {
            boundaries.push(reader.byte_pos());
            lines_in_chunk = 0;
            i += 1;
        }
    }
    let eof = reader.byte_pos();
    let mut starts = Vec::with_capacity(lines.len());
    for t in 0..lines.len() {
        starts.push(if t == 0 {
            0
        } else {
            *boundaries.get(t - 1).unwrap_or(&eof)
        });
    }
    Ok(starts)
}
