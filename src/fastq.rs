// Byte-accurate line IO over possibly gzip-compressed streams.
//
// The work partitioner hands workers *decompressed* byte offsets, so the
// reader has to account for every byte it consumes itself; this is why the
// record loop does not sit on top of a generic FASTQ parser.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

const LINE_BUF_SIZE: usize = 16384;

/// Open a file, transparently decoding gzip when the path ends in `.gz`.
pub fn open_maybe_gzip(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Buffered line reader that tracks its decompressed byte position.
pub struct ByteLineReader {
    inner: Box<dyn Read>,
    buf: Vec<u8>,
    begin: usize,
    end: usize,
    eof: bool,
    pos: u64,
}

impl ByteLineReader {
    pub fn new(inner: Box<dyn Read>) -> Self {
        ByteLineReader {
            inner,
            buf: vec![0; LINE_BUF_SIZE],
            begin: 0,
            end: 0,
            eof: false,
            pos: 0,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(ByteLineReader::new(open_maybe_gzip(path)?))
    }

    /// Decompressed byte offset just past the last line returned.
    pub fn byte_pos(&self) -> u64 {
        self.pos
    }

    fn fill(&mut self) -> io::Result<usize> {
        if self.eof {
            return Ok(0);
        }
        self.begin = 0;
        self.end = self.inner.read(&mut self.buf)?;
        if self.end == 0 {
            self.eof = true;
        }
        Ok(self.end)
    }

    /// Read the next line into `line`, stripping the `\n` (and a `\r`
    /// before it). Returns false on EOF with nothing read. The byte
    /// position advances by the full on-stream length of the line,
    /// terminator included.
    pub fn read_line(&mut self, line: &mut Vec<u8>) -> io::Result<bool> {
        line.clear();
        let mut got_any = false;
        loop {
            if self.begin >= self.end {
                if self.fill()? == 0 {
                    break;
                }
            }
            let chunk = &self.buf[self.begin..self.end];
            match chunk.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    line.extend_from_slice(&chunk[..i]);
                    self.begin += i + 1;
                    self.pos += (i + 1) as u64;
                    got_any = true;
                    break;
                }
                None => {
                    line.extend_from_slice(chunk);
                    self.pos += chunk.len() as u64;
                    self.begin = self.end;
                    got_any = got_any || !chunk.is_empty();
                }
            }
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(got_any)
    }

    /// Drain exactly `n` decompressed bytes; positions a fresh reader at a
    /// worker's chunk start.
    pub fn skip_bytes(&mut self, mut n: u64) -> io::Result<()> {
        while n > 0 {
            if self.begin >= self.end {
                if self.fill()? == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "chunk start offset past end of input",
                    ));
                }
            }
            let avail = (self.end - self.begin) as u64;
            let take = avail.min(n);
            self.begin += take as usize;
            self.pos += take;
            n -= take;
        }
        Ok(())
    }
}

/// One four-line FASTQ record. Scratch buffers are reused across the
/// worker loop; a record never outlives the iteration that filled it.
#[derive(Debug, Default, Clone)]
pub struct FastqRecord {
    pub header: Vec<u8>,
    pub seq: Vec<u8>,
    pub plus: Vec<u8>,
    pub qual: Vec<u8>,
}

impl FastqRecord {
    /// Write the record back out, verbatim apart from line-terminator
    /// normalisation.
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&self.header)?;
        w.write_all(b"\n")?;
        w.write_all(&self.seq)?;
        w.write_all(b"\n")?;
        w.write_all(&self.plus)?;
        w.write_all(b"\n")?;
        w.write_all(&self.qual)?;
        w.write_all(b"\n")
    }
}

/// FASTQ reader over a [`ByteLineReader`].
pub struct FastqReader {
    inner: ByteLineReader,
    path: std::path::PathBuf,
    lines_read: usize,
}

impl FastqReader {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(FastqReader {
            inner: ByteLineReader::open(path)?,
            path: path.to_path_buf(),
            lines_read: 0,
        })
    }

    /// Skip to a worker's start offset in the decompressed stream.
    pub fn seek_to(&mut self, byte_offset: u64) -> Result<()> {
        self.inner.skip_bytes(byte_offset)?;
        Ok(())
    }

    /// Read the next record into `rec`. Returns false on clean EOF at a
    /// record boundary; a record cut off mid-way is a structural error.
    pub fn read_record(&mut self, rec: &mut FastqRecord) -> Result<bool> {
        if !self.inner.read_line(&mut rec.header)? {
            return Ok(false);
        }
        self.lines_read += 1;
        for buf in [&mut rec.seq, &mut rec.plus, &mut rec.qual] {
            if !self.inner.read_line(buf)? {
                return Err(Error::TruncatedFastq {
                    path: self.path.clone(),
                    line: self.lines_read,
                });
            }
            self.lines_read += 1;
        }
        Ok(true)
    }
}
