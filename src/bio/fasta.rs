use crate::bio::sequence::Sequence;
use crate::{IngestError, Result};
use flate2::read::GzDecoder;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{not_line_ending, space0, space1},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::warn;

/// Parse a FASTA header line into the first token and the rest
fn parse_header(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    let (input, _) = tag(">")(input)?;
    let (input, _) = space0(input)?;
    let (input, id) = take_till(|c: char| c.is_whitespace())(input)?;
    let (input, description) = opt(preceded(space1, not_line_ending))(input)?;
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    Ok((input, (id, description)))
}

/// Streaming FASTA reader. Records are produced one at a time, in file
/// order; the underlying reader is consumed exactly once.
pub struct FastaReader<R> {
    reader: R,
    buffer: String,
    pending_header: Option<String>,
    line_number: usize,
    finished: bool,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            pending_header: None,
            line_number: 0,
            finished: false,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        self.buffer.clear();
        let read = self.reader.read_line(&mut self.buffer).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                IngestError::Parse(format!("line {}: input is not valid UTF-8", self.line_number + 1))
            } else {
                IngestError::Io(e)
            }
        })?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(self.buffer.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn read_record(&mut self) -> Result<Option<Sequence>> {
        let header = match self.pending_header.take() {
            Some(header) => header,
            None => loop {
                match self.next_line()? {
                    None => return Ok(None),
                    Some(line) if line.starts_with('>') => break line,
                    Some(line) if line.trim().is_empty() => continue,
                    Some(_) => {
                        warn!(line = self.line_number, "Ignoring text before the first FASTA header");
                    }
                }
            },
        };

        let (_, (id, description)) = parse_header(&header).map_err(|e| {
            IngestError::Parse(format!("Failed to parse FASTA header '{}': {:?}", header, e))
        })?;
        let mut seq = Sequence::new(id, String::new());
        if let Some(desc) = description {
            seq = seq.with_description(desc.to_string());
        }

        while let Some(line) = self.next_line()? {
            if line.starts_with('>') {
                self.pending_header = Some(line);
                break;
            }
            seq.residues.extend(line.chars().filter(|c| !c.is_whitespace()));
        }

        Ok(Some(seq))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(seq)) => Some(Ok(seq)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Open a FASTA file for streaming (supports .gz compression)
pub fn open_fasta<P: AsRef<Path>>(path: P) -> Result<FastaReader<Box<dyn BufRead>>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let reader: Box<dyn BufRead> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(FastaReader::new(reader))
}

/// Parse FASTA from bytes
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<Sequence>> {
    FastaReader::new(data).collect()
}

/// Parse a whole FASTA file into memory
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    open_fasta(path)?.collect()
}

/// Write one record in canonical form: ID-only header, residues on one line
pub fn write_record<W: Write>(writer: &mut W, seq: &Sequence) -> Result<()> {
    writeln!(writer, "{}", seq.header())?;
    writeln!(writer, "{}", seq.residues)?;
    Ok(())
}
