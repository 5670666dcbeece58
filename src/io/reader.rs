// src/io/reader.rs
//! Sliding k-mer window over FASTA / FASTQ sequences.

use crate::error::Result;
use bio::io::{fasta, fastq};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// A stream of k-mers, as consumed by a collector.
pub trait KmerSource {
    /// Advance to the next k-mer. Returns false at the end of the input.
    fn next_kmer(&mut self) -> Result<bool>;

    /// The current k-mer: exactly k uppercase symbols from {A, C, G, T}.
    fn current_kmer(&self) -> &str;

    /// 1-based rank of the current k-mer window, in the whole source (`absolute`) or in the
    /// current sequence. Windows skipped for containing a degenerate symbol still count.
    fn current_kmer_id(&self, absolute: bool) -> u64;

    fn current_sequence_description(&self) -> &str;

    /// Name of the source, used in logs and reports.
    fn name(&self) -> &str;
}

impl<S: KmerSource + ?Sized> KmerSource for Box<S> {
    fn next_kmer(&mut self) -> Result<bool> {
        (**self).next_kmer()
    }

    fn current_kmer(&self) -> &str {
        (**self).current_kmer()
    }

    fn current_kmer_id(&self, absolute: bool) -> u64 {
        (**self).current_kmer_id(absolute)
    }

    fn current_sequence_description(&self) -> &str {
        (**self).current_sequence_description()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

type Input = BufReader<Box<dyn Read + Send>>;

enum Records {
    Fasta(fasta::Records<Input>),
    Fastq(fastq::Records<Input>),
    Memory(std::vec::IntoIter<(String, Vec<u8>)>),
}

impl Records {
    fn next_sequence(&mut self) -> Result<Option<(String, Vec<u8>)>> {
        fn describe(id: &str, desc: Option<&str>) -> String {
            match desc {
                Some(desc) => format!("{} {}", id, desc),
                None => id.to_string(),
            }
        }

        Ok(match self {
            Records::Fasta(records) => match records.next() {
                Some(record) => {
                    let record = record?;
                    Some((describe(record.id(), record.desc()), record.seq().to_vec()))
                }
                None => None,
            },
            Records::Fastq(records) => match records.next() {
                Some(record) => {
                    let record = record?;
                    Some((describe(record.id(), record.desc()), record.seq().to_vec()))
                }
                None => None,
            },
            Records::Memory(sequences) => sequences.next(),
        })
    }
}

/// Window state for one source.
///
/// Uppercase or lowercase A/C/G/T extend the window. IUPAC degeneracy symbols and `P` clear it, so
/// the k windows covering one are never produced. Blanks, dots, dashes and line breaks are
/// ignored, as is any other byte.
pub struct KmerReader {
    name: String,
    kmer_length: usize,
    records: Records,
    description: String,
    sequence: Vec<u8>,
    position: usize,
    window: String,
    sequence_length: u64,
    kmer_id: u64,
    kmer_id_offset: u64,
}

fn is_degenerate(symbol: u8) -> bool {
    matches!(
        symbol.to_ascii_uppercase(),
        b'R' | b'Y' | b'S' | b'W' | b'K' | b'M' | b'B' | b'D' | b'H' | b'V' | b'N' | b'P'
    )
}

impl KmerReader {
    fn with_records(name: String, kmer_length: usize, records: Records) -> Self {
        Self {
            name,
            kmer_length,
            records,
            description: String::new(),
            sequence: Vec::new(),
            position: 0,
            window: String::with_capacity(kmer_length),
            sequence_length: 0,
            kmer_id: 0,
            kmer_id_offset: 0,
        }
    }

    /// Open a FASTA or FASTQ file, gzip compressed if its name ends with `.gz`.
    ///
    /// The format is given by the first byte: `>` for FASTA, `@` for FASTQ.
    pub fn open<P: AsRef<Path>>(path: P, kmer_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let raw: Box<dyn Read + Send> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Self::from_reader(path.display().to_string(), kmer_length, raw)
    }

    /// Read FASTA or FASTQ records from any reader.
    pub fn from_reader(name: String, kmer_length: usize, reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut input: Input = BufReader::new(reader);
        let first = input.fill_buf()?.first().copied();
        let records = match first {
            Some(b'>') => Records::Fasta(fasta::Reader::from_bufread(input).records()),
            Some(b'@') => Records::Fastq(fastq::Reader::from_bufread(input).records()),
            None => Records::Memory(Vec::new().into_iter()),
            Some(other) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "'{}' is neither FASTA nor FASTQ (starts with {:?})",
                        name,
                        char::from(other)
                    ),
                )
                .into())
            }
        };
        debug!("Reading k-mers of length {} from '{}'", kmer_length, name);
        Ok(Self::with_records(name, kmer_length, records))
    }

    /// Window over in-memory `(description, sequence)` pairs.
    pub fn from_sequences<I, D, S>(name: &str, kmer_length: usize, sequences: I) -> Self
    where
        I: IntoIterator<Item = (D, S)>,
        D: Into<String>,
        S: AsRef<[u8]>,
    {
        let sequences: Vec<(String, Vec<u8>)> = sequences
            .into_iter()
            .map(|(d, s)| (d.into(), s.as_ref().to_vec()))
            .collect();
        Self::with_records(name.to_string(), kmer_length, Records::Memory(sequences.into_iter()))
    }

    pub fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    /// Count one more symbol of the current sequence.
    fn advance(&mut self) {
        self.sequence_length += 1;
        if self.sequence_length >= self.kmer_length as u64 {
            self.kmer_id += 1;
        }
    }

    /// Consume symbols of the current sequence until the window is full or the sequence ends.
    fn fill_window(&mut self) {
        while self.window.len() < self.kmer_length && self.position < self.sequence.len() {
            let symbol = self.sequence[self.position];
            self.position += 1;
            match symbol {
                b'A' | b'C' | b'G' | b'T' | b'a' | b'c' | b'g' | b't' => {
                    self.window.push(char::from(symbol.to_ascii_uppercase()));
                    self.advance();
                }
                b' ' | b'.' | b'-' | b'\n' | b'\r' => {}
                s if is_degenerate(s) => {
                    self.window.clear();
                    self.advance();
                    debug!(
                        "{}: degeneracy symbol '{}' in '{}' (position {}), window skipped",
                        self.name,
                        char::from(s),
                        self.description,
                        self.position
                    );
                }
                s => debug!(
                    "{}: unexpected symbol {:?} in '{}' (position {}) ignored",
                    self.name,
                    char::from(s),
                    self.description,
                    self.position
                ),
            }
        }
    }
}

impl KmerSource for KmerReader {
    fn next_kmer(&mut self) -> Result<bool> {
        if self.window.len() >= self.kmer_length && !self.window.is_empty() {
            self.window.remove(0);
        }
        loop {
            self.fill_window();
            if self.window.len() == self.kmer_length && self.kmer_length > 0 {
                return Ok(true);
            }
            match self.records.next_sequence()? {
                Some((description, sequence)) => {
                    self.description = description;
                    self.sequence = sequence;
                    self.position = 0;
                    self.window.clear();
                    self.sequence_length = 0;
                    self.kmer_id_offset = self.kmer_id;
                }
                None => {
                    self.window.clear();
                    self.sequence.clear();
                    self.description.clear();
                    return Ok(false);
                }
            }
        }
    }

    fn current_kmer(&self) -> &str {
        &self.window
    }

    fn current_kmer_id(&self, absolute: bool) -> u64 {
        if absolute {
            self.kmer_id
        } else {
            self.kmer_id - self.kmer_id_offset
        }
    }

    fn current_sequence_description(&self) -> &str {
        &self.description
    }

    fn name(&self) -> &str {
        &self.name
    }
}
