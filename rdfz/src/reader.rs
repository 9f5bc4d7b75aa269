use std::fmt;
use std::io::{self, BufReader, Read};

use crate::header::{Crc32, Header, MAGIC, PacketKind, VERSION};
use crate::writer::Term;

/// Errors that can occur while reading or writing RDFZ streams.
#[derive(Debug)]
pub enum RdfzError {
    /// Underlying I/O error.
    Io(std::io::Error),
    /// Structural problem with inputs or unsupported feature.
    Invalid(&'static str),
    /// The stream failed an integrity or bounds check.
    Corrupt(String),
}

impl fmt::Display for RdfzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfzError::Io(e) => write!(f, "{}", e),
            RdfzError::Invalid(m) => write!(f, "{}", m),
            RdfzError::Corrupt(m) => write!(f, "{}", m),
        }
    }
}
impl std::error::Error for RdfzError {}
impl From<std::io::Error> for RdfzError {
    fn from(e: std::io::Error) -> Self {
        RdfzError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, RdfzError>;

/// Longest string a packet may carry.
const MAX_STR_LEN: u64 = 1 << 26;

enum Body<R: Read> {
    Plain(BufReader<R>),
    #[cfg(feature = "zstd")]
    Zstd(zstd::stream::read::Decoder<'static, BufReader<R>>),
}

impl<R: Read> Read for Body<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Body::Plain(r) => r.read(buf),
            #[cfg(feature = "zstd")]
            Body::Zstd(r) => r.read(buf),
        }
    }
}

fn truncated(e: io::Error) -> RdfzError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        RdfzError::Corrupt("truncated stream".into())
    } else {
        RdfzError::Io(e)
    }
}

/// Streaming decoder yielding one `(subject, predicate, object)` per item.
///
/// Iteration stops after the EOF packet or the first error.
pub struct PacketReader<R: Read> {
    header: Header,
    body: Body<R>,
    crc: Option<Crc32>,
    prefixes: Vec<String>,
    done: bool,
}

impl<R: Read> PacketReader<R> {
    /// Read and validate the header, then prepare to decode the body.
    pub fn new(mut r: R) -> Result<Self> {
        let mut buf = [0u8; Header::LEN];
        r.read_exact(&mut buf).map_err(truncated)?;
        let header = Header::parse(&buf).ok_or(RdfzError::Invalid("short or invalid header"))?;
        if &header.magic != MAGIC {
            return Err(RdfzError::Invalid("bad magic"));
        }
        if header.version_u16 != VERSION {
            return Err(RdfzError::Invalid("unsupported version"));
        }
        let body = if header.is_zstd() {
            #[cfg(feature = "zstd")]
            {
                Body::Zstd(zstd::stream::read::Decoder::new(r)?)
            }
            #[cfg(not(feature = "zstd"))]
            {
                return Err(RdfzError::Invalid("zstd feature not enabled"));
            }
        } else {
            Body::Plain(BufReader::new(r))
        };
        Ok(PacketReader {
            header,
            body,
            crc: header.has_crc().then(Crc32::default),
            prefixes: Vec::new(),
            done: false,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Namespaces declared so far, in declaration order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.body.read_exact(buf).map_err(truncated)?;
        if let Some(crc) = self.crc.as_mut() {
            crc.update(buf);
        }
        Ok(())
    }

    fn read_uvarint(&mut self) -> Result<u64> {
        let (mut x, mut s) = (0u64, 0u32);
        for _ in 0..10 {
            let mut b = [0u8; 1];
            self.read_exact(&mut b)?;
            let b = b[0] as u64;
            x |= (b & 0x7f) << s;
            if b & 0x80 == 0 {
                return Ok(x);
            }
            s += 7;
        }
        Err(RdfzError::Corrupt("uvarint overflow".into()))
    }

    fn read_str(&mut self) -> Result<String> {
        let len = self.read_uvarint()?;
        if len > MAX_STR_LEN {
            return Err(RdfzError::Corrupt(format!("string length {} out of range", len)));
        }
        let mut buf = vec![0u8; len as usize];
        self.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|_| RdfzError::Corrupt("invalid UTF-8 in string".into()))
    }

    fn read_iri(&mut self, id: u64) -> Result<String> {
        let local = self.read_str()?;
        let base = self
            .prefixes
            .get(id as usize)
            .ok_or_else(|| RdfzError::Corrupt(format!("unknown prefix id {}", id)))?;
        Ok(format!("{}{}", base, local))
    }

    fn verify_footer(&mut self) -> Result<()> {
        let Some(crc) = self.crc.take() else {
            return Ok(());
        };
        let mut stored = [0u8; 4];
        self.body.read_exact(&mut stored).map_err(truncated)?;
        let expected = u32::from_le_bytes(stored);
        if crc.finish() != expected {
            return Err(RdfzError::Corrupt(format!(
                "CRC mismatch: stored {:08x}, computed {:08x}",
                expected,
                crc.finish()
            )));
        }
        Ok(())
    }

    fn next_triple(&mut self) -> Result<Option<(Term, Term, Term)>> {
        let mut terms: Vec<Term> = Vec::with_capacity(3);
        let mut typed_lex: Option<String> = None;
        loop {
            let kind = PacketKind::from_u64(self.read_uvarint()?);
            let term = match kind {
                PacketKind::Eof => {
                    if !terms.is_empty() || typed_lex.is_some() {
                        return Err(RdfzError::Corrupt("dangling terms at end of stream".into()));
                    }
                    self.verify_footer()?;
                    return Ok(None);
                }
                PacketKind::NewPrefix => {
                    let base = self.read_str()?;
                    self.prefixes.push(base);
                    continue;
                }
                PacketKind::Iri(id) => {
                    let iri = self.read_iri(id)?;
                    match typed_lex.take() {
                        Some(lex) => Term::Literal {
                            lex,
                            dt: Some(iri),
                            lang: None,
                        },
                        None => Term::Iri(iri),
                    }
                }
                _ if typed_lex.is_some() => {
                    return Err(RdfzError::Corrupt("literal datatype must be an IRI".into()));
                }
                PacketKind::BNode => Term::BNode(self.read_str()?),
                PacketKind::Literal => Term::Literal {
                    lex: self.read_str()?,
                    dt: None,
                    lang: None,
                },
                PacketKind::LangLiteral => {
                    let lex = self.read_str()?;
                    let lang = self.read_str()?;
                    Term::Literal {
                        lex,
                        dt: None,
                        lang: Some(lang),
                    }
                }
                PacketKind::TypedLiteral => {
                    typed_lex = Some(self.read_str()?);
                    continue;
                }
            };
            terms.push(term);
            if terms.len() == 3 {
                let o = terms.pop();
                let p = terms.pop();
                let s = terms.pop();
                if let (Some(s), Some(p), Some(o)) = (s, p, o) {
                    return Ok(Some((s, p, o)));
                }
            }
        }
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = Result<(Term, Term, Term)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_triple() {
            Ok(Some(t)) => Some(Ok(t)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
