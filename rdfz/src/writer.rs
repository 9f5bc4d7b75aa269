use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use crate::header::{Crc32, FLAG_CRC, FLAG_ZSTD, Header, PacketKind};
use crate::reader::{RdfzError, Result};

/// RDF term carried by an RDFZ stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// IRI/URI node.
    Iri(String),
    /// Blank node label (with or without `_:` prefix).
    BNode(String),
    /// Literal with optional datatype or language tag.
    Literal {
        lex: String,
        dt: Option<String>,
        lang: Option<String>,
    },
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::BNode(id) => write!(f, "_:{}", id.trim_start_matches("_:")),
            Term::Literal { lex, dt, lang } => {
                f.write_str("\"")?;
                for c in lex.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")?;
                if let Some(lang) = lang {
                    write!(f, "@{}", lang)?;
                } else if let Some(dt) = dt {
                    write!(f, "^^<{}>", dt)?;
                }
                Ok(())
            }
        }
    }
}

pub(crate) fn push_uvarint(mut v: u64, out: &mut Vec<u8>) {
    loop {
        let mut b = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            b |= 0x80;
        }
        out.push(b);
        if v == 0 {
            break;
        }
    }
}

fn push_str(s: &str, out: &mut Vec<u8>) {
    push_uvarint(s.len() as u64, out);
    out.extend_from_slice(s.as_bytes());
}

/// Split an IRI into (namespace, local name) at the last `#`, else the last `/`.
///
/// ```
/// assert_eq!(
///     rdfz::split_prefix("http://xmlns.com/foaf/0.1/name"),
///     ("http://xmlns.com/foaf/0.1/", "name")
/// );
/// ```
pub fn split_prefix(iri: &str) -> (&str, &str) {
    let cut = iri.rfind('#').or_else(|| iri.rfind('/'));
    match cut {
        Some(i) => iri.split_at(i + 1),
        None => ("", iri),
    }
}

/// Options controlling stream emission.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    /// Compress the body using zstd (requires `zstd` feature).
    pub zstd: bool,
    /// Append a CRC-32 of the body after the EOF packet.
    pub with_crc: bool,
}

impl WriterOptions {
    fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.with_crc {
            flags |= FLAG_CRC;
        }
        if self.zstd {
            flags |= FLAG_ZSTD;
        }
        flags
    }
}

enum Sink<W: Write> {
    Plain(W),
    #[cfg(feature = "zstd")]
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> Sink<W> {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        match self {
            Sink::Plain(w) => w.write_all(buf)?,
            #[cfg(feature = "zstd")]
            Sink::Zstd(e) => e.write_all(buf)?,
        }
        Ok(())
    }

    fn finish(self) -> Result<W> {
        match self {
            Sink::Plain(mut w) => {
                w.flush()?;
                Ok(w)
            }
            #[cfg(feature = "zstd")]
            Sink::Zstd(e) => {
                let mut w = e.finish()?;
                w.flush()?;
                Ok(w)
            }
        }
    }
}

/// Streaming encoder: triples go out as soon as they are added.
///
/// ```
/// use rdfz::{PacketReader, PacketWriter, Term, WriterOptions};
///
/// let mut w = PacketWriter::new(Vec::new(), WriterOptions { zstd: false, with_crc: true }).unwrap();
/// w.add(
///     &Term::Iri("http://example.org/Alice".into()),
///     &Term::Iri("http://xmlns.com/foaf/0.1/name".into()),
///     &Term::Literal { lex: "Alice".into(), dt: None, lang: None },
/// )
/// .unwrap();
/// let bytes = w.finish().unwrap();
/// let triples: Vec<_> = PacketReader::new(&bytes[..]).unwrap().collect::<Result<_, _>>().unwrap();
/// assert_eq!(triples.len(), 1);
/// ```
pub struct PacketWriter<W: Write> {
    sink: Sink<W>,
    crc: Option<Crc32>,
    prefixes: HashMap<String, u64>,
    buf: Vec<u8>,
    n_triples: u64,
}

impl<W: Write> PacketWriter<W> {
    /// Write the stream header to `w` and return a writer for the body.
    pub fn new(mut w: W, opts: WriterOptions) -> Result<Self> {
        w.write_all(&Header::new(opts.flags()).to_bytes())?;
        let sink = if opts.zstd {
            #[cfg(feature = "zstd")]
            {
                Sink::Zstd(zstd::stream::write::Encoder::new(w, 0)?)
            }
            #[cfg(not(feature = "zstd"))]
            {
                return Err(RdfzError::Invalid("zstd feature not enabled"));
            }
        } else {
            Sink::Plain(w)
        };
        Ok(PacketWriter {
            sink,
            crc: opts.with_crc.then(Crc32::default),
            prefixes: HashMap::new(),
            buf: Vec::with_capacity(256),
            n_triples: 0,
        })
    }

    /// Number of triples written so far.
    pub fn triples(&self) -> u64 {
        self.n_triples
    }

    /// Encode one triple.
    pub fn add(&mut self, s: &Term, p: &Term, o: &Term) -> Result<()> {
        self.buf.clear();
        for t in [s, p, o] {
            self.encode_term(t)?;
        }
        self.emit()?;
        self.n_triples += 1;
        Ok(())
    }

    fn encode_iri(&mut self, iri: &str) {
        let (base, local) = split_prefix(iri);
        let id = match self.prefixes.get(base) {
            Some(&id) => id,
            None => {
                let id = self.prefixes.len() as u64;
                push_uvarint(PacketKind::NewPrefix.to_u64(), &mut self.buf);
                push_str(base, &mut self.buf);
                self.prefixes.insert(base.to_string(), id);
                id
            }
        };
        push_uvarint(PacketKind::Iri(id).to_u64(), &mut self.buf);
        push_str(local, &mut self.buf);
    }

    fn encode_term(&mut self, t: &Term) -> Result<()> {
        match t {
            Term::Iri(iri) => self.encode_iri(iri),
            Term::BNode(id) => {
                push_uvarint(PacketKind::BNode.to_u64(), &mut self.buf);
                push_str(id.trim_start_matches("_:"), &mut self.buf);
            }
            Term::Literal { lex, dt, lang } => match (dt, lang) {
                (Some(_), Some(_)) => {
                    return Err(RdfzError::Invalid(
                        "literal has both a datatype and a language",
                    ));
                }
                (None, Some(lang)) => {
                    push_uvarint(PacketKind::LangLiteral.to_u64(), &mut self.buf);
                    push_str(lex, &mut self.buf);
                    push_str(lang, &mut self.buf);
                }
                (Some(dt), None) => {
                    push_uvarint(PacketKind::TypedLiteral.to_u64(), &mut self.buf);
                    push_str(lex, &mut self.buf);
                    self.encode_iri(dt);
                }
                (None, None) => {
                    push_uvarint(PacketKind::Literal.to_u64(), &mut self.buf);
                    push_str(lex, &mut self.buf);
                }
            },
        }
        Ok(())
    }

    fn emit(&mut self) -> Result<()> {
        if let Some(crc) = self.crc.as_mut() {
            crc.update(&self.buf);
        }
        self.sink.write_all(&self.buf)
    }

    /// Write the EOF packet and optional checksum, and return the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.buf.clear();
        push_uvarint(PacketKind::Eof.to_u64(), &mut self.buf);
        self.emit()?;
        if let Some(crc) = self.crc {
            self.sink.write_all(&crc.finish().to_le_bytes())?;
        }
        self.sink.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uvarint_encoding() {
        let mut out = Vec::new();
        push_uvarint(0, &mut out);
        push_uvarint(127, &mut out);
        push_uvarint(300, &mut out);
        assert_eq!(out, vec![0x00, 0x7f, 0xac, 0x02]);
    }

    #[test]
    fn split_prefix_prefers_hash() {
        assert_eq!(
            split_prefix("http://www.w3.org/1999/02/22-rdf-syntax-ns#type"),
            ("http://www.w3.org/1999/02/22-rdf-syntax-ns#", "type")
        );
        assert_eq!(split_prefix("http://ex.org/a/b"), ("http://ex.org/a/", "b"));
        assert_eq!(split_prefix("urn:isbn:1234"), ("", "urn:isbn:1234"));
    }

    #[test]
    fn prefixes_are_declared_once() {
        let mut w = PacketWriter::new(Vec::new(), WriterOptions::default()).unwrap();
        let s = Term::Iri("http://ex.org/s".into());
        let p = Term::Iri("http://ex.org/p".into());
        w.add(&s, &p, &s).unwrap();
        let first = w.finish().unwrap();
        // header, NEW_PREFIX + 3 IRI packets, EOF
        let body = &first[Header::LEN..];
        let new_prefix_count = body
            .iter()
            .filter(|&&b| b == PacketKind::NewPrefix.to_u64() as u8)
            .count();
        assert_eq!(new_prefix_count, 1);
    }

    #[test]
    fn rejects_lang_and_datatype() {
        let mut w = PacketWriter::new(Vec::new(), WriterOptions::default()).unwrap();
        let s = Term::Iri("http://ex.org/s".into());
        let bad = Term::Literal {
            lex: "x".into(),
            dt: Some("http://ex.org/dt".into()),
            lang: Some("en".into()),
        };
        assert!(matches!(w.add(&s, &s, &bad), Err(RdfzError::Invalid(_))));
    }

    #[test]
    fn display_is_ntriples() {
        let t = Term::Literal {
            lex: "a \"q\"\n".into(),
            dt: None,
            lang: Some("en".into()),
        };
        assert_eq!(t.to_string(), "\"a \\\"q\\\"\\n\"@en");
        assert_eq!(Term::BNode("_:b1".into()).to_string(), "_:b1");
    }
}
