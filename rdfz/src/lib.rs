//! rdfz — prefix-compressed streaming packet format for RDF triples.
//!
//! A stream is an 8-byte header followed by a body of packets. Each IRI is
//! split into a namespace and a local name; namespaces are declared once with
//! a `NEW_PREFIX` packet and referenced by number afterwards, which keeps
//! typical vocabularies small even without compression. The body can
//! optionally be zstd-compressed and protected by a trailing CRC-32.
//!
//! Quick start
//!
//! ```
//! use rdfz::{PacketReader, PacketWriter, Term, WriterOptions};
//!
//! let mut w = PacketWriter::new(Vec::new(), WriterOptions::default()).expect("header");
//! w.add(
//!     &Term::Iri("http://example.org/Alice".into()),
//!     &Term::Iri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type".into()),
//!     &Term::Iri("http://xmlns.com/foaf/0.1/Person".into()),
//! )
//! .expect("add");
//! let bytes = w.finish().expect("finish");
//!
//! for triple in PacketReader::new(&bytes[..]).expect("open") {
//!     let (s, p, o) = triple.expect("decode");
//!     println!("{} {} {} .", s, p, o);
//! }
//! ```

pub mod header;
pub mod reader;
pub mod writer;

pub use reader::{PacketReader, RdfzError};
pub use writer::{PacketWriter, Term, WriterOptions, split_prefix};

/// Crate-level result type using the reader error.
pub type Result<T> = std::result::Result<T, crate::reader::RdfzError>;
