//! Registry of the serialization formats this crate can read and write.

use crate::codec::{json, ntriples, rdfz, turtle, ParseFn, SerializeFn};
use crate::errors::{Error, Result};
use lazy_static::lazy_static;
use std::fmt;
use std::path::Path;

/// A named format with its MIME types, file extensions and codecs.
///
/// Extensions are stored without the leading dot.
#[derive(Clone, Copy)]
pub struct Format {
    pub id: &'static str,
    pub name: &'static str,
    pub preferred_mime_type: &'static str,
    pub preferred_extension: &'static str,
    pub other_mime_types: &'static [&'static str],
    pub other_extensions: &'static [&'static str],
    pub parser: Option<ParseFn>,
    pub serializer: Option<SerializeFn>,
}

impl Format {
    pub fn mime_types(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.preferred_mime_type).chain(self.other_mime_types.iter().copied())
    }

    pub fn extensions(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.preferred_extension).chain(self.other_extensions.iter().copied())
    }

    pub fn parse_fn(&self) -> Result<ParseFn> {
        self.parser.ok_or_else(|| Error::Codec {
            format: self.id,
            message: "no parser available".to_string(),
        })
    }

    pub fn serialize_fn(&self) -> Result<SerializeFn> {
        self.serializer.ok_or_else(|| Error::Codec {
            format: self.id,
            message: "no serializer available".to_string(),
        })
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format")
            .field("id", &self.id)
            .field("preferred_mime_type", &self.preferred_mime_type)
            .field("preferred_extension", &self.preferred_extension)
            .field("parser", &self.parser.is_some())
            .field("serializer", &self.serializer.is_some())
            .finish()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Format {}

fn registry() -> Vec<Format> {
    #[cfg_attr(not(feature = "oxigraph"), allow(unused_mut))]
    let mut turtle = Format {
        id: "turtle",
        name: "Turtle",
        preferred_mime_type: "text/turtle",
        preferred_extension: "ttl",
        other_mime_types: &["application/x-turtle"],
        other_extensions: &[],
        parser: None,
        serializer: Some(turtle::serialize_turtle),
    };
    #[cfg_attr(not(feature = "oxigraph"), allow(unused_mut))]
    let mut rdfxml = Format {
        id: "rdfxml",
        name: "RDF/XML",
        preferred_mime_type: "application/rdf+xml",
        preferred_extension: "rdf",
        other_mime_types: &["application/xml", "text/xml"],
        other_extensions: &["xml", "owl"],
        parser: None,
        serializer: None,
    };
    #[cfg(feature = "oxigraph")]
    {
        use crate::codec::oxi;
        turtle.parser = Some(oxi::parse_turtle);
        rdfxml.parser = Some(oxi::parse_rdfxml);
        rdfxml.serializer = Some(oxi::serialize_rdfxml);
    }

    vec![
        Format {
            id: "ntriples",
            name: "N-Triples",
            preferred_mime_type: "application/n-triples",
            preferred_extension: "nt",
            other_mime_types: &["text/plain", "text/ntriples", "text/x-ntriples"],
            other_extensions: &["txt"],
            parser: Some(ntriples::parse_ntriples),
            serializer: Some(ntriples::serialize_ntriples),
        },
        Format {
            id: "nquads",
            name: "N-Quads",
            preferred_mime_type: "application/n-quads",
            preferred_extension: "nq",
            other_mime_types: &["text/x-nquads"],
            other_extensions: &[],
            parser: Some(ntriples::parse_nquads),
            serializer: Some(ntriples::serialize_nquads),
        },
        turtle,
        rdfxml,
        Format {
            id: "json",
            name: "RDF/JSON",
            preferred_mime_type: "application/rdf+json",
            preferred_extension: "json",
            other_mime_types: &["application/json", "text/json"],
            other_extensions: &["rj"],
            parser: Some(json::parse_json),
            serializer: Some(json::serialize_json),
        },
        Format {
            id: "rdfz",
            name: "Compressed RDF",
            preferred_mime_type: "application/x-rdf-compressed",
            preferred_extension: "rdfz",
            other_mime_types: &[],
            other_extensions: &[],
            parser: Some(rdfz::parse_rdfz),
            serializer: Some(rdfz::serialize_rdfz),
        },
    ]
}

lazy_static! {
    static ref FORMATS: Vec<Format> = registry();
}

/// Every registered format, in registration order.
pub fn all() -> &'static [Format] {
    &FORMATS
}

pub fn by_id(id: &str) -> Option<&'static Format> {
    FORMATS.iter().find(|f| f.id.eq_ignore_ascii_case(id))
}

/// Like [`by_id`], but failing with [`Error::UnknownFormat`].
pub fn require(id: &str) -> Result<&'static Format> {
    by_id(id).ok_or_else(|| Error::UnknownFormat(id.to_string()))
}

/// Look up a MIME type, ignoring parameters such as `; charset=utf-8`.
pub fn from_mime_type(mime: &str) -> Option<&'static Format> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    FORMATS
        .iter()
        .find(|f| f.mime_types().any(|m| m.eq_ignore_ascii_case(essence)))
}

/// Look up the extension of `path`.
pub fn from_filename(path: impl AsRef<Path>) -> Option<&'static Format> {
    let ext = path.as_ref().extension()?.to_str()?;
    FORMATS
        .iter()
        .find(|f| f.extensions().any(|e| e.eq_ignore_ascii_case(ext)))
}

pub fn parsers() -> impl Iterator<Item = &'static Format> {
    FORMATS.iter().filter(|f| f.parser.is_some())
}

pub fn serializers() -> impl Iterator<Item = &'static Format> {
    FORMATS.iter().filter(|f| f.serializer.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_lookup_ignores_parameters_and_case() {
        assert_eq!(from_mime_type("text/turtle; charset=utf-8").unwrap().id, "turtle");
        assert_eq!(from_mime_type("Application/RDF+XML").unwrap().id, "rdfxml");
        assert_eq!(from_mime_type("text/plain").unwrap().id, "ntriples");
        assert!(from_mime_type("image/png").is_none());
    }

    #[test]
    fn filename_lookup() {
        assert_eq!(from_filename("data/people.NT").unwrap().id, "ntriples");
        assert_eq!(from_filename("x.nq").unwrap().id, "nquads");
        assert_eq!(from_filename("onto.owl").unwrap().id, "rdfxml");
        assert_eq!(from_filename("dump.rdfz").unwrap().id, "rdfz");
        assert!(from_filename("README").is_none());
        assert!(from_filename("a.csv").is_none());
    }

    #[test]
    fn serializers_are_listed_by_serializer() {
        let ids: Vec<_> = serializers().map(|f| f.id).collect();
        assert!(ids.contains(&"turtle"));
        assert!(ids.contains(&"json"));
        assert!(serializers().all(|f| f.serialize_fn().is_ok()));
        assert!(parsers().all(|f| f.parse_fn().is_ok()));
    }

    #[cfg(feature = "oxigraph")]
    #[test]
    fn every_format_parses_with_oxigraph() {
        assert_eq!(parsers().count(), all().len());
    }

    #[test]
    fn require_reports_unknown() {
        assert!(require("NTriples").is_ok());
        assert!(matches!(require("csv"), Err(Error::UnknownFormat(id)) if id == "csv"));
    }
}
