//! Well-known namespace bases and the RDF vocabulary terms used internally
//! for containers and lists.

use crate::term::Term;
use lazy_static::lazy_static;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCT: &str = "http://purl.org/dc/terms/";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Bases and conventional prefix names, in the order `trine formats` prints them.
pub const WELL_KNOWN_PREFIXES: [(&str, &str); 7] = [
    (RDF, "rdf"),
    (RDFS, "rdfs"),
    (OWL, "owl"),
    (FOAF, "foaf"),
    (DC, "dc"),
    (DCT, "dct"),
    (XSD, "xsd"),
];

lazy_static! {
    /// rdf:type
    pub static ref A: Term = Term::resource(format!("{}type", RDF));
    pub static ref FIRST: Term = Term::resource(format!("{}first", RDF));
    pub static ref REST: Term = Term::resource(format!("{}rest", RDF));
    pub static ref NIL: Term = Term::resource(format!("{}nil", RDF));
    pub static ref LIST: Term = Term::resource(format!("{}List", RDF));
}

/// The container membership property `rdf:_n`.
pub fn member(n: usize) -> Term {
    Term::resource(format!("{}_{}", RDF, n))
}
