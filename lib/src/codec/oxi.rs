//! Codecs backed by oxigraph's parsers and serializers (Turtle, RDF/XML).

use super::{ErrorSender, TripleReceiver, TripleSender};
use crate::consts::XSD;
use crate::errors::{Error, Result};
use crate::namespace::PrefixTable;
use crate::term::Term;
use crate::triple::Triple;
use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{
    BlankNode, GraphName, Literal, NamedNode, NamedOrBlankNode, Term as OxTerm,
    Triple as OxTriple,
};
use std::io::{BufReader, Read, Write};

fn codec_error(format: &'static str, e: impl std::fmt::Display) -> Error {
    Error::Codec {
        format,
        message: e.to_string(),
    }
}

fn from_ox_subject(s: NamedOrBlankNode) -> Term {
    match s {
        NamedOrBlankNode::NamedNode(nn) => Term::Resource(nn.into_string()),
        NamedOrBlankNode::BlankNode(bn) => Term::BlankNode(bn.into_string()),
    }
}

fn from_ox_literal(lit: Literal) -> Term {
    if let Some(lang) = lit.language() {
        return Term::literal_with_language(lit.value(), lang);
    }
    let dt = lit.datatype().as_str();
    if dt.strip_prefix(XSD) == Some("string") {
        Term::literal(lit.value())
    } else {
        Term::literal_with_datatype(lit.value(), Term::resource(dt))
    }
}

/// Convert an oxigraph term.
#[allow(unreachable_patterns)]
pub fn from_ox_term(t: OxTerm) -> Term {
    match t {
        OxTerm::NamedNode(nn) => Term::Resource(nn.into_string()),
        OxTerm::BlankNode(bn) => Term::BlankNode(bn.into_string()),
        OxTerm::Literal(lit) => from_ox_literal(lit),
        other => Term::Resource(other.to_string()),
    }
}

fn to_ox_named(uri: &str, format: &'static str) -> Result<NamedNode> {
    NamedNode::new(uri).map_err(|e| codec_error(format, e))
}

fn to_ox_subject(t: &Term, format: &'static str) -> Result<NamedOrBlankNode> {
    match t {
        Term::Resource(uri) => Ok(to_ox_named(uri, format)?.into()),
        Term::BlankNode(id) => Ok(BlankNode::new(id.as_str())
            .map_err(|e| codec_error(format, e))?
            .into()),
        Term::Literal { .. } => Err(Error::UnindexableTerm(t.to_string())),
    }
}

/// Convert to an oxigraph term, checking IRI and blank node syntax.
pub fn to_ox_term(t: &Term, format: &'static str) -> Result<OxTerm> {
    t.validate()?;
    Ok(match t {
        Term::Resource(_) | Term::BlankNode(_) => match to_ox_subject(t, format)? {
            NamedOrBlankNode::NamedNode(nn) => nn.into(),
            NamedOrBlankNode::BlankNode(bn) => bn.into(),
        },
        Term::Literal {
            value,
            language,
            datatype,
        } => {
            let lit = if let Some(lang) = language {
                Literal::new_language_tagged_literal(value.as_str(), lang.as_str())
                    .map_err(|e| codec_error(format, e))?
            } else if let Some(dt) = datatype.as_deref().and_then(Term::as_uri) {
                Literal::new_typed_literal(value.as_str(), to_ox_named(dt, format)?)
            } else {
                Literal::new_simple_literal(value.as_str())
            };
            lit.into()
        }
    })
}

fn read_with(
    format: RdfFormat,
    name: &'static str,
    source: &mut (dyn Read + Send),
    triples: &TripleSender,
    prefixes: &mut PrefixTable,
) -> Result<()> {
    let mut parser = RdfParser::from_format(format).for_reader(BufReader::new(source));
    for quad in parser.by_ref() {
        let quad = quad.map_err(|e| codec_error(name, e))?;
        let context = match quad.graph_name {
            GraphName::NamedNode(nn) => Some(Term::Resource(nn.into_string())),
            GraphName::BlankNode(bn) => Some(Term::BlankNode(bn.into_string())),
            GraphName::DefaultGraph => None,
        };
        triples.send(Triple {
            subject: from_ox_subject(quad.subject),
            predicate: Term::Resource(quad.predicate.into_string()),
            object: from_ox_term(quad.object),
            context,
        })?;
    }
    for (prefix, iri) in parser.prefixes() {
        prefixes.bind(iri, prefix);
    }
    Ok(())
}

fn parse_with(
    format: RdfFormat,
    name: &'static str,
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    prefixes: &mut PrefixTable,
) {
    match read_with(format, name, source, &triples, prefixes) {
        Ok(()) | Err(Error::Cancelled) => {}
        Err(e) => errors.report(e),
    }
}

pub fn parse_turtle(
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    prefixes: &mut PrefixTable,
) {
    parse_with(RdfFormat::Turtle, "turtle", source, triples, errors, prefixes)
}

pub fn parse_rdfxml(
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    prefixes: &mut PrefixTable,
) {
    parse_with(RdfFormat::RdfXml, "rdfxml", source, triples, errors, prefixes)
}

fn write_rdfxml(sink: &mut (dyn Write + Send), triples: TripleReceiver) -> Result<()> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::RdfXml).for_writer(&mut *sink);
    for triple in triples {
        let subject = to_ox_subject(&triple.subject, "rdfxml")?;
        let predicate = match &triple.predicate {
            Term::Resource(uri) => to_ox_named(uri, "rdfxml")?,
            other => return Err(Error::UnindexableTerm(other.to_string())),
        };
        let object = to_ox_term(&triple.object, "rdfxml")?;
        serializer.serialize_triple(&OxTriple::new(subject, predicate, object))?;
    }
    serializer.finish()?.flush()?;
    Ok(())
}

/// RDF/XML output; contexts are dropped.
pub fn serialize_rdfxml(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    errors: ErrorSender,
    _prefixes: &PrefixTable,
) {
    if let Err(e) = write_rdfxml(sink, triples) {
        errors.report(e);
    }
}
