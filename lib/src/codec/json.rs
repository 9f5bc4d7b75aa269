//! RDF/JSON: `{ subject: { predicate: [ object, ... ] } }`.
//!
//! Subjects are keyed by IRI or by `_:id` for blank nodes. Contexts are not
//! represented.

use super::{ErrorSender, TripleReceiver, TripleSender};
use crate::errors::{Error, Result};
use crate::namespace::PrefixTable;
use crate::term::Term;
use crate::triple::Triple;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufReader, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ObjectKind {
    Uri,
    Bnode,
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct JsonObject {
    #[serde(rename = "type")]
    kind: ObjectKind,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
}

type Document = BTreeMap<String, BTreeMap<String, Vec<JsonObject>>>;

fn key(term: &Term) -> Result<String> {
    match term {
        Term::Resource(uri) => Ok(uri.clone()),
        Term::BlankNode(id) => Ok(format!("_:{}", id)),
        Term::Literal { .. } => Err(Error::UnindexableTerm(term.to_string())),
    }
}

fn from_key(key: &str) -> Term {
    match key.strip_prefix("_:") {
        Some(id) => Term::blank_node(id),
        None => Term::resource(key),
    }
}

impl JsonObject {
    fn from_term(term: &Term) -> Result<Self> {
        term.validate()?;
        Ok(match term {
            Term::Resource(uri) => JsonObject {
                kind: ObjectKind::Uri,
                value: uri.clone(),
                lang: None,
                datatype: None,
            },
            Term::BlankNode(id) => JsonObject {
                kind: ObjectKind::Bnode,
                value: format!("_:{}", id),
                lang: None,
                datatype: None,
            },
            Term::Literal {
                value,
                language,
                datatype,
            } => JsonObject {
                kind: ObjectKind::Literal,
                value: value.clone(),
                lang: language.clone(),
                datatype: datatype.as_deref().and_then(Term::as_uri).map(str::to_string),
            },
        })
    }

    fn into_term(self) -> Term {
        match self.kind {
            ObjectKind::Uri => Term::Resource(self.value),
            ObjectKind::Bnode => from_key(&self.value),
            ObjectKind::Literal => Term::Literal {
                value: self.value,
                language: self.lang,
                datatype: self.datatype.map(|dt| Box::new(Term::Resource(dt))),
            },
        }
    }
}

fn read_document(source: &mut (dyn Read + Send), triples: &TripleSender) -> Result<()> {
    let doc: Document = serde_json::from_reader(BufReader::new(source))?;
    for (subject, predicates) in doc {
        let subject = from_key(&subject);
        for (predicate, objects) in predicates {
            let predicate = Term::resource(predicate);
            for object in objects {
                triples.send(Triple::new(
                    subject.clone(),
                    predicate.clone(),
                    object.into_term(),
                ))?;
            }
        }
    }
    Ok(())
}

pub fn parse_json(
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    _prefixes: &mut PrefixTable,
) {
    match read_document(source, &triples) {
        Ok(()) | Err(Error::Cancelled) => {}
        Err(e) => errors.report(e),
    }
}

fn write_document(sink: &mut (dyn Write + Send), triples: TripleReceiver) -> Result<()> {
    let mut doc = Document::new();
    for triple in triples {
        triple.validate()?;
        let object = JsonObject::from_term(&triple.object)?;
        doc.entry(key(&triple.subject)?)
            .or_default()
            .entry(key(&triple.predicate)?)
            .or_default()
            .push(object);
    }
    serde_json::to_writer_pretty(&mut *sink, &doc)?;
    sink.write_all(b"\n")?;
    sink.flush()?;
    Ok(())
}

pub fn serialize_json(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    errors: ErrorSender,
    _prefixes: &PrefixTable,
) {
    if let Err(e) = write_document(sink, triples) {
        errors.report(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{run_parser, run_serializer, CancelToken};

    #[test]
    fn writes_talis_layout() {
        let triples = vec![
            Triple::new(
                Term::resource("http://ex/s"),
                Term::resource("http://ex/p"),
                Term::literal_with_language("chat", "fr"),
            ),
            Triple::new(
                Term::resource("http://ex/s"),
                Term::resource("http://ex/p"),
                Term::blank_node("b1"),
            ),
        ];
        let out = run_serializer(
            &serialize_json,
            Vec::new(),
            &PrefixTable::default(),
            &CancelToken::new(),
            triples,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "http://ex/s": {
                    "http://ex/p": [
                        {"type": "literal", "value": "chat", "lang": "fr"},
                        {"type": "bnode", "value": "_:b1"}
                    ]
                }
            })
        );
    }

    #[test]
    fn reads_typed_literals_and_blank_subjects() {
        let doc = r#"{"_:x": {"http://ex/p": [
            {"type": "literal", "value": "1", "datatype": "http://www.w3.org/2001/XMLSchema#integer"},
            {"type": "uri", "value": "http://ex/o"}
        ]}}"#;
        let mut got = Vec::new();
        let n = run_parser(
            &parse_json,
            doc.as_bytes(),
            &mut PrefixTable::default(),
            &CancelToken::new(),
            |t| {
                got.push(t);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(n, 2);
        assert_eq!(got[0].subject, Term::blank_node("x"));
        assert_eq!(
            got[0].object,
            Term::literal_with_datatype(
                "1",
                Term::resource("http://www.w3.org/2001/XMLSchema#integer")
            )
        );
        assert_eq!(got[1].object, Term::resource("http://ex/o"));
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = run_parser(
            &parse_json,
            &b"{not json"[..],
            &mut PrefixTable::default(),
            &CancelToken::new(),
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
