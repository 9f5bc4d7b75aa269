//! The RDF term model: resources, blank nodes and literals.

use crate::errors::{Error, Result};
use std::fmt;

/// A node or value in a triple.
///
/// Terms are immutable values; equality, ordering and hashing are structural
/// (a literal's datatype is compared as a term).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// A node identified by an IRI.
    Resource(String),
    /// An anonymous node, unique within one graph.
    BlankNode(String),
    /// A value, optionally tagged with a language or typed by a resource.
    Literal {
        value: String,
        language: Option<String>,
        datatype: Option<Box<Term>>,
    },
}

impl Term {
    pub fn resource(uri: impl Into<String>) -> Self {
        Term::Resource(uri.into())
    }

    pub fn blank_node(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn literal_with_language(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    pub fn literal_with_datatype(value: impl Into<String>, datatype: Term) -> Self {
        Term::Literal {
            value: value.into(),
            language: None,
            datatype: Some(Box::new(datatype)),
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Term::Resource(_))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// The IRI of a resource.
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Term::Resource(uri) => Some(uri),
            _ => None,
        }
    }

    /// The lexical value of a literal.
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Term::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Check the invariants that construction does not enforce.
    ///
    /// A literal may carry a language or a datatype, never both, and a
    /// datatype must be a resource.
    pub fn validate(&self) -> Result<()> {
        if let Term::Literal {
            language, datatype, ..
        } = self
        {
            if language.is_some() && datatype.is_some() {
                return Err(Error::MalformedLiteral(self.to_string()));
            }
            if let Some(dt) = datatype {
                if !dt.is_resource() {
                    return Err(Error::MalformedLiteral(self.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Write `s` with N-Triples string escapes.
pub(crate) fn escape_into(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04X}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

/// N-Triples syntax.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Resource(uri) => write!(f, "<{}>", uri),
            Term::BlankNode(id) => write!(f, "_:{}", id),
            Term::Literal {
                value,
                language,
                datatype,
            } => {
                f.write_str("\"")?;
                escape_into(f, value)?;
                f.write_str("\"")?;
                if let Some(lang) = language {
                    write!(f, "@{}", lang)?;
                }
                if let Some(dt) = datatype {
                    write!(f, "^^{}", dt)?;
                }
                Ok(())
            }
        }
    }
}

impl From<rdfz::Term> for Term {
    fn from(t: rdfz::Term) -> Self {
        match t {
            rdfz::Term::Iri(iri) => Term::Resource(iri),
            rdfz::Term::BNode(id) => Term::BlankNode(id),
            rdfz::Term::Literal { lex, dt, lang } => Term::Literal {
                value: lex,
                language: lang,
                datatype: dt.map(|dt| Box::new(Term::Resource(dt))),
            },
        }
    }
}

impl TryFrom<&Term> for rdfz::Term {
    type Error = Error;

    fn try_from(t: &Term) -> Result<Self> {
        t.validate()?;
        Ok(match t {
            Term::Resource(uri) => rdfz::Term::Iri(uri.clone()),
            Term::BlankNode(id) => rdfz::Term::BNode(id.clone()),
            Term::Literal {
                value,
                language,
                datatype,
            } => rdfz::Term::Literal {
                lex: value.clone(),
                lang: language.clone(),
                dt: datatype
                    .as_deref()
                    .and_then(Term::as_uri)
                    .map(str::to_string),
            },
        })
    }
}
