use super::{scan, Handle, Store, Triples};
use crate::errors::{Error, Result};
use crate::term::Term;
use crate::triple::Triple;
use log::debug;
use std::collections::BTreeMap;

/// What the index keeps for each stored triple under its subject and predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Posting {
    object: Term,
    context: Option<Term>,
}

type PredicateIndex = BTreeMap<String, Vec<Posting>>;

/// Two-level index: subject key → predicate key → postings.
///
/// Keys are `"_:" + id` for blank nodes and the IRI for resources. Literal
/// subjects and predicates have no key, nor do resources whose IRI starts
/// with `_:` (the key would read back as a blank node): `add` rejects them
/// and lookups for them match nothing. Duplicates are kept. Handles are not
/// tracked, so [`Store::remove_by_handle`] fails with [`Error::Unsupported`].
///
/// Lookups never create index entries.
#[derive(Debug, Default, Clone)]
pub struct IndexStore {
    index: BTreeMap<String, PredicateIndex>,
}

fn encode_key(term: &Term) -> Option<String> {
    match term {
        Term::Resource(uri) if uri.starts_with("_:") => None,
        Term::Resource(uri) => Some(uri.clone()),
        Term::BlankNode(id) => Some(format!("_:{}", id)),
        Term::Literal { .. } => None,
    }
}

fn decode_key(key: &str) -> Term {
    match key.strip_prefix("_:") {
        Some(id) => Term::BlankNode(id.to_string()),
        None => Term::Resource(key.to_string()),
    }
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct subjects.
    pub fn subjects(&self) -> usize {
        self.index.len()
    }

    fn postings(&self, s: &Term, p: &Term) -> Option<&Vec<Posting>> {
        let sk = encode_key(s)?;
        let pk = encode_key(p)?;
        self.index.get(&sk)?.get(&pk)
    }

    fn filter_sp(&self, s: &Term, p: &Term, o: Option<&Term>) -> Triples<'_> {
        let Some(postings) = self.postings(s, p) else {
            return Box::new(std::iter::empty());
        };
        let (s, p, o) = (s.clone(), p.clone(), o.cloned());
        Box::new(
            postings
                .iter()
                .filter(move |posting| o.as_ref().map_or(true, |o| *o == posting.object))
                .map(move |posting| Triple {
                    subject: s.clone(),
                    predicate: p.clone(),
                    object: posting.object.clone(),
                    context: posting.context.clone(),
                }),
        )
    }

    fn filter_s(&self, s: &Term, o: Option<&Term>) -> Triples<'_> {
        let Some(predicates) = encode_key(s).and_then(|sk| self.index.get(&sk)) else {
            return Box::new(std::iter::empty());
        };
        let (s, o) = (s.clone(), o.cloned());
        Box::new(predicates.iter().flat_map(move |(pk, postings)| {
            let predicate = decode_key(pk);
            let s = s.clone();
            let o = o.clone();
            postings
                .iter()
                .filter(move |posting| o.as_ref().map_or(true, |o| *o == posting.object))
                .map(move |posting| Triple {
                    subject: s.clone(),
                    predicate: predicate.clone(),
                    object: posting.object.clone(),
                    context: posting.context.clone(),
                })
        }))
    }
}

impl Store for IndexStore {
    fn name(&self) -> &'static str {
        "IndexStore"
    }

    fn add(&mut self, triple: Triple) -> Result<Handle> {
        let sk = encode_key(&triple.subject)
            .ok_or_else(|| Error::UnindexableTerm(triple.subject.to_string()))?;
        let pk = encode_key(&triple.predicate)
            .ok_or_else(|| Error::UnindexableTerm(triple.predicate.to_string()))?;
        self.index
            .entry(sk)
            .or_default()
            .entry(pk)
            .or_default()
            .push(Posting {
                object: triple.object,
                context: triple.context,
            });
        Ok(Handle::DETACHED)
    }

    fn remove(&mut self, triple: &Triple) -> Result<bool> {
        let (Some(sk), Some(pk)) = (encode_key(&triple.subject), encode_key(&triple.predicate))
        else {
            return Ok(false);
        };
        let Some(predicates) = self.index.get_mut(&sk) else {
            return Ok(false);
        };
        let Some(postings) = predicates.get_mut(&pk) else {
            return Ok(false);
        };
        let Some(pos) = postings
            .iter()
            .position(|p| p.object == triple.object && p.context == triple.context)
        else {
            return Ok(false);
        };
        postings.remove(pos);
        if postings.is_empty() {
            predicates.remove(&pk);
            if predicates.is_empty() {
                self.index.remove(&sk);
            }
        }
        Ok(true)
    }

    fn remove_by_handle(&mut self, _handle: Handle) -> Result<Triple> {
        Err(Error::Unsupported {
            store: "IndexStore",
            operation: "remove_by_handle",
        })
    }

    fn clear(&mut self) {
        debug!("clearing index of {} subjects", self.index.len());
        self.index.clear();
    }

    fn count(&self) -> usize {
        self.index
            .values()
            .flat_map(|predicates| predicates.values())
            .map(Vec::len)
            .sum()
    }

    fn iter(&self) -> Triples<'_> {
        Box::new(self.index.iter().flat_map(|(sk, predicates)| {
            let subject = decode_key(sk);
            predicates.iter().flat_map(move |(pk, postings)| {
                let subject = subject.clone();
                let predicate = decode_key(pk);
                postings.iter().map(move |posting| Triple {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object: posting.object.clone(),
                    context: posting.context.clone(),
                })
            })
        }))
    }

    fn filter(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> Triples<'_> {
        match (s, p, o) {
            (None, None, None) => self.iter(),
            (Some(s), Some(p), o) => self.filter_sp(s, p, o),
            (Some(s), None, o) => self.filter_s(s, o),
            _ => scan(self.iter(), s, p, o),
        }
    }
}
