//! Namespaces and the prefix table shared between a graph and its codecs.

use crate::consts::RDF;
use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use rdfz::split_prefix;

/// A namespace base IRI; `get` mints terms inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(base: impl Into<String>) -> Self {
        Namespace(base.into())
    }

    pub fn base(&self) -> &str {
        &self.0
    }

    /// `base + local` as a resource.
    pub fn get(&self, local: &str) -> Term {
        Term::Resource(format!("{}{}", self.0, local))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Mapping from namespace base IRIs to short prefix names.
///
/// Codecs read it to abbreviate IRIs and parsers add the bindings they
/// discover. A name belongs to at most one base. Iteration is ordered by
/// base, so output is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct PrefixTable {
    bindings: BTreeMap<String, String>,
}

impl From<BTreeMap<String, String>> for PrefixTable {
    fn from(bindings: BTreeMap<String, String>) -> Self {
        let mut t = PrefixTable::empty();
        for (base, name) in bindings {
            t.bind(base, name);
        }
        t
    }
}

impl From<PrefixTable> for BTreeMap<String, String> {
    fn from(t: PrefixTable) -> Self {
        t.bindings
    }
}

impl Default for PrefixTable {
    /// A table with only `rdf` bound.
    fn default() -> Self {
        let mut t = PrefixTable::empty();
        t.bind(RDF, "rdf");
        t
    }
}

fn is_local_name(local: &str) -> bool {
    !local.is_empty()
        && !local.ends_with('.')
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        && local.chars().next().map_or(false, |c| c != '-' && c != '.')
}

impl PrefixTable {
    pub fn empty() -> Self {
        PrefixTable {
            bindings: BTreeMap::new(),
        }
    }

    /// Bind `name` to `base`, replacing any previous name for that base.
    /// A base previously bound to `name` loses its binding.
    pub fn bind(&mut self, base: impl Into<String>, name: impl Into<String>) -> Namespace {
        let base = base.into();
        let name = name.into();
        self.bindings.retain(|b, n| *n != name || *b == base);
        self.bindings.insert(base.clone(), name);
        Namespace(base)
    }

    pub fn name_for(&self, base: &str) -> Option<&str> {
        self.bindings.get(base).map(String::as_str)
    }

    pub fn base_for(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(b, _)| b.as_str())
    }

    /// Abbreviate `uri` to `name:local` if its namespace is bound and the
    /// local part is usable in a prefixed name.
    pub fn shrink(&self, uri: &str) -> Option<String> {
        let (base, local) = split_prefix(uri);
        let name = self.bindings.get(base)?;
        if !is_local_name(local) {
            return None;
        }
        Some(format!("{}:{}", name, local))
    }

    /// Expand `name:local` using the table.
    pub fn expand(&self, prefixed: &str) -> Option<String> {
        let (name, local) = prefixed.split_once(':')?;
        self.base_for(name).map(|base| format!("{}{}", base, local))
    }

    /// Add every binding of `other`; on conflict `other` wins.
    pub fn merge(&mut self, other: &PrefixTable) {
        for (base, name) in &other.bindings {
            self.bind(base.as_str(), name.as_str());
        }
    }

    /// `(base, name)` pairs ordered by base.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(b, n)| (b.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
