//! Triple containers and the pattern-matching contract they share.
//!
//! A [`Store`] owns triples and answers single-pattern lookups. Two
//! implementations ship with the crate:
//!
//! - [`AppendStore`]: an insertion-ordered list with index-addressable handles.
//! - [`IndexStore`]: a subject → predicate → objects index that answers
//!   lookups with a known subject without scanning.
//!
//! Both return the same multiset of triples for every pattern; only the cost
//! differs. Iteration is lazy and borrows the store, so a consumer can stop
//! early without leaving anything behind.

mod append;
mod index;

pub use append::AppendStore;
pub use index::IndexStore;

use crate::errors::Result;
use crate::term::Term;
use crate::triple::Triple;

/// Lazy, finite, single-pass sequence of triples borrowed from a store.
pub type Triples<'a> = Box<dyn Iterator<Item = Triple> + 'a>;

/// Opaque reference to a stored triple, returned by [`Store::add`].
///
/// For an [`AppendStore`] the handle is the triple's position, and every
/// removal shifts the handles after it down by one. Stores that do not keep
/// positions return [`Handle::DETACHED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub usize);

impl Handle {
    pub const DETACHED: Handle = Handle(usize::MAX);

    pub fn index(self) -> usize {
        self.0
    }
}

pub trait Store: Send {
    /// Short name used in capability errors and logs.
    fn name(&self) -> &'static str;

    fn add(&mut self, triple: Triple) -> Result<Handle>;

    /// Remove one copy of `triple`. Returns whether anything was removed.
    fn remove(&mut self, triple: &Triple) -> Result<bool>;

    /// Remove and return the triple at `handle`.
    fn remove_by_handle(&mut self, handle: Handle) -> Result<Triple>;

    fn clear(&mut self);

    fn count(&self) -> usize;

    fn iter(&self) -> Triples<'_>;

    /// Triples matching every given term; `None` matches anything.
    fn filter(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> Triples<'_>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn add(&mut self, triple: Triple) -> Result<Handle> {
        (**self).add(triple)
    }
    fn remove(&mut self, triple: &Triple) -> Result<bool> {
        (**self).remove(triple)
    }
    fn remove_by_handle(&mut self, handle: Handle) -> Result<Triple> {
        (**self).remove_by_handle(handle)
    }
    fn clear(&mut self) {
        (**self).clear()
    }
    fn count(&self) -> usize {
        (**self).count()
    }
    fn iter(&self) -> Triples<'_> {
        (**self).iter()
    }
    fn filter(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> Triples<'_> {
        (**self).filter(s, p, o)
    }
}

/// Brute-force filter over any triple sequence.
///
/// This is the reference every indexed lookup must agree with.
pub fn scan<'a>(
    triples: Triples<'a>,
    s: Option<&Term>,
    p: Option<&Term>,
    o: Option<&Term>,
) -> Triples<'a> {
    let (s, p, o) = (s.cloned(), p.cloned(), o.cloned());
    Box::new(triples.filter(move |t| t.matches(s.as_ref(), p.as_ref(), o.as_ref())))
}
