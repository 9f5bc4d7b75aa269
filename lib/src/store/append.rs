use super::{scan, Handle, Store, Triples};
use crate::errors::{Error, Result};
use crate::term::Term;
use crate::triple::Triple;
use log::debug;

/// Insertion-ordered list of triples.
///
/// `add` is O(1) and returns the position as the handle. Removal shifts every
/// later triple down by one, so handles greater than the removed one now
/// refer to a different triple. Lookups are linear scans.
#[derive(Debug, Default, Clone)]
pub struct AppendStore {
    triples: Vec<Triple>,
}

impl AppendStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The triple currently at `handle`.
    pub fn get(&self, handle: Handle) -> Option<&Triple> {
        self.triples.get(handle.index())
    }
}

impl Store for AppendStore {
    fn name(&self) -> &'static str {
        "AppendStore"
    }

    fn add(&mut self, triple: Triple) -> Result<Handle> {
        self.triples.push(triple);
        Ok(Handle(self.triples.len() - 1))
    }

    fn remove(&mut self, triple: &Triple) -> Result<bool> {
        match self.triples.iter().position(|t| t == triple) {
            Some(i) => {
                self.triples.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_by_handle(&mut self, handle: Handle) -> Result<Triple> {
        if handle.index() >= self.triples.len() {
            return Err(Error::InvalidHandle(handle.index()));
        }
        Ok(self.triples.remove(handle.index()))
    }

    fn clear(&mut self) {
        debug!("clearing {} triples", self.triples.len());
        self.triples.clear();
    }

    fn count(&self) -> usize {
        self.triples.len()
    }

    fn iter(&self) -> Triples<'_> {
        Box::new(self.triples.iter().cloned())
    }

    fn filter(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> Triples<'_> {
        scan(self.iter(), s, p, o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::resource(s), Term::resource(p), Term::literal(o))
    }

    #[test]
    fn handles_are_positions() {
        let mut store = AppendStore::new();
        assert_eq!(store.add(t("a", "p", "1")).unwrap(), Handle(0));
        assert_eq!(store.add(t("b", "p", "2")).unwrap(), Handle(1));
        assert_eq!(store.get(Handle(1)), Some(&t("b", "p", "2")));
    }

    #[test]
    fn remove_by_handle_shifts_later_handles() {
        let mut store = AppendStore::new();
        store.add(t("a", "p", "1")).unwrap();
        store.add(t("b", "p", "2")).unwrap();
        store.add(t("c", "p", "3")).unwrap();

        assert_eq!(store.remove_by_handle(Handle(1)).unwrap(), t("b", "p", "2"));
        // the old handle 2 now lives at 1
        assert_eq!(store.remove_by_handle(Handle(1)).unwrap(), t("c", "p", "3"));
        assert_eq!(store.count(), 1);
        assert!(matches!(
            store.remove_by_handle(Handle(5)),
            Err(Error::InvalidHandle(5))
        ));
    }

    #[test]
    fn remove_takes_first_copy_only() {
        let mut store = AppendStore::new();
        store.add(t("a", "p", "1")).unwrap();
        store.add(t("a", "p", "1")).unwrap();
        assert!(store.remove(&t("a", "p", "1")).unwrap());
        assert_eq!(store.count(), 1);
        assert!(store.remove(&t("a", "p", "1")).unwrap());
        assert!(!store.remove(&t("a", "p", "1")).unwrap());
    }

    #[test]
    fn filter_is_ordered_scan() {
        let mut store = AppendStore::new();
        store.add(t("a", "p", "1")).unwrap();
        store.add(t("b", "q", "1")).unwrap();
        store.add(t("a", "q", "2")).unwrap();
        let hits: Vec<_> = store
            .filter(Some(&Term::resource("a")), None, None)
            .collect();
        assert_eq!(hits, vec![t("a", "p", "1"), t("a", "q", "2")]);
        let hits = store.filter(None, None, Some(&Term::literal("1"))).count();
        assert_eq!(hits, 2);
        store.clear();
        assert_eq!(store.iter().count(), 0);
    }
}
