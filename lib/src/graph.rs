//! A thread-safe graph: one [`Store`] behind a mutex, a prefix table and a
//! blank node id source.
//!
//! `Graph` is the entry point most callers want. Reads and writes take the
//! store lock for the duration of one call. Multi-step writes such as
//! [`Graph::encode_list`] hold it for the whole operation, so other threads
//! never observe half-built structures. Parsing and serializing go through the
//! pipeline in [`crate::codec`], with the store lock taken only on the calling
//! thread.

use crate::codec::{run_parser, run_serializer, CancelToken, Parser, Serializer};
use crate::config::{Config, StoreKind};
use crate::consts::{member, A, FIRST, LIST, NIL, REST};
use crate::errors::{Error, Result};
#[cfg(feature = "http")]
use crate::fetch::{self, FetchOptions};
use crate::format;
#[cfg(feature = "http")]
use crate::format::Format;
use crate::namespace::{Namespace, PrefixTable};
use crate::nodeid::{Counter, NodeIds};
use crate::store::{AppendStore, Handle, IndexStore, Store};
use crate::term::Term;
use crate::triple::Triple;
use log::{debug, info};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

pub struct Graph<S: Store = IndexStore> {
    store: Mutex<S>,
    prefixes: RwLock<PrefixTable>,
    ids: Box<dyn NodeIds>,
}

impl<S: Store + Default> Graph<S> {
    pub fn new() -> Self {
        Graph::from_store(S::default())
    }
}

impl<S: Store + Default> Default for Graph<S> {
    fn default() -> Self {
        Graph::new()
    }
}

impl Graph<Box<dyn Store>> {
    /// A graph backed by the store kind named in `config`, with its extra
    /// prefixes bound and blank nodes drawn from its prefix.
    pub fn from_config(config: &Config) -> Self {
        let store: Box<dyn Store> = match config.store {
            StoreKind::Append => Box::new(AppendStore::new()),
            StoreKind::Index => Box::new(IndexStore::new()),
        };
        let graph =
            Graph::from_store(store).with_ids(Counter::new(config.blank_node_prefix.as_str()));
        for (base, name) in &config.prefixes {
            graph.bind(base.as_str(), name.as_str());
        }
        graph
    }
}

impl<S: Store> Graph<S> {
    pub fn from_store(store: S) -> Self {
        Graph {
            store: Mutex::new(store),
            prefixes: RwLock::new(PrefixTable::default()),
            ids: Box::new(Counter::default()),
        }
    }

    /// Replace the blank node id source.
    pub fn with_ids(mut self, ids: impl NodeIds + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    // store operations never leave partial state, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bind(&self, base: impl Into<String>, name: impl Into<String>) -> Namespace {
        self.prefixes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .bind(base, name)
    }

    /// A snapshot of the prefix table.
    pub fn prefixes(&self) -> PrefixTable {
        self.prefixes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add(&self, subject: Term, predicate: Term, object: Term) -> Result<Handle> {
        self.add_triple(Triple::new(subject, predicate, object))
    }

    pub fn add_triple(&self, triple: Triple) -> Result<Handle> {
        self.lock().add(triple)
    }

    pub fn remove(&self, subject: Term, predicate: Term, object: Term) -> Result<bool> {
        self.remove_triple(&Triple::new(subject, predicate, object))
    }

    pub fn remove_triple(&self, triple: &Triple) -> Result<bool> {
        self.lock().remove(triple)
    }

    pub fn remove_by_handle(&self, handle: Handle) -> Result<Triple> {
        self.lock().remove_by_handle(handle)
    }

    pub fn clear(&self) {
        let mut store = self.lock();
        debug!("clearing {} triples from {}", store.count(), store.name());
        store.clear();
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn triples(&self) -> Vec<Triple> {
        self.lock().iter().collect()
    }

    pub fn filter(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> Vec<Triple> {
        self.lock().filter(s, p, o).collect()
    }

    /// Run `f` against the store with the lock held, for lazy iteration
    /// without copying.
    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock())
    }

    /// Copy every triple matching the pattern into `target`. Returns the
    /// number copied.
    pub fn filter_subset<T: Store>(
        &self,
        target: &Graph<T>,
        s: Option<&Term>,
        p: Option<&Term>,
        o: Option<&Term>,
    ) -> Result<usize> {
        // snapshot first: target may be self
        let matches = self.filter(s, p, o);
        let mut copied = 0;
        for triple in matches {
            target.add_triple(triple)?;
            copied += 1;
        }
        Ok(copied)
    }

    pub fn has_subject(&self, subject: &Term) -> bool {
        self.lock().filter(Some(subject), None, None).next().is_some()
    }

    /// The first object for `subject` and `predicate`.
    pub fn get(&self, subject: &Term, predicate: &Term) -> Option<Term> {
        first_object(&*self.lock(), subject, predicate)
    }

    pub fn get_all(&self, subject: &Term, predicate: &Term) -> Vec<Term> {
        self.lock()
            .filter(Some(subject), Some(predicate), None)
            .map(|t| t.object)
            .collect()
    }

    pub fn must_get(&self, subject: &Term, predicate: &Term) -> Result<Term> {
        self.get(subject, predicate).ok_or(Error::NotFound)
    }

    pub fn new_blank_node(&self) -> Term {
        Term::BlankNode(self.ids.next_id())
    }

    /// Attach `items` to `subject` as `rdf:_1`, `rdf:_2`, ...
    pub fn encode_container(
        &self,
        subject: &Term,
        items: impl IntoIterator<Item = Term>,
    ) -> Result<()> {
        let mut store = self.lock();
        for (i, item) in items.into_iter().enumerate() {
            store.add(Triple::new(subject.clone(), member(i + 1), item))?;
        }
        Ok(())
    }

    /// Encode `items` as an RDF collection whose head is `subject`.
    ///
    /// Each cell is typed `rdf:List`; cells after the head are fresh blank
    /// nodes and the last `rdf:rest` is `rdf:nil`. An empty sequence adds
    /// nothing.
    pub fn encode_list(
        &self,
        subject: &Term,
        items: impl IntoIterator<Item = Term>,
    ) -> Result<()> {
        let items: Vec<Term> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(());
        }
        let mut cells = vec![subject.clone()];
        cells.extend((1..items.len()).map(|_| self.new_blank_node()));
        cells.push(NIL.clone());

        let mut store = self.lock();
        for (i, item) in items.into_iter().enumerate() {
            let cell = &cells[i];
            store.add(Triple::new(cell.clone(), A.clone(), LIST.clone()))?;
            store.add(Triple::new(cell.clone(), FIRST.clone(), item))?;
            store.add(Triple::new(cell.clone(), REST.clone(), cells[i + 1].clone()))?;
        }
        Ok(())
    }

    /// Members of a container, read from `rdf:_1` up to the first gap.
    pub fn container_items(&self, root: &Term) -> Vec<Term> {
        let store = self.lock();
        (1..)
            .map_while(|n| first_object(&*store, root, &member(n)))
            .collect()
    }

    /// Members of the RDF collection starting at `root`.
    pub fn list_items(&self, root: &Term) -> Result<Vec<Term>> {
        let store = self.lock();
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut cell = root.clone();
        while cell != *NIL {
            if !seen.insert(cell.clone()) {
                return Err(Error::MalformedList(format!("cycle at {}", cell)));
            }
            let first = first_object(&*store, &cell, &FIRST)
                .ok_or_else(|| Error::MalformedList(format!("{} has no rdf:first", cell)))?;
            let rest = first_object(&*store, &cell, &REST)
                .ok_or_else(|| Error::MalformedList(format!("{} has no rdf:rest", cell)))?;
            items.push(first);
            cell = rest;
        }
        Ok(items)
    }

    /// Parse `source` into the store. Returns the number of triples added.
    ///
    /// Triples added before a failure stay in the store. Prefixes the parser
    /// discovers are merged into the graph's table.
    pub fn parse<P, R>(&self, parser: &P, source: R) -> Result<usize>
    where
        P: Parser + ?Sized,
        R: Read + Send,
    {
        self.parse_cancellable(parser, source, &CancelToken::new())
    }

    pub fn parse_cancellable<P, R>(
        &self,
        parser: &P,
        source: R,
        cancel: &CancelToken,
    ) -> Result<usize>
    where
        P: Parser + ?Sized,
        R: Read + Send,
    {
        let mut prefixes = self.prefixes();
        let result = run_parser(parser, source, &mut prefixes, cancel, |triple| {
            self.lock().add(triple).map(|_| ())
        });
        self.prefixes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(&prefixes);
        result
    }

    /// Parse a file, choosing the format from its extension.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let format = format::from_filename(path)
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        let parser = format.parse_fn()?;
        let file = BufReader::new(File::open(path)?);
        let added = self.parse(&parser, file)?;
        info!("Loaded {} triples from {} as {}", added, path.display(), format.id);
        Ok(added)
    }

    /// Fetch `url` and parse the response body with `parser`. `accept` is
    /// sent as the Accept header when given.
    #[cfg(feature = "http")]
    pub fn parse_http<P>(
        &self,
        parser: &P,
        url: &str,
        accept: Option<&str>,
        opts: &FetchOptions,
    ) -> Result<usize>
    where
        P: Parser + ?Sized,
    {
        let body = fetch::get(url, accept, opts)?;
        let added = self.parse(parser, body.as_slice())?;
        info!("Loaded {} triples from {}", added, url);
        Ok(added)
    }

    /// Fetch `url` as `format`, asking for its preferred MIME type.
    #[cfg(feature = "http")]
    pub fn parse_url(&self, url: &str, format: &Format, opts: &FetchOptions) -> Result<usize> {
        let parser = format.parse_fn()?;
        self.parse_http(&parser, url, Some(format.preferred_mime_type), opts)
    }

    /// Look `name` up in the prefix service and bind it.
    #[cfg(feature = "http")]
    pub fn lookup_and_bind(&self, name: &str, opts: &FetchOptions) -> Result<Namespace> {
        let base = fetch::lookup_prefix(name, opts)?;
        debug!("prefix {} resolved to {}", name, base);
        Ok(self.bind(base, name))
    }

    /// Write every triple to `sink` and hand the sink back.
    ///
    /// The store stays locked until the serializer is done.
    pub fn serialize<Z, W>(&self, serializer: &Z, sink: W) -> Result<W>
    where
        Z: Serializer + ?Sized,
        W: Write + Send,
    {
        self.serialize_cancellable(serializer, sink, &CancelToken::new())
    }

    pub fn serialize_cancellable<Z, W>(
        &self,
        serializer: &Z,
        sink: W,
        cancel: &CancelToken,
    ) -> Result<W>
    where
        Z: Serializer + ?Sized,
        W: Write + Send,
    {
        let prefixes = self.prefixes();
        let store = self.lock();
        run_serializer(serializer, sink, &prefixes, cancel, store.iter())
    }

    /// Write a file, choosing the format from its extension.
    pub fn serialize_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = format::from_filename(path)
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        let serializer = format.serialize_fn()?;
        let file = BufWriter::new(File::create(path)?);
        let mut file = self.serialize(&serializer, file)?;
        file.flush()?;
        info!("Wrote {} triples to {} as {}", self.count(), path.display(), format.id);
        Ok(())
    }

    pub fn into_store(self) -> S {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

fn first_object<S: Store + ?Sized>(store: &S, subject: &Term, predicate: &Term) -> Option<Term> {
    store
        .filter(Some(subject), Some(predicate), None)
        .next()
        .map(|t| t.object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ntriples::{parse_ntriples, serialize_ntriples};
    use crate::consts::RDF;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::thread;

    fn ex(local: &str) -> Term {
        Term::resource(format!("http://ex.org/{}", local))
    }

    #[test]
    fn get_and_must_get() {
        let g: Graph = Graph::new();
        g.add(ex("a"), ex("p"), Term::literal("1")).unwrap();
        g.add(ex("a"), ex("p"), Term::literal("2")).unwrap();
        assert_eq!(g.get(&ex("a"), &ex("p")), Some(Term::literal("1")));
        assert_eq!(g.get_all(&ex("a"), &ex("p")).len(), 2);
        assert!(g.has_subject(&ex("a")));
        assert!(!g.has_subject(&ex("b")));
        assert!(matches!(g.must_get(&ex("b"), &ex("p")), Err(Error::NotFound)));
    }

    #[test]
    fn container_roundtrip() {
        let g: Graph<AppendStore> = Graph::new();
        let items = vec![Term::literal("x"), ex("y"), Term::literal("z")];
        g.encode_container(&ex("bag"), items.clone()).unwrap();
        assert_eq!(g.count(), 3);
        assert_eq!(g.get(&ex("bag"), &Term::resource(format!("{}_2", RDF))), Some(ex("y")));
        assert_eq!(g.container_items(&ex("bag")), items);
    }

    #[test]
    fn list_shape_and_decode() {
        let g: Graph = Graph::new();
        let items = vec![Term::literal("1"), Term::literal("2"), Term::literal("3")];
        g.encode_list(&ex("l"), items.clone()).unwrap();
        // three triples per cell
        assert_eq!(g.count(), 9);
        assert_eq!(g.get(&ex("l"), &A), Some(LIST.clone()));
        assert_eq!(g.get(&ex("l"), &REST), Some(Term::blank_node("b0")));
        assert_eq!(g.get(&Term::blank_node("b1"), &REST), Some(NIL.clone()));
        assert_eq!(g.list_items(&ex("l")).unwrap(), items);
    }

    #[test]
    fn empty_list_adds_nothing() {
        let g: Graph = Graph::new();
        g.encode_list(&ex("l"), Vec::new()).unwrap();
        assert_eq!(g.count(), 0);
        assert_eq!(g.list_items(&NIL).unwrap(), Vec::<Term>::new());
    }

    #[test]
    fn malformed_lists_are_reported() {
        let g: Graph = Graph::new();
        g.add(ex("l"), FIRST.clone(), Term::literal("1")).unwrap();
        assert!(matches!(g.list_items(&ex("l")), Err(Error::MalformedList(_))));

        g.add(ex("l"), REST.clone(), ex("l")).unwrap();
        let err = g.list_items(&ex("l")).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn filter_subset_into_self() {
        let g: Graph = Graph::new();
        g.add(ex("a"), ex("p"), ex("b")).unwrap();
        g.add(ex("c"), ex("q"), ex("d")).unwrap();
        assert_eq!(g.filter_subset(&g, None, Some(&ex("p")), None).unwrap(), 1);
        assert_eq!(g.count(), 3);
    }

    #[test]
    fn parse_and_serialize_ntriples() {
        let g: Graph = Graph::new();
        let doc = "<http://ex.org/a> <http://ex.org/p> \"v\" .\n_:x <http://ex.org/p> <http://ex.org/a> .\n";
        assert_eq!(g.parse(&parse_ntriples, doc.as_bytes()).unwrap(), 2);
        let out = g.serialize(&serialize_ntriples, Vec::new()).unwrap();
        let copy: Graph<AppendStore> = Graph::new();
        copy.parse(&parse_ntriples, &out[..]).unwrap();
        let mut a = g.triples();
        let mut b = copy.triples();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn concurrent_adds_are_all_kept() {
        let g: Arc<Graph> = Arc::new(Graph::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let g = Arc::clone(&g);
                thread::spawn(move || {
                    for i in 0..50 {
                        g.add(ex(&format!("s{}", t)), ex("p"), Term::literal(i.to_string()))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(g.count(), 200);
    }

    #[test]
    fn from_config_uses_store_kind_and_prefixes() {
        let config = Config::builder()
            .store(StoreKind::Append)
            .blank_node_prefix("n")
            .prefixes(BTreeMap::from([(
                "http://ex.org/".to_string(),
                "ex".to_string(),
            )]))
            .build()
            .unwrap();
        let g = Graph::from_config(&config);
        assert_eq!(g.with_store(|s| s.name()), "AppendStore");
        assert_eq!(g.prefixes().name_for("http://ex.org/"), Some("ex"));
        assert_eq!(g.new_blank_node(), Term::blank_node("n0"));
        let h = g.add(ex("a"), ex("p"), ex("b")).unwrap();
        assert_eq!(g.remove_by_handle(h).unwrap().subject, ex("a"));
    }
}
