//! RDF triples in memory, with interchangeable stores and streaming codecs.
//!
//! ```
//! use trine::codec::ntriples::parse_ntriples;
//! use trine::{Graph, Term};
//!
//! let graph: Graph = Graph::new();
//! let doc = "<http://ex.org/a> <http://ex.org/knows> <http://ex.org/b> .\n";
//! assert_eq!(graph.parse(&parse_ntriples, doc.as_bytes()).unwrap(), 1);
//! let knows = Term::resource("http://ex.org/knows");
//! assert_eq!(
//!     graph.get(&Term::resource("http://ex.org/a"), &knows),
//!     Some(Term::resource("http://ex.org/b"))
//! );
//! ```

extern crate derive_builder;

pub mod codec;
pub mod config;
pub mod consts;
pub mod errors;
#[cfg(feature = "http")]
pub mod fetch;
pub mod format;
pub mod graph;
pub mod loader;
pub mod namespace;
pub mod nodeid;
pub mod store;
pub mod term;
pub mod triple;

pub use errors::{Error, Result};
pub use graph::Graph;
pub use store::{AppendStore, Handle, IndexStore, Store};
pub use term::Term;
pub use triple::Triple;

/// Let `TRINE_LOG` override `RUST_LOG` before a binary initializes its logger.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("TRINE_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
