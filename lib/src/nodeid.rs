//! Sources of fresh blank node identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Produces blank node ids that are unique for the lifetime of the source.
///
/// Ids start with an ASCII letter followed by letters and digits, so they are
/// valid blank node labels in every text format.
pub trait NodeIds: Send + Sync {
    fn next_id(&self) -> String;
}

/// Sequential ids: `b0`, `b1`, ... with a configurable prefix.
#[derive(Debug)]
pub struct Counter {
    prefix: String,
    next: AtomicU64,
}

impl Counter {
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix: String = prefix
            .into()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if !prefix.starts_with(|c: char| c.is_ascii_alphabetic()) {
            prefix.insert(0, 'b');
        }
        Counter {
            prefix,
            next: AtomicU64::new(0),
        }
    }
}

impl Default for Counter {
    fn default() -> Self {
        Counter::new("b")
    }
}

impl NodeIds for Counter {
    fn next_id(&self) -> String {
        format!("{}{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Random 64-bit ids, for graphs that will be merged with others.
#[derive(Debug, Default)]
pub struct RandomIds;

impl NodeIds for RandomIds {
    fn next_id(&self) -> String {
        format!("r{:016x}", rand::random::<u64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn counter_is_sequential() {
        let c = Counter::default();
        assert_eq!(c.next_id(), "b0");
        assert_eq!(c.next_id(), "b1");
    }

    #[test]
    fn counter_sanitizes_prefix() {
        assert_eq!(Counter::new("node_").next_id(), "node0");
        assert_eq!(Counter::new("9x").next_id(), "b9x0");
        assert_eq!(Counter::new("").next_id(), "b0");
    }

    #[test]
    fn random_ids_are_labels() {
        let r = RandomIds;
        let ids: HashSet<String> = (0..100).map(|_| r.next_id()).collect();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.starts_with('r')
            && id.chars().all(|c| c.is_ascii_alphanumeric())));
    }
}
