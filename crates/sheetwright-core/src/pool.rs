//! Shared value pool (the workbook's shared-string table)

use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{Error, Result};

/// Append-only interning table for repeated text values
///
/// Cells reference pooled text by id. Ids are handed out in insertion order
/// starting at 0 and are never reused or renumbered; entries stay in the pool
/// even when no cell references them any more, which matches how the
/// shared-string part of a package is laid out.
#[derive(Debug, Clone, Default)]
pub struct SharedValuePool {
    /// Entries in id order
    entries: Vec<Arc<str>>,
    /// Text -> id lookup for deduplication
    index: AHashMap<Arc<str>, u32>,
}

impl SharedValuePool {
    /// Create a new empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from entries in id order, as stored in a package
    ///
    /// Packages written by other tools may repeat a text. Every entry keeps
    /// its id so existing cell references stay valid; interning the repeated
    /// text afterwards returns the first id.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pool = Self::new();
        for text in entries {
            let text = text.as_ref();
            let id = pool.entries.len() as u32;
            let arc: Arc<str> = Arc::from(text);
            if pool.index.contains_key(text) {
                log::warn!("shared value {} repeats an earlier entry: {:?}", id, text);
            } else {
                pool.index.insert(arc.clone(), id);
            }
            pool.entries.push(arc);
        }
        pool
    }

    /// Get the id for a text, adding it to the pool if it is new
    ///
    /// Equal text always yields the same id; new text gets the next, higher id.
    pub fn intern<S: AsRef<str>>(&mut self, text: S) -> u32 {
        let text = text.as_ref();
        if let Some(&id) = self.index.get(text) {
            return id;
        }

        let id = self.entries.len() as u32;
        let arc: Arc<str> = Arc::from(text);
        self.index.insert(arc.clone(), id);
        self.entries.push(arc);
        id
    }

    /// Resolve an id to its text
    pub fn resolve(&self, id: u32) -> Result<&str> {
        self.get(id)
            .ok_or_else(|| Error::not_found(format!("shared value id {}", id)))
    }

    /// Get the text for an id, if allocated
    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(id as usize).map(|s| s.as_ref())
    }

    /// Look up the id of a text without interning it
    pub fn find(&self, text: &str) -> Option<u32> {
        self.index.get(text).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries with their ids
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, s)| (i as u32, s.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut pool = SharedValuePool::new();

        let a = pool.intern("Hallo");
        let b = pool.intern("Hallo");
        let c = pool.intern("Welt");

        assert_eq!(a, 0);
        assert_eq!(a, b);
        assert_eq!(c, 1);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.resolve(c).unwrap(), "Welt");
    }

    #[test]
    fn test_resolve_unallocated() {
        let pool = SharedValuePool::new();
        assert!(matches!(pool.resolve(0), Err(Error::NotFound(_))));
        assert!(pool.get(3).is_none());
    }

    #[test]
    fn test_from_entries_keeps_ids() {
        let pool = SharedValuePool::from_entries(["a", "b", "a", "c"]);

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.resolve(2).unwrap(), "a");
        assert_eq!(pool.find("a"), Some(0));
        assert_eq!(pool.find("c"), Some(3));
    }

    proptest! {
        #[test]
        fn interning_never_shrinks_or_renumbers(texts in proptest::collection::vec("[a-e]{0,3}", 0..40)) {
            let mut pool = SharedValuePool::new();
            let mut seen: Vec<(String, u32)> = Vec::new();
            let mut last_len = 0;
            let mut highest: Option<u32> = None;

            for text in &texts {
                let id = pool.intern(text);
                match seen.iter().find(|(t, _)| t == text) {
                    Some((_, earlier)) => prop_assert_eq!(*earlier, id),
                    None => {
                        if let Some(h) = highest {
                            prop_assert!(id > h);
                        }
                        highest = Some(id);
                        seen.push((text.clone(), id));
                    }
                }
                prop_assert!(pool.len() >= last_len);
                last_len = pool.len();
            }

            for (text, id) in &seen {
                prop_assert_eq!(pool.resolve(*id).unwrap(), text.as_str());
            }
        }
    }
}
