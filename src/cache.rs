use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::seq::IteratorRandom;

use crate::compiled::CompiledExpression;

/// Bounded cache from source expression to its compiled form, keyed by the
/// raw expression string. Ported from the reference `Parser`'s `_cache`:
/// once the cache grows past `max_size`, half its entries are evicted at
/// random rather than by any recency tracking.
pub struct CompileCache {
    entries: RwLock<HashMap<String, Arc<CompiledExpression>>>,
    max_size: usize,
}

const DEFAULT_MAX_SIZE: usize = 64;

impl CompileCache {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_size,
        }
    }

    pub fn get(&self, source: &str) -> Option<Arc<CompiledExpression>> {
        self.entries.read().get(source).cloned()
    }

    /// Insert a freshly compiled expression, evicting half the cache at
    /// random if this insertion pushes it past `max_size`.
    pub fn insert(&self, source: String, compiled: Arc<CompiledExpression>) {
        let mut entries = self.entries.write();
        entries.insert(source, compiled);
        if entries.len() > self.max_size {
            free_half_at_random(&mut entries);
        }
    }

    /// Clear the cache entirely.
    pub fn purge(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::new()
    }
}

fn free_half_at_random(entries: &mut HashMap<String, Arc<CompiledExpression>>) {
    let mut rng = rand::thread_rng();
    let to_remove: Vec<String> = entries
        .keys()
        .cloned()
        .choose_multiple(&mut rng, entries.len() / 2);
    for key in to_remove {
        entries.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;

    fn dummy(source: &str) -> Arc<CompiledExpression> {
        Arc::new(CompiledExpression::new(source, Ast::Identity))
    }

    #[test]
    fn miss_then_hit() {
        let cache = CompileCache::new();
        assert!(cache.get("foo").is_none());
        cache.insert("foo".to_string(), dummy("foo"));
        assert!(cache.get("foo").is_some());
    }

    #[test]
    fn purge_clears_everything() {
        let cache = CompileCache::new();
        cache.insert("foo".to_string(), dummy("foo"));
        cache.purge();
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_keeps_size_bounded() {
        let cache = CompileCache::with_max_size(4);
        for i in 0..20 {
            let source = format!("expr{}", i);
            cache.insert(source.clone(), dummy(&source));
        }
        assert!(cache.len() <= 5);
    }
}
