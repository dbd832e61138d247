//! Named input bindings supplied at execution time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use compgraph_core::source::TableSource;

/// Maps input names to re-openable tables. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Bindings {
    tables: HashMap<String, Arc<dyn TableSource>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bind; a later bind of the same name replaces the earlier.
    pub fn bind(mut self, name: impl Into<String>, table: impl TableSource + 'static) -> Self {
        self.insert(name, Arc::new(table));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Arc<dyn TableSource>) {
        self.tables.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn TableSource>> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.names() {
            if let Some(table) = self.tables.get(name) {
                map.entry(&name, &table.describe());
            }
        }
        map.finish()
    }
}
