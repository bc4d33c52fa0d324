//! Named, ordered generation handlers per host stage.
//!
//! The host runs, per region, every region handler once its own maps exist;
//! per chunk column, every column handler and then each [`Pass`] in order.
//! Handlers are addressed by name so an integration can insert ahead of,
//! remove, or wrap specific host handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ChunkColumn, MapRegion};

/// Chunk generation passes, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pass {
    /// Raw terrain: rock and water columns
    Terrain,
    /// Strata, soils, ore deposits, caves
    TerrainFeatures,
    /// Plants, trees and surface decoration
    Vegetation,
    /// Sunlight flooding across neighbouring chunks
    Lighting,
    /// Final bookkeeping before the chunk is saved
    PreDone,
}

impl Pass {
    pub fn all() -> &'static [Self] {
        &[
            Self::Terrain,
            Self::TerrainFeatures,
            Self::Vegetation,
            Self::Lighting,
            Self::PreDone,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::TerrainFeatures => "terrain_features",
            Self::Vegetation => "vegetation",
            Self::Lighting => "lighting",
            Self::PreDone => "pre_done",
        }
    }
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub type ChunkHandler = Arc<dyn Fn(&mut dyn ChunkColumn) + Send + Sync>;
pub type RegionHandler = Arc<dyn Fn(&mut MapRegion) + Send + Sync>;

/// A handler and the name it is addressed by.
#[derive(Clone)]
pub struct Named<H> {
    pub name: String,
    pub handler: H,
}

impl<H> Named<H> {
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

/// Ordered handler lists for region maps, column heights and every pass.
#[derive(Clone, Default)]
pub struct PassRegistry {
    region: Vec<Named<RegionHandler>>,
    columns: Vec<Named<ChunkHandler>>,
    passes: BTreeMap<Pass, Vec<Named<ChunkHandler>>>,
}

impl PassRegistry {
    /// Registry exposing every pass.
    pub fn new() -> Self {
        Self::with_passes(Pass::all())
    }

    /// Registry exposing only the given passes.
    pub fn with_passes(passes: &[Pass]) -> Self {
        Self {
            region: Vec::new(),
            columns: Vec::new(),
            passes: passes.iter().map(|&p| (p, Vec::new())).collect(),
        }
    }

    pub fn has_pass(&self, pass: Pass) -> bool {
        self.passes.contains_key(&pass)
    }

    // -------------------------------------------------------------------------
    // chunk passes
    // -------------------------------------------------------------------------

    /// Returns `false` if the host does not expose `pass`.
    pub fn insert_first(&mut self, pass: Pass, name: impl Into<String>, handler: ChunkHandler) -> bool {
        match self.passes.get_mut(&pass) {
            Some(list) => {
                list.insert(0, Named::new(name, handler));
                true
            }
            None => false,
        }
    }

    /// Insert at `index`, clamped to the list length.
    pub fn insert_at(
        &mut self,
        pass: Pass,
        index: usize,
        name: impl Into<String>,
        handler: ChunkHandler,
    ) -> bool {
        match self.passes.get_mut(&pass) {
            Some(list) => {
                let index = index.min(list.len());
                list.insert(index, Named::new(name, handler));
                true
            }
            None => false,
        }
    }

    pub fn append(&mut self, pass: Pass, name: impl Into<String>, handler: ChunkHandler) -> bool {
        match self.passes.get_mut(&pass) {
            Some(list) => {
                list.push(Named::new(name, handler));
                true
            }
            None => false,
        }
    }

    /// Remove every handler called `name`; returns how many were removed.
    pub fn remove(&mut self, pass: Pass, name: &str) -> usize {
        match self.passes.get_mut(&pass) {
            Some(list) => {
                let before = list.len();
                list.retain(|h| h.name != name);
                before - list.len()
            }
            None => 0,
        }
    }

    pub fn names(&self, pass: Pass) -> Vec<&str> {
        self.passes
            .get(&pass)
            .map(|list| list.iter().map(|h| h.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Replace each handler of `pass` for which `select` is true with
    /// `wrap(handler)`, keeping its name and position.
    pub fn map_handlers(
        &mut self,
        pass: Pass,
        select: impl Fn(&str) -> bool,
        mut wrap: impl FnMut(ChunkHandler) -> ChunkHandler,
    ) -> usize {
        let Some(list) = self.passes.get_mut(&pass) else {
            return 0;
        };
        let mut wrapped = 0;
        for named in list.iter_mut() {
            if select(&named.name) {
                named.handler = wrap(named.handler.clone());
                wrapped += 1;
            }
        }
        wrapped
    }

    pub fn run_pass(&self, pass: Pass, chunk: &mut dyn ChunkColumn) {
        if let Some(list) = self.passes.get(&pass) {
            for named in list {
                (named.handler)(chunk);
            }
        }
    }

    // -------------------------------------------------------------------------
    // column heights
    // -------------------------------------------------------------------------

    pub fn insert_column_first(&mut self, name: impl Into<String>, handler: ChunkHandler) {
        self.columns.insert(0, Named::new(name, handler));
    }

    pub fn append_column(&mut self, name: impl Into<String>, handler: ChunkHandler) {
        self.columns.push(Named::new(name, handler));
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|h| h.name.as_str()).collect()
    }

    pub fn run_columns(&self, chunk: &mut dyn ChunkColumn) {
        for named in &self.columns {
            (named.handler)(chunk);
        }
    }

    // -------------------------------------------------------------------------
    // region maps
    // -------------------------------------------------------------------------

    pub fn append_region(&mut self, name: impl Into<String>, handler: RegionHandler) {
        self.region.push(Named::new(name, handler));
    }

    pub fn region_names(&self) -> Vec<&str> {
        self.region.iter().map(|h| h.name.as_str()).collect()
    }

    pub fn run_region(&self, region: &mut MapRegion) {
        for named in &self.region {
            (named.handler)(region);
        }
    }
}

impl std::fmt::Debug for PassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("PassRegistry");
        dbg.field("region", &self.region_names());
        dbg.field("columns", &self.column_names());
        for pass in self.passes.keys() {
            dbg.field(pass.name(), &self.names(*pass));
        }
        dbg.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn noop() -> ChunkHandler {
        Arc::new(|_: &mut dyn ChunkColumn| {})
    }

    #[test]
    fn test_ordering_operations() {
        let mut registry = PassRegistry::new();
        registry.append(Pass::Terrain, "b", noop());
        registry.append(Pass::Terrain, "c", noop());
        registry.insert_first(Pass::Terrain, "a", noop());
        registry.insert_at(Pass::Terrain, 1, "a2", noop());
        assert_eq!(registry.names(Pass::Terrain), vec!["a", "a2", "b", "c"]);

        assert_eq!(registry.remove(Pass::Terrain, "b"), 1);
        assert_eq!(registry.remove(Pass::Terrain, "missing"), 0);
        assert_eq!(registry.names(Pass::Terrain), vec!["a", "a2", "c"]);
    }

    #[test]
    fn test_missing_pass_slot() {
        let mut registry = PassRegistry::with_passes(&[Pass::Terrain]);
        assert!(!registry.has_pass(Pass::Vegetation));
        assert!(!registry.append(Pass::Vegetation, "x", noop()));
        assert!(registry.names(Pass::Vegetation).is_empty());
    }

    #[test]
    fn test_region_handlers_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PassRegistry::new();
        for name in ["first", "second"] {
            let log = Arc::clone(&log);
            registry.append_region(
                name,
                Arc::new(move |_: &mut MapRegion| log.lock().unwrap().push(name)),
            );
        }
        registry.run_region(&mut MapRegion::new(0, 0));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(registry.region_names(), vec!["first", "second"]);
    }
}
