//! Guarded-stage combinator.

use std::sync::Arc;

use crate::host::{ChunkColumn, ChunkHandler};
use crate::raster::CoverageRect;

/// Wrap `handler` so it only runs for chunks accepted by `predicate`.
pub fn guarded<P>(predicate: P, handler: ChunkHandler) -> ChunkHandler
where
    P: Fn(&dyn ChunkColumn) -> bool + Send + Sync + 'static,
{
    Arc::new(move |chunk: &mut dyn ChunkColumn| {
        if predicate(&*chunk) {
            handler(chunk);
        }
    })
}

/// Predicate: the chunk's inclusive block rectangle overlaps `coverage`.
pub fn intersects_coverage(
    coverage: CoverageRect,
) -> impl Fn(&dyn ChunkColumn) -> bool + Send + Sync + Clone + 'static {
    move |chunk: &dyn ChunkColumn| {
        let (x0, z0, x1, z1) = chunk.bounds();
        coverage.intersects_inclusive(x0, z0, x1, z1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryChunk;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_guard_skips_outside_chunks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler: ChunkHandler = Arc::new(move |_: &mut dyn ChunkColumn| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let guard = guarded(intersects_coverage(CoverageRect::new(0, 0, 64, 64)), handler);

        let mut inside = MemoryChunk::new(1, 1, 32, 64);
        let mut edge = MemoryChunk::new(-1, 0, 32, 64);
        let mut outside = MemoryChunk::new(2, 0, 32, 64);
        guard(&mut inside);
        guard(&mut outside);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Chunk -1 spans x in [-32, -1]: no overlap with x >= 0.
        guard(&mut edge);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_partial_overlap_counts() {
        let predicate = intersects_coverage(CoverageRect::new(31, 31, 2, 2));
        assert!(predicate(&MemoryChunk::new(0, 0, 32, 64)));
        assert!(predicate(&MemoryChunk::new(1, 1, 32, 64)));
        assert!(!predicate(&MemoryChunk::new(2, 0, 32, 64)));
    }
}
