//! Tiled pre-generation of the whole coverage area.
//!
//! The coverage rectangle, grown by a chunk-aligned margin, is cut into square
//! tiles of chunks. Tiles are requested from the host one at a time, row by
//! row; the next request is only issued once the previous tile's completion
//! callback has fired, at which point that tile is durable. Abandoning the
//! run between tiles therefore never leaves a tile half-written.

use std::sync::mpsc;

use chrono::{DateTime, Duration, Local};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::host::{ChunkArea, PregenHost};
use crate::raster::CoverageRect;

/// Progress notification, emitted once per integer-percent change.
#[derive(Clone, Debug, PartialEq)]
pub struct PregenProgress {
    pub done: usize,
    pub total: usize,
    pub percent: u32,
    pub elapsed: Duration,
}

pub type ProgressSink = Box<dyn FnMut(&PregenProgress)>;

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct PregenReport {
    pub tiles: usize,
    pub chunks: usize,
    pub started: DateTime<Local>,
    pub elapsed: Duration,
}

/// Cut the padded coverage into row-major tiles of at most
/// `tile_chunks x tile_chunks` chunks.
pub fn plan_tiles(
    coverage: CoverageRect,
    chunk_size: i32,
    tile_chunks: i32,
    padding_chunks: i32,
) -> Vec<ChunkArea> {
    let tile = tile_chunks.max(1);
    let pad = padding_chunks.max(0);
    let (min_cx, min_cz, max_cx, max_cz) = coverage.chunk_bounds(chunk_size);
    let (min_cx, min_cz, max_cx, max_cz) = (min_cx - pad, min_cz - pad, max_cx + pad, max_cz + pad);

    let mut tiles = Vec::new();
    let mut cz = min_cz;
    while cz < max_cz {
        let mut cx = min_cx;
        while cx < max_cx {
            tiles.push(ChunkArea::new(cx, cz, (cx + tile).min(max_cx), (cz + tile).min(max_cz)));
            cx += tile;
        }
        cz += tile;
    }
    tiles
}

fn log_progress(progress: &PregenProgress) {
    log::info!(
        "Pre-generation {}% ({}/{} tiles, {}s)",
        progress.percent,
        progress.done,
        progress.total,
        progress.elapsed.num_seconds()
    );
}

pub struct PregenScheduler {
    tiles: Vec<ChunkArea>,
    sink: ProgressSink,
}

impl PregenScheduler {
    pub fn new(coverage: CoverageRect, config: &OverlayConfig) -> Self {
        Self::from_tiles(plan_tiles(
            coverage,
            config.chunk_size,
            config.pregen_tile_chunks,
            config.pregen_padding_chunks,
        ))
    }

    pub fn from_tiles(tiles: Vec<ChunkArea>) -> Self {
        Self {
            tiles,
            sink: Box::new(log_progress),
        }
    }

    /// Replace the default logging sink.
    pub fn with_sink(mut self, sink: ProgressSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn tiles(&self) -> &[ChunkArea] {
        &self.tiles
    }

    pub fn total_chunks(&self) -> usize {
        self.tiles.iter().map(ChunkArea::chunk_count).sum()
    }

    /// Materialize every tile. The world is suspended for the duration and
    /// resumed afterwards, also when a tile fails.
    pub fn run(mut self, host: &mut dyn PregenHost) -> Result<PregenReport> {
        let started = Local::now();
        let total = self.tiles.len();
        let total_chunks = self.total_chunks();
        log::info!("Pre-generating {} chunks in {} tiles", total_chunks, total);

        host.suspend_world();
        let (sender, receiver) = mpsc::channel();
        let mut last_percent = None;
        let mut failure = None;

        for (done, &tile) in self.tiles.iter().enumerate() {
            log::debug!("Requesting tile {:?}", tile);
            let sender = sender.clone();
            host.materialize(
                tile,
                Box::new(move |result| {
                    let _ = sender.send(result);
                }),
            );

            match receiver.recv() {
                Ok(Ok(())) => {}
                Ok(Err(msg)) => {
                    failure = Some(OverlayError::Host(msg));
                    break;
                }
                Err(_) => {
                    failure = Some(OverlayError::Host("completion callback dropped".to_string()));
                    break;
                }
            }

            let done = done + 1;
            let percent = (done * 100 / total) as u32;
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                (self.sink)(&PregenProgress {
                    done,
                    total,
                    percent,
                    elapsed: Local::now() - started,
                });
            }
        }

        host.resume_world();

        if let Some(err) = failure {
            log::error!("Pre-generation stopped: {}", err);
            return Err(err);
        }
        let elapsed = Local::now() - started;
        log::info!("Pre-generation finished in {}s", elapsed.num_seconds());
        Ok(PregenReport {
            tiles: total,
            chunks: total_chunks,
            started,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryWorld, MemoryWorldConfig};
    use crate::host::Completion;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_plan_tiles_pads_and_clips() {
        // 100 blocks = chunks 0..4 with 32-block chunks; padding -> -1..5.
        let tiles = plan_tiles(CoverageRect::new(0, 0, 100, 100), 32, 4, 1);
        assert_eq!(
            tiles,
            vec![
                ChunkArea::new(-1, -1, 3, 3),
                ChunkArea::new(3, -1, 5, 3),
                ChunkArea::new(-1, 3, 3, 5),
                ChunkArea::new(3, 3, 5, 5),
            ]
        );
        let chunks: usize = tiles.iter().map(ChunkArea::chunk_count).sum();
        assert_eq!(chunks, 36);
    }

    /// Host that records calls and completes immediately.
    #[derive(Default)]
    struct RecordingHost {
        requests: Vec<ChunkArea>,
        events: Vec<&'static str>,
        fail_at: Option<usize>,
    }

    impl PregenHost for RecordingHost {
        fn materialize(&mut self, area: ChunkArea, done: Completion) {
            let index = self.requests.len();
            self.requests.push(area);
            self.events.push("materialize");
            if self.fail_at == Some(index) {
                done(Err("disk full".to_string()));
            } else {
                done(Ok(()));
            }
        }

        fn suspend_world(&mut self) {
            self.events.push("suspend");
        }

        fn resume_world(&mut self) {
            self.events.push("resume");
        }
    }

    fn grid_tiles(n: i32) -> Vec<ChunkArea> {
        (0..n).map(|i| ChunkArea::new(i, 0, i + 1, 1)).collect()
    }

    #[test]
    fn test_progress_only_on_percent_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = Rc::clone(&seen);
        let mut host = RecordingHost::default();

        let report = PregenScheduler::from_tiles(grid_tiles(250))
            .with_sink(Box::new(move |p| sink_seen.borrow_mut().push(p.percent)))
            .run(&mut host)
            .unwrap();

        let seen = seen.borrow();
        // 0%..=100%, each exactly once.
        assert_eq!(seen.len(), 101);
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(report.tiles, 250);
        assert_eq!(report.chunks, 250);
    }

    #[test]
    fn test_requests_are_sequential_and_bracketed() {
        let mut host = RecordingHost::default();
        PregenScheduler::from_tiles(grid_tiles(3))
            .with_sink(Box::new(|_| {}))
            .run(&mut host)
            .unwrap();
        assert_eq!(
            host.events,
            vec!["suspend", "materialize", "materialize", "materialize", "resume"]
        );
        assert_eq!(host.requests, grid_tiles(3));
    }

    #[test]
    fn test_failure_stops_and_resumes() {
        let mut host = RecordingHost {
            fail_at: Some(1),
            ..Default::default()
        };
        let err = PregenScheduler::from_tiles(grid_tiles(5))
            .with_sink(Box::new(|_| {}))
            .run(&mut host)
            .unwrap_err();
        assert!(matches!(err, OverlayError::Host(_)));
        assert_eq!(host.requests.len(), 2);
        assert_eq!(host.events.last(), Some(&"resume"));
    }

    #[test]
    fn test_memory_world_pregen() {
        let config = MemoryWorldConfig {
            size_x: 256,
            size_z: 256,
            world_height: 96,
            sea_level: 40,
            blocks_per_region: 128,
            ..Default::default()
        };
        let mut world = MemoryWorld::new(config);
        let overlay = OverlayConfig {
            pregen_tile_chunks: 2,
            ..Default::default()
        };
        let scheduler = PregenScheduler::new(CoverageRect::new(0, 0, 64, 64), &overlay).with_sink(Box::new(|_| {}));
        assert_eq!(scheduler.total_chunks(), 16);

        scheduler.run(&mut world).unwrap();
        assert_eq!(world.chunk_count(), 16);
        assert!(world.chunk(-1, -1).is_some());
        assert!(world.chunk(2, 2).is_some());
        assert!(!world.is_suspended());
        assert_eq!(world.suspensions(), 1);
    }
}
