//! Cached spatial sampling of block and entity counts around an actor.
//!
//! The scanner samples at most once per `interval` engine ticks and
//! conditions read the cached counts in between, so the cache may be up to
//! `interval` ticks stale.
//!
//! A sample is built into fresh maps and swapped in with a single
//! assignment; a reader never sees a half-updated cache. Cells and entities
//! the accessor cannot resolve are skipped rather than counted.

use std::collections::BTreeMap;

use ambience_types::{Extent, Region};
use tracing::trace;

use crate::accessor::Accessor;
use crate::config::ScannerConfig;

/// Counts gathered in one sampling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanData {
    /// Block id → number of cells in the block region.
    pub blocks: BTreeMap<String, u32>,
    /// Entity type id → number of entities in the entity region.
    pub entities: BTreeMap<String, u32>,
    /// Engine tick the sample was taken at.
    pub sampled_at: u64,
    /// Cells the accessor could not resolve.
    pub skipped_cells: u32,
}

/// Per-actor sampler with its cached result.
#[derive(Debug, Clone)]
pub struct Scanner {
    block_extent: Extent,
    entity_extent: Extent,
    interval: u64,
    data: Option<ScanData>,
}

impl Scanner {
    /// Create a scanner that has never sampled.
    pub const fn new(config: &ScannerConfig) -> Self {
        Self {
            block_extent: config.block_extent(),
            entity_extent: config.entity_extent(),
            interval: config.interval,
            data: None,
        }
    }

    /// Whether a sample is due at tick `now`.
    pub fn is_due(&self, now: u64) -> bool {
        self.data
            .as_ref()
            .is_none_or(|data| now.saturating_sub(data.sampled_at) >= self.interval)
    }

    /// Sample around the actor if the interval has elapsed.
    ///
    /// Returns `true` when a new sample replaced the cache.
    pub fn refresh(&mut self, now: u64, accessor: &dyn Accessor) -> bool {
        if !self.is_due(now) {
            return false;
        }
        let sample = self.sample(now, accessor);
        trace!(
            tick = now,
            block_kinds = sample.blocks.len(),
            entity_kinds = sample.entities.len(),
            skipped = sample.skipped_cells,
            "Scanner sampled"
        );
        self.data = Some(sample);
        true
    }

    /// Take one full sample, ignoring the interval.
    fn sample(&self, now: u64, accessor: &dyn Accessor) -> ScanData {
        let center = accessor.position().block_pos();

        let mut blocks: BTreeMap<String, u32> = BTreeMap::new();
        let mut skipped_cells: u32 = 0;
        let block_region = Region::centered(center, self.block_extent);
        for cell in block_region.cells() {
            match accessor.block(cell) {
                Some(block) => increment(&mut blocks, block),
                None => skipped_cells = skipped_cells.saturating_add(1),
            }
        }

        let mut entities: BTreeMap<String, u32> = BTreeMap::new();
        let entity_region = Region::centered(center, self.entity_extent);
        for entity in accessor.entities_in(&entity_region) {
            if let Some(kind) = accessor.entity_type(entity) {
                increment(&mut entities, kind);
            }
        }

        ScanData {
            blocks,
            entities,
            sampled_at: now,
            skipped_cells,
        }
    }

    /// Cached block counts, `None` if never sampled.
    pub fn block_data(&self) -> Option<&BTreeMap<String, u32>> {
        self.data.as_ref().map(|data| &data.blocks)
    }

    /// Cached entity counts, `None` if never sampled.
    pub fn entity_data(&self) -> Option<&BTreeMap<String, u32>> {
        self.data.as_ref().map(|data| &data.entities)
    }

    /// The whole cached sample, `None` if never sampled.
    pub const fn data(&self) -> Option<&ScanData> {
        self.data.as_ref()
    }
}

fn increment(counts: &mut BTreeMap<String, u32>, key: String) {
    let slot = counts.entry(key).or_insert(0);
    *slot = slot.saturating_add(1);
}
