//! All-pairs collision scan.
//!
//! For each layer, in order: first every ordered pair of distinct collidables
//! inside the layer, then every collidable of the layer against every
//! collidable of each other layer. Both directions of a pair are tested
//! independently and both reactions fire when both tests pass; nothing is
//! deduplicated.
//!
//! Cost is O(n^2) in the total number of collidables per frame. That is the
//! scaling limit of this engine; it targets small scenes. The visiting order is
//! part of the observable behavior (`on_collide` side effects interleave in
//! exactly this order), so it must not be swapped for a broad phase.

use super::entity::{CallbackError, Collidable};
use super::layer::{split_pair, Layer};

/// Scan failure: which layer's pass was running and what the callback returned.
#[derive(Debug)]
pub(crate) struct ScanFailure {
    pub layer: String,
    pub source: CallbackError,
}

impl ScanFailure {
    fn new(layer: &Layer, source: CallbackError) -> Self {
        Self {
            layer: layer.name().to_string(),
            source,
        }
    }
}

/// Runs one full scan and returns how many `on_collide` notifications fired.
/// The first failing `on_collide` aborts the rest of the scan.
pub(crate) fn scan(layers: &mut [Layer]) -> Result<usize, ScanFailure> {
    let mut fired = 0;
    for outer in 0..layers.len() {
        match scan_within(&mut layers[outer]) {
            Ok(count) => fired += count,
            Err(source) => return Err(ScanFailure::new(&layers[outer], source)),
        }

        for other in 0..layers.len() {
            let Some((source_layer, target_layer)) = split_pair(layers, outer, other) else {
                continue;
            };
            match scan_between(source_layer, target_layer) {
                Ok(count) => fired += count,
                Err(source) => return Err(ScanFailure::new(source_layer, source)),
            }
        }
    }
    Ok(fired)
}

fn scan_within(layer: &mut Layer) -> Result<usize, CallbackError> {
    let count = layer.collidable_count();
    let mut fired = 0;
    for source in 0..count {
        for target in 0..count {
            let Some((source, target)) = layer.collidable_pair(source, target) else {
                continue;
            };
            fired += notify(source, target)?;
        }
    }
    Ok(fired)
}

fn scan_between(source_layer: &mut Layer, target_layer: &Layer) -> Result<usize, CallbackError> {
    let mut fired = 0;
    for source in 0..source_layer.collidable_count() {
        for target in 0..target_layer.collidable_count() {
            let (Some(source), Some(target)) = (
                source_layer.collidable_mut(source),
                target_layer.collidable(target),
            ) else {
                continue;
            };
            fired += notify(source, target)?;
        }
    }
    Ok(fired)
}

fn notify(source: &mut dyn Collidable, target: &dyn Collidable) -> Result<usize, CallbackError> {
    if !source.collides_with(target) {
        return Ok(0);
    }
    source.on_collide(target)?;
    Ok(1)
}
