use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::correction::{LambertianKernel, ViewingConditions};
use crate::lut::LutError;

use super::pixel::{PixelInputs, RetrievalResult};
use super::retrieval::AerosolRetriever;

/// One pixel of a tile: the retrieval inputs plus the viewing scalars the
/// legacy kernel needs.
#[derive(Debug, Clone)]
pub struct ScenePixel {
    pub inputs: PixelInputs,
    pub view: ViewingConditions,
}

/// Runs a retriever over tiles of pixels.
///
/// Inside a tile pixels are processed sequentially so the warm-start hint
/// can carry from one pixel to the next; tiles are independent and mapped
/// in parallel. Cancellation is cooperative: the flag is checked once per
/// tile, never mid-tile.
#[derive(Debug)]
pub struct SceneProcessor<K> {
    retriever: AerosolRetriever<K>,
    cancel: Arc<AtomicBool>,
}

impl<K: LambertianKernel + Sync> SceneProcessor<K> {
    pub fn new(retriever: AerosolRetriever<K>) -> Self {
        SceneProcessor {
            retriever,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn retriever(&self) -> &AerosolRetriever<K> {
        &self.retriever
    }

    /// Shared flag that stops tile processing when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Processes one tile sequentially, carrying the warm-start hint
    /// across pixels.
    pub fn process_tile(&self, pixels: &[ScenePixel]) -> Result<Vec<RetrievalResult>, LutError> {
        let mut iaots = 0;
        let mut results = Vec::with_capacity(pixels.len());

        for pixel in pixels {
            let result = self.retriever.retrieve(&pixel.inputs, &pixel.view, iaots)?;
            iaots = result.iaots;
            results.push(result);
        }

        Ok(results)
    }

    /// Processes tiles in parallel. Tiles reached after cancellation come
    /// back as `None`; already-started tiles run to completion.
    pub fn process_tiles(
        &self,
        tiles: &[Vec<ScenePixel>],
    ) -> Result<Vec<Option<Vec<RetrievalResult>>>, LutError> {
        tiles
            .par_iter()
            .map(|tile| {
                if self.cancel.load(Ordering::Relaxed) {
                    return Ok(None);
                }
                self.process_tile(tile).map(Some)
            })
            .collect()
    }
}
