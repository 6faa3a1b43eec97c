use rand::Rng;

use super::bbox::BoundingBox;
use super::distance::{patch_distance, Score};
use super::image::Pixel;
use super::patch::{Anchor, PatchGrid};

/// Nearest-neighbor field: for each target anchor, the best-known source
/// anchor and its score.
///
/// Sized to the whole image; only entries inside the engine's current box
/// are meaningful.
#[derive(Debug, Clone)]
pub struct NearestNeighborField {
    sources: Vec<Anchor>,
    scores: Vec<Score>,
}

impl NearestNeighborField {
    pub fn new(len: usize) -> Self {
        Self {
            sources: vec![Anchor::default(); len],
            scores: vec![Score::ZERO; len],
        }
    }

    #[inline]
    pub fn source(&self, i: usize) -> Anchor {
        self.sources[i]
    }

    #[inline]
    pub fn score(&self, i: usize) -> Score {
        self.scores[i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, source: Anchor, score: Score) {
        self.sources[i] = source;
        self.scores[i] = score;
    }

    /// Split borrow for rescoring: sources read-only, scores mutable.
    pub fn parts_mut(&mut self) -> (&[Anchor], &mut [Score]) {
        (&self.sources, &mut self.scores)
    }

    /// Seed every anchor in `bbox` with a uniformly random source anchor
    /// outside `bbox` and score it with no cutoff.
    ///
    /// The caller must ensure [`has_source_region`] holds.
    pub fn initialize<R: Rng>(
        &mut self,
        image: &[Pixel],
        mask: &[Pixel],
        grid: &PatchGrid,
        bbox: &BoundingBox,
        rng: &mut R,
    ) {
        debug_assert!(has_source_region(grid, bbox));
        let aw = grid.anchor_width();
        let ah = grid.anchor_height();

        for ay in bbox.y_min..bbox.y_max {
            for ax in bbox.x_min..bbox.x_max {
                let source = loop {
                    let bx = rng.random_range(0..aw);
                    let by = rng.random_range(0..ah);
                    if !bbox.contains(bx, by) {
                        break Anchor::new(bx, by);
                    }
                };
                let target = Anchor::new(ax, ay);
                let score = patch_distance(image, image, mask, grid, target, source, Score::Invalid);
                self.set(grid.anchor_index(target), source, score);
            }
        }
    }
}

/// Whether any valid anchor lies outside `bbox`, i.e. whether a trustworthy
/// source patch exists at all.
pub fn has_source_region(grid: &PatchGrid, bbox: &BoundingBox) -> bool {
    bbox.is_empty()
        || bbox.x_min > 0
        || bbox.y_min > 0
        || bbox.x_max < grid.anchor_width()
        || bbox.y_max < grid.anchor_height()
}
