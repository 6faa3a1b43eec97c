use log::{debug, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::InpaintConfig;
use crate::error::InpaintError;

use super::bbox::{hole_bounding_box, BoundingBox};
use super::blend::{blend, Accumulator};
use super::image::RgbImage;
use super::nnf::{has_source_region, NearestNeighborField};
use super::patch::PatchGrid;
use super::refine::refine;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0;

/// Engine lifecycle. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Finished,
}

/// Snapshot of an engine's progress.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Progress {
    pub iterations: u32,
    pub expected_iterations: u32,
    /// Heuristic estimate; may exceed 100.
    pub percent_complete: f64,
    pub finished: bool,
}

/// PatchMatch inpainting engine.
///
/// Construction seeds a random nearest-neighbor field over the hole's
/// bounding box; each [`advance`](Inpainter::advance) refines the field,
/// blends matched patches into the hole and shrinks the box, until no hole
/// pixels remain.
pub struct Inpainter {
    image: RgbImage,
    mask: RgbImage,
    grid: PatchGrid,
    nnf: NearestNeighborField,
    accum: Accumulator,
    bbox: BoundingBox,
    rng: Pcg32,
    iterations: u32,
    expected_iterations: u32,
    state: State,
}

impl Inpainter {
    /// Create an engine with the default seed.
    pub fn new(source: RgbImage, mask: RgbImage, patch_size: u32) -> Result<Self, InpaintError> {
        Self::with_rng(source, mask, patch_size, Pcg32::seed_from_u64(DEFAULT_SEED))
    }

    /// Create an engine from a configuration's patch size and seed.
    pub fn with_config(
        source: RgbImage,
        mask: RgbImage,
        config: &InpaintConfig,
    ) -> Result<Self, InpaintError> {
        Self::with_rng(source, mask, config.patch_size, Pcg32::seed_from_u64(config.seed))
    }

    /// Create an engine that draws all randomness from `rng`.
    pub fn with_rng(
        source: RgbImage,
        mask: RgbImage,
        patch_size: u32,
        mut rng: Pcg32,
    ) -> Result<Self, InpaintError> {
        let (width, height) = (source.width, source.height);
        if mask.width != width || mask.height != height {
            return Err(InpaintError::DimensionMismatch {
                source_width: width,
                source_height: height,
                mask_width: mask.width,
                mask_height: mask.height,
            });
        }
        if patch_size == 0 || patch_size > width || patch_size > height {
            return Err(InpaintError::InvalidPatchSize {
                patch_size,
                width,
                height,
            });
        }
        let len = checked_buffer_len(width, height)?;
        for (which, image) in [("source", &source), ("mask", &mask)] {
            if image.buf.len() != len {
                return Err(InpaintError::BufferLength {
                    which,
                    width,
                    height,
                    len: image.buf.len(),
                });
            }
        }

        let grid = PatchGrid::new(width as usize, height as usize, patch_size as usize);
        let bbox = hole_bounding_box(&mask.buf, &grid, &BoundingBox::full(grid.width, grid.height));
        let mut nnf = NearestNeighborField::new(len);

        let state = if bbox.is_empty() {
            State::Finished
        } else if !has_source_region(&grid, &bbox) {
            warn!("hole box {bbox:?} covers every patch position; nothing to copy from");
            State::Finished
        } else {
            nnf.initialize(&source.buf, &mask.buf, &grid, &bbox, &mut rng);
            State::Running
        };

        let expected_iterations =
            3 + (bbox.width().max(bbox.height()) / (3 * grid.size)) as u32;
        debug!(
            "inpainter {width}x{height} patch {patch_size}: box {bbox:?}, {} hole pixels, \
             expect {expected_iterations} iterations",
            mask.hole_count()
        );

        Ok(Self {
            image: source,
            mask,
            grid,
            nnf,
            accum: Accumulator::new(len),
            bbox,
            rng,
            iterations: 0,
            expected_iterations,
            state,
        })
    }

    /// Run one refinement + blend iteration. Does nothing once finished.
    pub fn advance(&mut self) {
        if self.state == State::Finished {
            return;
        }

        let reverse = self.iterations % 2 == 1;
        refine(
            &mut self.nnf,
            &self.image.buf,
            &self.mask.buf,
            &self.grid,
            &self.bbox,
            reverse,
            &mut self.rng,
        );
        let blended = blend(
            &mut self.nnf,
            &mut self.accum,
            &self.image.buf,
            &self.mask.buf,
            &self.grid,
            &self.bbox,
        );
        self.image.buf = blended.image;
        self.mask.buf = blended.mask;
        self.iterations += 1;

        let next = hole_bounding_box(&self.mask.buf, &self.grid, &self.bbox);
        debug!(
            "iteration {}: filled {} pixels, box {:?} -> {:?}, {:.1}%",
            self.iterations,
            blended.filled,
            self.bbox,
            next,
            self.percent_complete()
        );

        if next.is_empty() {
            self.state = State::Finished;
        } else if blended.filled == 0 && next == self.bbox {
            warn!(
                "iteration {} made no progress; {} hole pixels left unfilled",
                self.iterations,
                self.mask.hole_count()
            );
            self.state = State::Finished;
        }
        self.bbox = next;
    }

    /// The latest composited image.
    pub fn current_image(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the engine, returning the latest composited image.
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// The remaining hole mask.
    pub fn mask(&self) -> &RgbImage {
        &self.mask
    }

    /// Anchors still being synthesized. Empty once finished normally.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    pub fn patch_size(&self) -> u32 {
        self.grid.size as u32
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// `100 * iterations / expected_iterations`; a UI estimate, not a bound.
    pub fn percent_complete(&self) -> f64 {
        100.0 * self.iterations as f64 / self.expected_iterations as f64
    }

    pub fn progress(&self) -> Progress {
        Progress {
            iterations: self.iterations,
            expected_iterations: self.expected_iterations,
            percent_complete: self.percent_complete(),
            finished: self.is_finished(),
        }
    }
}

/// Number of pixels, provided every per-pixel working buffer is addressable.
fn checked_buffer_len(width: u32, height: u32) -> Result<usize, InpaintError> {
    let cell_bytes = std::mem::size_of::<[f64; 4]>();
    (width as usize)
        .checked_mul(height as usize)
        .filter(|len| {
            len.checked_mul(cell_bytes)
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(InpaintError::Allocation { width, height })
}

/// Inpaint `source` where `mask` is non-black, running until the engine
/// finishes or `config.max_iterations` iterations have run.
pub fn inpaint(
    source: RgbImage,
    mask: RgbImage,
    config: &InpaintConfig,
) -> Result<RgbImage, InpaintError> {
    let mut engine = Inpainter::with_config(source, mask, config)?;
    while !engine.is_finished() {
        if config.max_iterations.is_some_and(|max| engine.iterations() >= max) {
            break;
        }
        engine.advance();
    }
    Ok(engine.into_image())
}
