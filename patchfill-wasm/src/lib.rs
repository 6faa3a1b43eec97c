use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use patchfill::{Inpainter as CoreInpainter, Progress as CoreProgress, RgbImage};

// ── Tsify types for TypeScript interface generation ──

/// Progress snapshot returned to JavaScript.
#[derive(Tsify, Serialize, Deserialize)]
#[tsify(into_wasm_abi)]
pub struct WasmProgress {
    pub iterations: u32,
    pub expected_iterations: u32,
    /// Heuristic estimate; may exceed 100.
    pub percent_complete: f64,
    pub finished: bool,
}

impl From<CoreProgress> for WasmProgress {
    fn from(p: CoreProgress) -> Self {
        WasmProgress {
            iterations: p.iterations,
            expected_iterations: p.expected_iterations,
            percent_complete: p.percent_complete,
            finished: p.finished,
        }
    }
}

// ── Inpainter wrapper ──

/// Incremental inpainting engine for use from JavaScript/TypeScript.
///
/// Drive it from an animation loop: call `step()` once per frame and paint
/// `image_rgba()` into the canvas between steps.
#[wasm_bindgen]
pub struct Inpainter {
    inner: CoreInpainter,
}

#[wasm_bindgen]
impl Inpainter {
    /// Create an engine from canvas RGBA data (4 bytes per pixel).
    ///
    /// Every mask pixel whose RGB is not black is filled; alpha is ignored.
    #[wasm_bindgen(constructor)]
    pub fn new(
        source: &[u8],
        mask: &[u8],
        width: u32,
        height: u32,
        patch_size: u32,
    ) -> Result<Inpainter, JsError> {
        let source = rgba_image(source, width, height, "source")?;
        let mask = rgba_image(mask, width, height, "mask")?;
        let inner =
            CoreInpainter::new(source, mask, patch_size).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Inpainter { inner })
    }

    /// Run one iteration.
    pub fn step(&mut self) {
        self.inner.advance();
    }

    /// Run up to `max_steps` iterations. Returns whether the engine finished.
    pub fn run(&mut self, max_steps: u32) -> bool {
        for _ in 0..max_steps {
            if self.inner.is_finished() {
                break;
            }
            self.inner.advance();
        }
        self.inner.is_finished()
    }

    /// Current image as opaque RGBA bytes, ready for `ImageData`.
    pub fn image_rgba(&self) -> Vec<u8> {
        self.inner.current_image().to_rgba_bytes()
    }

    pub fn progress(&self) -> Result<JsValue, JsError> {
        let progress = WasmProgress::from(self.inner.progress());
        serde_wasm_bindgen::to_value(&progress).map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    pub fn percent_complete(&self) -> f64 {
        self.inner.percent_complete()
    }
}

fn rgba_image(data: &[u8], width: u32, height: u32, what: &str) -> Result<RgbImage, JsError> {
    RgbImage::from_rgba_bytes(width, height, data).ok_or_else(|| {
        JsError::new(&format!(
            "{what} RGBA data length {} does not match {}x{}x4 = {}",
            data.len(),
            width,
            height,
            width as usize * height as usize * 4,
        ))
    })
}
