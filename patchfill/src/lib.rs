//! PatchMatch inpainting: fills the non-black region of a mask with content
//! synthesized from the rest of the same image.
//!
//! ```
//! use patchfill::inpaint::engine::Inpainter;
//! use patchfill::inpaint::image::{Pixel, RgbImage};
//!
//! let source = RgbImage::filled(16, 16, Pixel::gray(100));
//! let mut mask = RgbImage::new(16, 16);
//! mask.set(8, 8, Pixel::gray(255));
//!
//! let mut engine = Inpainter::new(source, mask, 3).unwrap();
//! while !engine.is_finished() {
//!     engine.advance();
//! }
//! assert_eq!(engine.current_image().get(8, 8), Pixel::gray(100));
//! ```

pub mod config;
pub mod error;
pub mod inpaint;

pub use config::InpaintConfig;
pub use error::{ConfigError, InpaintError};
pub use inpaint::engine::{inpaint, Inpainter, Progress};
pub use inpaint::image::{Pixel, RgbImage};
