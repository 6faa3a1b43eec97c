pub mod image;
pub mod patch;
#[allow(clippy::needless_range_loop)]
pub mod bbox;
pub mod distance;
pub mod nnf;
pub mod refine;
#[allow(clippy::needless_range_loop)]
pub mod blend;
pub mod engine;
