//! Image pipeline: cutout, background resolution, compositing, storage.

pub mod compositor;
pub mod cutout;
pub mod resolver;
pub mod storage;
