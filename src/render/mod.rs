//! Rasterization: the cumulative canvas, text overlays, base maps and the per-segment frame loop.

pub mod canvas;
pub mod frames;
pub mod label;
pub mod map;
