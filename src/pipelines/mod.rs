//! Render pipeline definitions.
//!
//! - `basic` builds a wgpu pipeline from a [`PipelineState`](crate::backend::PipelineState)
//! - `grid`, `phong` and `outline` describe the three passes: shader paths,
//!   uniform layout and fixed-function state

pub mod basic;
pub mod grid;
pub mod outline;
pub mod phong;
