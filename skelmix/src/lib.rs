//! Skeletal animation blending runtime.
//!
//! Tracks (keyframed, procedural or sequential playlists) are configured against a node
//! hierarchy and merged by a [`BlendCoordinator`] into one pose per tick, by priority and
//! weight. The crate is renderer-agnostic: it only computes local and world node transforms.

#![forbid(unsafe_code)]

mod error;
mod model;
mod runtime;
mod transform;

#[cfg(feature = "json")]
pub mod json;

pub use error::*;
pub use model::*;
pub use runtime::*;
pub use transform::*;


#[cfg(test)]
mod test_support;
