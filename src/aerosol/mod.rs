//! Per-pixel aerosol optical thickness retrieval.
//!
//! The retriever inverts the atmospheric model band by band over the fixed
//! AOT-550 nm grid, brackets the residual minimum and refines it with a
//! parabolic fit. The processor runs the retriever over tiles of pixels,
//! carrying the warm-start hint inside a tile and parallelising across
//! tiles.

pub mod minimizer;
pub mod pixel;
pub mod processor;
pub mod retrieval;

pub use pixel::{PixelInputs, RetrievalResult};
pub use processor::{ScenePixel, SceneProcessor};
pub use retrieval::AerosolRetriever;
