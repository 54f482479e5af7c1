//! CPU depth-sort kernel for Gaussian splat rendering: projects splat
//! centers to scalar depths, buckets them into a histogram domain, and
//! emits a back-to-front index permutation via a single counting-sort pass.

pub mod camera;
pub mod centers;
pub mod demo;
pub mod loader;
pub mod math;
pub mod sorter;
pub mod splat;
pub mod worker;

pub use centers::CenterPalette;
pub use sorter::{
    sort_indexes, CenterView, PrecomputedDepths, SceneView, SortError, SortInputs, SortScratch,
};
pub use worker::{SortRequest, SortResponse, SortWorker};
