// Data cleaning pipeline: per-record normalization, dataset assembly, and
// on-demand aggregation

pub mod aggregate;
pub mod dataset;
pub mod normalize;

pub use dataset::{Column, Dataset, ProductRow};
pub use normalize::{normalize, NormalizedProduct};
