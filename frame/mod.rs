pub mod dataset;
pub mod summary;

pub use dataset::{DataError, Dataset, MAX_CATEGORY_LEVELS};
