pub mod compose;
pub mod filters;
pub mod segmentation;
