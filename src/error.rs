use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the composition and layout engine.
///
/// Input errors (`UnsupportedFile`, `FileTooLarge`) are rejected before any
/// pixel work starts. The rest are local to the operation that raised them;
/// none of them touch the edit history.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not a supported image file: {0}")]
    UnsupportedFile(PathBuf),

    #[error("file is {actual} bytes, over the {limit} byte limit")]
    FileTooLarge { actual: u64, limit: u64 },

    #[error("source image has no pixels")]
    EmptySource,

    #[error("{columns} columns of {cell_width}px cells do not fit a {page_width}px page")]
    LayoutOverflow {
        columns: u32,
        cell_width: u32,
        page_width: u32,
    },

    #[error(transparent)]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
