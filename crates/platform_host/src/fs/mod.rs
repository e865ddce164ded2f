//! Virtual file-system contracts: path algebra and node/content types.

pub mod path;
pub mod types;
