//! Source location metadata
//!
//! Expands a package's SRC_URI declaration into a [`SourceLocationMap`].

pub mod src_uri;

pub use src_uri::{SourceUriParser, SrcUriParser};

use indexmap::IndexMap;

/// Logical file name -> candidate download URLs, in declaration order
pub type SourceLocationMap = IndexMap<String, Vec<String>>;
