//! Candidate pruning utilities.
//!
//! Spatial non-maximum suppression over centred match locations.

pub(crate) mod nms;
