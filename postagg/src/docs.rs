//! Documentation that is not specific to one crate.

pub mod api;
pub mod overview;
pub mod testing;
