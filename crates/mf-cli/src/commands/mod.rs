//! CLI command implementations

pub(crate) mod common;
pub(crate) mod dataset;
pub(crate) mod project;
pub(crate) mod runs;
pub(crate) mod train;
