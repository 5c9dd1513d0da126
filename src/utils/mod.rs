//! Utility modules shared by the build and serve stages.

pub mod log;
