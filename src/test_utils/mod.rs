//! Test helpers shared by the unit tests of every module.
mod common;
mod mock;

pub use common::*;
pub use mock::*;
