//! Small filesystem/key-loading helpers shared by several commands,
//! mirroring the split `signia-cli::io::{input,export}` used for its own
//! shared plumbing.

pub mod keys;
pub mod tree;
