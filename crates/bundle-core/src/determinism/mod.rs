//! Determinism helpers shared across components that must produce
//! byte-identical output given the same input, regardless of platform or
//! collection iteration order.

pub mod stable_sort;
