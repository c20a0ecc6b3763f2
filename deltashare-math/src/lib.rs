//! # deltashare-math
//!
//! Dense parameter arrays for the deltashare sparse exchange protocol.
//!
//! This crate provides [`ParamArray`], a row-major `f32` buffer tagged with its
//! dimensions. Element order inside an array is always row-major so that two
//! peers flattening the same array produce the same sequence.
//!
//! Only dependency is `thiserror`.

pub mod array;
pub mod ops;

pub use array::{ArrayError, ParamArray};
