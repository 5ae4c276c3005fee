//! # Hexdot Core
//!
//! Hexagonal dot-array generation for mask layouts: geometric primitives,
//! the close-packed lattice sweep, composable placement filters, and
//! caller-owned batches of generated arrays.
//!
//! All lengths are in micrometers. Quantization to the 1 nm CIF unit happens
//! in `hexdot-io`, at serialization time.

pub mod geometry;
pub mod filter;
pub mod lattice;
pub mod batch;

pub use geometry::{Feature, Point, Region};
pub use filter::{BoxedFilter, Filter, FilterSpec, Quadrant};
pub use lattice::{generate, HexLattice, LatticeError, MAX_LATTICE_POINTS};
pub use batch::{ArrayBatch, DotArray};
