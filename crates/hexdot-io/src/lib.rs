//! # Hexdot I/O
//!
//! Serializes generated dot arrays to CleWin's CIF dialect and splices them
//! into existing designs. Also reads the JSON job files that describe a full
//! set of arrays and their target file.

pub mod cif;
pub mod error;
pub mod writer;
pub mod job;

pub use cif::{splice, splice_batch, CifDocument, Segment, BLANK_TEMPLATE, MARKER, MARKER_LINE};
pub use error::CifError;
pub use writer::{CifWriter, TemplateSource};
pub use job::{ArrayJob, ArraySpec};
