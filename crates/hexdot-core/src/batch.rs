use serde::{Deserialize, Serialize};

use crate::filter::BoxedFilter;
use crate::geometry::Feature;
use crate::lattice::{HexLattice, LatticeError};

/// One generated array together with the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotArray {
    pub diameter: f64,
    pub pitch: f64,
    pub features: Vec<Feature>,
}

impl DotArray {
    /// Short label of the form `d<diameter> p<pitch>`.
    pub fn label(&self) -> String {
        format!("d{} p{}", self.diameter, self.pitch)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// An append-only set of arrays destined for the same write.
///
/// The batch is owned by the caller and handed to the writer by reference;
/// nothing is retained between writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayBatch {
    pub name: String,
    arrays: Vec<DotArray>,
}

impl ArrayBatch {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            arrays: Vec::new(),
        }
    }

    /// Generate a hexagonal array and append it to the batch.
    pub fn add_array(
        &mut self,
        diameter: f64,
        pitch: f64,
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        filters: &[BoxedFilter],
    ) -> Result<&DotArray, LatticeError> {
        let lattice = HexLattice::new(diameter, pitch, x0, x1, y0, y1)?;
        let features = lattice.features(filters);
        log::debug!(
            "Batch '{}': added array d{} p{} with {} dots",
            self.name,
            diameter,
            pitch,
            features.len()
        );
        self.arrays.push(DotArray {
            diameter,
            pitch,
            features,
        });
        Ok(&self.arrays[self.arrays.len() - 1])
    }

    /// Append an array generated elsewhere.
    pub fn push(&mut self, array: DotArray) {
        self.arrays.push(array);
    }

    pub fn arrays(&self) -> &[DotArray] {
        &self.arrays
    }

    /// All features, array by array in insertion order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.arrays.iter().flat_map(|a| a.features.iter())
    }

    pub fn feature_count(&self) -> usize {
        self.arrays.iter().map(DotArray::len).sum()
    }

    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}
