use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hexdot_core::batch::ArrayBatch;
use hexdot_core::filter::{build_all, FilterSpec};

use crate::cif::DEFAULT_LAYER;
use crate::error::CifError;
use crate::writer::{CifWriter, TemplateSource};

/// A declarative description of arrays to generate and where to write them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayJob {
    pub output: PathBuf,
    /// Template to read instead of the output file. Must exist when given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub use_blank: bool,
    #[serde(default = "default_layer")]
    pub layer: String,
    pub arrays: Vec<ArraySpec>,
}

/// One hexagonal array. Lengths in µm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySpec {
    pub diameter: f64,
    pub pitch: f64,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

fn default_layer() -> String {
    DEFAULT_LAYER.to_string()
}

impl ArrayJob {
    pub fn from_json(json: &str) -> Result<Self, CifError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, CifError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a job file. Relative `output` and `template` paths resolve
    /// against the job file's directory.
    pub fn load(path: &Path) -> Result<Self, CifError> {
        let json = fs::read_to_string(path).map_err(|e| CifError::io(path, e))?;
        let mut job = Self::from_json(&json)?;
        if let Some(base) = path.parent() {
            job.output = base.join(&job.output);
            job.template = job.template.map(|t| base.join(t));
        }
        Ok(job)
    }

    pub fn template_source(&self) -> TemplateSource {
        if self.use_blank {
            TemplateSource::Blank
        } else if let Some(template) = &self.template {
            TemplateSource::Required(template.clone())
        } else {
            TemplateSource::ExistingOrBlank(self.output.clone())
        }
    }

    pub fn build_batch(&self) -> Result<ArrayBatch, CifError> {
        let name = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut batch = ArrayBatch::new(&name);
        for spec in &self.arrays {
            let filters = build_all(&spec.filters);
            batch.add_array(
                spec.diameter,
                spec.pitch,
                spec.x0,
                spec.x1,
                spec.y0,
                spec.y1,
                &filters,
            )?;
        }
        Ok(batch)
    }

    pub fn writer(&self, silent: bool) -> CifWriter {
        CifWriter::new(&self.output)
            .with_template(self.template_source())
            .with_layer(&self.layer)
            .silent(silent)
    }

    /// Generate every array and write them to the output as one layer block.
    pub fn run(&self, silent: bool) -> Result<ArrayBatch, CifError> {
        let batch = self.build_batch()?;
        self.writer(silent).write_batch(&batch)?;
        Ok(batch)
    }
}
