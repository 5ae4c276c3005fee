use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use hexdot_core::batch::{ArrayBatch, DotArray};
use hexdot_core::geometry::Feature;
use tempfile::NamedTempFile;

use crate::cif::{self, BLANK_TEMPLATE, DEFAULT_LAYER};
use crate::error::CifError;

/// Where the document that receives new geometry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Always start from the built-in blank document.
    Blank,
    /// Read this file; a missing file is an error.
    Required(PathBuf),
    /// Read this file if it exists, otherwise start from the blank document.
    ExistingOrBlank(PathBuf),
}

impl TemplateSource {
    /// Return the template text.
    pub fn load(&self) -> Result<String, CifError> {
        match self {
            TemplateSource::Blank => {
                log::debug!("Using blank template");
                Ok(BLANK_TEMPLATE.to_string())
            }
            TemplateSource::Required(path) => {
                if !exists(path)? {
                    return Err(CifError::TemplateNotFound(path.clone()));
                }
                read_template(path)
            }
            TemplateSource::ExistingOrBlank(path) => {
                if exists(path)? {
                    read_template(path)
                } else {
                    log::debug!("{} does not exist, using blank template", path.display());
                    Ok(BLANK_TEMPLATE.to_string())
                }
            }
        }
    }
}

/// `Ok(false)` only when the path is known not to exist; any other stat
/// failure is reported.
fn exists(path: &Path) -> Result<bool, CifError> {
    path.try_exists().map_err(|e| CifError::io(path, e))
}

fn read_template(path: &Path) -> Result<String, CifError> {
    log::debug!("Reading template {}", path.display());
    fs::read_to_string(path).map_err(|e| CifError::io(path, e))
}

/// Writes generated dots into a CleWin CIF file.
///
/// By default the output file is also the template, so repeated writes to the
/// same path stack their layer blocks; a missing file starts from the blank
/// document.
#[derive(Debug, Clone)]
pub struct CifWriter {
    write_path: PathBuf,
    template: TemplateSource,
    layer: String,
    silent: bool,
}

impl CifWriter {
    pub fn new(write_path: impl Into<PathBuf>) -> Self {
        let write_path = write_path.into();
        Self {
            template: TemplateSource::ExistingOrBlank(write_path.clone()),
            write_path,
            layer: DEFAULT_LAYER.to_string(),
            silent: false,
        }
    }

    pub fn with_layer(mut self, layer: &str) -> Self {
        self.layer = layer.to_string();
        self
    }

    pub fn with_template(mut self, template: TemplateSource) -> Self {
        self.template = template;
        self
    }

    /// Read from `path` instead of the output file; it must exist.
    pub fn with_read_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_template(TemplateSource::Required(path.into()))
    }

    /// Start from the blank document, discarding any existing output.
    pub fn use_blank(self) -> Self {
        self.with_template(TemplateSource::Blank)
    }

    /// Suppress progress messages.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn write_path(&self) -> &Path {
        &self.write_path
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn template(&self) -> &TemplateSource {
        &self.template
    }

    pub fn load_template(&self) -> Result<String, CifError> {
        self.template.load()
    }

    /// Splice `features` into the template and overwrite the output file.
    pub fn write_features(&self, features: &[Feature]) -> Result<(), CifError> {
        let template = self.load_template()?;
        if !self.silent {
            log::info!(
                "Writing {} dots to layer \"{}\" in {}...",
                features.len(),
                self.layer,
                self.write_path.display()
            );
        }
        let content = cif::splice(&template, &self.layer, features);
        self.store(&content)
    }

    /// Splice every array of `batch` into the template as one layer block.
    pub fn write_batch(&self, batch: &ArrayBatch) -> Result<(), CifError> {
        let template = self.load_template()?;
        if !self.silent {
            for array in batch.arrays() {
                log::info!("{}", self.progress_message(array));
            }
        }
        let content = cif::splice_batch(&template, &self.layer, batch);
        self.store(&content)
    }

    fn progress_message(&self, array: &DotArray) -> String {
        format!(
            "Writing hexagonal dot array with d = {} µm and p = {} µm to layer \"{}\" in {}...",
            array.diameter,
            array.pitch,
            self.layer,
            self.write_path.display()
        )
    }

    /// Replace the output file atomically: the content goes to a temporary
    /// file next to it, which is then renamed over the target.
    fn store(&self, content: &str) -> Result<(), CifError> {
        let path = &self.write_path;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(|e| CifError::io(path, e))?;
        if let Ok(metadata) = fs::metadata(path) {
            file.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| CifError::io(path, e))?;
        }
        file.write_all(content.as_bytes())
            .map_err(|e| CifError::io(path, e))?;
        file.persist(path).map_err(|e| CifError::io(path, e.error))?;
        if !self.silent {
            log::info!("Done!");
        }
        Ok(())
    }
}
