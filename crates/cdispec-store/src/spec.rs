// ABOUTME: The SpecDocument wrapper pairing a shared raw CDI spec with its declared format.
// ABOUTME: Offers save/write_to shortcuts over the default persister and a light builder.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use cdispec_core::format::Format;
use cdispec_core::model::{ContainerEdits, DEFAULT_CDI_VERSION, Device, Spec};
use cdispec_core::naming::{NameError, validate_class_name, validate_vendor_name};

use crate::persist::{Persister, SpecError};

/// A CDI spec ready to be persisted. The format tag is fixed at construction.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    raw: Arc<Spec>,
    format: Option<Format>,
}

impl SpecDocument {
    pub fn new(raw: impl Into<Arc<Spec>>, format: Option<Format>) -> Self {
        Self {
            raw: raw.into(),
            format,
        }
    }

    pub fn builder() -> SpecBuilder {
        SpecBuilder::default()
    }

    /// The raw spec. It is shared with every clone of this document and with
    /// whoever handed the `Arc` to [`SpecDocument::new`].
    pub fn raw(&self) -> &Spec {
        &self.raw
    }

    pub fn format(&self) -> Option<Format> {
        self.format
    }

    /// Write the spec to `path`, overwriting any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SpecError> {
        Persister::new().save(self, path).map(|_| ())
    }

    /// Stream the spec, byte-identical to what [`SpecDocument::save`] writes, into `sink`.
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<u64, SpecError> {
        Persister::new().write_to(self, sink)
    }
}

/// Builds a [`SpecDocument`] from a vendor, class, and devices.
#[derive(Debug, Clone, Default)]
pub struct SpecBuilder {
    version: Option<String>,
    vendor: String,
    class: String,
    devices: Vec<Device>,
    edits: ContainerEdits,
    format: Option<Format>,
}

impl SpecBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.devices.push(device);
        self
    }

    pub fn devices(mut self, devices: impl IntoIterator<Item = Device>) -> Self {
        self.devices.extend(devices);
        self
    }

    pub fn container_edits(mut self, edits: ContainerEdits) -> Self {
        self.edits = edits;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Validate the vendor and class and assemble the document.
    pub fn build(self) -> Result<SpecDocument, NameError> {
        validate_vendor_name(&self.vendor)?;
        validate_class_name(&self.class)?;

        let raw = Spec {
            cdi_version: self
                .version
                .unwrap_or_else(|| DEFAULT_CDI_VERSION.to_string()),
            kind: format!("{}/{}", self.vendor, self.class),
            devices: self.devices,
            container_edits: self.edits,
            ..Spec::default()
        };
        Ok(SpecDocument::new(raw, self.format))
    }
}
