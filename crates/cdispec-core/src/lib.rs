// ABOUTME: Core library for cdispec, containing the CDI spec model and naming rules.
// ABOUTME: Defines the document types, format/extension mapping, and canonical spec names.

pub mod format;
pub mod model;
pub mod naming;

pub use format::{Format, FormatError, extension_for, normalize_path};
pub use model::{ContainerEdits, Device, DeviceNode, Hook, Mount, Spec};
pub use naming::{KindNamer, NameError, SpecNamer, TransientNamer};
