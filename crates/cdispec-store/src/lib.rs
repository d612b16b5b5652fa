// ABOUTME: Persistence layer for cdispec, handling spec registry writes and streaming export.
// ABOUTME: Provides the directory-scoped registry, the SpecDocument wrapper, and the persister.

pub mod persist;
pub mod registry;
pub mod spec;

pub use persist::{Persister, SpecError};
pub use registry::{
    PersistenceDelegate, RegistryDelegate, RegistryError, RegistryOptions, SpecRegistry,
    SpecWriter,
};
pub use spec::{SpecBuilder, SpecDocument};
