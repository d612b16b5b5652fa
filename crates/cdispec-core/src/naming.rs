// ABOUTME: Canonical file naming for CDI specs derived from the spec's vendor/class kind.
// ABOUTME: Validates vendor and class names and builds regular, transient, and device names.

use thiserror::Error;

use crate::model::Spec;

/// Errors that can occur while deriving a name from a spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid vendor/class {0:?} in spec kind")]
    InvalidKind(String),

    #[error("invalid vendor name {name:?}: {reason}")]
    InvalidVendor { name: String, reason: &'static str },

    #[error("invalid class name {name:?}: {reason}")]
    InvalidClass { name: String, reason: &'static str },

    #[error("transient id must not be empty")]
    EmptyTransientId,
}

/// Derives a canonical spec file name (without extension) from a spec document.
pub trait SpecNamer {
    fn name_for(&self, raw: &Spec) -> Result<String, NameError>;
}

/// Names a spec `vendor-class` from its `kind` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindNamer;

impl SpecNamer for KindNamer {
    fn name_for(&self, raw: &Spec) -> Result<String, NameError> {
        generate_name_for_spec(raw)
    }
}

/// Names a spec `vendor-class_<id>` so several transient specs of one kind can coexist.
#[derive(Debug, Clone)]
pub struct TransientNamer {
    transient_id: String,
}

impl TransientNamer {
    pub fn new(transient_id: impl Into<String>) -> Self {
        Self {
            transient_id: transient_id.into(),
        }
    }
}

impl SpecNamer for TransientNamer {
    fn name_for(&self, raw: &Spec) -> Result<String, NameError> {
        generate_transient_name_for_spec(raw, &self.transient_id)
    }
}

/// Split a `vendor/class` kind into its validated parts.
pub fn parse_kind(kind: &str) -> Result<(&str, &str), NameError> {
    let (vendor, class) = kind
        .split_once('/')
        .ok_or_else(|| NameError::InvalidKind(kind.to_string()))?;
    if vendor.is_empty() || class.is_empty() || class.contains('/') {
        return Err(NameError::InvalidKind(kind.to_string()));
    }

    validate_vendor_name(vendor)?;
    validate_class_name(class)?;
    Ok((vendor, class))
}

/// Vendor names start with a letter, end with a letter or digit, and may
/// contain letters, digits, `_`, `.` and `-` in between.
pub fn validate_vendor_name(vendor: &str) -> Result<(), NameError> {
    check_name(vendor, &['_', '.', '-']).map_err(|reason| NameError::InvalidVendor {
        name: vendor.to_string(),
        reason,
    })
}

/// Class names follow the vendor rules but do not allow `.`.
pub fn validate_class_name(class: &str) -> Result<(), NameError> {
    check_name(class, &['_', '-']).map_err(|reason| NameError::InvalidClass {
        name: class.to_string(),
        reason,
    })
}

fn check_name(name: &str, extra: &[char]) -> Result<(), &'static str> {
    let mut chars = name.chars();
    let first = chars.next().ok_or("name is empty")?;
    if !first.is_ascii_alphabetic() {
        return Err("must start with a letter");
    }
    if let Some(last) = name.chars().last()
        && !last.is_ascii_alphanumeric()
    {
        return Err("must end with a letter or digit");
    }
    if name
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !extra.contains(&c))
    {
        return Err("contains an invalid character");
    }
    Ok(())
}

/// Build the canonical spec name for a vendor and class.
pub fn generate_spec_name(vendor: &str, class: &str) -> String {
    format!("{vendor}-{class}")
}

/// Build a transient spec name. Any `/` in the id is replaced with `_`.
pub fn generate_transient_spec_name(vendor: &str, class: &str, transient_id: &str) -> String {
    let transient_id = transient_id.replace('/', "_");
    format!("{}_{}", generate_spec_name(vendor, class), transient_id)
}

/// Derive the canonical spec name from a spec's `kind`.
pub fn generate_name_for_spec(raw: &Spec) -> Result<String, NameError> {
    let (vendor, class) = parse_kind(&raw.kind)?;
    Ok(generate_spec_name(vendor, class))
}

/// Derive a transient spec name from a spec's `kind` and a caller-supplied id.
pub fn generate_transient_name_for_spec(raw: &Spec, transient_id: &str) -> Result<String, NameError> {
    if transient_id.is_empty() {
        return Err(NameError::EmptyTransientId);
    }
    let (vendor, class) = parse_kind(&raw.kind)?;
    Ok(generate_transient_spec_name(vendor, class, transient_id))
}

/// Fully qualified device name, `vendor/class=device`.
pub fn qualified_device_name(vendor: &str, class: &str, device: &str) -> String {
    format!("{vendor}/{class}={device}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_of_kind(kind: &str) -> Spec {
        Spec {
            kind: kind.to_string(),
            ..Spec::default()
        }
    }

    #[test]
    fn name_for_spec_joins_vendor_and_class() {
        let name = generate_name_for_spec(&spec_of_kind("nvidia.com/gpu")).unwrap();
        assert_eq!(name, "nvidia.com-gpu");

        let name = KindNamer.name_for(&spec_of_kind("vendor1.com/device_x")).unwrap();
        assert_eq!(name, "vendor1.com-device_x");
    }

    #[test]
    fn malformed_kind_is_rejected() {
        for kind in ["", "nvidia.com", "/gpu", "nvidia.com/", "a/b/c"] {
            let err = generate_name_for_spec(&spec_of_kind(kind)).unwrap_err();
            assert_eq!(err, NameError::InvalidKind(kind.to_string()), "kind {kind:?}");
        }
    }

    #[test]
    fn vendor_and_class_characters_are_validated() {
        assert!(matches!(
            parse_kind("1vendor/gpu"),
            Err(NameError::InvalidVendor { reason: "must start with a letter", .. })
        ));
        assert!(matches!(
            parse_kind("vendor-/gpu"),
            Err(NameError::InvalidVendor { reason: "must end with a letter or digit", .. })
        ));
        assert!(matches!(
            parse_kind("vendor.com/g.pu"),
            Err(NameError::InvalidClass { reason: "contains an invalid character", .. })
        ));
        assert_eq!(parse_kind("v/c").unwrap(), ("v", "c"));
    }

    #[test]
    fn transient_name_sanitizes_slashes() {
        let spec = spec_of_kind("example.com/net");

        let name = generate_transient_name_for_spec(&spec, "pod/1234").unwrap();
        assert_eq!(name, "example.com-net_pod_1234");

        let name = TransientNamer::new("ctr").name_for(&spec).unwrap();
        assert_eq!(name, "example.com-net_ctr");

        assert_eq!(
            generate_transient_name_for_spec(&spec, ""),
            Err(NameError::EmptyTransientId)
        );
    }

    #[test]
    fn qualified_device_name_format() {
        assert_eq!(
            qualified_device_name("nvidia.com", "gpu", "0"),
            "nvidia.com/gpu=0"
        );
    }
}
