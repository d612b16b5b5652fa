// ABOUTME: End-to-end smoke test for cdispec save and export.
// ABOUTME: Exercises the library round trip and the cdispec binary's save/export/devices/name commands.

use std::fs;
use std::path::Path;
use std::process::Command;

use cdispec_core::format::Format;
use cdispec_core::{ContainerEdits, Device, DeviceNode, Mount};
use cdispec_store::{Persister, SpecDocument, SpecRegistry};

fn gpu_doc(format: Option<Format>) -> SpecDocument {
    let mut gpu = Device::new("0");
    gpu.container_edits.device_nodes.push(DeviceNode {
        path: "/dev/nvidia0".to_string(),
        ..DeviceNode::default()
    });

    let mut builder = SpecDocument::builder()
        .vendor("nvidia.com")
        .class("gpu")
        .device(gpu)
        .container_edits(ContainerEdits {
            env: vec!["NVIDIA_VISIBLE_DEVICES=void".to_string()],
            mounts: vec![Mount {
                host_path: "/usr/bin/nvidia-smi".to_string(),
                container_path: "/usr/bin/nvidia-smi".to_string(),
                mount_type: None,
                options: vec!["ro".to_string(), "nosuid".to_string(), "bind".to_string()],
            }],
            ..ContainerEdits::default()
        });
    if let Some(format) = format {
        builder = builder.format(format);
    }
    builder.build().unwrap()
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn smoke_test_save_and_export() {
    let dir = tempfile::TempDir::new().unwrap();
    let scratch = tempfile::TempDir::new().unwrap();

    for format in [None, Some(Format::Yaml), Some(Format::Json)] {
        let doc = gpu_doc(format);

        // 1. Save under the canonical name and read it back
        doc.save(dir.path().join("nvidia.com-gpu")).unwrap();
        let saved_path = cdispec_core::normalize_path(dir.path().join("nvidia.com-gpu"), format);
        let saved = fs::read(&saved_path).unwrap();
        assert_eq!(&SpecRegistry::read_spec(&saved_path).unwrap(), doc.raw());

        // 2. Stream the same document and compare bytes
        let before = listing(scratch.path());
        let mut sink = Vec::new();
        let copied = Persister::new()
            .with_scratch_dir(scratch.path())
            .write_to(&doc, &mut sink)
            .unwrap();

        assert_eq!(sink, saved, "export differs from saved file for {format:?}");
        assert_eq!(copied, saved.len() as u64);
        assert_eq!(listing(scratch.path()), before, "scratch dir changed");
    }

    assert_eq!(
        listing(dir.path()),
        vec!["nvidia.com-gpu.json".to_string(), "nvidia.com-gpu.yaml".to_string()]
    );
}

#[test]
fn smoke_test_default_write_to_uses_os_temp_dir() {
    let doc = gpu_doc(Some(Format::Json));

    let mut sink = Vec::new();
    let copied = doc.write_to(&mut sink).unwrap();

    assert_eq!(copied, sink.len() as u64);
    let value: serde_json::Value = serde_json::from_slice(&sink).unwrap();
    assert_eq!(value["kind"], "nvidia.com/gpu");
}

#[test]
fn smoke_test_cli() {
    let dir = tempfile::TempDir::new().unwrap();
    let scratch = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("input.yaml");
    gpu_doc(Some(Format::Yaml)).save(&input).unwrap();

    let bin = env!("CARGO_BIN_EXE_cdispec");

    // save: no extension on the output, --format json appends .json
    let status = Command::new(bin)
        .arg("save")
        .arg(&input)
        .arg(dir.path().join("out"))
        .args(["--format", "json"])
        .env_remove("CDISPEC_FORMAT")
        .env_remove("CDISPEC_SCRATCH_DIR")
        .status()
        .unwrap();
    assert!(status.success());
    let saved = fs::read(dir.path().join("out.json")).unwrap();

    // export: same bytes on stdout
    let output = Command::new(bin)
        .arg("export")
        .arg(&input)
        .env("CDISPEC_FORMAT", "json")
        .env("CDISPEC_SCRATCH_DIR", scratch.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, saved);
    assert!(listing(scratch.path()).is_empty());

    // devices: fully qualified device names
    let output = Command::new(bin).arg("devices").arg(&input).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "nvidia.com/gpu=0");

    // name: canonical and transient
    let output = Command::new(bin).arg("name").arg(&input).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "nvidia.com-gpu");

    let output = Command::new(bin)
        .arg("name")
        .arg(&input)
        .args(["--transient-id", "pod/42"])
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "nvidia.com-gpu_pod_42");
}
