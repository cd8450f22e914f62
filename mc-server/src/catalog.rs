use std::{
    fs, io,
    path::{Path, PathBuf},
};

use api::{ModuleSpec, ParamKind, ParamSpec};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

const METADATA_EXT: &str = "json";
const HEADER_SCAN_LINES: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct ModuleMetadata {
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<ParamSpec>,
}

/// Walks the modules directory and builds the catalog, sorted by path
/// for stable ordering. Every module file gets a fresh id; parameter
/// metadata comes from a sidecar JSON file when present, otherwise
/// from an `@input` block in the script header.
pub fn discover_modules(modules_dir: &Path, module_ext: &str) -> Vec<ModuleSpec> {
    let mut files = Vec::new();
    collect_module_files(modules_dir, module_ext, &mut files);
    files.sort();
    files.iter().map(|path| describe_module(path)).collect()
}

fn collect_module_files(dir: &Path, module_ext: &str, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_module_files(&path, module_ext, found);
        } else if path.extension().and_then(|ext| ext.to_str()) == Some(module_ext) {
            found.push(path);
        }
    }
}

fn describe_module(path: &Path) -> ModuleSpec {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    let mut module = ModuleSpec {
        id: Uuid::new_v4().to_string(),
        name: stem,
        path: path.display().to_string(),
        inputs: Vec::new(),
    };

    let sidecar = path.with_extension(METADATA_EXT);
    if sidecar.exists() {
        match read_sidecar(&sidecar) {
            Ok(metadata) => {
                if let Some(name) = metadata.name {
                    module.name = name;
                }
                module.inputs = metadata.inputs;
            }
            Err(err) => warn!("ignoring unreadable metadata {}: {err}", sidecar.display()),
        }
        return module;
    }

    if let Ok(header) = read_header(path) {
        module.inputs = parse_header_inputs(&header);
    }
    module
}

fn read_sidecar(path: &Path) -> io::Result<ModuleMetadata> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(io::Error::other)
}

fn read_header(path: &Path) -> io::Result<String> {
    let raw = fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .take(HEADER_SCAN_LINES)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// `@input` header convention: within the first lines of the script,
/// `- name: description` entries declare text parameters.
fn parse_header_inputs(header: &str) -> Vec<ParamSpec> {
    if !header.contains("@input") {
        return Vec::new();
    }
    let mut inputs = Vec::new();
    for line in header.lines() {
        let Some(rest) = line.trim().strip_prefix('-') else {
            continue;
        };
        let Some((name, description)) = rest.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let description = description.trim();
        inputs.push(ParamSpec {
            name: name.to_string(),
            kind: ParamKind::Text,
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
        });
    }
    inputs
}
