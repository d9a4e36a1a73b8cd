//! Reading and writing contract documents on disk.
//!
//! Files ending in `.yaml` or `.yml` are YAML; everything else is JSON.

use anyhow::Context;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

pub fn read_document(path: &Path) -> anyhow::Result<JsonValue> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = if is_yaml(path) {
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))?
    };
    Ok(document)
}

pub fn write_document(path: &Path, document: &JsonValue) -> anyhow::Result<()> {
    let rendered = if is_yaml(path) {
        serde_yaml::to_string(document).context("failed to serialize YAML")?
    } else {
        let mut json = serde_json::to_string_pretty(document).context("failed to serialize JSON")?;
        json.push('\n');
        json
    };
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))
}
