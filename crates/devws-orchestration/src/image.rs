//! Derived image tags.

use devws_store::{Preset, Project};
use std::collections::BTreeMap;

const HASH_LEN: usize = 6;

/// The derived tag for a dockerfile project's image.
pub fn dockerfile_image_tag(project: &Project) -> String {
    format!("project-{}:develop", project.name)
}

/// The deterministic tag for a preset-built image.
///
/// The preset's declared build-arg keys split into two groups by their
/// `hash` flag: values of keys marked not to hash become literal tag
/// segments; the remaining values are concatenated and content-hashed, the
/// hash truncated to six characters and appended as the final segment. Two
/// projects with the same raw values and the same hashed content therefore
/// share one image.
pub fn preset_image_tag(preset: &Preset, build_args: &BTreeMap<String, String>) -> String {
    let mut raw_segments = Vec::new();
    let mut hashed = String::new();

    for (key, spec) in &preset.build_args_options {
        let value = build_args
            .get(key)
            .cloned()
            .or_else(|| spec.default.clone())
            .unwrap_or_default();
        if spec.hash {
            hashed.push_str(&value);
        } else {
            raw_segments.push(sanitize_segment(&value));
        }
    }

    let digest = blake3::hash(hashed.as_bytes()).to_hex();
    raw_segments.push(digest.as_str()[..HASH_LEN].to_string());
    format!("ws-preset-{}:{}", preset.name, raw_segments.join("-"))
}

// Docker tags allow [A-Za-z0-9_.-] only.
fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
