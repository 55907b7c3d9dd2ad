//! Helpers for the pyre CLI: flame loading and frame conversion.

use std::fs;
use std::path::Path;

use pyre_core::generators;
use pyre_core::palette::{preset_palette, preset_palette_names};
use pyre_core::{Flame, Palette};

/// Load a flame from a built-in generator name or a JSON file.
///
/// Exactly one source must be given.
pub fn load_flame(generator: Option<&str>, flame_path: Option<&Path>) -> Result<Flame, String> {
    match (generator, flame_path) {
        (Some(name), None) => generators::by_name(name).ok_or_else(|| {
            format!(
                "unknown generator '{}'; available: {}",
                name,
                generators::generator_names().join(", ")
            )
        }),
        (None, Some(path)) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&json)
                .map_err(|e| format!("failed to parse {}: {}", path.display(), e))
        }
        (Some(_), Some(_)) => Err("pass either --generator or --flame, not both".to_string()),
        (None, None) => Err("pass a flame via --generator or --flame".to_string()),
    }
}

/// Resolve a preset palette by name.
pub fn load_palette(name: &str) -> Result<Palette, String> {
    preset_palette(name).ok_or_else(|| {
        format!(
            "unknown palette '{}'; available: {}",
            name,
            preset_palette_names().join(", ")
        )
    })
}

/// Convert an RGBA f32 frame to 8-bit RGBA bytes for PNG export.
pub fn frame_to_rgba8(frame: &[f32]) -> Vec<u8> {
    frame
        .iter()
        .map(|&component| (component.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_flame_from_generator() {
        let flame = load_flame(Some("barnsley-fern"), None).unwrap();
        assert_eq!(flame.xforms.len(), 4);
    }

    #[test]
    fn test_load_flame_requires_exactly_one_source() {
        assert!(load_flame(None, None).is_err());
        assert!(load_flame(Some("example"), Some(Path::new("x.json"))).is_err());
    }

    #[test]
    fn test_load_flame_unknown_generator_lists_options() {
        let err = load_flame(Some("nope"), None).unwrap_err();
        assert!(err.contains("barnsley-fern"));
    }

    #[test]
    fn test_load_palette_known_and_unknown() {
        assert!(load_palette("fire-dragon").is_ok());
        let err = load_palette("nope").unwrap_err();
        assert!(err.contains("fire-dragon"));
    }

    #[test]
    fn test_frame_to_rgba8_clamps_and_scales() {
        let frame = [0.0f32, 0.5, 1.0, 1.5];
        let bytes = frame_to_rgba8(&frame);
        assert_eq!(bytes, vec![0, 128, 255, 255]);
    }
}
