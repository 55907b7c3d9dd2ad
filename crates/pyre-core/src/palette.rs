//! Color palettes and the embedded preset table.
//!
//! A palette is an ordered lookup table of normalized RGB triplets, indexed
//! by a chain's running color value in [0, 1]. Preset palettes ship as
//! base64-encoded byte triplets extracted offline from the flam3 palette
//! collection; the decode step (base64 -> bytes -> `byte / 255`) is part of
//! the palette loading contract here.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// Embedded preset palettes, generated offline from flam3-palettes.xml
const PALETTES_JSON: &str = include_str!("palettes.json");

#[derive(Deserialize)]
struct EncodedPalette {
    name: String,
    data: String,
}

/// All embedded preset palettes, keyed by name.
static PRESET_PALETTES: Lazy<HashMap<String, Palette>> = Lazy::new(|| {
    let encoded: Vec<EncodedPalette> =
        serde_json::from_str(PALETTES_JSON).expect("embedded palettes.json is well-formed");

    encoded
        .into_iter()
        .map(|palette| {
            let decoded = Palette::from_base64(&palette.name, &palette.data)
                .expect("embedded palette data decodes");
            (palette.name, decoded)
        })
        .collect()
});

/// Look up an embedded preset palette by name.
pub fn preset_palette(name: &str) -> Option<Palette> {
    PRESET_PALETTES.get(name).cloned()
}

/// Names of all embedded preset palettes, sorted.
pub fn preset_palette_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PRESET_PALETTES.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// A named, ordered sequence of RGB triplets with components in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    /// Flat RGB triplets; length is a multiple of 3
    pub colors: Vec<f32>,
}

impl Palette {
    /// Decode a palette from base64-encoded byte triplets (one byte per
    /// R/G/B channel).
    pub fn from_base64(name: &str, data: &str) -> Result<Self, String> {
        let bytes = BASE64
            .decode(data)
            .map_err(|e| format!("palette {}: invalid base64: {}", name, e))?;

        if bytes.is_empty() || bytes.len() % 3 != 0 {
            return Err(format!(
                "palette {}: byte count must be a positive multiple of 3, got {}",
                name,
                bytes.len()
            ));
        }

        let colors = bytes.iter().map(|&b| f32::from(b) / 255.0).collect();
        Ok(Self {
            name: name.to_string(),
            colors,
        })
    }

    /// The seven-color rainbow palette from the original renderer.
    pub fn rainbow() -> Self {
        Self {
            name: "rainbow".to_string(),
            colors: vec![
                1.0, 0.0, 0.0, // red
                1.0, 1.0, 0.0, // yellow
                0.0, 1.0, 0.0, // green
                0.0, 1.0, 1.0, // cyan
                0.0, 0.0, 1.0, // blue
                1.0, 0.0, 1.0, // magenta
                1.0, 1.0, 1.0, // white
            ],
        }
    }

    /// Number of colors in the palette.
    pub fn color_count(&self) -> usize {
        self.colors.len() / 3
    }

    /// Sample the palette at `t` in [0, 1]. Values outside the range are
    /// clamped. Matches the GPU lookup: truncating index, no interpolation.
    pub fn sample(&self, t: f32) -> [f32; 3] {
        let count = self.color_count();
        let t = t.clamp(0.0, 1.0);
        let index = ((t * (count - 1) as f32) as usize).min(count - 1);
        [
            self.colors[index * 3],
            self.colors[index * 3 + 1],
            self.colors[index * 3 + 2],
        ]
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.colors.is_empty() || self.colors.len() % 3 != 0 {
            return Err(format!(
                "palette {}: length must be a positive multiple of 3, got {}",
                self.name,
                self.colors.len()
            ));
        }
        if self.colors.iter().any(|&c| !(0.0..=1.0).contains(&c)) {
            return Err(format!(
                "palette {}: components must be normalized to [0, 1]",
                self.name
            ));
        }
        Ok(())
    }
}
