//! Transform and flame types.

use serde::{Deserialize, Serialize};

/// Nonlinear warp applied after a transform's affine map.
///
/// The set is closed: every kind is a pure deterministic map of the
/// affine-mapped point (Julia additionally consumes one random bit per
/// application).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variation {
    Linear,
    Sinusoidal,
    Spherical,
    Swirl,
    Horseshoe,
    Polar,
    Handkerchief,
    Heart,
    Disc,
    Spiral,
    Hyperbolic,
    Diamond,
    Ex,
    Julia,
    Bent,
    Waves,
    Fisheye,
    Popcorn,
    Exponential,
    Power,
    Cosine,
    Rings,
    Fan,
}

impl Variation {
    /// Stable numeric id, shared with the GPU shader's variation switch.
    pub fn index(self) -> u32 {
        match self {
            Variation::Linear => 0,
            Variation::Sinusoidal => 1,
            Variation::Spherical => 2,
            Variation::Swirl => 3,
            Variation::Horseshoe => 4,
            Variation::Polar => 5,
            Variation::Handkerchief => 6,
            Variation::Heart => 7,
            Variation::Disc => 8,
            Variation::Spiral => 9,
            Variation::Hyperbolic => 10,
            Variation::Diamond => 11,
            Variation::Ex => 12,
            Variation::Julia => 13,
            Variation::Bent => 14,
            Variation::Waves => 15,
            Variation::Fisheye => 16,
            Variation::Popcorn => 17,
            Variation::Exponential => 18,
            Variation::Power => 19,
            Variation::Cosine => 20,
            Variation::Rings => 21,
            Variation::Fan => 22,
        }
    }
}

/// One weighted transform of a flame: a 2D affine map followed by a
/// variation, with a palette color and blend speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XForm {
    /// Nonlinear variation applied after the affine map
    pub variation: Variation,

    /// Affine coefficients `(a, b, c, d, e, f)` mapping
    /// `(x, y) -> (a*x + b*y + c, d*x + e*y + f)`
    pub affine: [f32; 6],

    /// Palette index fraction in [0, 1]
    pub color: f32,

    /// Color blend rate toward this transform's color on selection, in [0, 1]
    pub speed: f32,

    /// Relative selection probability, >= 0
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl XForm {
    /// Apply the affine portion of the transform.
    pub fn apply_affine(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.affine;
        (a * x + b * y + c, d * x + e * y + f)
    }
}

/// A flame definition: an ordered sequence of transforms.
///
/// Order is irrelevant to the rendered image but fixes the cumulative-weight
/// selection order, so it must be stable for reproducible runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Flame {
    pub xforms: Vec<XForm>,
}

impl Flame {
    pub fn new(xforms: Vec<XForm>) -> Self {
        Self { xforms }
    }

    /// Check the flame is renderable.
    ///
    /// Rejects empty transform lists, negative or all-zero weights, and
    /// non-finite or out-of-range parameters. Runs before any dispatch so
    /// invalid parameters never reach the histogram kernels.
    pub fn validate(&self) -> Result<(), String> {
        if self.xforms.is_empty() {
            return Err("flame must contain at least one transform".to_string());
        }

        let mut total_weight = 0.0f32;
        for (i, xform) in self.xforms.iter().enumerate() {
            if xform.weight < 0.0 || !xform.weight.is_finite() {
                return Err(format!(
                    "transform {}: weight must be finite and >= 0, got {}",
                    i, xform.weight
                ));
            }
            if !(0.0..=1.0).contains(&xform.color) {
                return Err(format!(
                    "transform {}: color must be in [0, 1], got {}",
                    i, xform.color
                ));
            }
            if !(0.0..=1.0).contains(&xform.speed) {
                return Err(format!(
                    "transform {}: speed must be in [0, 1], got {}",
                    i, xform.speed
                ));
            }
            if xform.affine.iter().any(|c| !c.is_finite()) {
                return Err(format!("transform {}: affine coefficients must be finite", i));
            }
            total_weight += xform.weight;
        }

        if total_weight <= 0.0 {
            return Err("transform weights must not all be zero".to_string());
        }

        Ok(())
    }
}

/// Rescale transform weights so they sum to 1, as required by the
/// cumulative-weight selection in the point generator.
pub fn normalize_xforms(xforms: &[XForm]) -> Vec<XForm> {
    let total_weight: f32 = xforms.iter().map(|xform| xform.weight).sum();
    xforms
        .iter()
        .map(|xform| XForm {
            weight: xform.weight / total_weight,
            ..xform.clone()
        })
        .collect()
}
