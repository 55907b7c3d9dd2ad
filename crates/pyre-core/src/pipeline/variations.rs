//! The variation catalog: nonlinear warps applied after a transform's
//! affine map.
//!
//! Each variation is a pure map of the affine-mapped point; Julia
//! additionally consumes one random bit. Formulas follow the classical
//! flame-fractal catalog. Singularities (a vanishing radius or divisor) are
//! guarded: the affine-mapped point is returned unchanged instead of
//! propagating NaN/Inf into the histogram.

use std::f32::consts::PI;

use crate::models::{Variation, XForm};

/// Threshold below which a radius or divisor counts as singular.
const EPS: f32 = 1e-6;

/// Apply `variation` to the affine-mapped point `(x, y)`.
///
/// `affine` supplies the coefficients read by the dependent variations
/// (waves, popcorn, rings, fan). `julia_bit` selects the branch of the
/// two-valued Julia map.
pub fn apply_variation(
    variation: Variation,
    x: f32,
    y: f32,
    affine: &[f32; 6],
    julia_bit: bool,
) -> (f32, f32) {
    let r2 = x * x + y * y;
    let r = r2.sqrt();
    // Flame convention: theta measured so that x = r sin(theta)
    let theta = x.atan2(y);

    match variation {
        Variation::Linear => (x, y),
        Variation::Sinusoidal => (x.sin(), y.sin()),
        Variation::Spherical => {
            if r2 < EPS {
                return (x, y);
            }
            (x / r2, y / r2)
        }
        Variation::Swirl => {
            let (sin_r2, cos_r2) = r2.sin_cos();
            (x * sin_r2 - y * cos_r2, x * cos_r2 + y * sin_r2)
        }
        Variation::Horseshoe => {
            if r < EPS {
                return (x, y);
            }
            ((x - y) * (x + y) / r, 2.0 * x * y / r)
        }
        Variation::Polar => (theta / PI, r - 1.0),
        Variation::Handkerchief => (r * (theta + r).sin(), r * (theta - r).cos()),
        Variation::Heart => (r * (theta * r).sin(), -r * (theta * r).cos()),
        Variation::Disc => {
            let scale = theta / PI;
            (scale * (PI * r).sin(), scale * (PI * r).cos())
        }
        Variation::Spiral => {
            if r < EPS {
                return (x, y);
            }
            ((theta.cos() + r.sin()) / r, (theta.sin() - r.cos()) / r)
        }
        Variation::Hyperbolic => {
            if r < EPS {
                return (x, y);
            }
            (theta.sin() / r, r * theta.cos())
        }
        Variation::Diamond => (theta.sin() * r.cos(), theta.cos() * r.sin()),
        Variation::Ex => {
            let p0 = (theta + r).sin();
            let p1 = (theta - r).cos();
            let p0 = p0 * p0 * p0;
            let p1 = p1 * p1 * p1;
            (r * (p0 + p1), r * (p0 - p1))
        }
        Variation::Julia => {
            let omega = if julia_bit { PI } else { 0.0 };
            let angle = theta / 2.0 + omega;
            let sqrt_r = r.sqrt();
            (sqrt_r * angle.cos(), sqrt_r * angle.sin())
        }
        Variation::Bent => {
            let bx = if x < 0.0 { 2.0 * x } else { x };
            let by = if y < 0.0 { y / 2.0 } else { y };
            (bx, by)
        }
        Variation::Waves => {
            let (b, c) = (affine[1], affine[2]);
            let (e, f) = (affine[4], affine[5]);
            (
                x + b * (y / (c * c + EPS)).sin(),
                y + e * (x / (f * f + EPS)).sin(),
            )
        }
        Variation::Fisheye => {
            let scale = 2.0 / (r + 1.0);
            (scale * y, scale * x)
        }
        Variation::Popcorn => {
            let (c, f) = (affine[2], affine[5]);
            (
                x + c * (3.0 * y).tan().sin(),
                y + f * (3.0 * x).tan().sin(),
            )
        }
        Variation::Exponential => {
            let factor = (x - 1.0).exp();
            (factor * (PI * y).cos(), factor * (PI * y).sin())
        }
        Variation::Power => {
            let factor = r.powf(theta.sin());
            (factor * theta.cos(), factor * theta.sin())
        }
        Variation::Cosine => ((PI * x).cos() * y.cosh(), -(PI * x).sin() * y.sinh()),
        Variation::Rings => {
            let c2 = affine[2] * affine[2];
            let modulus = 2.0 * c2;
            if modulus < EPS {
                return (x, y);
            }
            let factor = (r + c2).rem_euclid(modulus) - c2 + r * (1.0 - c2);
            (factor * theta.cos(), factor * theta.sin())
        }
        Variation::Fan => {
            let t = PI * affine[2] * affine[2];
            if t < EPS {
                return (x, y);
            }
            let f = affine[5];
            let angle = if (theta + f).rem_euclid(t) > t / 2.0 {
                theta - t / 2.0
            } else {
                theta + t / 2.0
            };
            (r * angle.cos(), r * angle.sin())
        }
    }
}

/// Apply a transform: affine map first, then its variation.
pub fn apply_xform(xform: &XForm, x: f32, y: f32, julia_bit: bool) -> (f32, f32) {
    let (ax, ay) = xform.apply_affine(x, y);
    apply_variation(xform.variation, ax, ay, &xform.affine, julia_bit)
}
