//! Well-known flame definitions used by tests, demos, and the CLI.

use crate::models::{Flame, Variation, XForm};

/// Sierpinski triangle: three half-scale linear contractions toward the
/// given triangle vertices, equally weighted.
pub fn sierpinski_triangle(points: [[f32; 2]; 3]) -> Flame {
    let xforms = points
        .iter()
        .enumerate()
        .map(|(i, point)| XForm {
            variation: Variation::Linear,
            affine: [
                0.5,
                0.0,
                0.5 * point[0],
                0.0,
                0.5,
                0.5 * point[1],
            ],
            color: i as f32 / 2.0,
            speed: 0.5,
            weight: 1.0 / 3.0,
        })
        .collect();
    Flame::new(xforms)
}

/// Barnsley fern, coefficients from the classic IFS definition.
pub fn barnsley_fern() -> Flame {
    Flame::new(vec![
        // The stem
        XForm {
            variation: Variation::Linear,
            affine: [0.0, 0.0, 0.0, 0.0, 0.16, 0.0],
            color: 0.0,
            speed: 0.5,
            weight: 0.01,
        },
        // Repeating leaves
        XForm {
            variation: Variation::Linear,
            affine: [0.85, 0.04, 0.0, -0.04, 0.85, 1.6],
            color: 0.5,
            speed: 0.2,
            weight: 0.85,
        },
        // Main leaf on the left side
        XForm {
            variation: Variation::Linear,
            affine: [0.2, -0.26, 0.0, 0.23, 0.22, 1.6],
            color: 1.0,
            speed: 0.5,
            weight: 0.07,
        },
        // Main leaf on the right side
        XForm {
            variation: Variation::Linear,
            affine: [-0.15, 0.28, 0.0, 0.26, 0.24, 0.44],
            color: 1.0,
            speed: 0.5,
            weight: 0.07,
        },
    ])
}

/// A small mixed linear/sinusoidal arrangement that fills the frame quickly.
pub fn example() -> Flame {
    Flame::new(vec![
        XForm {
            variation: Variation::Linear,
            affine: [0.5, 0.0, 0.0, 0.0, 0.5, -0.5],
            color: 0.0,
            speed: 0.5,
            weight: 1.0,
        },
        XForm {
            variation: Variation::Linear,
            affine: [0.5, 0.0, -0.5, 0.0, 0.5, 0.5],
            color: 0.0,
            speed: 0.5,
            weight: 1.0,
        },
        XForm {
            variation: Variation::Sinusoidal,
            affine: [0.5, 0.0, 0.5, 0.0, 0.5, 0.5],
            color: 1.0,
            speed: 0.5,
            weight: 1.0,
        },
        XForm {
            variation: Variation::Linear,
            affine: [-2.0, 0.0, 0.0, 0.0, -2.0, 0.0],
            color: 0.0,
            speed: 0.5,
            weight: 1.0,
        },
    ])
}

/// Four spherical transforms with hand-picked affines; a dense, swirling
/// test flame.
pub fn spherical_test() -> Flame {
    Flame::new(vec![
        XForm {
            variation: Variation::Spherical,
            affine: [-0.681206, 0.20769, -0.0416126, -0.0779465, 0.755065, -0.262334],
            color: 1.0,
            speed: 0.5,
            weight: 0.25,
        },
        XForm {
            variation: Variation::Spherical,
            affine: [0.953766, 0.43268, 0.642503, 0.48396, -0.0542476, -0.995898],
            color: 0.66,
            speed: 0.5,
            weight: 0.25,
        },
        XForm {
            variation: Variation::Spherical,
            affine: [0.840613, 0.318971, 0.905589, -0.816191, -0.430402, 0.909402],
            color: 0.33,
            speed: 0.5,
            weight: 0.25,
        },
        XForm {
            variation: Variation::Spherical,
            affine: [0.960492, 0.215383, -0.126074, -0.466555, -0.727377, 0.253509],
            color: 0.0,
            speed: 0.5,
            weight: 0.25,
        },
    ])
}

/// Names of the built-in generators, as accepted by [`by_name`].
pub fn generator_names() -> &'static [&'static str] {
    &["barnsley-fern", "sierpinski", "example", "spherical"]
}

/// Look up a built-in flame by name.
pub fn by_name(name: &str) -> Option<Flame> {
    match name {
        "barnsley-fern" => Some(barnsley_fern()),
        "sierpinski" => Some(sierpinski_triangle([
            [0.0, 0.866],
            [-0.75, -0.433],
            [0.75, -0.433],
        ])),
        "example" => Some(example()),
        "spherical" => Some(spherical_test()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_xforms;

    #[test]
    fn test_generators_produce_valid_flames() {
        for name in generator_names() {
            let flame = by_name(name).unwrap();
            assert!(flame.validate().is_ok(), "generator {} invalid", name);
        }
    }

    #[test]
    fn test_sierpinski_weights_normalize_to_one() {
        let flame = by_name("sierpinski").unwrap();
        let normalized = normalize_xforms(&flame.xforms);
        let total: f32 = normalized.iter().map(|x| x.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_barnsley_fern_weights() {
        let flame = barnsley_fern();
        let weights: Vec<f32> = flame.xforms.iter().map(|x| x.weight).collect();
        assert_eq!(weights, vec![0.01, 0.85, 0.07, 0.07]);
    }

    #[test]
    fn test_unknown_generator_is_none() {
        assert!(by_name("not-a-generator").is_none());
    }
}
