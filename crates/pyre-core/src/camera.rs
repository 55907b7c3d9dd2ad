//! Camera projection from fractal coordinate space into the histogram grid.

/// Build the 3x3 row-major affine matrix mapping world coordinates to pixel
/// coordinates in a `viewport`-sized grid.
///
/// `camera` is `[center_x, center_y, zoom]`. The visible x range is
/// `[cx - 1/zoom, cx + 1/zoom]` mapped onto `[0, W-1]`; the y range is
/// scaled by the aspect ratio `H/W` and mapped onto `[H-1, 0]`, so
/// increasing world y moves up the image.
pub fn camera_matrix(viewport: [u32; 2], camera: [f32; 3]) -> [[f32; 3]; 3] {
    let [width, height] = viewport;
    let [cx, cy, zoom] = camera;

    let half_x = 1.0 / zoom;
    let half_y = half_x * (height as f32 / width as f32);

    let scale_x = (width - 1) as f32 / (2.0 * half_x);
    let scale_y = (height - 1) as f32 / (2.0 * half_y);

    [
        [scale_x, 0.0, -(cx - half_x) * scale_x],
        [0.0, -scale_y, (cy + half_y) * scale_y],
        [0.0, 0.0, 1.0],
    ]
}

/// Apply a projection matrix to a world point, yielding pixel coordinates.
pub fn project(matrix: &[[f32; 3]; 3], x: f32, y: f32) -> (f32, f32) {
    (
        matrix[0][0] * x + matrix[0][1] * y + matrix[0][2],
        matrix[1][0] * x + matrix[1][1] * y + matrix[1][2],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_origin_maps_to_center_pixel() {
        let matrix = camera_matrix([101, 51], [0.0, 0.0, 1.0]);
        let (px, py) = project(&matrix, 0.0, 0.0);
        assert!((px - 50.0).abs() < 1e-4);
        assert!((py - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_x_range_spans_viewport() {
        let matrix = camera_matrix([100, 100], [0.0, 0.0, 1.0]);

        let (left, _) = project(&matrix, -1.0, 0.0);
        let (right, _) = project(&matrix, 1.0, 0.0);
        assert!((left - 0.0).abs() < 1e-4);
        assert!((right - 99.0).abs() < 1e-4);
    }

    #[test]
    fn test_y_axis_is_inverted() {
        // For a square viewport at zoom 1, world y = +1 is the top row
        let matrix = camera_matrix([100, 100], [0.0, 0.0, 1.0]);

        let (_, top) = project(&matrix, 0.0, 1.0);
        let (_, bottom) = project(&matrix, 0.0, -1.0);
        assert!((top - 0.0).abs() < 1e-4);
        assert!((bottom - 99.0).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_narrows_visible_range() {
        let matrix = camera_matrix([100, 100], [0.0, 0.0, 2.0]);

        // At zoom 2 the visible x range is [-0.5, 0.5]
        let (left, _) = project(&matrix, -0.5, 0.0);
        let (right, _) = project(&matrix, 0.5, 0.0);
        assert!((left - 0.0).abs() < 1e-4);
        assert!((right - 99.0).abs() < 1e-4);
    }

    #[test]
    fn test_camera_center_offsets_projection() {
        let matrix = camera_matrix([101, 101], [2.0, -1.0, 1.0]);
        let (px, py) = project(&matrix, 2.0, -1.0);
        assert!((px - 50.0).abs() < 1e-4);
        assert!((py - 50.0).abs() < 1e-4);
    }
}
