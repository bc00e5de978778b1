use nalgebra::Matrix3;
use crate::image_pipeline::distortion::{DistortionModel, LensModel};

/// Marker stored in both coordinates of an output pixel with no source.
pub const INVALID_COORDINATE: f32 = -1.0;

const EDGE_NUDGE: f32 = 0.001;

/// Per-output-pixel source coordinates in the raw image.
///
/// A valid entry has all four bilinear neighbours inside the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct RemapTable {
    width: usize,
    height: usize,
    source_width: usize,
    source_height: usize,
    map_x: Vec<f32>,
    map_y: Vec<f32>,
}

impl RemapTable {
    /// Projects every output pixel through `k⁻¹` and the lens model.
    pub fn build(model: &LensModel, k: &Matrix3<f64>, output: (usize, usize), source: (usize, usize)) -> Self {
        let (width, height) = output;
        let (source_width, source_height) = source;
        let (fx, fy, cx, cy) = (k[(0, 0)], k[(1, 1)], k[(0, 2)], k[(1, 2)]);

        let mut xs = Vec::with_capacity(width * height);
        let mut ys = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                xs.push((x as f64 - cx) / fx);
                ys.push((y as f64 - cy) / fy);
            }
        }
        model.distort_coordinates(&mut xs, &mut ys);

        let max_x = (source_width - 1) as f32;
        let max_y = (source_height - 1) as f32;
        let mut map_x = Vec::with_capacity(xs.len());
        let mut map_y = Vec::with_capacity(ys.len());
        for (&x, &y) in xs.iter().zip(&ys) {
            let (mut ix, mut iy) = (x as f32, y as f32);
            // Coordinates exactly on the border still have a usable neighbour.
            if ix == 0.0 {
                ix = EDGE_NUDGE;
            }
            if ix == max_x {
                ix = max_x - EDGE_NUDGE;
            }
            if iy == 0.0 {
                iy = EDGE_NUDGE;
            }
            if iy == max_y {
                iy = max_y - EDGE_NUDGE;
            }

            if ix > 0.0 && iy > 0.0 && ix < max_x && iy < max_y {
                map_x.push(ix);
                map_y.push(iy);
            } else {
                map_x.push(INVALID_COORDINATE);
                map_y.push(INVALID_COORDINATE);
            }
        }

        Self {
            width,
            height,
            source_width,
            source_height,
            map_x,
            map_y,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn source_size(&self) -> (usize, usize) {
        (self.source_width, self.source_height)
    }

    pub fn map_x(&self) -> &[f32] {
        &self.map_x
    }

    pub fn map_y(&self) -> &[f32] {
        &self.map_y
    }

    /// Source coordinates of output pixel `(x, y)`, `None` for sentinel entries.
    pub fn get(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        let idx = y * self.width + x;
        self.is_valid(idx).then(|| (self.map_x[idx], self.map_y[idx]))
    }

    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.map_x[idx] != INVALID_COORDINATE
    }

    pub fn valid_count(&self) -> usize {
        self.map_x.iter().filter(|&&x| x != INVALID_COORDINATE).count()
    }

    /// Resamples `source` into `output`; sentinel pixels become 0.
    pub fn remap(&self, source: &[f32], output: &mut [f32]) {
        debug_assert_eq!(source.len(), self.source_width * self.source_height);
        debug_assert_eq!(output.len(), self.width * self.height);

        for ((out, &x), &y) in output.iter_mut().zip(&self.map_x).zip(&self.map_y) {
            *out = if x == INVALID_COORDINATE {
                0.0
            } else {
                bilinear(source, self.source_width, x, y)
            };
        }
    }
}

#[inline]
fn bilinear(source: &[f32], stride: usize, x: f32, y: f32) -> f32 {
    let xi = x as usize;
    let yi = y as usize;
    let dx = x - xi as f32;
    let dy = y - yi as f32;
    let dxdy = dx * dy;

    let base = yi * stride + xi;
    dxdy * source[base + 1 + stride]
        + (dy - dxdy) * source[base + stride]
        + (dx - dxdy) * source[base + 1]
        + (1.0 - dx - dy + dxdy) * source[base]
}
