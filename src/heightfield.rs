//! Heightfield container.
//!
//! Rectangular grid of `f32` values with edge-clamped sampling and a
//! tensor-product bilinear resample. Generalizes the square grid the
//! original algorithm sketch assumes to a `width x height` rectangle so a
//! non-square atlas canvas (`rows != cols`) can be produced by a single
//! continuous field; see `DESIGN.md` for why this generalization is safe.

/// Owned `width x height` grid of `f32` heights, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    pub width: usize,
    pub height: usize,
    data: Vec<f32>,
}

impl HeightField {
    /// Allocate a `width x height` field filled with `fill`.
    pub fn create(width: usize, height: usize, fill: f32) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    fn index(&self, x: i64, y: i64) -> usize {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        cy * self.width + cx
    }

    /// Sample at integer coordinates, clamping `(x,y)` to `[0,width) x [0,height)`.
    pub fn get(&self, x: i64, y: i64) -> f32 {
        self.data[self.index(x, y)]
    }

    /// Write at integer coordinates. `x`/`y` must be in-bounds.
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let idx = y * self.width + x;
        self.data[idx] = v;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = (usize, usize)> {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    /// Bilinear resample to a new `new_w x new_h` field.
    ///
    /// `u = i * (width-1) / (new_w-1)` (and likewise for `v`), the standard
    /// tensor-product formula. Idempotent when `(new_w, new_h) == (width,
    /// height)`, and produces the same values whether upsampling or
    /// downsampling, because it is defined purely in terms of continuous
    /// source coordinates rather than a box filter.
    pub fn resample_to(&self, new_w: usize, new_h: usize) -> HeightField {
        let mut out = HeightField::create(new_w, new_h, 0.0);
        let scale_x = if new_w > 1 {
            (self.width - 1) as f64 / (new_w - 1) as f64
        } else {
            0.0
        };
        let scale_y = if new_h > 1 {
            (self.height - 1) as f64 / (new_h - 1) as f64
        } else {
            0.0
        };

        for j in 0..new_h {
            let v = j as f64 * scale_y;
            let y0 = v.floor() as i64;
            let fy = (v - y0 as f64) as f32;
            for i in 0..new_w {
                let u = i as f64 * scale_x;
                let x0 = u.floor() as i64;
                let fx = (u - x0 as f64) as f32;

                let h00 = self.get(x0, y0);
                let h10 = self.get(x0 + 1, y0);
                let h01 = self.get(x0, y0 + 1);
                let h11 = self.get(x0 + 1, y0 + 1);

                let h0 = h00 * (1.0 - fx) + h10 * fx;
                let h1 = h01 * (1.0 - fx) + h11 * fx;
                out.set(i, j, h0 * (1.0 - fy) + h1 * fy);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_clamp_outside_bounds() {
        let mut h = HeightField::create(4, 4, 0.0);
        h.set(0, 0, 1.0);
        h.set(3, 3, 9.0);
        assert_eq!(h.get(-5, -5), 1.0);
        assert_eq!(h.get(100, 100), 9.0);
    }

    #[test]
    fn resample_idempotent() {
        let mut h = HeightField::create(5, 5, 0.0);
        for (x, y) in h.iter_coords() {
            h.set(x, y, (x * 3 + y) as f32);
        }
        let same = h.resample_to(5, 5);
        assert_eq!(h, same);
    }

    #[test]
    fn resample_up_then_down_preserves_corners() {
        let mut h = HeightField::create(4, 4, 0.0);
        h.set(0, 0, 1.0);
        h.set(3, 0, 2.0);
        h.set(0, 3, 3.0);
        h.set(3, 3, 4.0);

        let up = h.resample_to(9, 9);
        assert!((up.get(0, 0) - 1.0).abs() < 1e-6);
        assert!((up.get(8, 0) - 2.0).abs() < 1e-6);
        assert!((up.get(0, 8) - 3.0).abs() < 1e-6);
        assert!((up.get(8, 8) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn resample_rectangular_target() {
        let h = HeightField::create(4, 4, 5.0);
        let r = h.resample_to(10, 6);
        assert_eq!(r.width, 10);
        assert_eq!(r.height, 6);
        assert!((r.get(5, 3) - 5.0).abs() < 1e-6);
    }
}
