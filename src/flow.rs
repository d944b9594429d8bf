//! D8 flow-accumulation solver.
//!
//! Grounded in `erosion::rivers::compute_flow_direction` /
//! `compute_flow_accumulation` (same D8 direction table, same
//! descending-height sweep), generalized from an unweighted steepest-descent
//! search to a distance-weighted slope, and from "ocean cells excluded" to
//! "every cell participates, ties broken by `(y,x)`".

use crate::heightfield::HeightField;

/// `(dx, dy)` offsets for the 8 neighbors, rook then diagonal order matching
/// the `DX`/`DY` tables in `erosion/rivers.rs`.
const NEIGHBORS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

fn neighbor_distance(dx: i32, dy: i32) -> f32 {
    if dx != 0 && dy != 0 {
        std::f32::consts::SQRT_2
    } else {
        1.0
    }
}

/// Flow accumulation grid: every cell starts at `1.0` and gains the
/// accumulation of every upstream cell that drains into it.
pub fn flow_accumulation(height: &HeightField) -> HeightField {
    let (w, h) = (height.width, height.height);
    let mut order: Vec<(usize, usize)> = height.iter_coords().collect();
    // Descending height, ties broken by ascending (y,x) for determinism.
    order.sort_by(|&(ax, ay), &(bx, by)| {
        let ha = height.get(ax as i64, ay as i64);
        let hb = height.get(bx as i64, by as i64);
        hb.partial_cmp(&ha)
            .unwrap()
            .then_with(|| ay.cmp(&by))
            .then_with(|| ax.cmp(&bx))
    });

    let mut flow = HeightField::create(w, h, 1.0);

    for (x, y) in order {
        let hp = height.get(x as i64, y as i64);
        let fp = flow.get(x as i64, y as i64);

        let mut best_slope = 0.0f32;
        let mut best: Option<(usize, usize)> = None;

        for &(dx, dy) in &NEIGHBORS {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let hn = height.get(nx as i64, ny as i64);
            let dist = neighbor_distance(dx, dy);
            let slope = (hp - hn) / dist;
            if slope > best_slope {
                best_slope = slope;
                best = Some((nx as usize, ny as usize));
            }
        }

        if let Some((nx, ny)) = best {
            let updated = flow.get(nx as i64, ny as i64) + fp;
            flow.set(nx, ny, updated);
        }
    }

    flow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_floor_is_always_at_least_one() {
        let field = HeightField::create(8, 8, 0.0);
        let flow = flow_accumulation(&field);
        for (x, y) in flow.iter_coords() {
            assert!(flow.get(x as i64, y as i64) >= 1.0);
        }
    }

    #[test]
    fn monotonic_ramp_accumulates_strictly_down_column() {
        let n = 16usize;
        let mut field = HeightField::create(n, n, 0.0);
        for (x, y) in field.iter_coords() {
            field.set(x, y, y as f32 / (n - 1) as f32);
        }
        // Ramp increases with y, so flow drains toward y=0 (downhill).
        let flow = flow_accumulation(&field);
        let mut prev = flow.get(0, (n - 1) as i64);
        for y in (0..n - 1).rev() {
            let cur = flow.get(0, y as i64);
            assert!(cur >= prev, "flow should accumulate moving downhill");
            prev = cur;
        }
        // Last row in the iteration (row 0, the bottom of the drain) should
        // carry accumulation from every column feeding into it.
        let total_at_sink: f32 = (0..n).map(|x| flow.get(x as i64, 0)).sum::<f32>();
        assert!(total_at_sink >= n as f32);
    }

    #[test]
    fn is_deterministic_on_a_flat_field() {
        let field = HeightField::create(10, 10, 1.0);
        let a = flow_accumulation(&field);
        let b = flow_accumulation(&field);
        assert_eq!(a, b);
    }
}
