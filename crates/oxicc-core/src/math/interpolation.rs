//! Interpolation over CLUT grids and 1D tables
//!
//! Grids are flattened with the first input dimension varying slowest and
//! the output channels innermost, which is the ICC storage order.

/// Linear interpolation between two values
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Piecewise-linear lookup into a table spanning [0, 1]
#[inline]
pub fn interp_table(table: &[f64], x: f64) -> f64 {
    match table.len() {
        0 => x,
        1 => table[0],
        n => {
            let pos = x.clamp(0.0, 1.0) * (n - 1) as f64;
            let i = (pos.floor() as usize).min(n - 2);
            lerp(table[i], table[i + 1], pos - i as f64)
        }
    }
}

/// Locate `x` in a grid of `n` points: lower index, upper index, fraction
#[inline]
fn grid_cell(x: f64, n: usize) -> (usize, usize, f64) {
    let max_idx = (n - 1) as f64;
    let pos = (x * max_idx).clamp(0.0, max_idx);
    let i0 = pos.floor() as usize;
    let i1 = (i0 + 1).min(n - 1);
    (i0, i1, pos - i0 as f64)
}

/// Trilinear interpolation in a cubic 3D grid with `out.len()` outputs
pub fn trilinear_interp(lut: &[f64], grid_size: usize, input: [f64; 3], out: &mut [f64]) {
    let channels = out.len();
    let (r0, r1, fr) = grid_cell(input[0], grid_size);
    let (g0, g1, fg) = grid_cell(input[1], grid_size);
    let (b0, b1, fb) = grid_cell(input[2], grid_size);

    let at = |r: usize, g: usize, b: usize, c: usize| -> f64 {
        let i = ((r * grid_size + g) * grid_size + b) * channels + c;
        lut.get(i).copied().unwrap_or(0.0)
    };

    for (c, o) in out.iter_mut().enumerate() {
        let c00 = lerp(at(r0, g0, b0, c), at(r1, g0, b0, c), fr);
        let c10 = lerp(at(r0, g1, b0, c), at(r1, g1, b0, c), fr);
        let c01 = lerp(at(r0, g0, b1, c), at(r1, g0, b1, c), fr);
        let c11 = lerp(at(r0, g1, b1, c), at(r1, g1, b1, c), fr);
        *o = lerp(lerp(c00, c10, fg), lerp(c01, c11, fg), fb);
    }
}

/// Tetrahedral interpolation in a cubic 3D grid with `out.len()` outputs
///
/// Each cube is split into 6 tetrahedra along the main diagonal; the one
/// holding the input is picked from the ordering of the fractions.
pub fn tetrahedral_interp(lut: &[f64], grid_size: usize, input: [f64; 3], out: &mut [f64]) {
    let channels = out.len();
    let (r0, r1, fr) = grid_cell(input[0], grid_size);
    let (g0, g1, fg) = grid_cell(input[1], grid_size);
    let (b0, b1, fb) = grid_cell(input[2], grid_size);

    let base = |r: usize, g: usize, b: usize| ((r * grid_size + g) * grid_size + b) * channels;
    let at = |idx: usize, c: usize| lut.get(idx + c).copied().unwrap_or(0.0);

    let c000 = base(r0, g0, b0);
    let c111 = base(r1, g1, b1);
    // The two intermediate vertices, visited in order of decreasing fraction
    let (first, second, w) = if fr > fg {
        if fg > fb {
            (base(r1, g0, b0), base(r1, g1, b0), [fr, fg, fb])
        } else if fr > fb {
            (base(r1, g0, b0), base(r1, g0, b1), [fr, fb, fg])
        } else {
            (base(r0, g0, b1), base(r1, g0, b1), [fb, fr, fg])
        }
    } else if fg > fb {
        if fr > fb {
            (base(r0, g1, b0), base(r1, g1, b0), [fg, fr, fb])
        } else {
            (base(r0, g1, b0), base(r0, g1, b1), [fg, fb, fr])
        }
    } else {
        (base(r0, g0, b1), base(r0, g1, b1), [fb, fg, fr])
    };

    for (c, o) in out.iter_mut().enumerate() {
        let v0 = at(c000, c);
        let v1 = at(first, c);
        let v2 = at(second, c);
        let v3 = at(c111, c);
        *o = v0 + w[0] * (v1 - v0) + w[1] * (v2 - v1) + w[2] * (v3 - v2);
    }
}

/// Multilinear interpolation over any number of input dimensions.
///
/// `grid` holds the point count of each dimension; cost grows as
/// 2^dimensions, so this is meant for the non-3D cases.
pub fn multilinear_interp(lut: &[f64], grid: &[usize], input: &[f64], out: &mut [f64]) {
    let channels = out.len();
    let dims = grid.len().min(input.len());
    out.iter_mut().for_each(|o| *o = 0.0);
    if dims == 0 {
        return;
    }

    let cells: Vec<(usize, usize, f64)> = (0..dims)
        .map(|d| grid_cell(input[d], grid[d].max(1)))
        .collect();

    for corner in 0..(1usize << dims) {
        let mut weight = 1.0;
        let mut index = 0usize;
        for (d, &(i0, i1, f)) in cells.iter().enumerate() {
            let high = corner & (1 << (dims - 1 - d)) != 0;
            weight *= if high { f } else { 1.0 - f };
            index = index * grid[d] + if high { i1 } else { i0 };
        }
        if weight == 0.0 {
            continue;
        }
        let base = index * channels;
        for (c, o) in out.iter_mut().enumerate() {
            *o += weight * lut.get(base + c).copied().unwrap_or(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity 3D LUT: output equals the grid coordinate
    fn identity_lut(grid: usize) -> Vec<f64> {
        let mut lut = Vec::with_capacity(grid * grid * grid * 3);
        let max = (grid - 1) as f64;
        for r in 0..grid {
            for g in 0..grid {
                for b in 0..grid {
                    lut.extend_from_slice(&[r as f64 / max, g as f64 / max, b as f64 / max]);
                }
            }
        }
        lut
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.25), 2.5);
    }

    #[test]
    fn test_interp_table() {
        let table = [0.0, 0.5, 1.0];
        assert!((interp_table(&table, 0.25) - 0.25).abs() < 1e-12);
        assert!((interp_table(&table, 2.0) - 1.0).abs() < 1e-12);
        assert_eq!(interp_table(&[], 0.3), 0.3);
    }

    #[test]
    fn test_identity_luts_reproduce_input() {
        let lut = identity_lut(5);
        let input = [0.13, 0.71, 0.42];
        let mut tet = [0.0; 3];
        let mut tri = [0.0; 3];
        let mut multi = [0.0; 3];
        tetrahedral_interp(&lut, 5, input, &mut tet);
        trilinear_interp(&lut, 5, input, &mut tri);
        multilinear_interp(&lut, &[5, 5, 5], &input, &mut multi);
        for c in 0..3 {
            assert!((tet[c] - input[c]).abs() < 1e-12);
            assert!((tri[c] - input[c]).abs() < 1e-12);
            assert!((multi[c] - input[c]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_grid_corners_exact() {
        let lut = identity_lut(3);
        let mut out = [0.0; 3];
        tetrahedral_interp(&lut, 3, [1.0, 0.0, 0.5], &mut out);
        assert_eq!(out, [1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_multilinear_4d_single_output() {
        // 2x2x2x2 grid, output = sum of inputs / 4
        let mut lut = Vec::new();
        for a in 0..2 {
            for b in 0..2 {
                for c in 0..2 {
                    for d in 0..2 {
                        lut.push((a + b + c + d) as f64 / 4.0);
                    }
                }
            }
        }
        let mut out = [0.0];
        multilinear_interp(&lut, &[2, 2, 2, 2], &[0.2, 0.4, 0.6, 0.8], &mut out);
        assert!((out[0] - 0.5).abs() < 1e-12);
    }
}
