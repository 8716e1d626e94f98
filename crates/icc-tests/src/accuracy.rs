//! Accuracy measurement
//!
//! Byte-level agreement uses the largest per-channel difference; perceptual
//! agreement uses CIEDE2000 on D50 Lab, computed by palette.

use oxicc_core::{Lab, Xyz};
use palette::color_difference::Ciede2000;
use palette::white_point::D50;

/// Statistics from a deltaE comparison
#[derive(Debug, Clone)]
pub struct DeltaEStats {
    pub mean: f64,
    pub max: f64,
    pub count: usize,
}

impl DeltaEStats {
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let (mut sum, mut max, mut count) = (0.0, 0.0f64, 0usize);
        for s in samples {
            sum += s;
            max = max.max(s);
            count += 1;
        }
        Self {
            mean: if count == 0 { 0.0 } else { sum / count as f64 },
            max,
            count,
        }
    }

    /// Every difference below the threshold of perception
    pub fn is_excellent(&self) -> bool {
        self.max < 1.0
    }
}

/// CIEDE2000 between two D50 Lab colors
pub fn delta_e_2000(a: [f64; 3], b: [f64; 3]) -> f64 {
    let a = palette::Lab::<D50, f64>::new(a[0], a[1], a[2]);
    let b = palette::Lab::<D50, f64>::new(b[0], b[1], b[2]);
    a.difference(b)
}

/// D50 Lab of a PCS XYZ value
pub fn xyz_to_lab(xyz: [f64; 3]) -> [f64; 3] {
    Lab::from_xyz(Xyz::from_array(xyz)).to_array()
}

/// Largest absolute difference between two equally sized buffers
pub fn max_channel_diff<T: Copy + Into<f64>>(a: &[T], b: &[T]) -> f64 {
    assert_eq!(a.len(), b.len(), "buffer sizes differ");
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x.into() - y.into()).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_colors() {
        assert!(delta_e_2000([50.0, 10.0, -10.0], [50.0, 10.0, -10.0]) < 1e-9);
    }

    #[test]
    fn test_lightness_difference() {
        let d = delta_e_2000([50.0, 0.0, 0.0], [51.0, 0.0, 0.0]);
        assert!(d > 0.5 && d < 1.5);
    }

    #[test]
    fn test_stats() {
        let stats = DeltaEStats::from_samples([0.2, 0.4, 0.9]);
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 0.5).abs() < 1e-12);
        assert!(stats.is_excellent());
    }

    #[test]
    fn test_max_channel_diff() {
        assert_eq!(max_channel_diff(&[1u8, 5, 9], &[2u8, 5, 6]), 3.0);
        assert_eq!(max_channel_diff::<u16>(&[], &[]), 0.0);
    }
}
