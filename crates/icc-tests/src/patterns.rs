//! Test pattern generation
//!
//! Patterns are produced as normalized samples so one pattern can be
//! packed into any depth and layout.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Test pattern types
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Ramp from black to white, equal channels
    Grayscale,
    /// Corners of the unit cube, cycled
    ColorCube,
    /// Evenly spaced lattice with `n` steps per channel
    Lattice(usize),
    /// Random samples with seed
    Random(u64),
}

/// `count` pixels of `channels` normalized components
pub fn generate_samples(pattern: TestPattern, count: usize, channels: usize) -> Vec<f64> {
    let mut data = vec![0.0; count * channels];
    match pattern {
        TestPattern::Grayscale => {
            let last = count.saturating_sub(1).max(1) as f64;
            for (i, px) in data.chunks_exact_mut(channels).enumerate() {
                px.fill(i as f64 / last);
            }
        }
        TestPattern::ColorCube => {
            for (i, px) in data.chunks_exact_mut(channels).enumerate() {
                let corner = i % (1 << channels.min(16));
                for (c, v) in px.iter_mut().enumerate() {
                    *v = ((corner >> c) & 1) as f64;
                }
            }
        }
        TestPattern::Lattice(steps) => {
            let steps = steps.max(2);
            for (i, px) in data.chunks_exact_mut(channels).enumerate() {
                let mut rest = i;
                for v in px.iter_mut() {
                    *v = (rest % steps) as f64 / (steps - 1) as f64;
                    rest /= steps;
                }
            }
        }
        TestPattern::Random(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for v in &mut data {
                *v = rng.gen_range(0.0..=1.0);
            }
        }
    }
    data
}

/// Generate a pattern as a packed RGB8 buffer
pub fn generate_pattern(pattern: TestPattern, width: usize, height: usize) -> Vec<u8> {
    generate_samples(pattern, width * height, 3)
        .into_iter()
        .map(|v| (v * 255.0).round() as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_ends() {
        let data = generate_pattern(TestPattern::Grayscale, 4, 1);
        assert_eq!(&data[..3], &[0, 0, 0]);
        assert_eq!(&data[9..], &[255, 255, 255]);
    }

    #[test]
    fn test_color_cube_corners() {
        let data = generate_samples(TestPattern::ColorCube, 8, 3);
        assert_eq!(&data[3..6], &[1.0, 0.0, 0.0]);
        assert_eq!(&data[21..], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_lattice_covers_grid() {
        let data = generate_samples(TestPattern::Lattice(3), 27, 3);
        assert_eq!(&data[..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&data[78..], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_random_deterministic() {
        let a = generate_pattern(TestPattern::Random(42), 10, 10);
        let b = generate_pattern(TestPattern::Random(42), 10, 10);
        assert_eq!(a, b);
    }
}
