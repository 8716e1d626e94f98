//! Transform options

/// Interpolation used for 3-input CLUTs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Six tetrahedra per grid cell
    #[default]
    Tetrahedral,
    /// Eight-corner blend per grid cell
    Trilinear,
}

/// Options applied to every stage of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub interpolation: Interpolation,
    /// Run rows on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            parallel: cfg!(feature = "parallel"),
        }
    }
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let opts = TransformOptions::new()
            .with_interpolation(Interpolation::Trilinear)
            .with_parallel(false);

        assert_eq!(opts.interpolation, Interpolation::Trilinear);
        assert!(!opts.parallel);
        assert_eq!(
            TransformOptions::default().interpolation,
            Interpolation::Tetrahedral
        );
    }
}
