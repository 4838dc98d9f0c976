use {
    crate::error::Result,
    candle_core::Tensor,
};

/// Zero-mean Gaussian noise with a fixed standard deviation.
///
/// TD3 uses two instances of this: one for exploration during action
/// selection (unclipped), and one for target-policy smoothing inside the
/// update step (clipped via [`GaussianNoise::sample_clipped`]).
#[derive(Clone, Copy)]
pub struct GaussianNoise {
    stddev: f64,
}
impl GaussianNoise {
    pub fn new(stddev: f64) -> Self {
        Self { stddev }
    }

    /// Draw noise with the shape, dtype and device of `reference`.
    pub fn sample_like(
        &self,
        reference: &Tensor,
    ) -> Result<Tensor> {
        Ok(reference.randn_like(0.0, self.stddev)?)
    }

    /// Draw noise like [`GaussianNoise::sample_like`], then clamp it into
    /// `[-clip, clip]` before it is applied.
    pub fn sample_clipped(
        &self,
        reference: &Tensor,
        clip: f64,
    ) -> Result<Tensor> {
        Ok(self.sample_like(reference)?.clamp(-clip, clip)?)
    }
}
