use {
    crate::error::{
        Result,
        Td3Error,
    },
    candle_core::{
        Device,
        Tensor,
    },
    std::ops::RangeInclusive,
};

/// The per-dimension `[low, high]` bounds of a continuous action space.
///
/// Immutable for the lifetime of the agent. The bounds define the hard clip
/// applied to exploration actions and to target-policy actions inside the
/// update step, as well as the actor's output scaling.
///
/// Output scaling multiplies the actor's `tanh` output by the upper bound
/// only, so the bounds are assumed symmetric (`low == -high`). Asymmetric
/// bounds are clipped correctly but scaled incorrectly.
#[derive(Clone)]
pub struct ActionBound {
    low: Tensor,
    high: Tensor,
    size_action: usize,
}
impl ActionBound {
    pub fn new(
        domain: &[RangeInclusive<f64>],
        device: &Device,
    ) -> Result<Self> {
        let lows: Vec<f64> = domain.iter().map(|range| *range.start()).collect();
        let highs: Vec<f64> = domain.iter().map(|range| *range.end()).collect();
        Ok(Self {
            low: Tensor::new(lows, device)?,
            high: Tensor::new(highs, device)?,
            size_action: domain.len(),
        })
    }

    pub fn size_action(&self) -> usize {
        self.size_action
    }

    /// The upper bound, broadcast-multiplied onto the actor's `tanh` output.
    pub fn scale(&self) -> &Tensor {
        &self.high
    }

    /// Clip each action dimension into its own `[low, high]` range.
    ///
    /// Idempotent, and the identity for actions already inside the bounds.
    /// The action may carry a leading batch dimension.
    pub fn clip(
        &self,
        action: &Tensor,
    ) -> Result<Tensor> {
        let got = *action.dims().last().unwrap_or(&0);
        if got != self.size_action {
            return Err(Td3Error::ShapeMismatch {
                what: "action",
                expected: self.size_action,
                got,
            });
        }
        Ok(action
            .broadcast_maximum(&self.low)?
            .broadcast_minimum(&self.high)?)
    }
}
