//! Indicator trait definitions.

use crate::types::Bar;

/// Streaming indicator over a single input series (typically closes).
///
/// Values are causal: the output after `update` depends only on the
/// inputs seen so far. `None` means the indicator is still warming up.
pub trait StreamingIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Update the indicator with a new value.
    ///
    /// # Arguments
    /// * `value` - New input value
    ///
    /// # Returns
    /// The current indicator value, or None if not yet ready
    fn update(&mut self, value: f64) -> Option<Self::Output>;

    /// Get the current value without adding new data.
    fn current(&self) -> Option<Self::Output>;

    /// Reset the indicator state.
    fn reset(&mut self);

    /// Check if the indicator has enough data to produce values.
    fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Get the lookback period.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Streaming indicator that consumes whole bars (e.g. ATR needs high/low).
pub trait BarIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Update the indicator with the next bar.
    fn update(&mut self, bar: &Bar) -> Option<Self::Output>;

    /// Get the current value without adding new data.
    fn current(&self) -> Option<Self::Output>;

    /// Reset the indicator state.
    fn reset(&mut self);

    /// Get the lookback period.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
