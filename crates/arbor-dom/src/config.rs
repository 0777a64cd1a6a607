//! Tree Configuration

/// Tree configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum microtasks run by one checkpoint.
    ///
    /// `None` runs until the queue is empty, including passes scheduled by
    /// observer callbacks that mutate the tree again.
    pub max_microtasks_per_checkpoint: Option<usize>,

    /// Keep observer callback errors for `take_callback_errors`.
    ///
    /// Retained errors accumulate until the host drains them; hosts that
    /// never call `take_callback_errors` should turn this off.
    pub retain_callback_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_microtasks_per_checkpoint: None,
            retain_callback_errors: true,
        }
    }
}
