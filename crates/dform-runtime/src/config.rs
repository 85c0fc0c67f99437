#![forbid(unsafe_code)]

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Drop a field's error as soon as its value changes. Default: false,
    /// errors are only recomputed by `validate`, `blur` and `submit`.
    pub clear_error_on_change: bool,
    /// Only `image/*` files get previews. Default: true.
    pub preview_images_only: bool,
    /// Most submission events kept in the trace; older ones are evicted.
    /// 0 keeps everything. Default: 256.
    pub trace_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clear_error_on_change: false,
            preview_images_only: true,
            trace_capacity: 256,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn clear_error_on_change(mut self, enabled: bool) -> Self {
        self.clear_error_on_change = enabled;
        self
    }

    #[must_use]
    pub fn preview_images_only(mut self, enabled: bool) -> Self {
        self.preview_images_only = enabled;
        self
    }

    #[must_use]
    pub fn trace_capacity(mut self, max_events: usize) -> Self {
        self.trace_capacity = max_events;
        self
    }
}
