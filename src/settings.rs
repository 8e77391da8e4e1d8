//! Pipeline settings
//!
//! Configuration for creating a [`PostFxManager`](crate::PostFxManager).

use crate::registry::AggregationPolicy;

/// Settings for creating a post-effect pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFxSettings {
    /// Size of the ping-pong buffers (width, height) in pixels.
    pub size: (u32, u32),
    /// Whether the viewport is the primary view, whose depth buffer is stored bottom-up.
    pub primary_view: bool,
    /// How disabled effects affect flag aggregation.
    pub aggregation: AggregationPolicy,
}

impl Default for PostFxSettings {
    fn default() -> Self {
        Self {
            size: (1280, 720),
            primary_view: false,
            aggregation: AggregationPolicy::FullScan,
        }
    }
}

impl PostFxSettings {
    /// Create new settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Mark the viewport as the primary view.
    pub fn primary_view(mut self, primary: bool) -> Self {
        self.primary_view = primary;
        self
    }

    /// Set the aggregation policy.
    pub fn aggregation(mut self, policy: AggregationPolicy) -> Self {
        self.aggregation = policy;
        self
    }
}
