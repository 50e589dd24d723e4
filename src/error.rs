use std::path::PathBuf;

/// Failures reported by a single estimator update.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    /// The quaternion lost its length during integration (zero or NaN norm).
    /// The estimator has already been reset to identity when this is returned.
    #[error("quaternion norm collapsed to {norm} after integration, estimator reset")]
    QuaternionCollapsed { norm: f32 },

    #[error("invalid time step {0} s")]
    InvalidTimeStep(f32),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("gain {name} must be finite and non-negative, got {value}")]
    InvalidGain { name: &'static str, value: f32 },

    #[error("euler offset {name} must be finite, got {value}")]
    InvalidOffset { name: &'static str, value: f32 },

    #[error("ticks_per_second must be non-zero")]
    ZeroTickRate,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("{0}: no samples")]
    Empty(String),
}
