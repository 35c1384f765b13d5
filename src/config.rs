//! Viewer configuration.
//!
//! [`ViewerConfig`] bundles every knob a viewport surface reads during its
//! lifetime. Values come from [`Default`] and can be overridden through the
//! environment with [`ViewerConfig::from_env`].

use std::path::PathBuf;

use instant::Duration;

/// Overrides the directory shaders are loaded from.
pub const ENV_RESOURCE_ROOT: &str = "FLOW_VIEWER_ASSETS";
/// Overrides the redraw timer period in milliseconds.
pub const ENV_FRAME_MS: &str = "FLOW_VIEWER_FRAME_MS";
/// Enables (`1`, `true`, `on`) or disables the GPU debug message stream.
pub const ENV_GPU_DEBUG: &str = "FLOW_VIEWER_GPU_DEBUG";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Directory that shader paths are resolved against.
    pub resource_root: PathBuf,
    /// Period of the redraw timer (60 Hz by default).
    pub frame_interval: Duration,
    pub clear_colour: [f32; 4],
    /// Start the GPU debug message stream when a surface initializes.
    pub debug_logging: bool,
    /// Requested MSAA sample count. Backends fall back to 1 if unsupported.
    pub msaa_samples: u32,
    /// Pixel scroll distance that counts as one wheel notch.
    pub wheel_pixels_per_notch: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            resource_root: default_resource_root(),
            frame_interval: Duration::from_millis(16),
            clear_colour: [0.1, 0.1, 0.1, 1.0],
            debug_logging: cfg!(debug_assertions),
            msaa_samples: 4,
            wheel_pixels_per_notch: 120.0,
        }
    }
}

impl ViewerConfig {
    /// Defaults with environment overrides applied.
    ///
    /// Malformed values are reported and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(ENV_RESOURCE_ROOT) {
            config.resource_root = PathBuf::from(root);
        }
        if let Ok(ms) = std::env::var(ENV_FRAME_MS) {
            match ms.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.frame_interval = Duration::from_millis(ms),
                _ => log::warn!("Ignoring invalid {}={:?}", ENV_FRAME_MS, ms),
            }
        }
        if let Ok(flag) = std::env::var(ENV_GPU_DEBUG) {
            match parse_flag(&flag) {
                Some(enabled) => config.debug_logging = enabled,
                None => log::warn!("Ignoring invalid {}={:?}", ENV_GPU_DEBUG, flag),
            }
        }
        config
    }

    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_root = root.into();
        self
    }

    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }
}

/// The build script copies `assets/` next to the compiled artifacts.
fn default_resource_root() -> PathBuf {
    PathBuf::from(env!("OUT_DIR")).join("assets")
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
