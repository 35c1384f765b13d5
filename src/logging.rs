//! Logger initialization.
//!
//! Everything in the crate logs through the `log` facade; the binary calls
//! [`init_logging`] once at startup to install `env_logger`.

use std::sync::Once;

use log::LevelFilter;

/// Crates of the GPU stack. They log every resource creation at `info`.
const GPU_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter in `env_logger` syntax, e.g. `"flow_viewer=trace,wgpu_core=warn"`.
    /// Takes precedence over `RUST_LOG` and the levels below.
    pub filter: Option<String>,
    pub level: LevelFilter,
    /// Level applied to [`GPU_MODULES`] when no filter string is given.
    pub gpu_level: LevelFilter,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            level: LevelFilter::Info,
            gpu_level: LevelFilter::Warn,
            timestamps: true,
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.level);
                for module in GPU_MODULES {
                    builder.filter_module(module, config.gpu_level);
                }
            }
        }
        if !config.timestamps {
            builder.format_timestamp(None);
        }

        if let Err(e) = builder.try_init() {
            eprintln!("flow-viewer: logger already installed: {}", e);
            return;
        }
        log::debug!("logging initialized");
    });
}
