//! Configuration
//!
//! From the host's configuration option to the frozen compiler options of a
//! build: source reduction, chain loading and normalization.

mod chain;
mod normalize;
mod source;


pub use chain::{load_config_chain, ConfigChain, LoadedConfig, DEFAULT_CONFIG_FILE, INLINE_CONFIG_NAME};
pub use normalize::{isolated_modules_warning, normalize_compiler_options, NormalizedOptions};
pub use source::{reduce_config_option, ConfigGetter, ConfigOption, ConfigSource};
