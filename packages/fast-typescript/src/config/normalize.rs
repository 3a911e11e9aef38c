//! Option normalizer.
//!
//! Every backend compiles one file at a time, so the options handed to it
//! always carry `isolatedModules: true`.

use crate::context::PluginWarning;
use crate::util::readme;
use ts::CompilerOptions;

/// Options frozen for one build, plus the warning raised while freezing them.
#[derive(Debug, Clone)]
pub struct NormalizedOptions {
    pub options: CompilerOptions,
    pub warning: Option<PluginWarning>,
}

pub fn isolated_modules_warning() -> PluginWarning {
    PluginWarning::new(format!(
        "'isolatedModules' option should be set to true in tsconfig. {}",
        readme("#isolatedmodules")
    ))
}

/// Forces `isolatedModules` on, warning once when the project did not set it.
pub fn normalize_compiler_options(mut options: CompilerOptions) -> NormalizedOptions {
    if options.isolated_modules == Some(true) {
        return NormalizedOptions { options, warning: None };
    }
    options.isolated_modules = Some(true);
    NormalizedOptions {
        options,
        warning: Some(isolated_modules_warning()),
    }
}
