// swc Backend
//
// Drives the `swc` command line from @swc/cli with a generated config file.

use super::api::{TransformOutcome, Transformer, TransformerName};
use super::process::{locate, run_with_stdin, split_inline_source_map, Executable};
use crate::context::PluginContext;
use crate::error::LoadError;
use crate::util::extname;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::debug;
use ts::{CompilerOptions, JsxEmit, ScriptTarget};

pub const BINARY_PATH_VAR: &str = "SWC_BINARY_PATH";

pub fn load() -> Result<Box<dyn Transformer>, LoadError> {
    let executable = locate(
        "swc",
        BINARY_PATH_VAR,
        "@swc/cli",
        "Install it with `npm install --save-dev @swc/cli @swc/core` or point SWC_BINARY_PATH at the executable.",
    )?;
    Ok(Box::new(SwcTransformer::new(executable)))
}

/// swc has no `es6` or `esnext` target.
fn jsc_target(target: Option<ScriptTarget>) -> &'static str {
    match target.unwrap_or(ScriptTarget::ES5) {
        ScriptTarget::ES2023 | ScriptTarget::ESNext => "es2022",
        other => other.as_str(),
    }
}

/// Builds the `.swcrc` contents for `.ts` files, or `.tsx` files when `tsx`.
pub fn swc_config(options: &CompilerOptions, tsx: bool) -> Value {
    let transform_jsx = tsx
        && matches!(
            options.jsx,
            Some(JsxEmit::React) | Some(JsxEmit::ReactJSX) | Some(JsxEmit::ReactJSXDev)
        );

    let mut transform = json!({
        "legacyDecorator": true,
        "decoratorMetadata": options.emit_decorator_metadata.unwrap_or(false),
    });
    if transform_jsx {
        let automatic = matches!(options.jsx, Some(JsxEmit::ReactJSX) | Some(JsxEmit::ReactJSXDev));
        let mut react = json!({
            "runtime": if automatic { "automatic" } else { "classic" },
            "development": options.jsx == Some(JsxEmit::ReactJSXDev),
            "throwIfNamespace": true,
            "useBuiltins": true,
        });
        if let Some(factory) = &options.jsx_factory {
            react["pragma"] = json!(factory);
        }
        if let Some(fragment) = &options.jsx_fragment_factory {
            react["pragmaFrag"] = json!(fragment);
        }
        if let Some(source) = &options.jsx_import_source {
            react["importSource"] = json!(source);
        }
        transform["react"] = react;
    }

    json!({
        "isModule": true,
        "module": {
            "type": "es6",
            "strict": false,
            "strictMode": false,
            "importInterop": "none",
            "ignoreDynamic": true,
            "preserveImportMeta": true,
        },
        "sourceMaps": true,
        "inputSourceMap": false,
        "inlineSourcesContent": false,
        "minify": false,
        "jsc": {
            "target": jsc_target(options.target),
            "loose": false,
            "keepClassNames": true,
            "externalHelpers": options.import_helpers.unwrap_or(false),
            "parser": {
                "syntax": "typescript",
                "tsx": tsx,
                "dynamicImport": true,
                "decorators": options.experimental_decorators.unwrap_or(false),
            },
            "transform": transform,
            "experimental": {
                "keepImportAttributes": true,
            },
        },
    })
}

struct SwcConfigFiles {
    // Holds the directory alive for the lifetime of the build.
    _dir: TempDir,
    ts: PathBuf,
    tsx: PathBuf,
}

pub struct SwcTransformer {
    executable: Executable,
    config: Option<SwcConfigFiles>,
}

impl SwcTransformer {
    pub fn new(executable: Executable) -> Self {
        Self { executable, config: None }
    }
}

impl Transformer for SwcTransformer {
    fn name(&self) -> TransformerName {
        TransformerName::Swc
    }

    fn configure(&mut self, _ctx: &dyn PluginContext, options: &CompilerOptions) -> Result<(), String> {
        let dir = tempfile::Builder::new()
            .prefix("fast-ts-swc")
            .tempdir()
            .map_err(|err| format!("Failed to create the swc config directory: {}", err))?;

        let ts = dir.path().join("ts.swcrc");
        let tsx = dir.path().join("tsx.swcrc");
        for (path, is_tsx) in [(&ts, false), (&tsx, true)] {
            let text = serde_json::to_string_pretty(&swc_config(options, is_tsx)).map_err(|err| err.to_string())?;
            std::fs::write(path, text).map_err(|err| format!("Failed to write {}: {}", path.display(), err))?;
        }

        debug!(version = %self.executable.version, target = jsc_target(options.target), "swc configured");
        self.config = Some(SwcConfigFiles { _dir: dir, ts, tsx });
        Ok(())
    }

    fn transform(&self, _ctx: &dyn PluginContext, source: &str, path: &str) -> TransformOutcome {
        let Some(config) = &self.config else {
            return TransformOutcome::Failure("swc transformer used before it was configured".to_string());
        };
        let config_file = match extname(path).rsplit('.').next() {
            Some("ts") | Some("mts") | Some("cts") => &config.ts,
            Some("tsx") => &config.tsx,
            _ => return TransformOutcome::Skip,
        };

        let args = [
            "--config-file".to_string(),
            config_file.to_string_lossy().into_owned(),
            "--no-swcrc".to_string(),
            "--filename".to_string(),
            path.to_string(),
            "--source-maps".to_string(),
            "inline".to_string(),
        ];
        let output = match run_with_stdin(&self.executable.path, &args, source) {
            Ok(output) => output,
            Err(err) => return TransformOutcome::Failure(format!("Failed to run swc: {}", err)),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return TransformOutcome::Failure(if stderr.is_empty() {
                format!("swc exited with {}", output.status)
            } else {
                stderr
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (code, map) = split_inline_source_map(&stdout);
        TransformOutcome::Success { code, map }
    }
}
