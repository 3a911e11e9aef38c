// esbuild Backend
//
// Drives the `esbuild` executable, one process per file.

use super::api::{TransformOutcome, Transformer, TransformerName};
use super::process::{locate, run_with_stdin, split_inline_source_map, Executable};
use crate::context::{PluginContext, PluginWarning};
use crate::error::LoadError;
use crate::util::extname;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;
use ts::{CompilerOptions, JsxEmit, ScriptTarget};

pub const BINARY_PATH_VAR: &str = "ESBUILD_BINARY_PATH";

static MESSAGE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:▲|✘|X)\s*\[(WARNING|ERROR)\]\s+(.*?)(?:\s+\[[a-z0-9-]+\])?\s*$").unwrap());
static MESSAGE_LOCATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+(.+):(\d+):(\d+):\s*$").unwrap());

pub fn load() -> Result<Box<dyn Transformer>, LoadError> {
    let executable = locate(
        "esbuild",
        BINARY_PATH_VAR,
        "esbuild",
        "Install it with `npm install --save-dev esbuild` or point ESBUILD_BINARY_PATH at the executable.",
    )?;
    Ok(Box::new(EsbuildTransformer::new(executable)))
}

fn loader_for(path: &str) -> Option<&'static str> {
    match extname(path).rsplit('.').next()? {
        "ts" | "cts" | "mts" => Some("ts"),
        "tsx" => Some("tsx"),
        _ => None,
    }
}

/// esbuild settings derived from compiler options.
#[derive(Debug, Clone, PartialEq)]
pub struct EsbuildOptions {
    pub target: String,
    pub jsx: Option<&'static str>,
    pub jsx_dev: bool,
    pub jsx_factory: Option<String>,
    pub jsx_fragment: Option<String>,
    pub jsx_import_source: Option<String>,
    pub tsconfig_raw: Value,
}

impl EsbuildOptions {
    /// Maps `options`, warning where esbuild cannot follow the compiler.
    pub fn from_compiler_options(ctx: &dyn PluginContext, options: &CompilerOptions) -> Self {
        let target = match options.target {
            None => {
                ctx.warn(PluginWarning::new(
                    "The 'target' option is not set in tsconfig.json. TypeScript then emits ES5 while esbuild \
                     would emit ESNext, so ES5 will be used. Set 'target' explicitly to disable this warning.",
                ));
                ScriptTarget::ES5
            }
            Some(ScriptTarget::ES3) => {
                ctx.warn(PluginWarning::new(
                    "ES3 target is not supported by esbuild, so ES5 will be used instead.\n\
                     Please set the 'target' option in tsconfig.json to at least ES5 to disable this warning or, \
                     if you really need ES3 output, use swc rather than esbuild.",
                ));
                ScriptTarget::ES5
            }
            Some(target) => target,
        };

        let jsx = options.jsx.map(|jsx| match jsx {
            JsxEmit::Preserve | JsxEmit::ReactNative => "preserve",
            JsxEmit::React => "transform",
            JsxEmit::ReactJSX | JsxEmit::ReactJSXDev => "automatic",
        });

        let mut compiler_options = Map::new();
        if let Some(always_strict) = options.always_strict {
            compiler_options.insert("alwaysStrict".into(), json!(always_strict));
        }
        compiler_options.insert("importsNotUsedAsValues".into(), json!("preserve"));
        compiler_options.insert("preserveValueImports".into(), json!(true));
        if let Some(verbatim) = options.verbatim_module_syntax {
            compiler_options.insert("verbatimModuleSyntax".into(), json!(verbatim));
        }
        if let Some(define) = options.use_define_for_class_fields {
            compiler_options.insert("useDefineForClassFields".into(), json!(define));
        }
        if options.experimental_decorators == Some(true) {
            compiler_options.insert("experimentalDecorators".into(), json!(true));
        }

        EsbuildOptions {
            target: target.as_str().to_string(),
            jsx,
            jsx_dev: options.jsx == Some(JsxEmit::ReactJSXDev),
            jsx_factory: options.jsx_factory.clone(),
            jsx_fragment: options.jsx_fragment_factory.clone(),
            jsx_import_source: options.jsx_import_source.clone(),
            tsconfig_raw: json!({ "compilerOptions": compiler_options }),
        }
    }

    /// Command-line flags shared by every file of the build.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--format=esm".to_string(),
            "--charset=utf8".to_string(),
            "--sourcemap=inline".to_string(),
            "--sources-content=false".to_string(),
            format!("--target={}", self.target),
            "--tree-shaking=false".to_string(),
            "--ignore-annotations".to_string(),
            "--log-level=warning".to_string(),
            "--color=false".to_string(),
            format!("--tsconfig-raw={}", self.tsconfig_raw),
        ];
        if let Some(jsx) = self.jsx {
            args.push(format!("--jsx={}", jsx));
            args.push("--jsx-side-effects".to_string());
        }
        if self.jsx_dev {
            args.push("--jsx-dev".to_string());
        }
        if let Some(factory) = &self.jsx_factory {
            args.push(format!("--jsx-factory={}", factory));
        }
        if let Some(fragment) = &self.jsx_fragment {
            args.push(format!("--jsx-fragment={}", fragment));
        }
        if let Some(source) = &self.jsx_import_source {
            args.push(format!("--jsx-import-source={}", source));
        }
        args
    }
}

/// A warning or error esbuild printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsbuildMessage {
    pub is_error: bool,
    pub text: String,
    /// `(file, line, column)`
    pub location: Option<(String, u32, u32)>,
}

/// Parses esbuild's plain-text log output.
pub fn parse_messages(stderr: &str) -> Vec<EsbuildMessage> {
    let mut messages: Vec<EsbuildMessage> = Vec::new();
    for line in stderr.lines() {
        if let Some(header) = MESSAGE_HEADER.captures(line) {
            messages.push(EsbuildMessage {
                is_error: &header[1] == "ERROR",
                text: header[2].to_string(),
                location: None,
            });
        } else if let Some(loc) = MESSAGE_LOCATION.captures(line) {
            if let Some(last) = messages.last_mut().filter(|m| m.location.is_none()) {
                let line = loc[2].parse().unwrap_or(0);
                let column = loc[3].parse().unwrap_or(0);
                last.location = Some((loc[1].to_string(), line, column));
            }
        }
    }
    messages
}

fn failure_message(messages: &[EsbuildMessage], stderr: &str) -> String {
    let errors: Vec<&EsbuildMessage> = messages.iter().filter(|m| m.is_error).collect();
    if errors.is_empty() {
        return stderr.trim().to_string();
    }
    let mut text = format!(
        "Transform failed with {} error{}:",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for error in errors {
        text.push('\n');
        if let Some((file, line, column)) = &error.location {
            text.push_str(&format!("{}:{}:{}: ", file, line, column));
        }
        text.push_str("ERROR: ");
        text.push_str(&error.text);
    }
    text
}

pub struct EsbuildTransformer {
    executable: Executable,
    options: Option<EsbuildOptions>,
    args: Vec<String>,
}

impl EsbuildTransformer {
    pub fn new(executable: Executable) -> Self {
        Self {
            executable,
            options: None,
            args: Vec::new(),
        }
    }

    pub fn options(&self) -> Option<&EsbuildOptions> {
        self.options.as_ref()
    }
}

impl Transformer for EsbuildTransformer {
    fn name(&self) -> TransformerName {
        TransformerName::Esbuild
    }

    fn configure(&mut self, ctx: &dyn PluginContext, options: &CompilerOptions) -> Result<(), String> {
        let mapped = EsbuildOptions::from_compiler_options(ctx, options);
        debug!(version = %self.executable.version, target = %mapped.target, "esbuild configured");
        self.args = mapped.to_args();
        self.options = Some(mapped);
        Ok(())
    }

    fn transform(&self, ctx: &dyn PluginContext, source: &str, path: &str) -> TransformOutcome {
        let Some(loader) = loader_for(path) else {
            return TransformOutcome::Skip;
        };

        let mut args = self.args.clone();
        args.push(format!("--loader={}", loader));
        args.push(format!("--sourcefile={}", path));

        let output = match run_with_stdin(&self.executable.path, &args, source) {
            Ok(output) => output,
            Err(err) => return TransformOutcome::Failure(format!("Failed to run esbuild: {}", err)),
        };
        let stderr = String::from_utf8_lossy(&output.stderr);
        let messages = parse_messages(&stderr);

        if !output.status.success() {
            return TransformOutcome::Failure(failure_message(&messages, &stderr));
        }

        for message in messages.iter().filter(|m| !m.is_error) {
            let warning = PluginWarning::new(message.text.clone());
            ctx.warn(match &message.location {
                Some((_, line, column)) => warning.with_loc(*line, *column),
                None => warning,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (code, map) = split_inline_source_map(&stdout);
        TransformOutcome::Success { code, map }
    }
}
