//! Plugin façade
//!
//! [`FastTypescript`] is what a host instantiates: it validates its inputs
//! once, up front, and keeps any failure until the first build asks for it.
//! Every build then gets its own [`BuildSession`] with frozen compiler
//! options, a configured backend and empty resolution caches.

use crate::config::{
    load_config_chain, normalize_compiler_options, reduce_config_option, ConfigChain, ConfigOption, ConfigSource,
};
use crate::context::{PluginContext, PluginWarning};
use crate::error::PluginError;
use crate::resolve::{resolve_import, should_resolve, ResolveIdCache, ResolveIdResult};
use crate::transformers::{
    ActiveTransformer, LoadedTransformer, TransformResult, TransformerName, TransformerRegistry,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use ts::{flatten_diagnostic_message_text, CompilerOptions, ModuleResolutionCache, RealSystem, System};

/// One plugin instance, reusable across builds.
pub struct FastTypescript {
    source: ConfigSource,
    transformer: Option<LoadedTransformer>,
    startup_error: Option<PluginError>,
    system: Arc<dyn System>,
}

impl FastTypescript {
    /// Plugin using the built-in backends and the real file system.
    ///
    /// `transformer` defaults to `oxc`. A transformer name given as `config`
    /// selects that transformer and loads `./tsconfig.json`.
    pub fn new(config: ConfigOption, transformer: Option<&str>) -> Self {
        Self::with_registry(config, transformer, &TransformerRegistry::with_builtin())
    }

    pub fn with_registry(config: ConfigOption, transformer: Option<&str>, registry: &TransformerRegistry) -> Self {
        let (config, name) = match config {
            ConfigOption::Path(path) if TransformerName::parse(&path).is_some() => (ConfigOption::Bool(true), path),
            config => (
                config,
                transformer.unwrap_or(TransformerName::default().as_str()).to_string(),
            ),
        };

        let mut plugin = FastTypescript {
            source: ConfigSource::Disabled,
            transformer: None,
            startup_error: None,
            system: Arc::new(RealSystem::new()),
        };

        let selected = match registry.select(&name) {
            Ok(selected) => selected,
            Err(err) => return plugin.failed(err),
        };
        let source = match reduce_config_option(config) {
            Ok(source) => source,
            Err(err) => return plugin.failed(err.into()),
        };
        plugin.source = source;
        match selected.load() {
            Ok(loaded) => plugin.transformer = Some(loaded),
            Err(err) => return plugin.failed(err),
        }
        plugin
    }

    /// Reads configuration and resolves imports through `system`.
    pub fn with_system(mut self, system: Arc<dyn System>) -> Self {
        self.system = system;
        self
    }

    fn failed(mut self, err: PluginError) -> Self {
        debug!(error = %err, "plugin startup failed");
        self.startup_error = Some(err);
        self
    }

    pub fn startup_error(&self) -> Option<&PluginError> {
        self.startup_error.as_ref()
    }

    pub fn transformer_name(&self) -> Option<TransformerName> {
        self.transformer.as_ref().map(LoadedTransformer::name)
    }

    pub fn config_source(&self) -> &ConfigSource {
        &self.source
    }

    /// Starts a build: loads the tsconfig chain, normalizes the options,
    /// configures the backend and, in watch mode, watches the chain.
    pub fn build_start(&self, ctx: &dyn PluginContext) -> Result<BuildSession, PluginError> {
        if let Some(err) = &self.startup_error {
            return Err(err.clone());
        }
        let Some(transformer) = &self.transformer else {
            return Err(PluginError::StartupConfiguration(
                "No transformer is available for this build.".to_string(),
            ));
        };

        let loaded = load_config_chain(self.source.clone(), self.system.as_ref())?;
        for diagnostic in &loaded.warnings {
            ctx.warn(PluginWarning::new(flatten_diagnostic_message_text(
                &diagnostic.message_text,
                "\n",
            )));
        }

        let normalized = normalize_compiler_options(loaded.options);
        if let Some(warning) = normalized.warning {
            ctx.warn(warning);
        }
        let options = Arc::new(normalized.options);

        let active = transformer.configure(ctx, &options)?;
        let module_cache = ModuleResolutionCache::new(&loaded.base_path, &options);

        if ctx.watch_mode() {
            for file in loaded.chain.iter() {
                ctx.add_watch_file(file);
            }
        }

        debug!(
            transformer = %active.name(),
            base = %loaded.base_path,
            configs = loaded.chain.len(),
            "build started"
        );
        Ok(BuildSession {
            options,
            base_path: loaded.base_path,
            chain: loaded.chain,
            file_names: loaded.file_names,
            transformer: active,
            resolve_cache: ResolveIdCache::new(),
            module_cache,
            system: self.system.clone(),
        })
    }
}

impl Default for FastTypescript {
    fn default() -> Self {
        Self::new(ConfigOption::default(), None)
    }
}

/// State of one build. Shared by concurrent resolve and transform calls.
pub struct BuildSession {
    options: Arc<CompilerOptions>,
    base_path: String,
    chain: ConfigChain,
    file_names: Vec<String>,
    transformer: ActiveTransformer,
    resolve_cache: ResolveIdCache,
    module_cache: ModuleResolutionCache,
    system: Arc<dyn System>,
}

impl BuildSession {
    /// Normalized compiler options, frozen for the build.
    pub fn options(&self) -> &Arc<CompilerOptions> {
        &self.options
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn chain(&self) -> &ConfigChain {
        &self.chain
    }

    /// Root files listed by the configuration.
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn transformer_name(&self) -> TransformerName {
        self.transformer.name()
    }

    /// Number of specifiers answered so far.
    pub fn resolved_count(&self) -> usize {
        self.resolve_cache.len()
    }

    /// Resolves an import the way the TypeScript compiler would.
    ///
    /// Requests that are not imports from a TypeScript source pass through
    /// without touching the cache.
    pub fn resolve_id(&self, specifier: &str, importer: Option<&str>, is_entry: bool) -> ResolveIdResult {
        let Some(importer) = importer.filter(|importer| should_resolve(specifier, Some(*importer), is_entry)) else {
            return ResolveIdResult::PassThrough;
        };
        self.resolve_cache.get_or_resolve(specifier, || {
            resolve_import(
                specifier,
                importer,
                &self.options,
                self.system.as_ref(),
                Some(&self.module_cache),
            )
        })
    }

    /// `Ok(None)` when `id` is not a file the backend handles.
    pub fn transform(&self, ctx: &dyn PluginContext, code: &str, id: &str) -> Result<Option<TransformResult>, PluginError> {
        self.transformer.transform_file(ctx, code, id)
    }

    /// Convenience for hosts holding a path.
    pub fn transform_path(&self, ctx: &dyn PluginContext, code: &str, path: &Path) -> Result<Option<TransformResult>, PluginError> {
        self.transform(ctx, code, &path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CollectingContext;
    use crate::error::LoadError;
    use crate::transformers::{TransformOutcome, Transformer};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ts::testing::InMemorySystem;
    use ts::ScriptTarget;

    struct StripNumbers;

    impl Transformer for StripNumbers {
        fn name(&self) -> TransformerName {
            TransformerName::Oxc
        }

        fn configure(&mut self, _ctx: &dyn PluginContext, options: &CompilerOptions) -> Result<(), String> {
            assert_eq!(options.isolated_modules, Some(true));
            Ok(())
        }

        fn transform(&self, _ctx: &dyn PluginContext, source: &str, _path: &str) -> TransformOutcome {
            TransformOutcome::Success {
                code: source.replace(": number", ""),
                map: None,
            }
        }
    }

    fn registry() -> TransformerRegistry {
        let mut registry = TransformerRegistry::new();
        registry.register(TransformerName::Oxc, || Ok(Box::new(StripNumbers) as Box<dyn Transformer>));
        registry
    }

    fn project() -> Arc<InMemorySystem> {
        Arc::new(InMemorySystem::with_files(
            "/p",
            &[
                (
                    "/p/tsconfig.json",
                    r#"{
                        // base settings live in a shared file
                        "extends": "./tsconfig.base.json",
                        "compilerOptions": { "target": "ES2020" },
                    }"#,
                ),
                ("/p/tsconfig.base.json", r#"{ "compilerOptions": { "strict": true } }"#),
                ("/p/src/main.ts", "import { x } from './dep.js'"),
                ("/p/src/dep.ts", "export const x: number = 1"),
            ],
        ))
    }

    fn plugin(config: ConfigOption) -> FastTypescript {
        FastTypescript::with_registry(config, None, &registry()).with_system(project())
    }

    #[test]
    fn defers_startup_errors_to_the_first_build() {
        let plugin = FastTypescript::with_registry(ConfigOption::default(), Some("babel"), &registry());
        assert_eq!(
            plugin.startup_error().map(PluginError::message),
            Some("Unknown transformer name \"babel\"")
        );
        let err = plugin.build_start(&CollectingContext::new()).err().unwrap();
        assert_eq!(err.to_string(), "Unknown transformer name \"babel\"");
    }

    #[test]
    fn reports_config_errors_before_loading_the_transformer() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let mut registry = TransformerRegistry::new();
        registry.register(TransformerName::Oxc, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LoadError::Other("not reached".to_string()))
        });

        let plugin = FastTypescript::with_registry(json!(42).into(), None, &registry);
        assert_eq!(
            plugin.startup_error(),
            Some(&PluginError::StartupConfiguration(
                "Invalid value '42' for tsconfig parameter.".to_string()
            ))
        );
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn accepts_a_transformer_name_as_config() {
        let plugin = FastTypescript::with_registry("oxc".into(), Some("swc"), &registry());
        assert!(plugin.startup_error().is_none());
        assert_eq!(plugin.transformer_name(), Some(TransformerName::Oxc));
        assert_eq!(plugin.config_source(), &ConfigSource::UseDefault);
    }

    #[test]
    fn starts_builds_from_the_chain() {
        let ctx = CollectingContext::watching();
        let session = plugin(ConfigOption::default()).build_start(&ctx).unwrap();

        assert_eq!(session.options().target, Some(ScriptTarget::ES2020));
        assert_eq!(session.options().strict, Some(true));
        assert_eq!(session.options().isolated_modules, Some(true));
        assert_eq!(session.base_path(), "/p");
        assert_eq!(
            ctx.watch_files(),
            vec![PathBuf::from("/p/tsconfig.json"), PathBuf::from("/p/tsconfig.base.json")]
        );
        let warnings = ctx.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.starts_with("'isolatedModules' option should be set to true"));
    }

    #[test]
    fn watches_nothing_outside_watch_mode() {
        let ctx = CollectingContext::new();
        plugin(ConfigOption::default()).build_start(&ctx).unwrap();
        assert!(ctx.watch_files().is_empty());
    }

    #[test]
    fn resolves_and_transforms() {
        let ctx = CollectingContext::new();
        let session = plugin(json!({ "compilerOptions": { "isolatedModules": true } }).into())
            .build_start(&ctx)
            .unwrap();
        assert!(ctx.warnings().is_empty());

        assert_eq!(
            session.resolve_id("./dep.js", Some("/p/src/main.ts"), false),
            ResolveIdResult::Resolved(PathBuf::from("/p/src/dep.ts"))
        );
        assert_eq!(session.resolve_id("./dep.js", None, false), ResolveIdResult::PassThrough);
        assert_eq!(session.resolved_count(), 1);

        let result = session
            .transform(&ctx, "export const x: number = 1", "/p/src/dep.ts")
            .unwrap()
            .unwrap();
        assert_eq!(result.code, "export const x = 1");
        assert_eq!(session.transform(&ctx, "x", "/p/src/dep.js"), Ok(None));
    }

    #[test]
    fn gives_each_build_fresh_caches() {
        let plugin = plugin(ConfigOption::default());
        let ctx = CollectingContext::new();
        let first = plugin.build_start(&ctx).unwrap();
        first.resolve_id("./dep", Some("/p/src/main.ts"), false);
        assert_eq!(first.resolved_count(), 1);

        let second = plugin.build_start(&ctx).unwrap();
        assert_eq!(second.resolved_count(), 0);
    }
}
