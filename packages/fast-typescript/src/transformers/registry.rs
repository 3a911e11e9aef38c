// Transformer Registry
//
// Maps transformer names to factories and walks the selected backend through
// select → load → configure → transform.

use super::api::{unknown_transformer_message, TransformOutcome, TransformResult, Transformer, TransformerName};
use crate::context::{PluginContext, PluginWarning};
use crate::error::{LoadError, PluginError};
use crate::resolve::is_ts_source_file;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};
use ts::CompilerOptions;

/// Creates a fresh backend instance.
pub type TransformerFactory = Arc<dyn Fn() -> Result<Box<dyn Transformer>, LoadError> + Send + Sync>;

/// esbuild reports this whenever ESM output meets `require()`; output is always ESM here.
const REQUIRE_TO_ESM_NOTICE: &str = "Converting \"require\" to \"esm\"";

/// Name → factory table. Only the selected factory is ever called.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    factories: IndexMap<TransformerName, TransformerFactory>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the oxc, esbuild and swc backends.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(TransformerName::Oxc, super::oxc::load);
        registry.register(TransformerName::Esbuild, super::esbuild::load);
        registry.register(TransformerName::Swc, super::swc::load);
        registry
    }

    /// Registers `factory` for `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: TransformerName, factory: F)
    where
        F: Fn() -> Result<Box<dyn Transformer>, LoadError> + Send + Sync + 'static,
    {
        self.factories.insert(name, Arc::new(factory));
    }

    pub fn contains(&self, name: TransformerName) -> bool {
        self.factories.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = TransformerName> + '_ {
        self.factories.keys().copied()
    }

    /// Validates `name` against the registered set.
    pub fn select(&self, name: &str) -> Result<SelectedTransformer, PluginError> {
        let selected = TransformerName::parse(name)
            .and_then(|known| self.factories.get(&known).map(|factory| (known, factory.clone())));
        match selected {
            Some((name, factory)) => {
                debug!(transformer = %name, "transformer selected");
                Ok(SelectedTransformer { name, factory })
            }
            None => Err(PluginError::StartupConfiguration(unknown_transformer_message(name))),
        }
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

fn load_error(name: TransformerName, err: LoadError) -> PluginError {
    match err {
        LoadError::MissingDependency { dependency, hint } => PluginError::BackendLoad(format!(
            "Transformer '{}' could not be loaded: its optional dependency '{}' is not installed. {}",
            name, dependency, hint
        )),
        LoadError::Other(message) => PluginError::BackendLoad(message),
    }
}

/// A known transformer whose backend has not been loaded yet.
pub struct SelectedTransformer {
    name: TransformerName,
    factory: TransformerFactory,
}

impl SelectedTransformer {
    pub fn name(&self) -> TransformerName {
        self.name
    }

    /// Instantiates the backend once to prove it is available.
    pub fn load(self) -> Result<LoadedTransformer, PluginError> {
        let backend = (self.factory)().map_err(|err| load_error(self.name, err))?;
        debug!(transformer = %self.name, "transformer loaded");
        Ok(LoadedTransformer {
            name: self.name,
            factory: self.factory,
            preloaded: Mutex::new(Some(backend)),
        })
    }
}

/// A backend that loaded successfully; configured anew for every build.
pub struct LoadedTransformer {
    name: TransformerName,
    factory: TransformerFactory,
    preloaded: Mutex<Option<Box<dyn Transformer>>>,
}

impl LoadedTransformer {
    pub fn name(&self) -> TransformerName {
        self.name
    }

    /// Hands the frozen options to a fresh backend instance.
    pub fn configure(&self, ctx: &dyn PluginContext, options: &CompilerOptions) -> Result<ActiveTransformer, PluginError> {
        let preloaded = self.preloaded.lock().unwrap_or_else(|e| e.into_inner()).take();
        let mut backend = match preloaded {
            Some(backend) => backend,
            None => (self.factory)().map_err(|err| load_error(self.name, err))?,
        };

        let filtered = NoticeFilter { inner: ctx };
        backend
            .configure(&filtered, options)
            .map_err(PluginError::StartupConfiguration)?;
        debug!(transformer = %self.name, "transformer configured");
        Ok(ActiveTransformer {
            name: self.name,
            backend,
        })
    }
}

/// A configured backend serving transform requests for one build.
pub struct ActiveTransformer {
    name: TransformerName,
    backend: Box<dyn Transformer>,
}

impl ActiveTransformer {
    pub fn name(&self) -> TransformerName {
        self.name
    }

    /// `Ok(None)` when the file is not a TypeScript source or the backend skips it.
    pub fn transform_file(&self, ctx: &dyn PluginContext, source: &str, path: &str) -> Result<Option<TransformResult>, PluginError> {
        if !is_ts_source_file(path) {
            return Ok(None);
        }
        trace!(transformer = %self.name, file = path, "transform");

        let filtered = NoticeFilter { inner: ctx };
        match self.backend.transform(&filtered, source, path) {
            TransformOutcome::Success { code, map } => Ok(Some(TransformResult { code, map })),
            TransformOutcome::Skip => Ok(None),
            TransformOutcome::Failure(message) => Err(PluginError::Transform {
                file: path.to_string(),
                message,
            }),
        }
    }
}

/// Drops the one warning that is expected noise given ESM output.
struct NoticeFilter<'a> {
    inner: &'a dyn PluginContext,
}

impl PluginContext for NoticeFilter<'_> {
    fn warn(&self, warning: PluginWarning) {
        if !warning.message.starts_with(REQUIRE_TO_ESM_NOTICE) {
            self.inner.warn(warning);
        }
    }

    fn add_watch_file(&self, path: &Path) {
        self.inner.add_watch_file(path)
    }

    fn watch_mode(&self) -> bool {
        self.inner.watch_mode()
    }
}
