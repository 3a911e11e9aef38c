//! Plugin Scenarios
//!
//! Whole-plugin behaviour as a host sees it: construction, build start,
//! resolution and transformation against an in-memory project.

use fast_typescript::config::ConfigOption;
use fast_typescript::transformers::{TransformOutcome, Transformer};
use fast_typescript::{
    CollectingContext, FastTypescript, LoadError, PluginContext, PluginError, ResolveIdResult, TransformerName,
    TransformerRegistry,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ts::testing::InMemorySystem;
use ts::{CompilerOptions, ScriptTarget};

/// Returns its input unchanged.
struct Identity;

impl Transformer for Identity {
    fn name(&self) -> TransformerName {
        TransformerName::Oxc
    }

    fn configure(&mut self, _ctx: &dyn PluginContext, _options: &CompilerOptions) -> Result<(), String> {
        Ok(())
    }

    fn transform(&self, _ctx: &dyn PluginContext, source: &str, _path: &str) -> TransformOutcome {
        TransformOutcome::Success {
            code: source.to_string(),
            map: None,
        }
    }
}

fn identity_registry() -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    registry.register(TransformerName::Oxc, || Ok(Box::new(Identity) as Box<dyn Transformer>));
    registry
}

fn app() -> Arc<InMemorySystem> {
    Arc::new(InMemorySystem::with_files(
        "/app",
        &[
            (
                "/app/tsconfig.json",
                r#"{
                    "extends": "@acme/tsconfig",
                    "compilerOptions": { "isolatedModules": true, "baseUrl": "." }
                }"#,
            ),
            ("/app/node_modules/@acme/tsconfig/package.json", r#"{ "name": "@acme/tsconfig" }"#),
            (
                "/app/node_modules/@acme/tsconfig/tsconfig.json",
                r#"{ "compilerOptions": { "target": "ES2022", "strict": true } }"#,
            ),
            ("/app/src/main.ts", "import type { Shape } from './shape';\nimport { area } from 'lib/area';"),
            ("/app/src/shape.d.ts", "export interface Shape { w: number }"),
            ("/app/lib/area.ts", "export const area = 1;"),
        ],
    ))
}

// Plugin construction and startup failures
#[test]
fn should_fail_when_the_default_tsconfig_is_missing() {
    let system = Arc::new(InMemorySystem::new("/empty"));
    let plugin = FastTypescript::with_registry(ConfigOption::Bool(true), None, &identity_registry())
        .with_system(system);
    assert!(plugin.startup_error().is_none());

    let err = plugin.build_start(&CollectingContext::new()).err().unwrap();
    assert!(matches!(err, PluginError::StartupConfiguration(_)));
    assert_eq!(err.to_string(), "Cannot read file '/empty/tsconfig.json'.");
}

#[test]
fn should_ask_for_missing_optional_dependencies() {
    let mut registry = TransformerRegistry::new();
    registry.register(TransformerName::Swc, || {
        Err(LoadError::missing(
            "@swc/cli",
            "Install it with `npm install --save-dev @swc/cli @swc/core`.",
        ))
    });
    registry.register(TransformerName::Esbuild, || {
        Err(LoadError::Other("esbuild --version failed: bad binary".to_string()))
    });

    let missing = FastTypescript::with_registry(ConfigOption::Bool(false), Some("swc"), &registry);
    let missing = missing.build_start(&CollectingContext::new()).err().unwrap();
    assert!(matches!(missing, PluginError::BackendLoad(_)));
    assert!(missing.to_string().contains("optional dependency '@swc/cli' is not installed"));
    assert!(missing.to_string().contains("npm install --save-dev @swc/cli @swc/core"));

    let broken = FastTypescript::with_registry(ConfigOption::Bool(false), Some("esbuild"), &registry);
    let broken = broken.build_start(&CollectingContext::new()).err().unwrap();
    assert_eq!(broken.to_string(), "esbuild --version failed: bad binary");
}

#[test]
fn should_never_transform_with_an_unknown_transformer() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let mut registry = TransformerRegistry::new();
    registry.register(TransformerName::Oxc, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Identity) as Box<dyn Transformer>)
    });

    let plugin = FastTypescript::with_registry(ConfigOption::Bool(false), Some("sucrase"), &registry);
    let err = plugin.build_start(&CollectingContext::new()).err().unwrap();
    assert_eq!(err.to_string(), "Unknown transformer name \"sucrase\"");
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test]
fn should_resolve_getters_once_at_construction() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let getter = ConfigOption::getter(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        ConfigOption::Object(json!({ "compilerOptions": { "isolatedModules": true } }))
    });

    let plugin = FastTypescript::with_registry(getter, None, &identity_registry()).with_system(app());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for _ in 0..2 {
        let ctx = CollectingContext::new();
        plugin.build_start(&ctx).unwrap();
        assert!(ctx.warnings().is_empty());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// Build sessions
#[test]
fn should_watch_the_chain_without_package_manifests() {
    let ctx = CollectingContext::watching();
    let plugin = FastTypescript::with_registry(ConfigOption::Bool(true), None, &identity_registry())
        .with_system(app());
    let session = plugin.build_start(&ctx).unwrap();

    let expected = vec![
        PathBuf::from("/app/tsconfig.json"),
        PathBuf::from("/app/node_modules/@acme/tsconfig/tsconfig.json"),
    ];
    assert_eq!(ctx.watch_files(), expected);
    assert_eq!(session.chain().files(), expected.as_slice());
    assert_eq!(session.options().target, Some(ScriptTarget::ES2022));
    assert!(ctx.warnings().is_empty());
}

#[test]
fn should_decline_declaration_only_imports() {
    let plugin = FastTypescript::with_registry(ConfigOption::Bool(true), None, &identity_registry())
        .with_system(app());
    let session = plugin.build_start(&CollectingContext::new()).unwrap();

    assert_eq!(
        session.resolve_id("./shape", Some("/app/src/main.ts"), false),
        ResolveIdResult::Declined
    );
    assert_eq!(
        session.resolve_id("lib/area", Some("/app/src/main.ts"), false),
        ResolveIdResult::Resolved(PathBuf::from("/app/lib/area.ts"))
    );
    assert_eq!(
        session.resolve_id("lib/area", Some("/app/src/main.ts"), true),
        ResolveIdResult::PassThrough
    );
    assert_eq!(
        session.resolve_id("react", Some("/app/src/main.ts"), false),
        ResolveIdResult::PassThrough
    );
}

#[test]
fn should_answer_repeated_lookups_from_the_cache() {
    let system = app();
    let plugin = FastTypescript::with_registry(ConfigOption::Bool(true), None, &identity_registry())
        .with_system(system.clone());
    let session = plugin.build_start(&CollectingContext::new()).unwrap();

    let first = session.resolve_id("lib/area", Some("/app/src/main.ts"), false);
    system.remove("/app/lib/area.ts");
    let second = session.resolve_id("lib/area", Some("/app/src/other.ts"), false);
    assert_eq!(first, second);
    assert_eq!(session.resolved_count(), 1);

    let rebuilt = plugin.build_start(&CollectingContext::new()).unwrap();
    assert_eq!(
        rebuilt.resolve_id("lib/area", Some("/app/src/main.ts"), false),
        ResolveIdResult::PassThrough
    );
}

#[cfg(feature = "oxc")]
#[test]
fn should_transpile_inline_es2015_configuration() {
    let ctx = CollectingContext::new();
    let plugin = FastTypescript::new(json!({ "compilerOptions": { "target": "ES2015" } }).into(), None)
        .with_system(app());
    let session = plugin.build_start(&ctx).unwrap();

    let warnings = ctx.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.starts_with("'isolatedModules' option should be set to true in tsconfig."));
    assert_eq!(session.options().target, Some(ScriptTarget::ES2015));
    assert_eq!(session.base_path(), "/app");

    let result = session
        .transform(&ctx, "export const add = (a: number, b: number): number => a + b;\n", "/app/src/add.ts")
        .unwrap()
        .unwrap();
    assert!(result.code.contains("=>"), "{}", result.code);
    assert!(!result.code.contains("number"), "{}", result.code);
    assert!(result.map.is_some());
}
