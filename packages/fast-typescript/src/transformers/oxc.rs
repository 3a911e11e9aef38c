// oxc Backend
//
// In-process transpilation: parse, build scoping, strip types, print.

use super::api::Transformer;
use crate::error::LoadError;

#[cfg(feature = "oxc")]
pub use backend::{OxcTransformer, TARGET_WARNING};

#[cfg(feature = "oxc")]
pub fn load() -> Result<Box<dyn Transformer>, LoadError> {
    Ok(Box::new(OxcTransformer::new()))
}

#[cfg(not(feature = "oxc"))]
pub fn load() -> Result<Box<dyn Transformer>, LoadError> {
    Err(LoadError::missing(
        "oxc",
        "Rebuild fast-typescript with the `oxc` cargo feature enabled.",
    ))
}

#[cfg(feature = "oxc")]
mod backend {
    use super::super::api::{TransformOutcome, Transformer, TransformerName};
    use crate::context::{PluginContext, PluginWarning};
    use oxc_allocator::Allocator;
    use oxc_ast::AstKind;
    use oxc_codegen::{Codegen, CodegenOptions};
    use oxc_parser::Parser;
    use oxc_semantic::{Semantic, SemanticBuilder};
    use oxc_span::SourceType;
    use oxc_transformer::{JsxRuntime, TransformOptions};
    use std::path::{Path, PathBuf};
    use tracing::debug;
    use ts::{CompilerOptions, JsxEmit, ScriptTarget};

    pub const TARGET_WARNING: &str =
        "The oxc transformer cannot lower syntax below ES2015, so ES2015 will be used instead. \
         Set the 'target' option in tsconfig.json to ES2015 or later to disable this warning.";

    fn target_name(ctx: &dyn PluginContext, target: Option<ScriptTarget>) -> &'static str {
        match target {
            None | Some(ScriptTarget::ES3) | Some(ScriptTarget::ES5) => {
                ctx.warn(PluginWarning::new(TARGET_WARNING));
                ScriptTarget::ES2015.as_str()
            }
            Some(target) => target.as_str(),
        }
    }

    /// Every decorator in the file: nested declarations and class expressions included.
    fn has_decorators(semantic: &Semantic<'_>) -> bool {
        semantic
            .nodes()
            .iter()
            .any(|node| matches!(node.kind(), AstKind::Decorator(_)))
    }

    pub struct OxcTransformer {
        options: TransformOptions,
        experimental_decorators: bool,
    }

    impl OxcTransformer {
        pub fn new() -> Self {
            Self {
                options: TransformOptions::default(),
                experimental_decorators: false,
            }
        }
    }

    impl Default for OxcTransformer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transformer for OxcTransformer {
        fn name(&self) -> TransformerName {
            TransformerName::Oxc
        }

        fn configure(&mut self, ctx: &dyn PluginContext, options: &CompilerOptions) -> Result<(), String> {
            let target = target_name(ctx, options.target);
            let mut transform = TransformOptions::from_target(target)?;

            transform.typescript.only_remove_type_imports = options.verbatim_module_syntax == Some(true);

            self.experimental_decorators = options.experimental_decorators == Some(true);
            transform.decorator.legacy = self.experimental_decorators;
            transform.decorator.emit_decorator_metadata =
                self.experimental_decorators && options.emit_decorator_metadata == Some(true);

            match options.jsx {
                Some(JsxEmit::React) => {
                    transform.jsx.jsx_plugin = true;
                    transform.jsx.runtime = JsxRuntime::Classic;
                    transform.jsx.pragma = options.jsx_factory.clone();
                    transform.jsx.pragma_frag = options.jsx_fragment_factory.clone();
                }
                Some(JsxEmit::ReactJSX) | Some(JsxEmit::ReactJSXDev) => {
                    transform.jsx.jsx_plugin = true;
                    transform.jsx.runtime = JsxRuntime::Automatic;
                    transform.jsx.development = options.jsx == Some(JsxEmit::ReactJSXDev);
                    transform.jsx.import_source = options.jsx_import_source.clone();
                }
                _ => transform.jsx.jsx_plugin = false,
            }
            transform.jsx.display_name_plugin = false;

            debug!(target, "oxc configured");
            self.options = transform;
            Ok(())
        }

        fn transform(&self, _ctx: &dyn PluginContext, source: &str, path: &str) -> TransformOutcome {
            let file_path = Path::new(path);
            let Ok(source_type) = SourceType::from_path(file_path) else {
                return TransformOutcome::Skip;
            };

            let allocator = Allocator::default();
            let mut parsed = Parser::new(&allocator, source, source_type).parse();
            if parsed.panicked || !parsed.errors.is_empty() {
                let messages: Vec<String> = parsed.errors.iter().map(|err| err.to_string()).collect();
                return TransformOutcome::Failure(messages.join("\n"));
            }

            let semantic = SemanticBuilder::new()
                .with_excess_capacity(0.0)
                .build(&parsed.program);
            if !self.experimental_decorators && has_decorators(&semantic.semantic) {
                return TransformOutcome::Failure(
                    "Decorators are only supported in their legacy form. \
                     Set \"experimentalDecorators\": true in tsconfig.json."
                        .to_string(),
                );
            }
            let transformed = oxc_transformer::Transformer::new(&allocator, file_path, &self.options)
                .build_with_scoping(semantic.semantic.into_scoping(), &mut parsed.program);
            if !transformed.errors.is_empty() {
                let messages: Vec<String> = transformed.errors.iter().map(|err| err.to_string()).collect();
                return TransformOutcome::Failure(messages.join("\n"));
            }

            let printed = Codegen::new()
                .with_options(CodegenOptions {
                    source_map_path: Some(PathBuf::from(path)),
                    ..CodegenOptions::default()
                })
                .build(&parsed.program);
            TransformOutcome::Success {
                code: printed.code,
                map: printed.map.map(|mut map| {
                    let sources = map.get_sources().count();
                    map.set_source_contents(vec![None; sources]);
                    map.to_json_string()
                }),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::context::CollectingContext;

        fn configured(options: &CompilerOptions) -> (OxcTransformer, CollectingContext) {
            let ctx = CollectingContext::new();
            let mut transformer = OxcTransformer::new();
            transformer.configure(&ctx, options).unwrap();
            (transformer, ctx)
        }

        #[test]
        fn warns_about_targets_below_es2015() {
            for target in [None, Some(ScriptTarget::ES3), Some(ScriptTarget::ES5)] {
                let options = CompilerOptions {
                    target,
                    ..CompilerOptions::default()
                };
                let (_, ctx) = configured(&options);
                assert_eq!(ctx.warnings().len(), 1);
                assert_eq!(ctx.warnings()[0].message, TARGET_WARNING);
            }

            let options = CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                ..CompilerOptions::default()
            };
            let (_, ctx) = configured(&options);
            assert!(ctx.warnings().is_empty());
        }

        #[test]
        fn strips_types() {
            let options = CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                ..CompilerOptions::default()
            };
            let (transformer, ctx) = configured(&options);
            let outcome = transformer.transform(&ctx, "const n: number = 1;\nexport type T = string;\n", "/p/a.ts");
            match outcome {
                TransformOutcome::Success { code, map } => {
                    assert!(code.contains("const n = 1"), "{}", code);
                    assert!(!code.contains("type T"), "{}", code);
                    assert!(map.is_some());
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        #[test]
        fn reports_syntax_errors() {
            let (transformer, ctx) = configured(&CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                ..CompilerOptions::default()
            });
            assert!(matches!(
                transformer.transform(&ctx, "const = ;", "/p/broken.ts"),
                TransformOutcome::Failure(_)
            ));
        }

        #[test]
        fn requires_legacy_decorators() {
            let source = "function sealed(c: any) {}\n@sealed\nexport class A {}\n";
            let (transformer, ctx) = configured(&CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                ..CompilerOptions::default()
            });
            match transformer.transform(&ctx, source, "/p/a.ts") {
                TransformOutcome::Failure(message) => assert!(message.contains("experimentalDecorators")),
                other => panic!("unexpected outcome {:?}", other),
            }

            let (transformer, ctx) = configured(&CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                experimental_decorators: Some(true),
                ..CompilerOptions::default()
            });
            assert!(matches!(
                transformer.transform(&ctx, source, "/p/a.ts"),
                TransformOutcome::Success { .. }
            ));
        }

        #[test]
        fn rejects_nested_and_expression_decorators() {
            let (transformer, ctx) = configured(&CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                ..CompilerOptions::default()
            });
            for source in [
                "declare const dec: any;\nexport function make() { @dec class A {} return A; }\n",
                "declare const dec: any;\nexport const B = @dec class {};\n",
                "declare const dec: any;\nexport class C { run() { return class { @dec field = 1; }; } }\n",
            ] {
                match transformer.transform(&ctx, source, "/p/nested.ts") {
                    TransformOutcome::Failure(message) => assert!(message.contains("experimentalDecorators"), "{}", message),
                    other => panic!("unexpected outcome for {:?}: {:?}", source, other),
                }
            }
        }

        #[test]
        fn omits_sources_content_from_maps() {
            let (transformer, ctx) = configured(&CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                ..CompilerOptions::default()
            });
            match transformer.transform(&ctx, "export const n: number = 1;\n", "/p/a.ts") {
                TransformOutcome::Success { map: Some(map), .. } => {
                    let map: serde_json::Value = serde_json::from_str(&map).unwrap();
                    assert_eq!(map["sources"].as_array().map(Vec::len), Some(1));
                    assert!(map.get("sourcesContent").map_or(true, |content| content.is_null()), "{}", map);
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
    }
}
