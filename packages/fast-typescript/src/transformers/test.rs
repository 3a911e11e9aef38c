// Transformer Tests
//
// Tests for the registry lifecycle and the backend option mappings.

#[cfg(test)]
mod tests {
    use crate::context::{CollectingContext, PluginContext, PluginWarning};
    use crate::error::{LoadError, PluginError};
    use crate::transformers::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use ts::CompilerOptions;

    /// Strips `: number` annotations and counts how often it is used.
    struct FakeTransformer {
        configured: Arc<AtomicUsize>,
        transformed: Arc<AtomicUsize>,
        reject_configure: bool,
    }

    impl Transformer for FakeTransformer {
        fn name(&self) -> TransformerName {
            TransformerName::Esbuild
        }

        fn configure(&mut self, ctx: &dyn PluginContext, _options: &CompilerOptions) -> Result<(), String> {
            self.configured.fetch_add(1, Ordering::SeqCst);
            if self.reject_configure {
                return Err("bad options".to_string());
            }
            ctx.warn(PluginWarning::new("Converting \"require\" to \"esm\" is currently not supported"));
            ctx.warn(PluginWarning::new("configured"));
            Ok(())
        }

        fn transform(&self, _ctx: &dyn PluginContext, source: &str, _path: &str) -> TransformOutcome {
            self.transformed.fetch_add(1, Ordering::SeqCst);
            if source.contains("syntax error") {
                return TransformOutcome::Failure("Unexpected token".to_string());
            }
            TransformOutcome::Success {
                code: source.replace(": number", ""),
                map: None,
            }
        }
    }

    #[derive(Default, Clone)]
    struct Counters {
        created: Arc<AtomicUsize>,
        configured: Arc<AtomicUsize>,
        transformed: Arc<AtomicUsize>,
    }

    fn fake_registry(counters: &Counters, reject_configure: bool) -> TransformerRegistry {
        let counters = counters.clone();
        let mut registry = TransformerRegistry::new();
        registry.register(TransformerName::Esbuild, move || {
            counters.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeTransformer {
                configured: counters.configured.clone(),
                transformed: counters.transformed.clone(),
                reject_configure,
            }) as Box<dyn Transformer>)
        });
        registry
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn should_list_builtin_backends() {
            let registry = TransformerRegistry::with_builtin();
            assert_eq!(
                registry.names().collect::<Vec<_>>(),
                vec![TransformerName::Oxc, TransformerName::Esbuild, TransformerName::Swc]
            );
            assert_eq!(format!("{:?}", registry), "[Oxc, Esbuild, Swc]");
        }

        #[test]
        fn should_reject_unknown_names() {
            let registry = TransformerRegistry::with_builtin();
            for name in ["babel", "OXC", ""] {
                let err = registry.select(name).err().unwrap();
                assert_eq!(
                    err,
                    PluginError::StartupConfiguration(format!("Unknown transformer name {:?}", name))
                );
            }
            assert_eq!(
                unknown_transformer_message("sucrase"),
                "Unknown transformer name \"sucrase\""
            );
        }

        #[test]
        fn should_reject_unregistered_names() {
            let registry = fake_registry(&Counters::default(), false);
            assert!(registry.contains(TransformerName::Esbuild));
            assert!(!registry.contains(TransformerName::Swc));
            assert!(matches!(
                registry.select("swc"),
                Err(PluginError::StartupConfiguration(_))
            ));
        }

        #[test]
        fn should_describe_missing_dependencies() {
            let mut registry = TransformerRegistry::new();
            registry.register(TransformerName::Swc, || {
                Err(LoadError::missing("@swc/cli", "Install it with `npm install --save-dev @swc/cli`."))
            });
            let err = registry.select("swc").unwrap().load().err().unwrap();
            assert_eq!(
                err.to_string(),
                "Transformer 'swc' could not be loaded: its optional dependency '@swc/cli' is not installed. \
                 Install it with `npm install --save-dev @swc/cli`."
            );
        }

        #[test]
        fn should_keep_other_load_errors_verbatim() {
            let mut registry = TransformerRegistry::new();
            registry.register(TransformerName::Oxc, || Err(LoadError::Other("boom".to_string())));
            let err = registry.select("oxc").unwrap().load().err().unwrap();
            assert_eq!(err, PluginError::BackendLoad("boom".to_string()));
        }

        #[test]
        fn should_reuse_the_loaded_instance_for_the_first_build() {
            let counters = Counters::default();
            let registry = fake_registry(&counters, false);
            let loaded = registry.select("esbuild").unwrap().load().unwrap();
            assert_eq!(loaded.name(), TransformerName::Esbuild);
            assert_eq!(counters.created.load(Ordering::SeqCst), 1);

            let ctx = CollectingContext::new();
            loaded.configure(&ctx, &CompilerOptions::default()).unwrap();
            assert_eq!(counters.created.load(Ordering::SeqCst), 1);

            loaded.configure(&ctx, &CompilerOptions::default()).unwrap();
            assert_eq!(counters.created.load(Ordering::SeqCst), 2);
            assert_eq!(counters.configured.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn should_fail_startup_when_configuration_is_rejected() {
            let registry = fake_registry(&Counters::default(), true);
            let loaded = registry.select("esbuild").unwrap().load().unwrap();
            let err = loaded
                .configure(&CollectingContext::new(), &CompilerOptions::default())
                .err()
                .unwrap();
            assert_eq!(err, PluginError::StartupConfiguration("bad options".to_string()));
        }
    }

    mod active_transformer_tests {
        use super::*;

        fn active(counters: &Counters, ctx: &CollectingContext) -> ActiveTransformer {
            fake_registry(counters, false)
                .select("esbuild")
                .unwrap()
                .load()
                .unwrap()
                .configure(ctx, &CompilerOptions::default())
                .unwrap()
        }

        #[test]
        fn should_drop_the_require_notice() {
            let ctx = CollectingContext::new();
            active(&Counters::default(), &ctx);
            let messages: Vec<String> = ctx.warnings().into_iter().map(|w| w.message).collect();
            assert_eq!(messages, vec!["configured".to_string()]);
        }

        #[test]
        fn should_transform_typescript_sources() {
            let counters = Counters::default();
            let ctx = CollectingContext::new();
            let transformer = active(&counters, &ctx);
            let result = transformer
                .transform_file(&ctx, "const n: number = 1;", "/p/src/a.ts")
                .unwrap()
                .unwrap();
            assert_eq!(result.code, "const n = 1;");
            assert_eq!(result.map, None);
            assert_eq!(counters.transformed.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn should_ignore_other_files() {
            let counters = Counters::default();
            let ctx = CollectingContext::new();
            let transformer = active(&counters, &ctx);
            for path in ["/p/src/a.js", "/p/src/types.d.ts", "/p/src/style.css", "\0virtual.ts.js"] {
                assert_eq!(transformer.transform_file(&ctx, "x", path), Ok(None), "{}", path);
            }
            assert_eq!(counters.transformed.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn should_report_failures_with_the_file() {
            let ctx = CollectingContext::new();
            let transformer = active(&Counters::default(), &ctx);
            let err = transformer
                .transform_file(&ctx, "syntax error", "/p/src/broken.ts")
                .unwrap_err();
            assert_eq!(
                err,
                PluginError::Transform {
                    file: "/p/src/broken.ts".to_string(),
                    message: "Unexpected token".to_string(),
                }
            );
            assert_eq!(err.to_string(), "Unexpected token");
        }
    }

    mod esbuild_tests {
        use super::*;
        use crate::transformers::esbuild::{parse_messages, EsbuildMessage, EsbuildOptions};
        use ts::{JsxEmit, ScriptTarget};

        #[test]
        fn should_default_the_target_to_es5_with_a_warning() {
            let ctx = CollectingContext::new();
            let options = EsbuildOptions::from_compiler_options(&ctx, &CompilerOptions::default());
            assert_eq!(options.target, "es5");
            assert_eq!(ctx.warnings().len(), 1);

            let ctx = CollectingContext::new();
            let es3 = CompilerOptions {
                target: Some(ScriptTarget::ES3),
                ..CompilerOptions::default()
            };
            assert_eq!(EsbuildOptions::from_compiler_options(&ctx, &es3).target, "es5");
            assert!(ctx.warnings()[0].message.starts_with("ES3 target is not supported by esbuild"));
        }

        #[test]
        fn should_map_jsx_and_tsconfig_raw() {
            let ctx = CollectingContext::new();
            let compiler = CompilerOptions {
                target: Some(ScriptTarget::ES2020),
                jsx: Some(JsxEmit::ReactJSXDev),
                jsx_import_source: Some("preact".to_string()),
                use_define_for_class_fields: Some(false),
                ..CompilerOptions::default()
            };
            let options = EsbuildOptions::from_compiler_options(&ctx, &compiler);
            assert!(ctx.warnings().is_empty());
            assert_eq!(options.jsx, Some("automatic"));
            assert!(options.jsx_dev);
            assert_eq!(options.tsconfig_raw["compilerOptions"]["useDefineForClassFields"], false);
            assert_eq!(options.tsconfig_raw["compilerOptions"]["importsNotUsedAsValues"], "preserve");

            let args = options.to_args();
            assert!(args.contains(&"--target=es2020".to_string()));
            assert!(args.contains(&"--format=esm".to_string()));
            assert!(args.contains(&"--jsx=automatic".to_string()));
            assert!(args.contains(&"--jsx-dev".to_string()));
            assert!(args.contains(&"--jsx-import-source=preact".to_string()));
        }

        #[test]
        fn should_pass_es2015_through_without_a_warning() {
            let ctx = CollectingContext::new();
            let compiler = CompilerOptions {
                target: Some(ScriptTarget::ES2015),
                ..CompilerOptions::default()
            };
            let options = EsbuildOptions::from_compiler_options(&ctx, &compiler);
            assert!(ctx.warnings().is_empty());
            assert_eq!(options.target, "es2015");
            assert!(options.to_args().contains(&"--target=es2015".to_string()));
            assert!(!options.to_args().iter().any(|arg| arg == "--target=es5"));
        }

        #[test]
        fn should_parse_log_messages() {
            let stderr = "\
▲ [WARNING] Unsupported source map comment [unsupported-source-map-comment]

    /p/a.ts:3:20:
      3 │ //# sourceMappingURL=a.js.map
        ╵                     ~~~~~~~~

✘ [ERROR] Expected \";\" but found \"x\"

    /p/a.ts:1:6:
      1 │ const x y = 1
        ╵       ^

1 warning and 1 error
";
            assert_eq!(
                parse_messages(stderr),
                vec![
                    EsbuildMessage {
                        is_error: false,
                        text: "Unsupported source map comment".to_string(),
                        location: Some(("/p/a.ts".to_string(), 3, 20)),
                    },
                    EsbuildMessage {
                        is_error: true,
                        text: "Expected \";\" but found \"x\"".to_string(),
                        location: Some(("/p/a.ts".to_string(), 1, 6)),
                    },
                ]
            );
        }
    }
}
