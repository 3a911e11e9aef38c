//! Compiler Options
//!
//! Typed view of `compilerOptions`. Options the toolchain acts on get a typed
//! field; every other recognised option is kept verbatim in `other`.

use crate::path::get_normalized_absolute_path;
use crate::{
    Diagnostic, ImportsNotUsedAsValues, JsxEmit, ModuleDetectionKind, ModuleKind,
    ModuleResolutionKind, NewLineKind, ScriptTarget,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Boolean,
    String,
    Number,
    List,
    Object,
    Enum,
}

impl OptionType {
    fn type_name(&self) -> &'static str {
        match self {
            OptionType::Boolean => "boolean",
            OptionType::String | OptionType::Enum => "string",
            OptionType::Number => "number",
            OptionType::List => "Array",
            OptionType::Object => "object",
        }
    }
}

/// A recognised `compilerOptions` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDeclaration {
    pub name: &'static str,
    pub kind: OptionType,
    /// Values (or list elements) are paths relative to the declaring file.
    pub is_file_path: bool,
}

/// Why a JSON value was rejected for an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    WrongType(OptionType),
    InvalidEnum(&'static [&'static str]),
}

/// Conversion between typed option values and their JSON spelling.
pub trait ConfigValue: Sized {
    const KIND: OptionType;

    fn from_json(value: &Value, is_file_path: bool, base_dir: &str) -> Result<Self, ValueError>;

    fn to_json(&self) -> Value;
}

impl ConfigValue for bool {
    const KIND: OptionType = OptionType::Boolean;

    fn from_json(value: &Value, _: bool, _: &str) -> Result<Self, ValueError> {
        value.as_bool().ok_or(ValueError::WrongType(Self::KIND))
    }

    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ConfigValue for String {
    const KIND: OptionType = OptionType::String;

    fn from_json(value: &Value, is_file_path: bool, base_dir: &str) -> Result<Self, ValueError> {
        let s = value.as_str().ok_or(ValueError::WrongType(Self::KIND))?;
        Ok(if is_file_path {
            get_normalized_absolute_path(s, base_dir)
        } else {
            s.to_string()
        })
    }

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ConfigValue for u32 {
    const KIND: OptionType = OptionType::Number;

    fn from_json(value: &Value, _: bool, _: &str) -> Result<Self, ValueError> {
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(ValueError::WrongType(Self::KIND))
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl ConfigValue for Vec<String> {
    const KIND: OptionType = OptionType::List;

    fn from_json(value: &Value, is_file_path: bool, base_dir: &str) -> Result<Self, ValueError> {
        let items = value.as_array().ok_or(ValueError::WrongType(Self::KIND))?;
        items
            .iter()
            .map(|item| String::from_json(item, is_file_path, base_dir))
            .collect::<Result<_, _>>()
            .map_err(|_| ValueError::WrongType(Self::KIND))
    }

    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(|s| Value::String(s.clone())).collect())
    }
}

impl ConfigValue for IndexMap<String, Vec<String>> {
    const KIND: OptionType = OptionType::Object;

    fn from_json(value: &Value, _: bool, _: &str) -> Result<Self, ValueError> {
        let object = value.as_object().ok_or(ValueError::WrongType(Self::KIND))?;
        object
            .iter()
            .map(|(key, targets)| {
                Vec::<String>::from_json(targets, false, "").map(|targets| (key.clone(), targets))
            })
            .collect()
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(key, targets)| (key.clone(), targets.to_json()))
                .collect(),
        )
    }
}

macro_rules! enum_config_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                const KIND: OptionType = OptionType::Enum;

                fn from_json(value: &Value, _: bool, _: &str) -> Result<Self, ValueError> {
                    let s = value.as_str().ok_or(ValueError::InvalidEnum(<$ty>::VALUES))?;
                    <$ty>::parse(s).ok_or(ValueError::InvalidEnum(<$ty>::VALUES))
                }

                fn to_json(&self) -> Value {
                    Value::String(self.as_str().to_string())
                }
            }
        )*
    };
}

enum_config_value!(
    ScriptTarget,
    ModuleKind,
    ModuleResolutionKind,
    ModuleDetectionKind,
    JsxEmit,
    NewLineKind,
    ImportsNotUsedAsValues,
);

macro_rules! is_path {
    () => {
        false
    };
    (path) => {
        true
    };
}

macro_rules! compiler_options {
    ($($field:ident: $ty:ty = $json:literal $(, $path:ident)?;)*) => {
        /// Parsed `compilerOptions`. `None` means "not set anywhere in the chain".
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct CompilerOptions {
            $(pub $field: Option<$ty>,)*
            /// Directory `paths` entries are relative to when `baseUrl` is unset.
            pub paths_base_path: Option<String>,
            /// Absolute path of the configuration file these options came from.
            pub config_file_path: Option<String>,
            /// Recognised options without a typed field, in declaration order.
            pub other: IndexMap<String, Value>,
        }

        const TYPED_OPTIONS: &[OptionDeclaration] = &[
            $(OptionDeclaration {
                name: $json,
                kind: <$ty as ConfigValue>::KIND,
                is_file_path: is_path!($($path)?),
            },)*
        ];

        impl CompilerOptions {
            fn set_typed(&mut self, decl: &OptionDeclaration, value: &Value, base_dir: &str) -> Option<Result<(), ValueError>> {
                match decl.name {
                    $($json => Some(
                        <$ty as ConfigValue>::from_json(value, decl.is_file_path, base_dir)
                            .map(|v| self.$field = Some(v)),
                    ),)*
                    _ => None,
                }
            }

            fn clear_option(&mut self, name: &str) {
                match name {
                    $($json => self.$field = None,)*
                    _ => {
                        self.other.shift_remove(name);
                    }
                }
            }

            fn inherit_typed(&mut self, base: &CompilerOptions) {
                $(
                    if self.$field.is_none() {
                        self.$field = base.$field.clone();
                    }
                )*
            }

            fn typed_to_json(&self, out: &mut Map<String, Value>) {
                $(
                    if let Some(value) = &self.$field {
                        out.insert($json.to_string(), value.to_json());
                    }
                )*
            }
        }
    };
}

compiler_options! {
    allow_importing_ts_extensions: bool = "allowImportingTsExtensions";
    allow_js: bool = "allowJs";
    always_strict: bool = "alwaysStrict";
    base_url: String = "baseUrl", path;
    custom_conditions: Vec<String> = "customConditions";
    declaration: bool = "declaration";
    declaration_dir: String = "declarationDir", path;
    emit_decorator_metadata: bool = "emitDecoratorMetadata";
    es_module_interop: bool = "esModuleInterop";
    experimental_decorators: bool = "experimentalDecorators";
    ignore_deprecations: String = "ignoreDeprecations";
    import_helpers: bool = "importHelpers";
    imports_not_used_as_values: ImportsNotUsedAsValues = "importsNotUsedAsValues";
    inline_source_map: bool = "inlineSourceMap";
    inline_sources: bool = "inlineSources";
    isolated_modules: bool = "isolatedModules";
    jsx: JsxEmit = "jsx";
    jsx_factory: String = "jsxFactory";
    jsx_fragment_factory: String = "jsxFragmentFactory";
    jsx_import_source: String = "jsxImportSource";
    module: ModuleKind = "module";
    module_detection: ModuleDetectionKind = "moduleDetection";
    module_resolution: ModuleResolutionKind = "moduleResolution";
    module_suffixes: Vec<String> = "moduleSuffixes";
    new_line: NewLineKind = "newLine";
    out: String = "out", path;
    out_dir: String = "outDir", path;
    out_file: String = "outFile", path;
    paths: IndexMap<String, Vec<String>> = "paths";
    preserve_symlinks: bool = "preserveSymlinks";
    preserve_value_imports: bool = "preserveValueImports";
    resolve_json_module: bool = "resolveJsonModule";
    resolve_package_json_exports: bool = "resolvePackageJsonExports";
    root_dir: String = "rootDir", path;
    source_map: bool = "sourceMap";
    strict: bool = "strict";
    target: ScriptTarget = "target";
    type_roots: Vec<String> = "typeRoots", path;
    types: Vec<String> = "types";
    use_define_for_class_fields: bool = "useDefineForClassFields";
    verbatim_module_syntax: bool = "verbatimModuleSyntax";
}

const fn untyped(name: &'static str, kind: OptionType) -> OptionDeclaration {
    OptionDeclaration {
        name,
        kind,
        is_file_path: false,
    }
}

const fn untyped_path(name: &'static str, kind: OptionType) -> OptionDeclaration {
    OptionDeclaration {
        name,
        kind,
        is_file_path: true,
    }
}

const OTHER_OPTIONS: &[OptionDeclaration] = &[
    untyped("allowArbitraryExtensions", OptionType::Boolean),
    untyped("allowSyntheticDefaultImports", OptionType::Boolean),
    untyped("allowUmdGlobalAccess", OptionType::Boolean),
    untyped("allowUnreachableCode", OptionType::Boolean),
    untyped("allowUnusedLabels", OptionType::Boolean),
    untyped("assumeChangesOnlyAffectDirectDependencies", OptionType::Boolean),
    untyped("charset", OptionType::String),
    untyped("checkJs", OptionType::Boolean),
    untyped("composite", OptionType::Boolean),
    untyped("declarationMap", OptionType::Boolean),
    untyped("diagnostics", OptionType::Boolean),
    untyped("disableReferencedProjectLoad", OptionType::Boolean),
    untyped("disableSizeLimit", OptionType::Boolean),
    untyped("disableSolutionSearching", OptionType::Boolean),
    untyped("disableSourceOfProjectReferenceRedirect", OptionType::Boolean),
    untyped("downlevelIteration", OptionType::Boolean),
    untyped("emitBOM", OptionType::Boolean),
    untyped("emitDeclarationOnly", OptionType::Boolean),
    untyped("exactOptionalPropertyTypes", OptionType::Boolean),
    untyped("explainFiles", OptionType::Boolean),
    untyped("extendedDiagnostics", OptionType::Boolean),
    untyped("forceConsistentCasingInFileNames", OptionType::Boolean),
    untyped_path("generateTrace", OptionType::String),
    untyped("incremental", OptionType::Boolean),
    untyped("isolatedDeclarations", OptionType::Boolean),
    untyped("keyofStringsOnly", OptionType::Boolean),
    untyped("lib", OptionType::List),
    untyped("listEmittedFiles", OptionType::Boolean),
    untyped("listFiles", OptionType::Boolean),
    untyped("locale", OptionType::String),
    untyped("mapRoot", OptionType::String),
    untyped("maxNodeModuleJsDepth", OptionType::Number),
    untyped("noCheck", OptionType::Boolean),
    untyped("noEmit", OptionType::Boolean),
    untyped("noEmitHelpers", OptionType::Boolean),
    untyped("noEmitOnError", OptionType::Boolean),
    untyped("noErrorTruncation", OptionType::Boolean),
    untyped("noFallthroughCasesInSwitch", OptionType::Boolean),
    untyped("noImplicitAny", OptionType::Boolean),
    untyped("noImplicitOverride", OptionType::Boolean),
    untyped("noImplicitReturns", OptionType::Boolean),
    untyped("noImplicitThis", OptionType::Boolean),
    untyped("noImplicitUseStrict", OptionType::Boolean),
    untyped("noLib", OptionType::Boolean),
    untyped("noPropertyAccessFromIndexSignature", OptionType::Boolean),
    untyped("noResolve", OptionType::Boolean),
    untyped("noStrictGenericChecks", OptionType::Boolean),
    untyped("noUncheckedIndexedAccess", OptionType::Boolean),
    untyped("noUncheckedSideEffectImports", OptionType::Boolean),
    untyped("noUnusedLocals", OptionType::Boolean),
    untyped("noUnusedParameters", OptionType::Boolean),
    untyped("plugins", OptionType::List),
    untyped("preserveConstEnums", OptionType::Boolean),
    untyped("pretty", OptionType::Boolean),
    untyped("reactNamespace", OptionType::String),
    untyped("removeComments", OptionType::Boolean),
    untyped("resolvePackageJsonImports", OptionType::Boolean),
    untyped("rewriteRelativeImportExtensions", OptionType::Boolean),
    untyped_path("rootDirs", OptionType::List),
    untyped("skipDefaultLibCheck", OptionType::Boolean),
    untyped("skipLibCheck", OptionType::Boolean),
    untyped("sourceRoot", OptionType::String),
    untyped("strictBindCallApply", OptionType::Boolean),
    untyped("strictBuiltinIteratorReturn", OptionType::Boolean),
    untyped("strictFunctionTypes", OptionType::Boolean),
    untyped("strictNullChecks", OptionType::Boolean),
    untyped("strictPropertyInitialization", OptionType::Boolean),
    untyped("stripInternal", OptionType::Boolean),
    untyped("suppressExcessPropertyErrors", OptionType::Boolean),
    untyped("suppressImplicitAnyIndexErrors", OptionType::Boolean),
    untyped("traceResolution", OptionType::Boolean),
    untyped_path("tsBuildInfoFile", OptionType::String),
    untyped("useUnknownInCatchVariables", OptionType::Boolean),
];

/// Looks up an option by name, ignoring case the way the compiler does.
pub fn get_option_declaration(name: &str) -> Option<&'static OptionDeclaration> {
    TYPED_OPTIONS
        .iter()
        .chain(OTHER_OPTIONS)
        .find(|decl| decl.name == name)
        .or_else(|| {
            TYPED_OPTIONS
                .iter()
                .chain(OTHER_OPTIONS)
                .find(|decl| decl.name.eq_ignore_ascii_case(name))
        })
}

fn check_untyped(decl: &OptionDeclaration, value: &Value, base_dir: &str) -> Result<Value, ValueError> {
    let ok = match decl.kind {
        OptionType::Boolean => value.is_boolean(),
        OptionType::String | OptionType::Enum => value.is_string(),
        OptionType::Number => value.is_number(),
        OptionType::List => value.is_array(),
        OptionType::Object => value.is_object(),
    };
    if !ok {
        return Err(ValueError::WrongType(decl.kind));
    }
    if !decl.is_file_path {
        return Ok(value.clone());
    }
    Ok(match value {
        Value::String(s) => Value::String(get_normalized_absolute_path(s, base_dir)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Value::String(get_normalized_absolute_path(s, base_dir)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    })
}

impl CompilerOptions {
    /// Applies one `compilerOptions` entry declared in a file living in `base_dir`.
    pub fn set_from_json(&mut self, name: &str, value: &Value, base_dir: &str) -> Result<(), Diagnostic> {
        let decl = get_option_declaration(name)
            .ok_or_else(|| Diagnostic::error(5023, format!("Unknown compiler option '{}'.", name)))?;

        // `null` resets the option.
        if value.is_null() {
            self.clear_option(decl.name);
            return Ok(());
        }

        let result = match self.set_typed(decl, value, base_dir) {
            Some(result) => result,
            None => check_untyped(decl, value, base_dir).map(|value| {
                self.other.insert(decl.name.to_string(), value);
            }),
        };

        if decl.name == "paths" && result.is_ok() {
            self.paths_base_path = Some(base_dir.to_string());
        }

        result.map_err(|err| match err {
            ValueError::WrongType(kind) => Diagnostic::error(
                5024,
                format!(
                    "Compiler option '{}' requires a value of type {}.",
                    decl.name,
                    kind.type_name()
                ),
            ),
            ValueError::InvalidEnum(values) => Diagnostic::error(
                6046,
                format!(
                    "Argument for '--{}' option must be: {}.",
                    decl.name,
                    values
                        .iter()
                        .map(|v| format!("'{}'", v))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ),
        })
    }

    /// Fills every option unset here from `base`. Used to layer a configuration
    /// over the ones it extends.
    pub fn extend_from(&mut self, base: &CompilerOptions) {
        if self.paths.is_none() {
            self.paths_base_path = base.paths_base_path.clone();
        }
        self.inherit_typed(base);

        let mut merged = base.other.clone();
        for (key, value) in std::mem::take(&mut self.other) {
            merged.insert(key, value);
        }
        self.other = merged;

        if self.config_file_path.is_none() {
            self.config_file_path = base.config_file_path.clone();
        }
    }

    /// Options as a `compilerOptions` JSON object.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        self.typed_to_json(&mut out);
        for (key, value) in &self.other {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.other.get(name).and_then(Value::as_bool)
    }

    pub fn get_emit_script_target(&self) -> ScriptTarget {
        if let Some(target) = self.target {
            return target;
        }
        match self.module {
            Some(ModuleKind::Node16) => ScriptTarget::ES2022,
            Some(ModuleKind::NodeNext) => ScriptTarget::ESNext,
            _ => ScriptTarget::ES5,
        }
    }

    pub fn get_emit_module_kind(&self) -> ModuleKind {
        match self.module {
            Some(module) => module,
            None if self.get_emit_script_target() >= ScriptTarget::ES2015 => ModuleKind::ES2015,
            None => ModuleKind::CommonJS,
        }
    }

    pub fn get_emit_module_resolution_kind(&self) -> ModuleResolutionKind {
        if let Some(kind) = self.module_resolution {
            return kind;
        }
        match self.get_emit_module_kind() {
            ModuleKind::CommonJS => ModuleResolutionKind::Node10,
            ModuleKind::Node16 => ModuleResolutionKind::Node16,
            ModuleKind::NodeNext => ModuleResolutionKind::NodeNext,
            ModuleKind::Preserve => ModuleResolutionKind::Bundler,
            _ => ModuleResolutionKind::Classic,
        }
    }

    pub fn get_resolve_package_json_exports(&self) -> bool {
        self.resolve_package_json_exports.unwrap_or(matches!(
            self.get_emit_module_resolution_kind(),
            ModuleResolutionKind::Node16 | ModuleResolutionKind::NodeNext | ModuleResolutionKind::Bundler
        ))
    }

    pub fn get_isolated_modules(&self) -> bool {
        self.isolated_modules == Some(true) || self.verbatim_module_syntax == Some(true)
    }

    pub fn get_allow_js(&self) -> bool {
        self.allow_js.unwrap_or(false)
    }
}

/// Checks option combinations that are invalid regardless of which file set them.
pub fn verify_compiler_options(options: &CompilerOptions) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if options.emit_decorator_metadata == Some(true) && options.experimental_decorators != Some(true) {
        diagnostics.push(Diagnostic::error(
            5052,
            "Option 'emitDecoratorMetadata' cannot be specified without specifying option 'experimentalDecorators'.",
        ));
    }

    if let (Some(_), Some(jsx @ (JsxEmit::ReactJSX | JsxEmit::ReactJSXDev))) =
        (&options.jsx_factory, options.jsx)
    {
        diagnostics.push(Diagnostic::error(
            5089,
            format!("Option 'jsxFactory' cannot be specified when option 'jsx' is '{}'.", jsx),
        ));
    }

    let out_file = options.out_file.as_ref().or(options.out.as_ref());
    if out_file.is_some() {
        if let Some(module) = options.module {
            if !matches!(module, ModuleKind::None | ModuleKind::AMD | ModuleKind::System) {
                let option = if options.out_file.is_some() { "outFile" } else { "out" };
                diagnostics.push(Diagnostic::error(
                    6131,
                    format!(
                        "Cannot compile modules using option '{}' unless the '--module' flag is 'amd' or 'system'.",
                        option
                    ),
                ));
            }
        }
    }

    let silenced = options.ignore_deprecations.as_deref() == Some("5.0");
    if !silenced {
        if options.target == Some(ScriptTarget::ES3) {
            diagnostics.push(Diagnostic::warning(
                5101,
                "Option 'target=ES3' is deprecated. Specify compilerOption '\"ignoreDeprecations\": \"5.0\"' to silence this warning.",
            ));
        }
        for (set, name) in [
            (options.imports_not_used_as_values.is_some(), "importsNotUsedAsValues"),
            (options.preserve_value_imports.is_some(), "preserveValueImports"),
        ] {
            if set {
                diagnostics.push(Diagnostic::warning(
                    5101,
                    format!("Option '{}' is deprecated. Use 'verbatimModuleSyntax' instead.", name),
                ));
            }
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sets_typed_and_untyped_options() {
        let mut options = CompilerOptions::default();
        options.set_from_json("target", &json!("ES2020"), "/p").unwrap();
        options.set_from_json("outDir", &json!("./dist"), "/p").unwrap();
        options.set_from_json("noImplicitAny", &json!(true), "/p").unwrap();
        options.set_from_json("rootDirs", &json!(["a", "/b"]), "/p").unwrap();

        assert_eq!(options.target, Some(ScriptTarget::ES2020));
        assert_eq!(options.out_dir.as_deref(), Some("/p/dist"));
        assert_eq!(options.get_bool("noImplicitAny"), Some(true));
        assert_eq!(options.other["rootDirs"], json!(["/p/a", "/b"]));
    }

    #[test]
    fn reports_bad_values() {
        let mut options = CompilerOptions::default();
        let unknown = options.set_from_json("notAnOption", &json!(1), "/").unwrap_err();
        assert_eq!(unknown.code, 5023);

        let wrong = options.set_from_json("strict", &json!("yes"), "/").unwrap_err();
        assert_eq!(wrong.code, 5024);
        assert_eq!(
            wrong.message_text.to_string(),
            "Compiler option 'strict' requires a value of type boolean."
        );

        let invalid = options.set_from_json("jsx", &json!("vue"), "/").unwrap_err();
        assert_eq!(invalid.code, 6046);
        assert!(invalid.message_text.to_string().starts_with("Argument for '--jsx' option must be: 'preserve'"));
    }

    #[test]
    fn option_names_ignore_case() {
        let mut options = CompilerOptions::default();
        options.set_from_json("IsolatedModules", &json!(true), "/").unwrap();
        assert_eq!(options.isolated_modules, Some(true));
    }

    #[test]
    fn paths_remember_declaring_directory() {
        let mut base = CompilerOptions::default();
        base.set_from_json("paths", &json!({"@/*": ["src/*"]}), "/base").unwrap();
        let mut child = CompilerOptions::default();
        child.set_from_json("strict", &json!(true), "/child").unwrap();
        child.extend_from(&base);
        assert_eq!(child.paths_base_path.as_deref(), Some("/base"));
        assert_eq!(child.paths.as_ref().map(|p| p["@/*"].clone()), Some(vec!["src/*".to_string()]));
    }

    #[test]
    fn extending_keeps_own_values() {
        let mut base = CompilerOptions::default();
        base.set_from_json("target", &json!("es5"), "/").unwrap();
        base.set_from_json("lib", &json!(["dom"]), "/").unwrap();
        let mut child = CompilerOptions::default();
        child.set_from_json("target", &json!("es2022"), "/").unwrap();
        child.extend_from(&base);
        assert_eq!(child.target, Some(ScriptTarget::ES2022));
        assert_eq!(child.other["lib"], json!(["dom"]));
    }

    #[test]
    fn null_clears_a_value() {
        let mut options = CompilerOptions::default();
        options.set_from_json("target", &json!("es5"), "/").unwrap();
        options.set_from_json("strict", &json!(true), "/").unwrap();
        options.set_from_json("target", &Value::Null, "/").unwrap();
        assert_eq!(options.target, None);
        assert_eq!(options.strict, Some(true));
    }

    #[test]
    fn computes_emit_defaults() {
        let mut options = CompilerOptions::default();
        assert_eq!(options.get_emit_script_target(), ScriptTarget::ES5);
        assert_eq!(options.get_emit_module_kind(), ModuleKind::CommonJS);
        assert_eq!(options.get_emit_module_resolution_kind(), ModuleResolutionKind::Node10);

        options.module = Some(ModuleKind::NodeNext);
        assert_eq!(options.get_emit_script_target(), ScriptTarget::ESNext);
        assert_eq!(options.get_emit_module_resolution_kind(), ModuleResolutionKind::NodeNext);
        assert!(options.get_resolve_package_json_exports());

        options.module = Some(ModuleKind::ESNext);
        assert_eq!(options.get_emit_module_resolution_kind(), ModuleResolutionKind::Classic);
    }

    #[test]
    fn verifies_option_combinations() {
        let mut options = CompilerOptions::default();
        options.emit_decorator_metadata = Some(true);
        options.jsx = Some(JsxEmit::ReactJSX);
        options.jsx_factory = Some("h".to_string());
        options.target = Some(ScriptTarget::ES3);

        let diagnostics = verify_compiler_options(&options);
        let codes: Vec<_> = diagnostics.iter().map(|d| (d.code, d.is_error())).collect();
        assert_eq!(codes, vec![(5052, true), (5089, true), (5101, false)]);

        options.ignore_deprecations = Some("5.0".to_string());
        assert_eq!(verify_compiler_options(&options).len(), 2);
    }

    #[test]
    fn serializes_to_json() {
        let mut options = CompilerOptions::default();
        options.target = Some(ScriptTarget::ES2015);
        options.isolated_modules = Some(true);
        assert_eq!(options.to_json(), json!({"isolatedModules": true, "target": "es2015"}));
    }
}
