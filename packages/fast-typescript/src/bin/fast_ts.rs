use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use fast_typescript::config::ConfigOption;
use fast_typescript::logging::{ConsoleLogger, LogLevel, Logger, LoggingContext};
use fast_typescript::resolve::is_ts_source_file;
use fast_typescript::{BuildSession, FastTypescript, ResolveIdResult, TransformResult};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("fast-ts")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Transpile TypeScript with oxc, esbuild or swc following tsconfig.json")
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("PATH")
                .help("Path to tsconfig.json")
                .global(true),
        )
        .arg(
            Arg::new("no-config")
                .long("no-config")
                .action(ArgAction::SetTrue)
                .conflicts_with("project")
                .help("Ignore tsconfig.json and use default compiler options")
                .global(true),
        )
        .arg(
            Arg::new("transformer")
                .short('t')
                .long("transformer")
                .value_name("NAME")
                .default_value("oxc")
                .help("Transpiler backend: oxc, esbuild or swc")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("warn")
                .help("Level for plugin messages: debug, info, warn or error")
                .global(true),
        )
        .subcommand(
            Command::new("transpile")
                .about("Transpile files, or every file the project lists")
                .arg(Arg::new("files").value_name("FILE").num_args(0..))
                .arg(
                    Arg::new("out-dir")
                        .short('o')
                        .long("out-dir")
                        .value_name("DIR")
                        .help("Write .js and .js.map files here instead of printing to stdout"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve an import specifier the way the plugin does")
                .arg(Arg::new("specifier").required(true))
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_name("IMPORTER")
                        .required(true)
                        .help("TypeScript file containing the import"),
                ),
        )
        .subcommand(Command::new("show-config").about("Print the normalized compiler options"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("FAST_TS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&matches) {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let level: LogLevel = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let ctx = LoggingContext::new(ConsoleLogger::new(level));

    let config = if matches.get_flag("no-config") {
        ConfigOption::Bool(false)
    } else {
        match matches.get_one::<String>("project") {
            Some(project) => ConfigOption::Path(project.clone()),
            None => ConfigOption::Bool(true),
        }
    };
    let transformer = matches.get_one::<String>("transformer").map(String::as_str);

    let plugin = FastTypescript::new(config, transformer);
    let session = plugin.build_start(&ctx)?;

    match matches.subcommand() {
        Some(("resolve", sub)) => run_resolve(&session, sub),
        Some(("show-config", _)) => run_show_config(&session),
        Some(("transpile", sub)) => run_transpile(&session, &ctx, sub),
        _ => Ok(()),
    }
}

fn run_resolve(session: &BuildSession, matches: &ArgMatches) -> Result<()> {
    let specifier = matches
        .get_one::<String>("specifier")
        .context("missing specifier")?;
    let importer = matches.get_one::<String>("from").context("missing --from")?;
    let importer = absolute(Path::new(importer))?.to_string_lossy().into_owned();

    match session.resolve_id(specifier, Some(importer.as_str()), false) {
        ResolveIdResult::Resolved(path) => println!("{}", path.display()),
        ResolveIdResult::Declined => println!("(declaration only, not bundled)"),
        ResolveIdResult::PassThrough => println!("(not resolved, left to the bundler)"),
    }
    Ok(())
}

fn run_show_config(session: &BuildSession) -> Result<()> {
    let report = serde_json::json!({
        "transformer": session.transformer_name().as_str(),
        "basePath": session.base_path(),
        "configChain": session
            .chain()
            .iter()
            .map(|file| file.to_string_lossy().into_owned())
            .collect::<Vec<_>>(),
        "compilerOptions": session.options().to_json(),
        "files": session.file_names(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_transpile<L: Logger>(session: &BuildSession, ctx: &LoggingContext<L>, matches: &ArgMatches) -> Result<()> {
    let files: Vec<PathBuf> = match matches.get_many::<String>("files") {
        Some(files) => files.map(|file| absolute(Path::new(file))).collect::<Result<_>>()?,
        None => session.file_names().iter().map(PathBuf::from).collect(),
    };
    let files: Vec<PathBuf> = files
        .into_iter()
        .filter(|file| is_ts_source_file(&file.to_string_lossy()))
        .collect();
    if files.is_empty() {
        bail!("No TypeScript source files to transpile.");
    }
    ctx.logger().info(&format!("transpiling {} file(s)", files.len()));

    let outputs = files
        .par_iter()
        .map(|file| -> Result<Option<(PathBuf, TransformResult)>> {
            let source = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
            let result = session.transform_path(ctx, &source, file)?;
            Ok(result.map(|result| (file.clone(), result)))
        })
        .collect::<Result<Vec<Option<(PathBuf, TransformResult)>>>>()?;

    let out_dir = matches.get_one::<String>("out-dir").map(PathBuf::from);
    for (file, result) in outputs.into_iter().flatten() {
        match &out_dir {
            Some(out_dir) => write_output(session, out_dir, &file, result)?,
            None => {
                println!("// {}", file.display());
                println!("{}", result.code);
            }
        }
    }
    Ok(())
}

fn output_path(session: &BuildSession, out_dir: &Path, file: &Path) -> PathBuf {
    let relative = file
        .strip_prefix(session.base_path())
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| file.file_name().map(PathBuf::from).unwrap_or_default());
    let extension = match relative.extension().and_then(|ext| ext.to_str()) {
        Some("mts") => "mjs",
        Some("cts") => "cjs",
        _ => "js",
    };
    out_dir.join(relative).with_extension(extension)
}

fn write_output(session: &BuildSession, out_dir: &Path, file: &Path, result: TransformResult) -> Result<()> {
    let target = output_path(session, out_dir, file);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut code = result.code;
    if let Some(map) = result.map {
        let map_path = PathBuf::from(format!("{}.map", target.display()));
        fs::write(&map_path, map).with_context(|| format!("Failed to write {}", map_path.display()))?;
        if let Some(name) = map_path.file_name() {
            if !code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(&format!("//# sourceMappingURL={}\n", name.to_string_lossy()));
        }
    }
    fs::write(&target, code).with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(cwd.join(path))
}
