//! reflgen CLI - Command line interface for the reflection generator

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, log, Level, LevelFilter};

use reflgen::{generate, GenerateOutcome, GenerateRequest, PipelineError};
use reflgen_codegen::{CodegenError, CppOptions, GateMode, OutputFormat, DEFAULT_ENUM_ACCESSOR};
use reflgen_meta::Registry;
use reflgen_parser::{source_for, CompileConfig, ConfigError, ParseError, SourceError};
use reflgen_walker::{MalformedPolicy, MemberFilter, WalkError, WalkOptions, DEFAULT_TYPE_MARKER};

const EXIT_MISSING_INPUT: i32 = 1;
const EXIT_PARSE: i32 = 2;
const EXIT_GENERATION: i32 = 3;

/// Recovered per-member problems are only shown with `-v`
const RECOVERED_LEVEL: Level = Level::Info;

#[derive(Parser)]
#[command(name = "reflgen", version)]
#[command(about = "Static reflection metadata generator for annotated C++ types", long_about = None)]
struct Cli {
    /// Report recovered problems
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Debug logging, including the parsed declaration tree
    #[arg(long, global = true)]
    dbg: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the reflection artifact for a header
    Generate(GenerateArgs),
    /// Parse a file and output the declaration tree as JSON
    Dump {
        /// Input header
        file: Option<PathBuf>,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
        /// Abort on the first parse error
        #[arg(long)]
        fatal_errors: bool,
        #[command(flatten)]
        compile: CompileArgs,
    },
    /// Load JSON artifacts and list the registered types
    Inspect {
        /// Artifacts generated with `--format json`
        artifacts: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Header (or JSON declaration tree) to generate from
    file: Option<PathBuf>,
    /// Output file; the artifact goes to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = FormatArg::Cpp)]
    format: FormatArg,
    /// Regenerate even if the artifact is up to date
    #[arg(long)]
    force: bool,
    /// How to decide that the artifact is up to date
    #[arg(long, value_enum, default_value_t = GateArg::Timestamp)]
    gate: GateArg,
    /// Only reflect types whose metadata contains this key
    #[arg(long, value_name = "KEY", default_value = DEFAULT_TYPE_MARKER)]
    type_marker: String,
    /// Reflect every type carrying an attribute or doc tag
    #[arg(long, conflicts_with = "type_marker")]
    any_marker: bool,
    /// Only reflect members that carry an annotation
    #[arg(long)]
    annotated_members_only: bool,
    /// Skip protected and private members
    #[arg(long)]
    public_only: bool,
    /// Keep malformed annotation text as a single `__raw` piece
    #[arg(long)]
    opaque_malformed: bool,
    /// Abort on the first parse error
    #[arg(long)]
    fatal_errors: bool,
    /// Header included by the generated C++ artifact
    #[arg(long, default_value = "refl.rule.hxx")]
    rule_header: String,
    /// Namespace brought in by the generated C++ artifact
    #[arg(long, default_value = "refl")]
    namespace: String,
    /// Name of the enumerator accessor in `EnumInfo` specializations
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ENUM_ACCESSOR)]
    enum_accessor: String,
    #[command(flatten)]
    compile: CompileArgs,
}

/// Compilation settings, passed through to the declaration source
#[derive(Args)]
struct CompileArgs {
    /// Directory containing compile_commands.json
    #[arg(long, value_name = "DIR")]
    database_dir: Option<PathBuf>,
    /// Use this file's entry from the compilation database
    #[arg(long, requires = "database_dir", value_name = "FILE")]
    database_file: Option<PathBuf>,
    /// Language standard, e.g. c++17
    #[arg(long = "std", value_name = "STANDARD")]
    standard: Option<String>,
    /// Include directory
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,
    /// Macro definition
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    define: Vec<String>,
    /// Macro undefinition
    #[arg(short = 'U', value_name = "NAME")]
    undefine: Vec<String>,
    /// Compiler feature flag, without the -f
    #[arg(short = 'f', value_name = "FEATURE")]
    feature: Vec<String>,
    #[arg(long)]
    gnu_extensions: bool,
    #[arg(long)]
    msvc_extensions: bool,
    #[arg(long)]
    msvc_compatibility: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Cpp,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum GateArg {
    Timestamp,
    Hash,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.dbg);

    let code = match cli.command {
        Commands::Generate(args) => cmd_generate(args),
        Commands::Dump {
            file,
            pretty,
            fatal_errors,
            compile,
        } => cmd_dump(file, pretty, fatal_errors, &compile),
        Commands::Inspect { artifacts } => cmd_inspect(&artifacts),
    };
    process::exit(code);
}

fn log_filter(verbose: bool, dbg: bool) -> LevelFilter {
    if dbg {
        LevelFilter::Debug
    } else if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    }
}

fn init_logging(verbose: bool, dbg: bool) {
    let level = log_filter(verbose, dbg).to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn cmd_generate(args: GenerateArgs) -> i32 {
    let Some(file) = required_file(args.file) else {
        return EXIT_MISSING_INPUT;
    };
    let config = match compile_config(&args.compile, &file) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let request = GenerateRequest {
        input: file.clone(),
        output: args.output,
        config,
        fatal_errors: args.fatal_errors,
        walk: WalkOptions {
            type_marker: (!args.any_marker).then_some(args.type_marker),
            member_filter: if args.annotated_members_only {
                MemberFilter::Annotated
            } else {
                MemberFilter::All
            },
            public_only: args.public_only,
            malformed: if args.opaque_malformed {
                MalformedPolicy::Opaque
            } else {
                MalformedPolicy::Empty
            },
        },
        format: match args.format {
            FormatArg::Cpp => OutputFormat::Cpp,
            FormatArg::Json => OutputFormat::Json,
        },
        cpp: CppOptions {
            rule_header: args.rule_header,
            namespace: args.namespace,
            enum_accessor: args.enum_accessor,
        },
        gate: match args.gate {
            GateArg::Timestamp => GateMode::Timestamp,
            GateArg::Hash => GateMode::ContentHash,
        },
        force: args.force,
    };

    match generate(&request) {
        Ok(GenerateOutcome::Skipped { path }) => {
            info!("{} is up to date, skipping", path.display());
            0
        }
        Ok(GenerateOutcome::Written {
            path,
            types,
            diagnostics,
            elapsed,
        }) => {
            report_diagnostics(&diagnostics);
            info!("wrote {} types to {}", types, path.display());
            println!("{}", elapsed.as_secs_f64());
            0
        }
        Ok(GenerateOutcome::Rendered {
            text,
            types,
            diagnostics,
            elapsed,
        }) => {
            report_diagnostics(&diagnostics);
            info!("rendered {} types", types);
            print!("{}", text);
            eprintln!("{}", elapsed.as_secs_f64());
            0
        }
        Err(error) => {
            report_pipeline_error(&file, &error);
            exit_code(&error)
        }
    }
}

fn cmd_dump(file: Option<PathBuf>, pretty: bool, fatal_errors: bool, compile: &CompileArgs) -> i32 {
    let Some(file) = required_file(file) else {
        return EXIT_MISSING_INPUT;
    };
    if !file.exists() {
        eprintln!("Error: input file not found: {}", file.display());
        return EXIT_MISSING_INPUT;
    }
    let config = match compile_config(compile, &file) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let unit = match source_for(&file, &config, fatal_errors).load(&file) {
        Ok(unit) => unit,
        Err(error) => {
            let error = PipelineError::Source(error);
            report_pipeline_error(&file, &error);
            return exit_code(&error);
        }
    };

    let json = if pretty {
        serde_json::to_string_pretty(&unit)
    } else {
        serde_json::to_string(&unit)
    };
    match json {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize declaration tree: {}", e);
            EXIT_GENERATION
        }
    }
}

fn cmd_inspect(artifacts: &[PathBuf]) -> i32 {
    if artifacts.is_empty() {
        eprintln!("Error: no artifact given");
        return EXIT_MISSING_INPUT;
    }

    let mut registry = Registry::new();
    let mut all_ok = true;

    for path in artifacts {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                return EXIT_MISSING_INPUT;
            }
        };
        match registry.register_artifact(&text) {
            Ok(count) => info!("{}: {} types", path.display(), count),
            Err(e) => {
                eprintln!("✗ {} - {}", path.display(), e);
                all_ok = false;
            }
        }
    }

    for ty in registry.iter() {
        let kind = if ty.is_enum() { "enum" } else { "class" };
        let members = if ty.is_enum() {
            format!("{} enumerators", ty.enumerators().len())
        } else {
            format!(
                "{} fields, {} static fields, {} methods",
                ty.fields().len(),
                ty.static_fields().len(),
                ty.methods().len()
            )
        };
        println!("{} {} ({}; {} meta)", kind, ty.qualified_name, members, ty.meta.len());
    }

    if all_ok {
        0
    } else {
        EXIT_GENERATION
    }
}

fn required_file(file: Option<PathBuf>) -> Option<PathBuf> {
    match file {
        Some(file) if !file.as_os_str().is_empty() => Some(file),
        _ => {
            eprintln!("Error: missing input file");
            None
        }
    }
}

/// Command-line settings merged over the compilation database entry
fn compile_config(args: &CompileArgs, file: &Path) -> Result<CompileConfig, i32> {
    let mut config = match &args.database_dir {
        Some(dir) => match CompileConfig::from_database(dir, file, args.database_file.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return Err(match e {
                    ConfigError::Io { source, .. } if source.kind() == ErrorKind::NotFound => {
                        EXIT_MISSING_INPUT
                    }
                    _ => EXIT_PARSE,
                });
            }
        },
        None => CompileConfig::new(),
    };

    let mut cli = CompileConfig::new();
    let mut no_args = std::iter::empty::<String>();
    if let Some(standard) = &args.standard {
        cli.apply_flag(&format!("-std={}", standard), &mut no_args, Path::new("."));
    }
    cli.include_dirs = args.include.clone();
    for definition in &args.define {
        cli.define(definition);
    }
    for name in &args.undefine {
        cli.undefine(name);
    }
    cli.features = args.feature.clone();
    cli.gnu_extensions |= args.gnu_extensions;
    cli.msvc_extensions = args.msvc_extensions;
    cli.msvc_compatibility = args.msvc_compatibility;

    config.merge(cli);
    Ok(config)
}

fn exit_code(error: &PipelineError) -> i32 {
    match error {
        PipelineError::MissingInput { .. } => EXIT_MISSING_INPUT,
        PipelineError::Source(SourceError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
            EXIT_MISSING_INPUT
        }
        PipelineError::Source(_) => EXIT_PARSE,
        PipelineError::Codegen(CodegenError::MissingSource { .. }) => EXIT_MISSING_INPUT,
        PipelineError::Walk(_) | PipelineError::Codegen(_) => EXIT_GENERATION,
    }
}

fn report_pipeline_error(file: &Path, error: &PipelineError) {
    match error {
        PipelineError::Source(SourceError::Parse { path, text, error }) => {
            report_parse_error(text, path, error);
        }
        PipelineError::Walk(errors) => {
            for error in errors {
                eprintln!("error[{}]: {}", error.code(), error);
            }
        }
        other => eprintln!("Error ({}): {}", file.display(), other),
    }
}

fn report_diagnostics(diagnostics: &[WalkError]) {
    for diagnostic in diagnostics {
        log!(RECOVERED_LEVEL, "[{}] {}", diagnostic.code(), diagnostic);
    }
    if !diagnostics.is_empty() {
        log!(RECOVERED_LEVEL, "{} problem(s) recovered", diagnostics.len());
    }
}

fn report_parse_error(source: &str, file: &Path, error: &ParseError) {
    let name = file.to_string_lossy().to_string();
    let span = error.span();
    let printed = Report::build(ReportKind::Error, name.clone(), span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((name.clone(), span.start..span.end))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name, Source::from(source)));
    if printed.is_err() {
        eprintln!("{}: {}", file.display(), error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args(args: &[&str]) -> GenerateArgs {
        let argv = std::iter::once("reflgen").chain(args.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Generate(args) => args,
            _ => panic!("expected the generate command"),
        }
    }

    #[test]
    fn recovered_problems_need_verbose() {
        assert!(RECOVERED_LEVEL > log_filter(false, false));
        assert!(RECOVERED_LEVEL <= log_filter(true, false));
        assert!(RECOVERED_LEVEL <= log_filter(false, true));
    }

    #[test]
    fn generate_defaults() {
        let args = generate_args(&["generate", "w.hpp"]);
        assert_eq!(args.type_marker, "refl");
        assert!(!args.any_marker);
        assert_eq!(args.enum_accessor, "all_enumerators");

        let args = generate_args(&["generate", "w.hpp", "--any-marker", "--enum-accessor", "all_static_fields"]);
        assert!(args.any_marker);
        assert_eq!(args.enum_accessor, "all_static_fields");
    }

    #[test]
    fn any_marker_conflicts_with_explicit_marker() {
        let argv = ["reflgen", "generate", "w.hpp", "--any-marker", "--type-marker", "reflect"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
