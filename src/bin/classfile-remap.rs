//! classfile-remap - apply a rename mapping to a class file or a JAR.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use classfile_remapper::batch::{remap_batch, BatchInput, BatchOptions, BatchReport};
use classfile_remapper::jar_utils::{hierarchy_from_jar, remap_jar, JarFile};
use classfile_remapper::mapping::format::tsrg::{self, McpNames};
use classfile_remapper::mapping::format::MappingFormat;
use classfile_remapper::mapping::{ClassNode, MappingTable};
use classfile_remapper::remap::{RemapContext, RemapOptions};

/// Rename classes, methods and fields inside compiled Java classes
#[derive(Parser, Debug)]
#[command(name = "classfile-remap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// A `.class` file or a JAR
    input: PathBuf,

    /// Mapping file
    #[arg(short, long)]
    mappings: PathBuf,

    /// Mapping format (proguard, mojang, tsrg, searge); guessed when omitted
    #[arg(short, long)]
    format: Option<MappingFormat>,

    /// Where to write the remapped class or JAR
    #[arg(short, long)]
    output: PathBuf,

    /// Library JARs whose classes take part in inheritance lookups
    #[arg(long, value_name = "JAR")]
    classpath: Vec<PathBuf>,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Apply the mapping in the opposite direction
    #[arg(long)]
    reverse: bool,

    /// MCP `fields.csv` giving final names for TSRG intermediary names
    #[arg(long, requires = "mcp_methods")]
    mcp_fields: Option<PathBuf>,

    /// MCP `methods.csv` giving final names for TSRG intermediary names
    #[arg(long, requires = "mcp_fields")]
    mcp_methods: Option<PathBuf>,

    /// Keep SourceFile attributes as they are
    #[arg(long)]
    no_source_file: bool,

    /// Do not rename `Outer$Inner` after a mapped `Outer`
    #[arg(long)]
    no_inner_inference: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let mappings = load_mappings(&cli)?;
    info!(entries = mappings.len(), "mappings loaded");

    let mut supplementary: Vec<ClassNode> = Vec::new();
    for path in &cli.classpath {
        let jar = JarFile::open(path)
            .with_context(|| format!("reading classpath {}", path.display()))?;
        supplementary.extend(hierarchy_from_jar(&jar));
    }

    let builder = RemapContext::builder(mappings)
        .supplementary(supplementary)
        .options(RemapOptions {
            infer_inner_classes: !cli.no_inner_inference,
            rewrite_source_file: !cli.no_source_file,
        });
    let options = BatchOptions {
        threads: cli.threads,
        ..Default::default()
    };

    let report = if is_class_file(&cli.input) {
        let bytes = fs::read(&cli.input)
            .with_context(|| format!("reading {}", cli.input.display()))?;
        let inputs = vec![BatchInput::new(cli.input.display().to_string(), bytes)];
        let ctx = builder.build(&inputs);
        let report = remap_batch(&ctx, &inputs, &options);
        if let Some((_, class)) = report.remapped().next() {
            fs::write(&cli.output, &class.bytes)
                .with_context(|| format!("writing {}", cli.output.display()))?;
        }
        report
    } else {
        let jar = JarFile::open(&cli.input)
            .with_context(|| format!("reading {}", cli.input.display()))?;
        let remapped = remap_jar(&jar, builder, &options)?;
        remapped
            .jar
            .save(&cli.output)
            .with_context(|| format!("writing {}", cli.output.display()))?;
        remapped.report
    };

    summarize(&report)
}

fn load_mappings(cli: &Cli) -> Result<MappingTable> {
    let text = fs::read_to_string(&cli.mappings)
        .with_context(|| format!("reading mappings {}", cli.mappings.display()))?;
    let format = cli.format.unwrap_or_else(|| MappingFormat::detect(&text));
    let table = match (format, &cli.mcp_fields, &cli.mcp_methods) {
        (MappingFormat::Tsrg, Some(fields), Some(methods)) => {
            let names =
                McpNames::from_csv(&fs::read_to_string(fields)?, &fs::read_to_string(methods)?)?;
            tsrg::parse_with_names(&text, &names)?
        }
        (MappingFormat::Proguard, Some(_), _) => {
            bail!("--mcp-fields/--mcp-methods only apply to TSRG mappings")
        }
        _ => format.parse(&text)?,
    };
    if cli.reverse {
        Ok(table.inverse()?)
    } else {
        Ok(table)
    }
}

fn is_class_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "class")
}

fn summarize(report: &BatchReport) -> Result<()> {
    for (id, e) in report.failures() {
        error!(entry = id, "{e}");
    }
    info!(
        remapped = report.success_count(),
        failed = report.failure_count(),
        warnings = report.warnings().count(),
        "done"
    );
    if !report.is_success() {
        bail!(
            "{} of {} classes could not be remapped",
            report.items.len() - report.success_count(),
            report.items.len()
        );
    }
    Ok(())
}
