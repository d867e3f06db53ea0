//! CLI tool for turning a research-paper slide blueprint into a presentation.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::{
    DeckConfig, DeckPipeline, DeckPlan, FigureMatcher, ImageAsset, ImageTypeClassifier,
    OutlineFormatter, SidecarTextRecognizer,
};
use deck_pptx::{DeckDocument, PptxWriter};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Title used when none is given.
const DEFAULT_TITLE: &str = "Research Paper";

/// File name used when the title yields no usable characters.
const DEFAULT_FILE_NAME: &str = "presentation.pptx";

/// Longest file stem derived from a title.
const MAX_STEM_CHARS: usize = 50;

const REPORT_FILE_NAME: &str = "verification_report.json";

/// Build a slide deck from a generated blueprint and the paper it describes.
#[derive(Parser, Debug)]
#[command(name = "paper-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Slide blueprint text file
    blueprint: PathBuf,

    /// Extracted paper text, used to verify bullet claims
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// JSON manifest of extracted images
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Output directory (default: same as blueprint)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Paper title for the title slide and file name
    #[arg(short, long)]
    title: Option<String>,

    /// Subtitle for the title slide
    #[arg(long)]
    subtitle: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tag figures with OCR text read from a `.txt` file beside each image
    #[arg(long)]
    ocr_sidecars: bool,

    /// Print a text outline to stdout instead of writing files
    #[arg(short, long)]
    print: bool,

    /// Print the slide plan as JSON to stdout instead of writing files
    #[arg(long, conflicts_with = "print")]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = match &args.config {
        Some(path) => DeckConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DeckConfig::default(),
    };

    let plan = build_plan(&args, &config)?;

    if args.print {
        print!("{}", OutlineFormatter::new().format_with_newline(&plan));
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let output_dir = output_dir(&args.blueprint, args.output.as_deref())?;
    let deck_path = unique_output_path(&output_dir, &output_file_name(args.title.as_deref()));

    let title = args.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let mut document = DeckDocument::from_plan(&plan, title, |path| std::fs::read(path));
    if let Some(subtitle) = &args.subtitle {
        document = document.with_subtitle(subtitle);
    }

    PptxWriter::new()
        .write_to_path(&deck_path, &document)
        .with_context(|| format!("Failed to write {}", deck_path.display()))?;

    let report_path = output_dir.join(REPORT_FILE_NAME);
    write_output(&report_path, &serde_json::to_string_pretty(&plan.report)?)?;

    if args.verbose {
        eprintln!(
            "  {} slides, {} with figures, {} bullets removed",
            plan.slides.len(),
            plan.illustrated_count(),
            plan.report.removed_bullets()
        );
    }
    println!("{}", deck_path.display());

    Ok(())
}

/// Read the inputs and run the pipeline.
fn build_plan(args: &Args, config: &DeckConfig) -> Result<DeckPlan> {
    let blueprint = std::fs::read_to_string(&args.blueprint)
        .with_context(|| format!("Failed to read {}", args.blueprint.display()))?;

    let source = args
        .source
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .transpose()?;

    let assets = match &args.assets {
        Some(path) => ImageAsset::load_manifest(path)
            .with_context(|| format!("Failed to load asset manifest {}", path.display()))?,
        None => Vec::new(),
    };

    if args.verbose {
        eprintln!("Processing: {}", args.blueprint.display());
        eprintln!("  {} figures available", assets.len());
    }

    let plan = pipeline(config, args.ocr_sidecars).run(&blueprint, source.as_deref(), &assets);

    if plan.slides.is_empty() {
        log::warn!("No slides could be built from {}", args.blueprint.display());
    }

    Ok(plan)
}

/// Pipeline for the given settings, with OCR sidecars if requested.
fn pipeline(config: &DeckConfig, ocr_sidecars: bool) -> DeckPipeline {
    let pipeline = DeckPipeline::from_config(config);
    if !ocr_sidecars {
        return pipeline;
    }

    let classifier = ImageTypeClassifier::new().with_recognizer(Box::new(SidecarTextRecognizer));
    pipeline.with_matcher(FigureMatcher::from_config(config).with_classifier(classifier))
}

/// Resolve and create the output directory.
fn output_dir(blueprint: &Path, output: Option<&Path>) -> Result<PathBuf> {
    match output {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            Ok(dir.to_path_buf())
        }
        None => Ok(blueprint
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))),
    }
}

/// Derive a `.pptx` file name from the paper title.
///
/// Drops characters other than word characters, whitespace and dashes, turns
/// whitespace/dash runs into `_` and keeps at most 50 characters.
fn output_file_name(title: Option<&str>) -> String {
    let Some(title) = title.filter(|t| *t != DEFAULT_TITLE) else {
        return DEFAULT_FILE_NAME.to_string();
    };

    let mut stem = String::new();
    let mut in_separator = false;
    for c in title
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
    {
        if c.is_whitespace() || c == '-' {
            if !in_separator {
                stem.push('_');
                in_separator = true;
            }
        } else {
            stem.push(c);
            in_separator = false;
        }
    }

    let stem: String = stem.chars().take(MAX_STEM_CHARS).collect();
    if stem.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        format!("{}.pptx", stem)
    }
}

/// `dir/name`, or `dir/stem_N.pptx` with the first free N.
fn unique_output_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name.strip_suffix(".pptx").unwrap_or(file_name);
    (1..)
        .map(|n| dir.join(format!("{}_{}.pptx", stem, n)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
