//! CLI tool for generating HyFlux decks from YAML and validating the result.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hyflux_core::spec::{self, SAMPLE_SPEC};
use hyflux_core::{GeneratorConfig, PresentationSpec};
use hyflux_pptx::{find_template, PptxGenerator, Validator};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Generate HyFlux PowerPoint decks from YAML content specs.
#[derive(Parser, Debug)]
#[command(name = "hyflux")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Generator config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a deck from a YAML content spec
    Generate {
        /// Input content spec (.yaml)
        spec: PathBuf,

        /// Output presentation (.pptx)
        output: PathBuf,

        /// Master template (default: searched under templates/)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Skip the validation checklist after generating
        #[arg(long)]
        no_validate: bool,
    },

    /// Run the validation checklist over a deck
    Validate {
        /// Presentation to check (.pptx)
        file: PathBuf,

        /// Slide count the deck must have
        #[arg(short, long)]
        expected: Option<usize>,
    },

    /// Check a content spec without generating anything
    Check {
        /// Input content spec (.yaml)
        spec: PathBuf,
    },

    /// Print a sample content spec
    Template {
        /// Write the sample here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = GeneratorConfig::load_or_default(args.config.as_deref())
        .context("Failed to load generator config")?;

    match &args.command {
        Command::Generate {
            spec,
            output,
            template,
            no_validate,
        } => {
            let passed = generate(spec, output, template.as_deref(), !no_validate, &config)?;
            Ok(exit_code(passed))
        }
        Command::Validate { file, expected } => {
            let report = Validator::new(config)
                .validate(file, *expected)
                .with_context(|| format!("Failed to validate {}", file.display()))?;
            println!("{}", report);
            Ok(exit_code(report.passed()))
        }
        Command::Check { spec } => {
            let valid = check_spec(spec, &config)?;
            Ok(exit_code(valid))
        }
        Command::Template { output } => {
            match output {
                Some(path) => {
                    write_output(path, SAMPLE_SPEC)?;
                    eprintln!("Sample spec written to: {}", path.display());
                }
                None => print!("{}", SAMPLE_SPEC),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Generate `output` from `spec_path`. Returns whether validation passed
/// (always true when validation is skipped).
fn generate(
    spec_path: &Path,
    output: &Path,
    template: Option<&Path>,
    validate: bool,
    config: &GeneratorConfig,
) -> Result<bool> {
    let text = read_spec(spec_path)?;
    let checked = spec::check(&text, config.max_slides)
        .with_context(|| format!("Failed to parse {}", spec_path.display()))?;
    for warning in &checked.warnings {
        eprintln!("Warning: {}", warning);
    }
    if !checked.is_valid() {
        bail!("Invalid spec: {}", checked.errors.join("; "));
    }

    let presentation = PresentationSpec::from_yaml(&text)?;
    let template = find_template(template).context("Master template not found")?;
    log::debug!("Template: {}", template.display());

    let generator = PptxGenerator::new(template, config.clone());
    let summary = generator
        .generate(&presentation, output)
        .with_context(|| format!("Failed to generate {}", output.display()))?;
    eprintln!(
        "Generated {} slides: {}",
        summary.slide_count,
        summary.output.display()
    );

    if !validate {
        return Ok(true);
    }
    let report = Validator::new(config.clone())
        .validate(output, Some(summary.slide_count))
        .with_context(|| format!("Failed to validate {}", output.display()))?;
    println!("{}", report);
    Ok(report.passed())
}

/// Check a spec and print its findings. Returns whether it is valid.
fn check_spec(spec_path: &Path, config: &GeneratorConfig) -> Result<bool> {
    let text = read_spec(spec_path)?;
    let checked = spec::check(&text, config.max_slides)
        .with_context(|| format!("Failed to parse {}", spec_path.display()))?;

    for error in &checked.errors {
        println!("Error: {}", error);
    }
    for warning in &checked.warnings {
        println!("Warning: {}", warning);
    }
    if checked.is_valid() {
        println!("Valid spec with {} slides", checked.slide_count);
    }
    Ok(checked.is_valid())
}

fn read_spec(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyflux_pptx::fixture;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("HyFlux_Template_-.pptx");
        fixture::write_template(&template, 36).unwrap();
        (dir, template)
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["hyflux", "-v", "validate", "deck.pptx", "-e", "3"]).unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Validate { file, expected } => {
                assert_eq!(file, PathBuf::from("deck.pptx"));
                assert_eq!(expected, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_generate_then_validate() {
        let (dir, template) = workspace();
        let spec_path = dir.path().join("deck.yaml");
        write_output(
            &spec_path,
            "slides:\n  - type: title_white\n    title: Hi\n  - type: end_slide\n",
        )
        .unwrap();
        let output = dir.path().join("out").join("deck.pptx");

        let passed = generate(
            &spec_path,
            &output,
            Some(&template),
            true,
            &GeneratorConfig::default(),
        )
        .unwrap();
        assert!(passed);
        assert!(output.exists());
    }

    #[test]
    fn test_generate_rejects_invalid_spec() {
        let (dir, template) = workspace();
        let spec_path = dir.path().join("bad.yaml");
        write_output(&spec_path, "slides:\n  - type: hologram\n    title: X\n").unwrap();
        let output = dir.path().join("bad.pptx");

        let err = generate(&spec_path, &output, Some(&template), true, &GeneratorConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Invalid spec"));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let (dir, _) = workspace();
        let spec_path = dir.path().join("deck.yaml");
        write_output(&spec_path, "slides: []\n").unwrap();
        let missing = dir.path().join("nope.pptx");

        assert!(generate(
            &spec_path,
            &dir.path().join("out.pptx"),
            Some(&missing),
            false,
            &GeneratorConfig::default()
        )
        .is_err());
    }

    #[test]
    fn test_check_sample_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yaml");
        write_output(&path, SAMPLE_SPEC).unwrap();
        assert!(check_spec(&path, &GeneratorConfig::default()).unwrap());
    }
}
