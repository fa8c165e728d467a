use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use merisio::config::{self, ConfigError, PipelineConfig};
use merisio::listing;
use merisio::pipeline::{self, PipelineError};
use merisio::project::Project;
use merisio::validate::{Report, Severity};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_INVALID: u8 = 1;
const EXIT_FAILURE: u8 = 2;

/// Merisio - validate MERISE conceptual models and generate their SQL schema
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a .merisio project file
    file: PathBuf,

    /// Report entities without any link as errors instead of warnings
    #[arg(long)]
    strict_orphans: bool,

    /// Target SQL dialect (default: postgresql)
    #[arg(long)]
    dialect: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show project metadata and statistics
    Info,
    /// Validate the MCD model
    Validate {
        /// Print findings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the logical data model (MLD tables)
    Mld,
    /// Generate SQL DDL
    Sql {
        /// Write SQL to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Environment settings, with command line flags taking precedence.
    fn config(&self) -> Result<PipelineConfig, ConfigError> {
        let mut config = PipelineConfig::from_env()?;
        if self.strict_orphans {
            config.policy.orphan_entity = Severity::Error;
        }
        if let Some(dialect) = &self.dialect {
            config.dialect = config::parse_dialect("--dialect", dialect)?;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Defaults to WARN so command output stays clean; RUST_LOG overrides it.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.config()?;

    let input = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let project = Project::from_json(&input)
        .with_context(|| format!("failed to load project {}", cli.file.display()))?;

    match &cli.command {
        Command::Info => {
            cmd_info(&project);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { json } => cmd_validate(&project, &config, *json),
        Command::Mld => {
            let generated = match pipeline::generate(&project.graph, &project.overrides, &config) {
                Ok(generated) => generated,
                Err(PipelineError::Invalid(report)) => return Ok(refuse(&report)),
            };
            print_warnings(&generated.report);
            print!("{}", listing::render(&generated.model));
            Ok(ExitCode::SUCCESS)
        }
        Command::Sql { output } => {
            let generated = match pipeline::generate(&project.graph, &project.overrides, &config) {
                Ok(generated) => generated,
                Err(PipelineError::Invalid(report)) => return Ok(refuse(&report)),
            };
            print_warnings(&generated.report);
            match output {
                Some(path) => {
                    fs::write(path, &generated.sql)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("SQL written to {}", path.display());
                }
                None => print!("{}", generated.sql),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_info(project: &Project) {
    let meta = &project.metadata;
    let stats = project.statistics();
    let or_none = |s: &str| if s.is_empty() { "(none)".to_string() } else { s.to_string() };

    println!("Project:      {}", meta.name);
    println!("Author:       {}", or_none(&meta.author));
    println!("Description:  {}", or_none(&meta.description));
    println!("Created:      {}", meta.created_at);
    println!("Modified:     {}", meta.modified_at);
    println!("Entities:     {}", stats.entities);
    println!("Associations: {}", stats.associations);
    println!("Links:        {}", stats.links);
    println!("Attributes:   {}", stats.attributes);
}

fn cmd_validate(project: &Project, config: &PipelineConfig, json: bool) -> Result<ExitCode> {
    let report = project.validate_with(&config.policy);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_empty() {
        println!("Validation passed. No errors found.");
    } else {
        let errors = report.errors().count();
        if errors > 0 {
            println!("Validation failed with {} error(s):", errors);
        } else {
            println!("Validation passed with {} warning(s):", report.findings.len());
        }
        for finding in &report.findings {
            println!("  - {}: {}", finding.severity, finding);
        }
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_INVALID)
    })
}

/// Generation was refused: list every finding and exit with 1.
fn refuse(report: &Report) -> ExitCode {
    eprintln!(
        "Validation failed with {} error(s):",
        report.errors().count()
    );
    for finding in &report.findings {
        eprintln!("  - {}: {}", finding.severity, finding);
    }
    ExitCode::from(EXIT_INVALID)
}

fn print_warnings(report: &Report) {
    for finding in report.warnings() {
        eprintln!("warning: {}", finding);
    }
}
