use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use usability_report::scores::{
    format_percentage, format_score, tally_questions, GlobalScores, UsabilityBreakdown,
};
use usability_report::survey::Evaluations;
use usability_report::{ReportCompiler, ReportConfig, ReportData, ReportInput};

/// Compiles design test survey results into PDF reports.
///
/// Fonts must be present under `assets/fonts` of the `usability_report`
/// crate or provided via the `USABILITY_REPORT_FONTS_DIR` environment
/// variable before rendering.
#[derive(Parser)]
#[command(author, version, about = "Usability report generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the detailed report of a survey result.
    Render {
        /// JSON file holding `{design_test, evaluators}`.
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the PDF is written to.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Base URL of the survey backend.
        #[arg(long)]
        backend_url: Option<String>,

        /// Skip the screen count lookup and prototype screenshots.
        #[arg(long)]
        offline: bool,

        /// Image drawn at the top of the cover page.
        #[arg(long)]
        header_image: Option<PathBuf>,

        /// Text placed before the design test name in the file name.
        #[arg(long)]
        title_prefix: Option<String>,
    },

    /// Print the usability figures of a survey result without rendering.
    Summary {
        /// JSON file holding `{design_test, evaluators}`.
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            input,
            output_dir,
            backend_url,
            offline,
            header_image,
            title_prefix,
        } => {
            let mut config = ReportConfig::from_env();
            if let Some(url) = backend_url {
                config.backend_url = url;
            }
            if let Some(path) = header_image {
                config.header_image = Some(path);
            }
            if let Some(prefix) = title_prefix {
                config.title_prefix = prefix;
            }
            render(&input, &output_dir, config, offline)
        }
        Commands::Summary { input } => summary(&input),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn read_input(path: &Path) -> Result<ReportInput, Box<dyn Error>> {
    let json = fs::read_to_string(path)?;
    Ok(ReportInput::from_json(&json)?)
}

fn render(
    input: &Path,
    output_dir: &Path,
    config: ReportConfig,
    offline: bool,
) -> Result<(), Box<dyn Error>> {
    let compiler = if offline {
        ReportCompiler::offline(config)
    } else {
        ReportCompiler::new(config)?
    }
    .on_start(|| info!("Generating report..."))
    .on_end(|| info!("Report generation finished"));

    let exported = compiler.export(read_input(input)?, output_dir)?;
    for issue in exported.document.issues() {
        eprintln!("Skipped table on page {}: {}", issue.page_index + 1, issue.reason);
    }
    println!(
        "Generated {} ({} pages)",
        exported.path.display(),
        exported.document.page_count()
    );
    Ok(())
}

fn summary(input: &Path) -> Result<(), Box<dyn Error>> {
    let data = ReportData::from_input(read_input(input)?)?;
    println!(
        "{} ({} evaluators)",
        data.design_test.name,
        data.evaluations.evaluator_count()
    );

    match &data.evaluations {
        Evaluations::Heuristic(evaluators) => {
            for tally in tally_questions(evaluators) {
                println!("\n{}", tally.question.title);
                match tally.breakdown() {
                    Ok(breakdown) => {
                        for row in &breakdown.rows {
                            println!(
                                "  {:<40} {:>8} / {:>8}  {:>8}",
                                row.label,
                                format_score(row.obtained),
                                format_score(row.max),
                                format_percentage(row.percentage)
                            );
                        }
                        println!("{}", usability_line(&breakdown));
                    }
                    Err(err) => println!("  {}", err),
                }
            }
        }
        Evaluations::Standard(evaluators) => {
            let scores = GlobalScores::from_evaluators(evaluators);
            match scores.breakdown() {
                Ok(breakdown) => {
                    for row in &breakdown.rows {
                        println!(
                            "  {:<20} {:>8} / {:>8}  {:>8}",
                            row.label,
                            format_score(row.obtained),
                            format_score(row.max),
                            format_percentage(row.percentage)
                        );
                    }
                    println!("{}", usability_line(&breakdown));
                }
                Err(err) => println!("  {}", err),
            }
        }
    }
    Ok(())
}

/// Closing line of a breakdown, shared by both test modes.
fn usability_line(breakdown: &UsabilityBreakdown) -> String {
    format!(
        "  usability {}, missing {}",
        format_percentage(breakdown.usability_level),
        format_percentage(breakdown.gap_percentage)
    )
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
