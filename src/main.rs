mod config;
mod crew;
mod ollama;
mod tools;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use crew::TeacherAssistantCrew;
use ollama::{ChatModel, OllamaClient};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tools::grade_analyzer::{analyze_complexity, ComplexityReport};
use tools::notes_analyzer::{analyze_notes, AnalysisReport};
use tools::notes_input::preview;
use tools::{GradeLevelAnalyzer, NotesAnalysisTool, NotesReader, NotesSource, ResultsWriter, Tool};

/// Turn teaching notes into a lesson plan, a quiz and teaching strategies.
#[derive(Debug, Parser)]
#[command(name = "teacher-assistant", version, about)]
struct Cli {
    /// Read notes from this file instead of prompting for them
    notes_file: Option<PathBuf>,

    /// Use the built-in photosynthesis example notes
    #[arg(long, conflicts_with = "notes_file")]
    example: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Print the note analysis tools' reports and exit without calling the model
    #[arg(long)]
    analyze_only: bool,

    /// With --analyze-only, print the reports as JSON
    #[arg(long, requires = "analyze_only")]
    json: bool,

    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Results file (overrides [output].results_file)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnalyzeOnlyReport {
    analysis: AnalysisReport,
    complexity: ComplexityReport,
}

impl Cli {
    fn notes_source(&self) -> NotesSource {
        match (&self.notes_file, self.example) {
            (_, true) => NotesSource::Example,
            (Some(path), false) => NotesSource::File(path.clone()),
            (None, false) => NotesSource::Interactive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    pretty_env_logger::formatted_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();
    let rule = "=".repeat(80);

    println!("\n{}\n🎓 TEACHER ASSISTANT CREW\n{}", rule, rule);

    let mut config = Config::load(&cli.config)?;
    if let Some(output) = &cli.output {
        config.output.results_file = output.clone();
    }
    log::info!("Configuration loaded successfully");

    let source = cli.notes_source();
    match &source {
        NotesSource::Example => println!("📚 Using example notes (Photosynthesis)"),
        NotesSource::File(path) => println!("📖 Reading notes from: {}", path.display()),
        NotesSource::Interactive => print_input_instructions(&rule),
    }

    let notes = NotesReader::new().run(source).await?;
    println!(
        "✓ Loaded {} characters ({} words)",
        notes.chars().count(),
        notes.split_whitespace().count()
    );

    if cli.analyze_only {
        if cli.json {
            let reports = AnalyzeOnlyReport {
                analysis: analyze_notes(&notes),
                complexity: analyze_complexity(&notes),
            };
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            println!("\n{}", NotesAnalysisTool::new().run(notes.clone()).await?);
            println!("{}", GradeLevelAnalyzer::new().run(notes).await?);
        }
        return Ok(());
    }

    config.validate().context("Invalid model configuration")?;
    println!("✓ Environment configured ({} via {})", config.ai_model.model, config.ai_model.endpoint);

    println!("{}\n\n📋 NOTES PREVIEW:\n{}", rule, "-".repeat(80));
    println!("{}", preview(&notes));
    println!("{}", "-".repeat(80));

    println!("\n⚠️  Generating teaching materials based on these notes.");
    println!("This will take a few minutes.");

    if !cli.yes && !confirm("\nProceed? (yes/no): ")? {
        println!("\n❌ Cancelled by user.");
        return Ok(());
    }

    println!("\nInitializing agents...");
    let model = OllamaClient::new(
        config.ai_model.endpoint.clone(),
        config.ai_model.model.clone(),
        config.ai_model.timeout(),
    )?;
    log::info!("Using model {}", model.model_name());
    let crew = TeacherAssistantCrew::new(model, &config);

    println!("\n🚀 Starting Crew Execution...\n{}\n", "-".repeat(80));
    let result = crew.kickoff(&notes).await.context("Crew execution failed")?;

    let saved = ResultsWriter::new()
        .run((result.to_text(), config.output.results_file.clone()))
        .await?;

    println!("\n{}\n✨ CREW EXECUTION COMPLETED!\n{}", rule, rule);
    println!("\n💾 Results saved to: {}", saved.display());
    println!("\n📊 Generated Materials:");
    for output in &result.outputs {
        println!("   ✓ {}", output.heading);
    }
    println!("\n🎉 Your teaching materials are ready!\n{}\n", rule);

    log::info!("Teacher assistant finished");
    Ok(())
}

fn print_input_instructions(rule: &str) {
    println!("\n{}\n📝 ENTER YOUR TEACHING NOTES\n{}", rule, rule);
    println!("\nInclude: topic, grade level, key concepts, objectives, etc.");
    println!("Type your notes (press Enter twice when done, or Ctrl+D):");
    println!("{}", "-".repeat(80));
}

/// Ask a yes/no question on stdin; end of input counts as "no".
fn confirm(question: &str) -> Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("yes\n"));
        assert!(is_affirmative(" Y "));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_notes_source_selection() {
        let cli = Cli::parse_from(["teacher-assistant", "--example"]);
        assert_eq!(cli.notes_source(), NotesSource::Example);

        let cli = Cli::parse_from(["teacher-assistant", "notes.txt", "--yes"]);
        assert_eq!(cli.notes_source(), NotesSource::File(PathBuf::from("notes.txt")));
        assert!(cli.yes);

        let cli = Cli::parse_from(["teacher-assistant"]);
        assert_eq!(cli.notes_source(), NotesSource::Interactive);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_json_requires_analyze_only() {
        assert!(Cli::try_parse_from(["teacher-assistant", "--example", "--json"]).is_err());
        let cli = Cli::try_parse_from(["teacher-assistant", "--example", "--analyze-only", "--json"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_analyze_only_report_serializes() {
        let notes = tools::notes_input::EXAMPLE_NOTES;
        let report = AnalyzeOnlyReport {
            analysis: analyze_notes(notes),
            complexity: analyze_complexity(notes),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["analysis"]["grade_level"], "Grade 7");
        assert_eq!(value["analysis"]["content_stats"]["has_objectives"], true);
        assert!(value["complexity"]["grade_range"].is_string());
    }

    #[test]
    fn test_example_conflicts_with_file() {
        assert!(Cli::try_parse_from(["teacher-assistant", "notes.txt", "--example"]).is_err());
    }
}
