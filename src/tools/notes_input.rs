use anyhow::Result;
use std::io::{self, BufRead};
use std::path::PathBuf;
use thiserror::Error;
use super::Tool;

/// Built-in notes used by `--example`.
pub const EXAMPLE_NOTES: &str = "
Topic: Introduction to Photosynthesis

Grade Level: 7th Grade Life Science

Key Concepts:
- Photosynthesis is the process plants use to convert light energy into chemical energy
- Chemical equation: 6CO2 + 6H2O + light energy → C6H12O6 + 6O2
- Takes place in chloroplasts, specifically in chlorophyll
- Two main stages: light-dependent reactions and light-independent reactions (Calvin Cycle)
- Light-dependent reactions occur in thylakoid membranes
- Calvin Cycle occurs in the stroma
- Factors affecting photosynthesis: light intensity, CO2 concentration, temperature

Learning Objectives:
- Students will explain the process of photosynthesis
- Students will identify the reactants and products
- Students will describe the role of chlorophyll and chloroplasts
- Students will analyze how environmental factors affect photosynthesis rates

Prior Knowledge:
- Basic cell structure (organelles)
- Chemical equations basics
- Understanding of energy concepts
- Plant cell anatomy

Real-World Connections:
- Food production and agriculture
- Oxygen in Earth's atmosphere
- Climate change and carbon cycle
- Renewable energy and biomass
";

const PREVIEW_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum NotesInputError {
    #[error("file '{}' not found", .0.display())]
    NotFound(PathBuf),
    #[error("file '{}' is empty", .0.display())]
    Empty(PathBuf),
    #[error("could not read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not read notes from stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("no notes provided")]
    NoNotes,
}

/// Where the teaching notes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesSource {
    Example,
    File(PathBuf),
    Interactive,
}

/// Collects teaching notes from a file, stdin or the built-in example.
pub struct NotesReader;

impl NotesReader {
    pub fn new() -> Self {
        Self
    }

    fn read_file(path: PathBuf) -> Result<String, NotesInputError> {
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(NotesInputError::NotFound(path))
            }
            Err(source) => return Err(NotesInputError::Read { path, source }),
        };

        if content.trim().is_empty() {
            return Err(NotesInputError::Empty(path));
        }

        Ok(content)
    }
}

/// Read notes line by line until two consecutive blank lines or end of input.
pub fn read_interactive<R: BufRead>(reader: R) -> Result<String, NotesInputError> {
    let mut lines = Vec::new();
    let mut blank_run = 0;

    for line in reader.lines() {
        let line = line.map_err(NotesInputError::Stdin)?;
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run >= 2 {
                break;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    let notes = lines.join("\n").trim().to_string();
    if notes.is_empty() {
        return Err(NotesInputError::NoNotes);
    }

    Ok(notes)
}

/// First 300 characters of the notes, with "..." appended when cut.
pub fn preview(notes: &str) -> String {
    if notes.chars().count() > PREVIEW_CHARS {
        let head: String = notes.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        notes.to_string()
    }
}

#[async_trait::async_trait]
impl Tool for NotesReader {
    type Input = NotesSource;
    type Output = String;

    fn name(&self) -> &str {
        "notes_reader"
    }

    async fn run(&self, source: NotesSource) -> Result<String> {
        let notes = match source {
            NotesSource::Example => {
                log::info!("NotesReader: using built-in example notes");
                EXAMPLE_NOTES.to_string()
            }
            NotesSource::File(path) => {
                log::info!("NotesReader: reading notes from {}", path.display());
                Self::read_file(path)?
            }
            NotesSource::Interactive => {
                log::info!("NotesReader: reading notes from stdin");
                tokio::task::spawn_blocking(|| read_interactive(io::stdin().lock())).await??
            }
        };

        log::info!(
            "NotesReader: loaded {} characters ({} words)",
            notes.chars().count(),
            notes.split_whitespace().count()
        );
        Ok(notes)
    }
}
