use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use super::Tool;

pub const GENERAL_SUBJECT: &str = "General/Multi-Subject";
pub const GRADE_NOT_SPECIFIED: &str = "Not Specified (Grades 6-12 adaptable)";

/// Subject categories in tie-break order: on equal scores the earlier entry wins.
const SUBJECT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Mathematics",
        &[
            "equation", "solve", "calculate", "algebra", "geometry", "theorem", "formula",
            "graph", "function", "variable", "quadratic", "polynomial", "trigonometry",
            "calculus",
        ],
    ),
    (
        "Science",
        &[
            "experiment", "hypothesis", "cell", "atom", "chemistry", "biology", "physics",
            "photosynthesis", "molecule", "energy", "reaction", "organism", "ecosystem",
            "matter",
        ],
    ),
    (
        "English/Language Arts",
        &[
            "grammar", "writing", "literature", "essay", "poem", "reading", "paragraph",
            "sentence", "comprehension", "vocabulary", "author", "theme",
        ],
    ),
    (
        "Social Studies/History",
        &[
            "war", "revolution", "civilization", "government", "geography", "culture",
            "society", "empire", "constitution", "democracy", "economy",
        ],
    ),
    (
        "Music",
        &[
            "rhythm", "melody", "notation", "tempo", "scale", "chord", "instrument", "beat",
            "harmony", "composition",
        ],
    ),
    (
        "Art",
        &[
            "painting", "drawing", "sculpture", "color theory", "perspective", "composition",
            "medium", "texture", "artist",
        ],
    ),
    (
        "Physical Education",
        &[
            "exercise", "fitness", "sport", "movement", "health", "coordination", "athletics",
            "wellness",
        ],
    ),
    (
        "Computer Science",
        &[
            "code", "programming", "algorithm", "software", "computer", "variable", "function",
            "loop", "debug",
        ],
    ),
];

static GRADE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"grade\s*(\d+)").expect("Invalid regex: grade N"),
        Regex::new(r"(\d+)(?:st|nd|rd|th)\s+grade").expect("Invalid regex: Nth grade"),
        Regex::new(r"level[:\s]+(\d+)").expect("Invalid regex: level N"),
    ]
});

const GRADE_BUCKETS: &[(&[&str], &str)] = &[
    (&["elementary", "primary", "kindergarten"], "K-5 (Elementary)"),
    (&["middle school", "junior high"], "6-8 (Middle School)"),
    (&["high school", "secondary"], "9-12 (High School)"),
    (&["college", "university", "undergraduate"], "College/University"),
];

const DIFFICULTY_HINTS: &[(&[&str], &str)] = &[
    (
        &["basic", "introduction", "simple", "beginner"],
        "Elementary to Middle School (Est.)",
    ),
    (&["advanced", "complex", "in-depth"], "High School to College (Est.)"),
];

const INDENT_OR_BULLET: [char; 5] = [' ', '\t', '-', '•', '*'];

const KEY_CONCEPTS_CAP: usize = 10;
const OBJECTIVES_CAP: usize = 8;
const VOCABULARY_CAP: usize = 15;
const TOPICS_CAP: usize = 10;
const PRIOR_KNOWLEDGE_CAP: usize = 8;
const REAL_WORLD_CAP: usize = 8;

/// Where the line scanner stands relative to one kind of section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionState {
    Outside,
    Inside,
}

/// Markers and filters for one kind of line-oriented section.
struct SectionRule {
    markers: &'static [&'static str],
    min_chars: usize,
    cap: usize,
    /// Marker lines without a colon are items, not headers.
    inline_markers: bool,
    /// Uppercase-initial lines containing this word do not close the section.
    keeps_open: Option<&'static str>,
}

const KEY_CONCEPTS: SectionRule = SectionRule {
    markers: &["key concept", "main concept", "concepts:"],
    min_chars: 6,
    cap: KEY_CONCEPTS_CAP,
    inline_markers: false,
    keeps_open: None,
};

/// Objective items often start with a marker ("- Students will ..."), so only
/// marker lines with a colon are treated as headers.
const OBJECTIVES: SectionRule = SectionRule {
    markers: &["learning objective", "objective", "students will", "goal"],
    min_chars: 11,
    cap: OBJECTIVES_CAP,
    inline_markers: true,
    keeps_open: Some("objective"),
};

const PRIOR_KNOWLEDGE: SectionRule = SectionRule {
    markers: &["prior knowledge", "prerequisite"],
    min_chars: 6,
    cap: PRIOR_KNOWLEDGE_CAP,
    inline_markers: false,
    keeps_open: None,
};

const REAL_WORLD: SectionRule = SectionRule {
    markers: &["real-world", "real world", "application", "connection"],
    min_chars: 6,
    cap: REAL_WORLD_CAP,
    inline_markers: false,
    keeps_open: None,
};

/// Basic statistics about the raw notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub total_words: usize,
    pub total_lines: usize,
    pub has_objectives: bool,
    pub has_vocabulary: bool,
    pub has_standards: bool,
}

/// Structured information extracted from teaching notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub subject: String,
    pub grade_level: String,
    pub key_concepts: Vec<String>,
    pub learning_objectives: Vec<String>,
    pub vocabulary: Vec<String>,
    pub topics: Vec<String>,
    pub prior_knowledge: Vec<String>,
    pub real_world_connections: Vec<String>,
    pub content_stats: ContentStats,
}

impl AnalysisReport {
    /// Render the report as the text handed to agents.
    ///
    /// Sections with no entries are left out. Topics are kept in the struct
    /// but not rendered.
    pub fn render(&self) -> String {
        let mut out = String::from("=== TEACHING NOTES ANALYSIS ===\n\n");
        out.push_str(&format!("Subject Area: {}\n", self.subject));
        out.push_str(&format!("Grade Level: {}\n\n", self.grade_level));

        push_bullets(&mut out, "Key Concepts:", &self.key_concepts);
        push_bullets(&mut out, "Learning Objectives Found:", &self.learning_objectives);

        if !self.vocabulary.is_empty() {
            out.push_str(&format!("Vocabulary Terms: {}\n\n", self.vocabulary.join(", ")));
        }

        push_bullets(&mut out, "Prior Knowledge Required:", &self.prior_knowledge);
        push_bullets(&mut out, "Real-World Connections:", &self.real_world_connections);

        let stats = &self.content_stats;
        out.push_str("Content Statistics:\n");
        out.push_str(&format!("  • Total Words: {}\n", stats.total_words));
        out.push_str(&format!("  • Total Lines: {}\n", stats.total_lines));
        out.push_str(&format!("  • Has Objectives: {}\n", stats.has_objectives));
        out.push_str(&format!("  • Has Vocabulary: {}\n", stats.has_vocabulary));
        out.push_str(&format!("  • Has Standards: {}\n", stats.has_standards));

        out
    }
}

fn push_bullets(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(heading);
    out.push('\n');
    for item in items {
        out.push_str(&format!("  • {}\n", item));
    }
    out.push('\n');
}

/// Analyze teaching notes: subject, grade level, sections and statistics.
///
/// Total over every input; empty notes produce the default labels and
/// empty lists.
pub fn analyze_notes(notes: &str) -> AnalysisReport {
    let lower = notes.to_lowercase();

    AnalysisReport {
        subject: identify_subject(&lower).to_string(),
        grade_level: extract_grade_level(&lower),
        key_concepts: extract_section(notes, &KEY_CONCEPTS),
        learning_objectives: extract_section(notes, &OBJECTIVES),
        vocabulary: extract_vocabulary(notes),
        topics: extract_topics(notes),
        prior_knowledge: extract_section(notes, &PRIOR_KNOWLEDGE),
        real_world_connections: extract_section(notes, &REAL_WORLD),
        content_stats: ContentStats {
            total_words: notes.split_whitespace().count(),
            total_lines: notes.split('\n').count(),
            has_objectives: lower.contains("objective"),
            has_vocabulary: lower.contains("vocab"),
            has_standards: lower.contains("standard"),
        },
    }
}

fn identify_subject(lower: &str) -> &'static str {
    let mut best = GENERAL_SUBJECT;
    let mut best_score = 0;

    for (subject, keywords) in SUBJECT_KEYWORDS {
        let score: usize = keywords.iter().map(|kw| lower.matches(kw).count()).sum();
        if score > best_score {
            best = *subject;
            best_score = score;
        }
    }

    best
}

fn extract_grade_level(lower: &str) -> String {
    for pattern in GRADE_PATTERNS.iter() {
        if let Some(grade) = pattern.captures(lower).and_then(|c| c.get(1)) {
            return format!("Grade {}", grade.as_str());
        }
    }

    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    GRADE_BUCKETS
        .iter()
        .chain(DIFFICULTY_HINTS)
        .find(|(words, _)| contains_any(words))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| GRADE_NOT_SPECIFIED.to_string())
}

fn strip_bullet(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || c == '-' || c == '•' || c == '*')
        .trim()
}

fn closes_section(line: &str, lower: &str, rule: &SectionRule) -> bool {
    if line.starts_with(INDENT_OR_BULLET) {
        return false;
    }
    if line.contains(':') {
        return true;
    }
    let uppercase_start = line.chars().next().is_some_and(char::is_uppercase);
    match rule.keeps_open {
        Some(word) => uppercase_start && !lower.contains(word),
        None => uppercase_start,
    }
}

fn extract_section(notes: &str, rule: &SectionRule) -> Vec<String> {
    let mut state = SectionState::Outside;
    let mut items = Vec::new();

    for line in notes.split('\n') {
        let lower = line.to_lowercase();

        if rule.markers.iter().any(|m| lower.contains(m)) {
            state = SectionState::Inside;
            if !rule.inline_markers || line.contains(':') {
                continue;
            }
        }

        if state == SectionState::Outside || line.trim().is_empty() {
            continue;
        }

        if closes_section(line, &lower, rule) {
            state = SectionState::Outside;
            continue;
        }

        let item = strip_bullet(line);
        if item.chars().count() >= rule.min_chars {
            items.push(item.to_string());
        }
    }

    items.truncate(rule.cap);
    items
}

fn extract_vocabulary(notes: &str) -> Vec<String> {
    let mut vocab = Vec::new();

    for line in notes.split('\n') {
        let lower = line.to_lowercase();
        if !(lower.contains("vocab") || lower.contains("terms")) {
            continue;
        }
        if let Some((_, terms)) = line.split_once(':') {
            vocab.extend(
                terms
                    .split([',', ';'])
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            );
        }
    }

    vocab.truncate(VOCABULARY_CAP);
    vocab
}

fn extract_topics(notes: &str) -> Vec<String> {
    let mut topics = Vec::new();

    for line in notes.split('\n') {
        let trimmed = line.trim();
        let Some(first) = trimmed.chars().next() else {
            continue;
        };
        if !(first.is_ascii_digit() || matches!(first, '-' | '•' | '*')) {
            continue;
        }

        let topic = trimmed.trim_start_matches(|c: char| {
            c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ')' | '-' | '•' | '*')
        });
        let len = topic.chars().count();
        if len > 5 && len < 100 {
            topics.push(topic.to_string());
        }
    }

    topics.truncate(TOPICS_CAP);
    topics
}

/// Agent tool exposing [`analyze_notes`] as rendered text.
pub struct NotesAnalysisTool;

impl NotesAnalysisTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Tool for NotesAnalysisTool {
    type Input = String;
    type Output = String;

    fn name(&self) -> &str {
        "notes_analyzer"
    }

    async fn run(&self, notes: String) -> Result<String> {
        let report = analyze_notes(&notes);
        log::info!(
            "NotesAnalyzer: subject={}, grade={}, {} concept(s), {} objective(s)",
            report.subject,
            report.grade_level,
            report.key_concepts.len(),
            report.learning_objectives.len()
        );
        Ok(report.render())
    }
}
