use anyhow::Result;
use serde::Serialize;
use std::fmt;
use super::Tool;

/// Coarse schooling stage suggested by text complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeRange {
    Elementary,
    MiddleSchool,
    HighSchoolPlus,
}

impl GradeRange {
    pub fn label(&self) -> &'static str {
        match self {
            GradeRange::Elementary => "Elementary (K-5)",
            GradeRange::MiddleSchool => "Middle School (6-8)",
            GradeRange::HighSchoolPlus => "High School+ (9-12+)",
        }
    }
}

impl fmt::Display for GradeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComplexityLevel::Low => "Low",
            ComplexityLevel::Medium => "Medium",
            ComplexityLevel::High => "High",
        };
        f.write_str(label)
    }
}

/// Readability figures for a block of notes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityReport {
    pub grade_range: GradeRange,
    pub complexity_level: ComplexityLevel,
    pub avg_word_length: f64,
    pub avg_sentence_length: f64,
}

impl ComplexityReport {
    pub fn render(&self) -> String {
        format!(
            "Content Complexity Analysis:\n  \
            • Suggested Grade Range: {}\n  \
            • Complexity Level: {}\n  \
            • Average Word Length: {:.1} characters\n  \
            • Average Sentence Length: {:.1} words\n",
            self.grade_range, self.complexity_level, self.avg_word_length, self.avg_sentence_length
        )
    }
}

/// Score notes by average word and sentence length.
///
/// Sentences are the pieces of a split on every `.`, so a trailing period
/// adds an empty piece and lowers the sentence average. The grade brackets
/// are tuned against exactly that arithmetic.
pub fn analyze_complexity(notes: &str) -> ComplexityReport {
    let words: Vec<&str> = notes.split_whitespace().collect();
    let sentence_count = notes.split('.').count();

    let avg_word_length = if words.is_empty() {
        0.0
    } else {
        let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();
        total_chars as f64 / words.len() as f64
    };

    let avg_sentence_length = if sentence_count == 0 {
        0.0
    } else {
        words.len() as f64 / sentence_count as f64
    };

    let (grade_range, complexity_level) = if avg_word_length < 4.5 && avg_sentence_length < 10.0 {
        (GradeRange::Elementary, ComplexityLevel::Low)
    } else if avg_word_length < 5.5 && avg_sentence_length < 15.0 {
        (GradeRange::MiddleSchool, ComplexityLevel::Medium)
    } else {
        (GradeRange::HighSchoolPlus, ComplexityLevel::High)
    };

    ComplexityReport {
        grade_range,
        complexity_level,
        avg_word_length,
        avg_sentence_length,
    }
}

/// Agent tool exposing [`analyze_complexity`] as rendered text.
pub struct GradeLevelAnalyzer;

impl GradeLevelAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Tool for GradeLevelAnalyzer {
    type Input = String;
    type Output = String;

    fn name(&self) -> &str {
        "grade_level_analyzer"
    }

    async fn run(&self, notes: String) -> Result<String> {
        let report = analyze_complexity(&notes);
        log::info!(
            "GradeLevelAnalyzer: {} / {} (word {:.1}, sentence {:.1})",
            report.grade_range,
            report.complexity_level,
            report.avg_word_length,
            report.avg_sentence_length
        );
        Ok(report.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sentence_is_elementary() {
        let report = analyze_complexity("The cat sat.");
        assert!((report.avg_word_length - 10.0 / 3.0).abs() < 1e-9);
        // "The cat sat" and the empty piece after the period
        assert_eq!(report.avg_sentence_length, 1.5);
        assert_eq!(report.grade_range, GradeRange::Elementary);
        assert_eq!(report.complexity_level, ComplexityLevel::Low);
    }

    #[test]
    fn test_empty_notes_have_zero_averages() {
        let report = analyze_complexity("");
        assert_eq!(report.avg_word_length, 0.0);
        assert_eq!(report.avg_sentence_length, 0.0);
        assert_eq!(report.grade_range, GradeRange::Elementary);
    }

    #[test]
    fn test_middle_school_bracket() {
        let notes = vec!["house"; 12].join(" ");
        let report = analyze_complexity(&notes);
        assert_eq!(report.avg_word_length, 5.0);
        assert_eq!(report.avg_sentence_length, 12.0);
        assert_eq!(report.grade_range, GradeRange::MiddleSchool);
        assert_eq!(report.complexity_level, ComplexityLevel::Medium);
    }

    #[test]
    fn test_both_conditions_must_hold() {
        // Tiny words, but one very long sentence
        let notes = vec!["a"; 20].join(" ");
        let report = analyze_complexity(&notes);
        assert_eq!(report.avg_word_length, 1.0);
        assert_eq!(report.grade_range, GradeRange::HighSchoolPlus);
        assert_eq!(report.complexity_level, ComplexityLevel::High);
    }

    #[test]
    fn test_long_words_are_high() {
        let report = analyze_complexity("extraordinary. photosynthesis. chlorophyll.");
        assert_eq!(report.grade_range, GradeRange::HighSchoolPlus);
    }

    #[test]
    fn test_render_format() {
        let text = analyze_complexity("The cat sat.").render();
        assert_eq!(
            text,
            "Content Complexity Analysis:\n  \
            • Suggested Grade Range: Elementary (K-5)\n  \
            • Complexity Level: Low\n  \
            • Average Word Length: 3.3 characters\n  \
            • Average Sentence Length: 1.5 words\n"
        );
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let notes = "Photosynthesis converts light energy. Plants need water.";
        assert_eq!(analyze_complexity(notes), analyze_complexity(notes));
    }

    #[tokio::test]
    async fn test_tool_returns_rendered_report() {
        let tool = GradeLevelAnalyzer::new();
        assert_eq!(tool.name(), "grade_level_analyzer");
        let text = tool.run(String::new()).await.unwrap();
        assert!(text.contains("Average Word Length: 0.0 characters"));
    }
}
