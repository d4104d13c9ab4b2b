pub mod grade_analyzer;
pub mod notes_analyzer;
pub mod notes_input;
pub mod results_writer;

pub use grade_analyzer::GradeLevelAnalyzer;
pub use notes_analyzer::NotesAnalysisTool;
pub use notes_input::{NotesReader, NotesSource};
pub use results_writer::ResultsWriter;

use anyhow::Result;

/// Tool trait for crew-orchestrated operations.
///
/// Not object-safe (associated types). The crew calls tools by concrete
/// type, not `dyn Tool`.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    type Input: Send;
    type Output: Send;

    fn name(&self) -> &str;
    async fn run(&self, input: Self::Input) -> Result<Self::Output>;
}
