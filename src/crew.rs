use anyhow::{Context, Result};

use crate::config::Config;
use crate::ollama::{ChatModel, ChatRequest};
use crate::tools::{GradeLevelAnalyzer, NotesAnalysisTool, Tool};

/// Tools an agent may consult before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTool {
    NotesAnalyzer,
    GradeAnalyzer,
}

/// Persona of one crew member.
#[derive(Debug)]
pub struct AgentSpec {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub tools: &'static [AgentTool],
}

/// A unit of work assigned to one agent.
#[derive(Debug)]
pub struct TaskSpec {
    pub name: &'static str,
    pub heading: &'static str,
    pub description: &'static str,
    pub expected_output: &'static str,
    pub agent: &'static AgentSpec,
    /// Earlier tasks whose output is passed along as context.
    pub context: &'static [&'static str],
}

pub static LESSON_PLAN_AGENT: AgentSpec = AgentSpec {
    role: "Lesson Plan Architect",
    goal: "Turn a teacher's rough notes into a complete, classroom-ready lesson plan \
           with clear objectives, pacing and activities",
    backstory: "You are a veteran curriculum designer who has written hundreds of \
                standards-aligned lesson plans. You know how to sequence content so that \
                students build understanding step by step, and you always match the \
                material to the grade level in front of you.",
    tools: &[AgentTool::NotesAnalyzer, AgentTool::GradeAnalyzer],
};

pub static QUIZ_GENERATOR_AGENT: AgentSpec = AgentSpec {
    role: "Assessment Quiz Generator",
    goal: "Write a fair, varied quiz that checks whether students met the lesson's \
           learning objectives",
    backstory: "You are an assessment specialist. You write multiple-choice, short-answer \
                and application questions that measure understanding rather than recall, \
                and you always provide a complete answer key.",
    tools: &[],
};

pub static TEACHING_STRATEGY_AGENT: AgentSpec = AgentSpec {
    role: "Teaching Strategy Advisor",
    goal: "Give the teacher practical strategies to deliver the lesson, differentiate \
           for all learners and handle common misconceptions",
    backstory: "You are an instructional coach with years of classroom experience. You \
                help teachers plan engagement hooks, scaffolds, differentiation and \
                formative checks that work in real classrooms.",
    tools: &[AgentTool::NotesAnalyzer],
};

/// Tasks in execution order.
pub static TASKS: [TaskSpec; 3] = [
    TaskSpec {
        name: "generate_lesson_plan",
        heading: "LESSON PLAN",
        description: "Create a comprehensive lesson plan from the teacher's notes. Use the \
                      tool analysis to pin down subject, grade level and key concepts. \
                      Include learning objectives, required materials, an opening hook, \
                      direct instruction, guided and independent practice, a closure \
                      activity and an approximate time for each part.",
        expected_output: "A structured lesson plan with headed sections for objectives, \
                          materials, each lesson phase with timing, and closure.",
        agent: &LESSON_PLAN_AGENT,
        context: &[],
    },
    TaskSpec {
        name: "generate_quiz",
        heading: "ASSESSMENT QUIZ",
        description: "Write an assessment quiz for the lesson plan. Include 5 multiple-choice \
                      questions, 3 short-answer questions and 1 real-world application \
                      question, each tied to a learning objective.",
        expected_output: "A numbered quiz followed by a complete answer key with brief \
                          explanations.",
        agent: &QUIZ_GENERATOR_AGENT,
        context: &["generate_lesson_plan"],
    },
    TaskSpec {
        name: "generate_teaching_suggestions",
        heading: "TEACHING STRATEGIES & SUGGESTIONS",
        description: "Using the lesson plan and quiz, suggest how to teach this lesson well: \
                      engagement strategies, differentiation for struggling and advanced \
                      learners, common misconceptions and how to address them, formative \
                      assessment checkpoints and extension ideas.",
        expected_output: "Organized teaching suggestions with a section per strategy area.",
        agent: &TEACHING_STRATEGY_AGENT,
        context: &["generate_lesson_plan", "generate_quiz"],
    },
];

/// Output of a single task.
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub task: &'static str,
    pub heading: &'static str,
    pub agent: &'static str,
    pub content: String,
}

/// Everything the crew produced, in task order.
#[derive(Debug, Clone)]
pub struct CrewResult {
    pub outputs: Vec<TaskOutput>,
}

impl CrewResult {
    /// Concatenate the task outputs under their headings.
    pub fn to_text(&self) -> String {
        self.outputs
            .iter()
            .map(|o| format!("## {}\n\n{}", o.heading, o.content.trim()))
            .collect::<Vec<_>>()
            .join(&format!("\n\n{}\n\n", "-".repeat(80)))
    }
}

/// Sequential three-agent crew that turns notes into teaching materials.
pub struct TeacherAssistantCrew<M: ChatModel> {
    model: M,
    notes_analyzer: NotesAnalysisTool,
    grade_analyzer: GradeLevelAnalyzer,
    temperature: f32,
    top_p: f32,
    verbose: bool,
}

impl<M: ChatModel> TeacherAssistantCrew<M> {
    pub fn new(model: M, config: &Config) -> Self {
        Self {
            model,
            notes_analyzer: NotesAnalysisTool::new(),
            grade_analyzer: GradeLevelAnalyzer::new(),
            temperature: config.ai_model.temperature,
            top_p: config.ai_model.top_p,
            verbose: config.crew.verbose,
        }
    }

    /// Run every task in order, feeding earlier outputs forward as context.
    pub async fn kickoff(&self, notes: &str) -> Result<CrewResult> {
        log::info!(
            "Crew: starting {} task(s) with model {}",
            TASKS.len(),
            self.model.model_name()
        );

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(TASKS.len());

        for (step, task) in TASKS.iter().enumerate() {
            log::info!(
                "Crew: Step {} - {} ({})",
                step + 1,
                task.name,
                task.agent.role
            );

            let tool_results = self.run_tools(task.agent.tools, notes).await;
            let context: Vec<&TaskOutput> = task
                .context
                .iter()
                .filter_map(|name| outputs.iter().find(|o| o.task == *name))
                .collect();

            let content = self
                .model
                .chat(ChatRequest {
                    system_prompt: build_system_prompt(task.agent),
                    user_prompt: build_user_prompt(task, notes, &tool_results, &context),
                    temperature: self.temperature,
                    top_p: self.top_p,
                })
                .await
                .with_context(|| format!("Crew: task '{}' failed", task.name))?;

            log::info!("Crew: Step {} - {} chars from {}", step + 1, content.len(), task.agent.role);

            if self.verbose {
                println!("\n# {}\n\n{}\n", task.agent.role, content.trim());
            }

            outputs.push(TaskOutput {
                task: task.name,
                heading: task.heading,
                agent: task.agent.role,
                content,
            });
        }

        Ok(CrewResult { outputs })
    }

    /// Run the agent's tools on the notes; a failing tool is logged and skipped.
    async fn run_tools(&self, tools: &[AgentTool], notes: &str) -> Vec<(String, String)> {
        let mut results = Vec::new();

        for tool in tools {
            let (name, result) = match tool {
                AgentTool::NotesAnalyzer => (
                    self.notes_analyzer.name().to_string(),
                    self.notes_analyzer.run(notes.to_string()).await,
                ),
                AgentTool::GradeAnalyzer => (
                    self.grade_analyzer.name().to_string(),
                    self.grade_analyzer.run(notes.to_string()).await,
                ),
            };

            match result {
                Ok(text) => results.push((name, text)),
                Err(e) => log::warn!("Crew: tool {} failed, continuing without it: {}", name, e),
            }
        }

        results
    }
}

fn build_system_prompt(agent: &AgentSpec) -> String {
    format!(
        "You are the {}.\n\nYour goal: {}\n\nBackground: {}\n\n\
        Write in clear, well-organized plain text that a teacher can use directly.",
        agent.role, agent.goal, agent.backstory
    )
}

fn build_user_prompt(
    task: &TaskSpec,
    notes: &str,
    tool_results: &[(String, String)],
    context: &[&TaskOutput],
) -> String {
    let mut prompt = String::new();

    prompt.push_str("## TEACHER'S NOTES\n\n---\n");
    prompt.push_str(notes.trim());
    prompt.push_str("\n---\n\n");

    for (name, text) in tool_results {
        prompt.push_str(&format!("## TOOL RESULT: {}\n\n{}\n", name, text));
    }

    for output in context {
        prompt.push_str(&format!(
            "## CONTEXT FROM {} ({})\n\n{}\n\n",
            output.heading, output.agent, output.content.trim()
        ));
    }

    prompt.push_str(&format!("## TASK\n\n{}\n\n", task.description));
    prompt.push_str(&format!("## EXPECTED OUTPUT\n\n{}\n", task.expected_output));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a fixed script and records every request.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, String>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(e)) => Err(anyhow::anyhow!(e)),
                None => Err(anyhow::anyhow!("script exhausted")),
            }
        }
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.crew.verbose = false;
        config
    }

    const NOTES: &str = "Topic: Fractions\nGrade: 4th Grade\nKey Concepts:\n- Parts of a whole";

    #[tokio::test]
    async fn test_kickoff_runs_tasks_in_order() {
        let model = ScriptedModel::new(vec![Ok("PLAN"), Ok("QUIZ"), Ok("TIPS")]);
        let crew = TeacherAssistantCrew::new(model, &quiet_config());

        let result = crew.kickoff(NOTES).await.unwrap();
        let tasks: Vec<&str> = result.outputs.iter().map(|o| o.task).collect();
        assert_eq!(
            tasks,
            vec!["generate_lesson_plan", "generate_quiz", "generate_teaching_suggestions"]
        );
        assert_eq!(result.outputs[2].content, "TIPS");
    }

    #[tokio::test]
    async fn test_prompts_carry_tools_and_context() {
        let model = ScriptedModel::new(vec![Ok("PLAN"), Ok("QUIZ"), Ok("TIPS")]);
        let crew = TeacherAssistantCrew::new(model, &quiet_config());
        crew.kickoff(NOTES).await.unwrap();

        let requests = crew.model.requests();
        assert_eq!(requests.len(), 3);

        // Lesson planner: both tools, no context
        assert!(requests[0].system_prompt.contains("Lesson Plan Architect"));
        assert!(requests[0].user_prompt.contains("=== TEACHING NOTES ANALYSIS ==="));
        assert!(requests[0].user_prompt.contains("Grade Level: Grade 4"));
        assert!(requests[0].user_prompt.contains("Content Complexity Analysis:"));
        assert!(!requests[0].user_prompt.contains("CONTEXT FROM"));

        // Quiz generator: no tools, lesson plan as context
        assert!(!requests[1].user_prompt.contains("TOOL RESULT"));
        assert!(requests[1]
            .user_prompt
            .contains("## CONTEXT FROM LESSON PLAN (Lesson Plan Architect)\n\nPLAN\n"));

        // Strategy advisor: notes analyzer only, plan and quiz as context
        assert!(requests[2].user_prompt.contains("TOOL RESULT: notes_analyzer"));
        assert!(!requests[2].user_prompt.contains("grade_level_analyzer"));
        assert!(requests[2].user_prompt.contains("CONTEXT FROM LESSON PLAN"));
        assert!(requests[2]
            .user_prompt
            .contains("## CONTEXT FROM ASSESSMENT QUIZ (Assessment Quiz Generator)\n\nQUIZ\n"));
    }

    #[tokio::test]
    async fn test_failed_task_stops_the_crew() {
        let model = ScriptedModel::new(vec![Ok("PLAN"), Err("connection refused")]);
        let crew = TeacherAssistantCrew::new(model, &quiet_config());

        let err = crew.kickoff(NOTES).await.unwrap_err();
        assert!(format!("{:#}", err).contains("generate_quiz"));
        assert_eq!(crew.model.requests().len(), 2);
    }

    #[test]
    fn test_to_text_concatenates_sections() {
        let result = CrewResult {
            outputs: vec![
                TaskOutput {
                    task: "generate_lesson_plan",
                    heading: "LESSON PLAN",
                    agent: "Lesson Plan Architect",
                    content: "Plan body\n".to_string(),
                },
                TaskOutput {
                    task: "generate_quiz",
                    heading: "ASSESSMENT QUIZ",
                    agent: "Assessment Quiz Generator",
                    content: "Quiz body".to_string(),
                },
            ],
        };

        let text = result.to_text();
        assert!(text.starts_with("## LESSON PLAN\n\nPlan body\n\n"));
        assert!(text.ends_with("## ASSESSMENT QUIZ\n\nQuiz body"));
    }

    #[test]
    fn test_task_context_refers_to_earlier_tasks() {
        for (i, task) in TASKS.iter().enumerate() {
            for name in task.context {
                let pos = TASKS.iter().position(|t| t.name == *name).unwrap();
                assert!(pos < i, "{} depends on later task {}", task.name, name);
            }
        }
    }
}
