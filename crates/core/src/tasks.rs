//! # Task Definitions
//!
//! Plan → Write → Edit. Each task names the task whose output it consumes;
//! the engine runs them in that order.

use serde::{Deserialize, Serialize};

use crate::agents::{BoundPersona, PersonaDescriptor};
use crate::template::Template;
use crate::topic::Topic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    Plan,
    Write,
    Edit,
}

impl TaskId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Plan => "plan",
            TaskId::Write => "write",
            TaskId::Edit => "edit",
        }
    }
}

/// Instructions for one persona, with the task whose output feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: TaskId,
    pub description: Template,
    pub expected_output: String,
    pub agent: PersonaDescriptor,
    /// Predecessor whose output is this task's input
    pub context: Option<TaskId>,
}

/// A task ready for the engine: topic substituted everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundTask {
    pub id: TaskId,
    pub description: String,
    pub expected_output: String,
    pub agent: BoundPersona,
    pub context: Option<TaskId>,
}

impl TaskDescriptor {
    pub fn bind(&self, topic: &Topic) -> BoundTask {
        BoundTask {
            id: self.id,
            description: self.description.bind(topic),
            expected_output: self.expected_output.clone(),
            agent: self.agent.bind(topic),
            context: self.context,
        }
    }
}

impl BoundTask {
    /// The user turn sent to the model. `context` is the predecessor's output.
    pub fn prompt(&self, context: Option<&str>) -> String {
        let mut prompt = format!(
            "Task:\n{}\n\nExpected output:\n{}",
            self.description, self.expected_output
        );
        if let Some(previous) = context {
            prompt.push_str("\n\nContext from the previous task:\n");
            prompt.push_str(previous);
        }
        prompt
    }
}

pub fn plan_task(planner: &PersonaDescriptor) -> TaskDescriptor {
    TaskDescriptor {
        id: TaskId::Plan,
        description: Template::new(
            "1. Prioritize the latest trends, key players, and noteworthy news on {topic}.\n\
             2. Identify the target audience, considering their interests and pain points.\n\
             3. Develop a detailed content outline including the introduction, key points, and a call to action.\n\
             4. Include SEO keywords and relevant data or sources.",
        ),
        expected_output: "A comprehensive content plan document with an outline, audience \
                          analysis, SEO keywords, and relevant data or sources"
            .to_string(),
        agent: planner.clone(),
        context: None,
    }
}

pub fn write_task(writer: &PersonaDescriptor) -> TaskDescriptor {
    TaskDescriptor {
        id: TaskId::Write,
        description: Template::new(
            "1. Use the content plan to craft a compelling blog post on {topic}.\n\
             2. Incorporate SEO keywords naturally.\n\
             3. Sections/Subtitles are properly named in an engaging manner.\n\
             4. Ensure the post is structured with an engaging introduction, insightful body, and summarizing conclusion.\n\
             5. Proofread for grammatical errors and alignment with the brand's voice.",
        ),
        expected_output: "A well-written blog post in markdown format, ready for publication, \
                          each section is properly formatted having 2 to 3 paragraphs with \
                          headings and subheadings."
            .to_string(),
        agent: writer.clone(),
        context: Some(TaskId::Plan),
    }
}

pub fn edit_task(editor: &PersonaDescriptor) -> TaskDescriptor {
    TaskDescriptor {
        id: TaskId::Edit,
        description: Template::new(
            "Proofread the blog post on {topic} for grammatical errors, punctuation, and formatting issues.\n\
             Ensure the post is aligned with the brand's voice and tone.\n\
             Check for consistency in style, tone, and structure.\n\
             Return the corrected post in markdown.",
        ),
        expected_output: "A well-edited blog post with no grammatical errors, punctuation \
                          issues, and formatting inconsistencies."
            .to_string(),
        agent: editor.clone(),
        context: Some(TaskId::Write),
    }
}

/// The crew's tasks in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tasks {
    pub plan: TaskDescriptor,
    pub write: TaskDescriptor,
    pub edit: TaskDescriptor,
}

impl Tasks {
    pub fn in_order(&self) -> [&TaskDescriptor; 3] {
        [&self.plan, &self.write, &self.edit]
    }
}

pub fn create_tasks(
    planner: &PersonaDescriptor,
    writer: &PersonaDescriptor,
    editor: &PersonaDescriptor,
) -> Tasks {
    Tasks {
        plan: plan_task(planner),
        write: write_task(writer),
        edit: edit_task(editor),
    }
}
