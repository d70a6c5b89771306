//! # Agent Definitions
//!
//! The three personas of the article crew. Each is plain data: the engine
//! turns a persona into system instructions once the topic is bound.

use serde::{Deserialize, Serialize};

use crate::template::Template;
use crate::topic::Topic;

/// Role configuration for one crew member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaDescriptor {
    /// Stable identifier used in events (`planner`, `writer`, `editor`)
    pub id: String,
    pub role: String,
    pub goal: Template,
    pub backstory: Template,
    /// Always false: work never leaves the fixed task order
    pub allow_delegation: bool,
    pub verbose: bool,
}

/// A persona with the topic substituted into its templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundPersona {
    pub id: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub allow_delegation: bool,
}

impl PersonaDescriptor {
    pub fn bind(&self, topic: &Topic) -> BoundPersona {
        BoundPersona {
            id: self.id.clone(),
            role: self.role.clone(),
            goal: self.goal.bind(topic),
            backstory: self.backstory.bind(topic),
            allow_delegation: self.allow_delegation,
        }
    }
}

impl BoundPersona {
    /// System instructions handed to the model for this persona.
    pub fn system_instructions(&self) -> String {
        format!(
            "You are {role}.\n\nYour goal: {goal}\n\n{backstory}\n\n\
             Work alone: do not delegate or ask other agents for help. \
             Respond with your finished work only.",
            role = self.role,
            goal = self.goal,
            backstory = self.backstory,
        )
    }
}

/// The Content Planner
///
/// First crew member. Researches the topic and produces the outline.
pub fn planner_agent() -> PersonaDescriptor {
    PersonaDescriptor {
        id: "planner".to_string(),
        role: "Content Planner".to_string(),
        goal: Template::new("Plan engaging and factually accurate content on {topic}"),
        backstory: Template::new(
            "You are an expert Content Planner with years of experience in research, content \
             strategy, and audience analysis. You break complex topics into digestible, engaging \
             content structures that resonate with their readers. When working on the topic: \
             {topic}, you research credible sources, identify key insights and actionable \
             takeaways, structure the information logically, consider what the audience already \
             knows and cares about, and hand well-organised research to the Content Writer. Your \
             plan is the foundation of an informative article that helps readers make informed \
             decisions.",
        ),
        allow_delegation: false,
        verbose: true,
    }
}

/// The Content Writer
///
/// Second crew member. Turns the plan into a draft article.
pub fn writer_agent() -> PersonaDescriptor {
    PersonaDescriptor {
        id: "writer".to_string(),
        role: "Content Writer".to_string(),
        goal: Template::new(
            "Write insightful and factually accurate opinion piece about the topic: {topic}",
        ),
        backstory: Template::new(
            "You are a skilled Content Writer who crafts compelling opinion pieces while keeping \
             journalistic integrity. Your style is clear, persuasive, and backed by solid \
             research. When working on the topic: {topic}, you build on the Content Planner's \
             research, outline, and strategic direction. You turn complex information into \
             accessible narratives, balance factual reporting with thoughtful analysis, and \
             clearly separate objective facts from opinion. Your arguments are well reasoned and \
             add a perspective the reader did not have before.",
        ),
        allow_delegation: false,
        verbose: true,
    }
}

/// The Editor
///
/// Final crew member. Polishes the draft into the published article.
pub fn editor_agent() -> PersonaDescriptor {
    PersonaDescriptor {
        id: "editor".to_string(),
        role: "Editor".to_string(),
        goal: Template::new(
            "Edit a given blog post to align with the writing style of the organization",
        ),
        backstory: Template::new(
            "You are a senior editor with extensive experience in content quality assurance, \
             fact-checking, and editorial standards across journalism, content marketing, and \
             digital publishing. Reviewing a post on {topic} from the Content Writer, you verify \
             factual claims, check logical flow and coherence, ensure sources are attributed, and \
             keep tone and style consistent. You improve readability while preserving the \
             writer's voice, balancing integrity with audience engagement.",
        ),
        allow_delegation: false,
        verbose: true,
    }
}

/// The crew's personas in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Personas {
    pub planner: PersonaDescriptor,
    pub writer: PersonaDescriptor,
    pub editor: PersonaDescriptor,
}

impl Personas {
    /// Planner, Writer, Editor
    pub fn in_order(&self) -> [&PersonaDescriptor; 3] {
        [&self.planner, &self.writer, &self.editor]
    }
}

/// Create the full crew. Deterministic; templates stay unbound.
pub fn create_personas() -> Personas {
    Personas {
        planner: planner_agent(),
        writer: writer_agent(),
        editor: editor_agent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::has_unbound_placeholder;

    #[test]
    fn test_registry_is_deterministic() {
        assert_eq!(create_personas(), create_personas());
    }

    #[test]
    fn test_pipeline_order() {
        let personas = create_personas();
        let roles: Vec<&str> = personas.in_order().iter().map(|p| p.role.as_str()).collect();
        assert_eq!(roles, vec!["Content Planner", "Content Writer", "Editor"]);
    }

    #[test]
    fn test_delegation_disabled() {
        for persona in create_personas().in_order() {
            assert!(!persona.allow_delegation, "{} may not delegate", persona.id);
        }
    }

    #[test]
    fn test_templates_unbound_until_run() {
        let planner = planner_agent();
        assert!(planner.goal.raw().contains("{topic}"));
        assert!(planner.backstory.raw().contains("{topic}"));
    }

    #[test]
    fn test_bind_substitutes_topic() {
        let topic = Topic::parse("Remote Work Culture").unwrap();
        for persona in create_personas().in_order() {
            let bound = persona.bind(&topic);
            assert!(!has_unbound_placeholder(&bound.goal));
            assert!(!has_unbound_placeholder(&bound.backstory));
            assert!(bound.system_instructions().contains(&persona.role));
        }
        let bound = planner_agent().bind(&topic);
        assert!(bound.goal.contains("Remote Work Culture"));
    }
}
