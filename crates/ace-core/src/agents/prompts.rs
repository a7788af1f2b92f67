//! Prompt construction for the three roles.
//!
//! The playbook reaches every role only through its rendering. Environments
//! with their own vocabulary can supply a custom [`PromptSet`].

use ace_abstraction::ChatMessage;

/// Inputs for a Generator prompt.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext<'a> {
    /// Rendered playbook.
    pub playbook: &'a str,
    /// Reflection carried over from the previous episode.
    pub reflection: Option<&'a str>,
    /// Current environment state.
    pub state: &'a str,
}

/// Inputs for a Reflector prompt.
#[derive(Debug, Clone, Copy)]
pub struct ReflectorContext<'a> {
    /// Rendered playbook.
    pub playbook: &'a str,
    /// Rendered trajectory.
    pub trajectory: &'a str,
}

/// Inputs for a Curator prompt.
#[derive(Debug, Clone, Copy)]
pub struct CuratorContext<'a> {
    /// Rendered playbook, after this episode's tags were applied.
    pub playbook: &'a str,
    /// Rendered trajectory.
    pub trajectory: &'a str,
    /// The Reflector's output for this episode.
    pub reflection: &'a str,
}

/// Builds the messages each role sends.
pub trait PromptSet: Send + Sync {
    /// Messages opening a Generator episode.
    fn generator_messages(&self, ctx: &GeneratorContext<'_>) -> Vec<ChatMessage>;

    /// Messages asking the Reflector for a verdict.
    fn reflector_messages(&self, ctx: &ReflectorContext<'_>) -> Vec<ChatMessage>;

    /// Messages asking the Curator to update the playbook.
    fn curator_messages(&self, ctx: &CuratorContext<'_>) -> Vec<ChatMessage>;
}

/// Environment-agnostic prompts parameterised by a task description.
#[derive(Debug, Clone)]
pub struct DefaultPrompts {
    task: String,
}

impl Default for DefaultPrompts {
    fn default() -> Self {
        Self::new("Reach the goal state using the provided tools.")
    }
}

impl DefaultPrompts {
    /// Creates prompts for `task`.
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }

    /// The task description.
    pub fn task(&self) -> &str {
        &self.task
    }
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() { placeholder } else { text }
}

impl PromptSet for DefaultPrompts {
    fn generator_messages(&self, ctx: &GeneratorContext<'_>) -> Vec<ChatMessage> {
        let system = format!(
            "You are a multi-turn agent acting in an environment through tools.\n\
             Task: {task}\n\n\
             Each turn: read the current state, consult the playbook and the reflection, \
             reason briefly, then call exactly ONE tool. The environment answers with the \
             new state, the reward and whether the task is terminated.\n\
             Never call more than one tool per turn and never call a tool that is not offered.\n\n\
             PLAYBOOK_BEGIN\n{playbook}\nPLAYBOOK_END\n\n\
             REFLECTION_BEGIN\n{reflection}\nREFLECTION_END",
            task = self.task,
            playbook = or_placeholder(ctx.playbook, "No playbook entries yet."),
            reflection = ctx.reflection.map_or("No prior reflection.", |r| or_placeholder(r, "No prior reflection.")),
        );
        let user = format!("STATE_BEGIN\n{}\nSTATE_END", or_placeholder(ctx.state, "State unavailable."));
        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }

    fn reflector_messages(&self, ctx: &ReflectorContext<'_>) -> Vec<ChatMessage> {
        let system = format!(
            "You diagnose an agent's attempt at this task: {task}\n\n\
             Analyse the trajectory and the environment feedback. Identify what went wrong or \
             could be better, why, and what the agent should do instead. Focus on strategies \
             and tool usage, not on the layout of one particular episode.\n\
             Tag every playbook entry you can judge as helpful, harmful or neutral, using the \
             id shown in square brackets.\n\n\
             Answer with a single JSON object:\n\
             {{\n  \"reasoning\": \"...\",\n  \"error_identification\": \"...\",\n  \
             \"root_cause_analysis\": \"...\",\n  \"correct_approach\": \"...\",\n  \
             \"key_insight\": \"...\",\n  \
             \"bullet_tags\": [{{\"id\": \"<entry id>\", \"tag\": \"helpful\"}}]\n}}",
            task = self.task,
        );
        let user = format!(
            "TRAJECTORY_BEGIN\n{}\nTRAJECTORY_END\n\nPLAYBOOK_BEGIN\n{}\nPLAYBOOK_END",
            ctx.trajectory,
            or_placeholder(ctx.playbook, "No playbook entries yet."),
        );
        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }

    fn curator_messages(&self, ctx: &CuratorContext<'_>) -> Vec<ChatMessage> {
        let system = format!(
            "You curate a playbook of strategies for this task: {task}\n\n\
             Review the playbook, the trajectory and the reflection. Record only insights that \
             are missing, rewrite entries that are unclear or wrong, and remove entries that \
             proved harmful or redundant. Reuse existing sections where they fit.\n\
             Change the playbook only through the ADD, REMOVE and MODIFY tools. \
             If nothing needs to change, call no tools.",
            task = self.task,
        );
        let user = format!(
            "PLAYBOOK_BEGIN\n{}\nPLAYBOOK_END\n\nTRAJECTORY_BEGIN\n{}\nTRAJECTORY_END\n\n\
             REFLECTION_BEGIN\n{}\nREFLECTION_END",
            or_placeholder(ctx.playbook, "No playbook entries yet."),
            ctx.trajectory,
            ctx.reflection,
        );
        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }
}
