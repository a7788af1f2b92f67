//! Core of the ACE playbook loop.
//!
//! A Generator acts in an [`Environment`], a Reflector diagnoses the
//! resulting trajectory, and a Curator edits a persistent [`Playbook`] of
//! tagged advice that the next episode reads back.
//!
//! # Modules
//!
//! - [`playbook`]: entries, sections, rendering, counters, file store
//! - [`verdict`]: Reflector output and entry tags
//! - [`curation`]: ADD/REMOVE/MODIFY protocol
//! - [`environment`]: the environment boundary
//! - [`agents`]: Generator, Reflector, Curator, prompts, model call policy
//! - [`episode`]: the per-episode state machine
//! - [`config`]: TOML configuration

pub mod agents;
pub mod config;
pub mod curation;
pub mod environment;
pub mod episode;
pub mod playbook;
pub mod verdict;

pub use agents::{
    AgentError, Curator, CuratorContext, DefaultPrompts, Generator, GeneratorContext, ModelCallPolicy, PromptSet,
    Reflector, ReflectorContext,
};
pub use config::{AceConfig, ConfigError};
pub use curation::{CurationEffect, CurationError, CurationOp, CurationReport, RejectedCall};
pub use environment::{ActionError, Environment, StepOutcome};
pub use episode::{
    EpisodeError, EpisodeOutcome, EpisodePhase, EpisodeReport, EpisodeRunner, Trajectory, TrajectoryStep,
};
pub use playbook::{
    DEFAULT_SECTION, Entry, Playbook, PlaybookError, PlaybookStore, RenderedEntry, Section, TagSummary,
    parse_rendered,
};
pub use verdict::{BulletTag, EntryTag, Verdict, VerdictError};
