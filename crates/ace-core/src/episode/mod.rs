//! Episode orchestration.
//!
//! One episode moves through `RenderState → Act → Reflect → TagStats →
//! Curate → Persisted → Completed`, or ends in `Failed` when a model call or
//! a playbook write fails. The runner owns the environment and the store and
//! lends them to each role in turn.

pub mod trajectory;

use std::fmt;
use std::sync::Arc;

use ace_abstraction::{Model, ModelError, ModelParameters};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span};

use crate::agents::{
    AgentError, Curator, DefaultPrompts, Generator, GeneratorContext, ModelCallPolicy, PromptSet, Reflector,
};
use crate::config::{self, AceConfig};
use crate::curation::CurationReport;
use crate::environment::Environment;
use crate::playbook::{PlaybookError, PlaybookStore, TagSummary};
use crate::verdict::Verdict;

pub use trajectory::{ActionInvocation, EpisodeOutcome, Trajectory, TrajectoryStep};

/// Where an episode is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodePhase {
    /// Not started.
    Idle,
    /// Building the acting context.
    RenderState,
    /// Generator acting.
    Act,
    /// Reflector diagnosing.
    Reflect,
    /// Applying verdict tags.
    TagStats,
    /// Curator updating the playbook.
    Curate,
    /// All changes written.
    Persisted,
    /// Finished normally.
    Completed,
    /// Aborted.
    Failed,
}

impl fmt::Display for EpisodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::RenderState => "render_state",
            Self::Act => "act",
            Self::Reflect => "reflect",
            Self::TagStats => "tag_stats",
            Self::Curate => "curate",
            Self::Persisted => "persisted",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors that abort an episode.
#[derive(Debug, Error)]
pub enum EpisodeError {
    /// A model call failed after retries.
    #[error("model call failed during {phase}: {source}")]
    Model {
        /// Phase the call was made in.
        phase: EpisodePhase,
        /// Underlying error.
        #[source]
        source: ModelError,
    },

    /// Writing the playbook failed.
    #[error("playbook write failed during {phase}: {source}")]
    Playbook {
        /// Phase the write was made in.
        phase: EpisodePhase,
        /// Underlying error.
        #[source]
        source: PlaybookError,
    },
}

impl EpisodeError {
    /// Phase the episode failed in.
    pub fn phase(&self) -> EpisodePhase {
        match self {
            Self::Model { phase, .. } | Self::Playbook { phase, .. } => *phase,
        }
    }

    fn from_agent(phase: EpisodePhase, err: AgentError) -> Self {
        match err {
            AgentError::Model(source) => Self::Model { phase, source },
            AgentError::Playbook(source) => Self::Playbook { phase, source },
        }
    }
}

/// Result type for episode operations.
pub type Result<T> = std::result::Result<T, EpisodeError>;

/// Summary of one finished episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    /// 1-based episode number within this runner.
    pub episode: usize,
    /// Seed passed to the environment reset.
    pub seed: Option<u64>,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub finished_at: DateTime<Utc>,
    /// What the Generator did.
    pub trajectory: Trajectory,
    /// The Reflector's verdict.
    pub verdict: Verdict,
    /// Counters bumped by the verdict.
    pub tags: TagSummary,
    /// What the Curator changed.
    pub curation: CurationReport,
    /// Phase the episode ended in.
    pub final_phase: EpisodePhase,
}

/// Runs episodes against one environment and one playbook.
pub struct EpisodeRunner<E: Environment> {
    env: E,
    store: PlaybookStore,
    model: Arc<dyn Model>,
    policy: ModelCallPolicy,
    parameters: ModelParameters,
    prompts: Arc<dyn PromptSet>,
    generator: Generator,
    reflector: Reflector,
    curator: Curator,
    seed: Option<u64>,
    episodes: usize,
    phase: EpisodePhase,
    last_reflection: Option<String>,
    episodes_run: usize,
}

impl<E: Environment> EpisodeRunner<E> {
    /// Creates a runner using [`DefaultPrompts`].
    pub fn new(env: E, store: PlaybookStore, model: Arc<dyn Model>, config: &AceConfig) -> Self {
        let prompts: Arc<dyn PromptSet> = Arc::new(DefaultPrompts::default());
        let policy = config.model.call_policy();
        let parameters = config.model.parameters();

        Self {
            env,
            store,
            generator: Generator::new(Arc::clone(&model), policy, config.episode.max_steps)
                .with_parameters(parameters.clone()),
            reflector: Reflector::new(Arc::clone(&model), Arc::clone(&prompts), policy)
                .with_parameters(parameters.clone()),
            curator: Curator::new(Arc::clone(&model), Arc::clone(&prompts), policy)
                .with_parameters(parameters.clone()),
            model,
            policy,
            parameters,
            prompts,
            seed: config.episode.seed,
            episodes: config.episode.episodes,
            phase: EpisodePhase::Idle,
            last_reflection: None,
            episodes_run: 0,
        }
    }

    /// Creates a runner with the configured playbook file and model client.
    pub fn from_config(env: E, config: &AceConfig) -> config::Result<Self> {
        let store = PlaybookStore::open(&config.playbook.path)
            .with_default_section(config.playbook.default_section.clone());
        let model = config.model.create_model()?;
        Ok(Self::new(env, store, model, config))
    }

    /// Replaces the prompt set used by the Generator, Reflector and Curator.
    #[must_use]
    pub fn with_prompts(mut self, prompts: Arc<dyn PromptSet>) -> Self {
        self.reflector = Reflector::new(Arc::clone(&self.model), Arc::clone(&prompts), self.policy)
            .with_parameters(self.parameters.clone());
        self.curator = Curator::new(Arc::clone(&self.model), Arc::clone(&prompts), self.policy)
            .with_parameters(self.parameters.clone());
        self.prompts = prompts;
        self
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutable access to the environment.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// The playbook store.
    pub fn store(&self) -> &PlaybookStore {
        &self.store
    }

    /// Current phase.
    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Reflection that will be fed to the next Generator.
    pub fn last_reflection(&self) -> Option<&str> {
        self.last_reflection.as_deref()
    }

    /// Episodes per run, from `[episode] episodes`.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Episodes started so far.
    pub fn episodes_run(&self) -> usize {
        self.episodes_run
    }

    fn transition(&mut self, phase: EpisodePhase) {
        info!(from = %self.phase, to = %phase, "Episode phase transition");
        self.phase = phase;
    }

    fn fail(&mut self, err: EpisodeError) -> EpisodeError {
        error!(phase = %err.phase(), error = %err, "Episode failed");
        self.phase = EpisodePhase::Failed;
        err
    }

    /// Runs one episode.
    pub async fn run_episode(&mut self) -> Result<EpisodeReport> {
        self.episodes_run += 1;
        let episode = self.episodes_run;
        let span = info_span!("episode", episode);
        self.run_episode_inner(episode).instrument(span).await
    }

    async fn run_episode_inner(&mut self, episode: usize) -> Result<EpisodeReport> {
        let started_at = Utc::now();
        let seed = self.seed.map(|s| s.wrapping_add((episode - 1) as u64));

        self.phase = EpisodePhase::Idle;
        self.transition(EpisodePhase::RenderState);
        self.store.reload();
        self.env.reset(seed);
        let playbook = self.store.render();
        let state = self.env.state_description();
        let messages = self.prompts.generator_messages(&GeneratorContext {
            playbook: &playbook,
            reflection: self.last_reflection.as_deref(),
            state: &state,
        });

        self.transition(EpisodePhase::Act);
        let trajectory = match self.generator.run(&mut self.env, messages).await {
            Ok(trajectory) => trajectory,
            Err(source) => return Err(self.fail(EpisodeError::Model { phase: EpisodePhase::Act, source })),
        };
        info!(turns = trajectory.turns(), outcome = %trajectory.outcome, "Acting finished");

        self.transition(EpisodePhase::Reflect);
        let verdict = match self.reflector.reflect(&self.store.render(), &trajectory).await {
            Ok(verdict) => verdict,
            Err(source) => return Err(self.fail(EpisodeError::Model { phase: EpisodePhase::Reflect, source })),
        };
        self.last_reflection = Some(verdict.as_context());

        self.transition(EpisodePhase::TagStats);
        let tags = match self.store.apply_verdict(&verdict) {
            Ok(tags) => tags,
            Err(source) => return Err(self.fail(EpisodeError::Playbook { phase: EpisodePhase::TagStats, source })),
        };

        self.transition(EpisodePhase::Curate);
        let curation = match self.curator.curate(&mut self.store, &trajectory, &verdict).await {
            Ok(curation) => curation,
            Err(e) => return Err(self.fail(EpisodeError::from_agent(EpisodePhase::Curate, e))),
        };

        self.transition(EpisodePhase::Persisted);
        self.transition(EpisodePhase::Completed);

        Ok(EpisodeReport {
            episode,
            seed,
            started_at,
            finished_at: Utc::now(),
            trajectory,
            verdict,
            tags,
            curation,
            final_phase: self.phase,
        })
    }

    /// Runs `episodes` episodes back to back, stopping at the first failure.
    pub async fn run(&mut self, episodes: usize) -> Result<Vec<EpisodeReport>> {
        let mut reports = Vec::with_capacity(episodes);
        for _ in 0..episodes {
            reports.push(self.run_episode().await?);
        }
        info!(episodes = reports.len(), entries = self.store.playbook().entry_count(), "Run finished");
        Ok(reports)
    }

    /// Runs the configured number of episodes.
    pub async fn run_configured(&mut self) -> Result<Vec<EpisodeReport>> {
        self.run(self.episodes).await
    }
}
