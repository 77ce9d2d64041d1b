//! SmartGPT pipeline orchestration
//!
//! A run goes through four stages, strictly in order:
//! 1. Generate `count` candidate answers concurrently
//! 2. Have a researcher critique every candidate
//! 3. Have a resolver pick and improve the best one (always the premium model)
//! 4. Extract only the improved answer
//!
//! The transcript is written during resolution. A failure in any completion
//! call aborts the run; nothing is retried.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{
    prompts, ModelSettings, ModelTier, OutputCount, PipelineConfig, RateSettings, Settings,
};
use crate::conversation::{Conversation, ConversationError};
use crate::providers::{Completion, CompletionProvider, ProviderError};

use super::transcript::{TranscriptError, TranscriptStore};
use super::usage::{estimate_cost, TokenCounts, UsageLedger};

/// Temperature sent when a request doesn't choose its own
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Errors that abort a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Completion failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid conversation: {0}")]
    Conversation(#[from] ConversationError),

    #[error("Cannot send an empty conversation")]
    EmptyConversation,

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// The four pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generating,
    Researching,
    Resolving,
    Extracting,
}

impl Stage {
    pub fn number(&self) -> usize {
        match self {
            Stage::Generating => 1,
            Stage::Researching => 2,
            Stage::Resolving => 3,
            Stage::Extracting => 4,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Generating => "Generating answers",
            Stage::Researching => "Researching answers",
            Stage::Resolving => "Resolving answers",
            Stage::Extracting => "Extracting final answer",
        };
        f.write_str(label)
    }
}

/// Progress notifications emitted while a run is underway
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted(Stage),
    /// One fan-out request settled; emitted in completion order
    AnswerGenerated { completed: usize, total: usize },
    TranscriptSaved(PathBuf),
}

/// Sink for pipeline progress
pub trait Reporter: Send + Sync {
    fn report(&self, event: PipelineEvent);
}

/// Output of the resolution stage
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Raw resolver output, possibly with preamble
    pub text: String,
    pub transcript: PathBuf,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub final_answer: String,
    pub resolved: String,
    pub transcript: PathBuf,
    pub tokens: TokenCounts,
    pub cost: f64,
}

/// Temperatures for a fan-out of `count` requests.
///
/// Request 0 keeps the default; every other request draws from [0.3, 0.7)
/// in steps of 0.01.
pub fn fanout_temperatures(count: usize, rng: &mut impl Rng) -> Vec<Option<f32>> {
    (0..count)
        .map(|index| (index > 0).then(|| rng.gen_range(30u32..70) as f32 / 100.0))
        .collect()
}

/// The SmartGPT orchestrator.
///
/// Owns the usage ledger for its runs: every completion issued through it,
/// from any stage, is added to the same counters.
pub struct SmartGpt {
    provider: Arc<dyn CompletionProvider>,
    config: PipelineConfig,
    models: ModelSettings,
    rates: RateSettings,
    transcripts: TranscriptStore,
    ledger: UsageLedger,
    reporter: Option<Arc<dyn Reporter>>,
}

impl SmartGpt {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: PipelineConfig, settings: &Settings) -> Self {
        Self {
            provider,
            config,
            models: settings.models.clone(),
            rates: settings.rates,
            transcripts: TranscriptStore::from_settings(&settings.transcript),
            ledger: UsageLedger::new(),
            reporter: None,
        }
    }

    /// Send progress events to `reporter`
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(reporter) = &self.reporter {
            reporter.report(event);
        }
    }

    /// Run every stage for `question`
    #[tracing::instrument(skip_all, fields(run_id = %uuid::Uuid::new_v4(), count = %self.config.output_count))]
    pub async fn run(&self, question: &str) -> Result<RunReport, PipelineError> {
        let output_count = self.config.output_count;
        let count = output_count.get();

        self.emit(PipelineEvent::StageStarted(Stage::Generating));
        let (answers, initial_prompt) = self.initial_outputs(question, output_count).await?;
        let candidates = prompts::concat_output(&answers);

        self.emit(PipelineEvent::StageStarted(Stage::Researching));
        let conversation = self.critique(&candidates, &initial_prompt, count).await?;

        self.emit(PipelineEvent::StageStarted(Stage::Resolving));
        let resolution = self.resolve(conversation, count).await?;

        self.emit(PipelineEvent::StageStarted(Stage::Extracting));
        let final_answer = self.extract_final(&resolution.text).await?;

        let tokens = self.ledger.snapshot();
        let cost = estimate_cost(&tokens, &self.rates);
        info!(cheap_tokens = tokens.cheap, premium_tokens = tokens.premium, cost, "Run complete");

        Ok(RunReport {
            final_answer,
            resolved: resolution.text,
            transcript: resolution.transcript,
            tokens,
            cost,
        })
    }

    /// One completion call, recorded in the ledger
    pub async fn generate(
        &self,
        tier: ModelTier,
        conversation: &Conversation,
        temperature: Option<f32>,
    ) -> Result<Completion, PipelineError> {
        if conversation.is_empty() {
            return Err(PipelineError::EmptyConversation);
        }

        let model = self.models.id(tier);
        let temperature = temperature.unwrap_or(DEFAULT_TEMPERATURE);

        let completion = self
            .provider
            .complete(model, conversation.messages(), temperature)
            .await?;

        self.ledger.record(tier, completion.total_tokens);
        debug!(
            model,
            temperature,
            turns = conversation.len(),
            tokens = completion.total_tokens,
            "Completion received"
        );

        Ok(completion)
    }

    /// Fan out `count` answers to the step-by-step prompt.
    ///
    /// Answers come back in request order. The first failure drops every
    /// request still in flight and fails the whole stage.
    pub async fn initial_outputs(
        &self,
        question: &str,
        count: OutputCount,
    ) -> Result<(Vec<String>, String), PipelineError> {
        let count = count.get();
        let prompt = prompts::initial(question);
        let conversation = Conversation::from_user(prompt.clone());
        let tier = self.config.fanout_model;

        let temperatures = {
            let mut rng = rand::thread_rng();
            fanout_temperatures(count, &mut rng)
        };

        let conversation = &conversation;
        let mut pending: FuturesUnordered<_> = temperatures
            .into_iter()
            .enumerate()
            .map(move |(index, temperature)| async move {
                let completion = self.generate(tier, conversation, temperature).await?;
                Ok::<_, PipelineError>((index, completion.text))
            })
            .collect();

        let mut answers = Vec::with_capacity(count);
        while let Some(result) = pending.next().await {
            let (index, text) = result?;
            answers.push((index, text));

            debug!(completed = answers.len(), total = count, "Answer generated");
            self.emit(PipelineEvent::AnswerGenerated {
                completed: answers.len(),
                total: count,
            });
        }

        answers.sort_by_key(|(index, _)| *index);
        Ok((answers.into_iter().map(|(_, text)| text).collect(), prompt))
    }

    /// Ask the researcher to list the flaws of every candidate
    pub async fn critique(
        &self,
        candidates: &str,
        initial_prompt: &str,
        count: usize,
    ) -> Result<Conversation, PipelineError> {
        let mut conversation = Conversation::from_user(initial_prompt);
        conversation.add_assistant(candidates)?;
        conversation.add_user(prompts::critique(count))?;

        let completion = self
            .generate(self.config.critique_model, &conversation, None)
            .await?;
        conversation.add_assistant(completion.text)?;

        Ok(conversation)
    }

    /// Ask the resolver for the best improved answer and save the transcript
    pub async fn resolve(
        &self,
        mut conversation: Conversation,
        count: usize,
    ) -> Result<Resolution, PipelineError> {
        conversation.add_user(prompts::resolve(count))?;

        let completion = self
            .generate(self.config.resolution_model(), &conversation, None)
            .await?;

        let transcript = self.transcripts.save(&conversation, &completion.text).await?;
        self.emit(PipelineEvent::TranscriptSaved(transcript.clone()));

        Ok(Resolution {
            text: completion.text,
            transcript,
        })
    }

    /// Strip the resolver output down to the improved answer
    pub async fn extract_final(&self, resolved: &str) -> Result<String, PipelineError> {
        let conversation = Conversation::from_user(prompts::extract(resolved));
        let completion = self
            .generate(self.config.extraction_model, &conversation, None)
            .await?;

        Ok(completion.text)
    }
}
