pub mod prompts;

use crate::SummarizeError;
use crate::chunker::TextChunker;
use crate::client::ModelClient;
use serde::{Deserialize, Serialize};

use prompts::{PARTIAL_SEPARATOR, combine_prompt, map_prompt, single_prompt};

/// Where a summarization run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Chunking,
    SinglePass,
    MapPhase,
    ReducePhase,
    Done,
    Failed,
}

/// Which path a finished run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plan {
    SinglePass,
    MapReduce { chunks: usize },
}

/// How partial summaries are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceStrategy {
    /// One combine call over all partial summaries, however long they are.
    #[default]
    Single,
    /// Collapse groups of partials that fit the chunk limit until the joined
    /// partials fit, then combine once.
    Recursive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub plan: Plan,
    pub invocations: usize,
}

/// Single-pass or map-reduce summarization over a `ModelClient`.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    chunker: TextChunker,
    reduce: ReduceStrategy,
}

impl Summarizer {
    pub fn new(chunker: TextChunker, reduce: ReduceStrategy) -> Self {
        Self { chunker, reduce }
    }

    pub fn reduce(&self) -> ReduceStrategy {
        self.reduce
    }

    pub fn summarize(
        &self,
        client: &dyn ModelClient,
        text: &str,
    ) -> Result<Summary, SummarizeError> {
        let mut run = Run::new(client);
        match self.drive(&mut run, text) {
            Ok((text, plan)) => {
                run.enter(Stage::Done);
                Ok(Summary {
                    text,
                    plan,
                    invocations: run.invocations,
                })
            }
            Err(err) => {
                run.enter(Stage::Failed);
                tracing::warn!(
                    invocations = run.invocations,
                    error = %err,
                    "summarization failed"
                );
                Err(err)
            }
        }
    }

    fn drive(&self, run: &mut Run<'_>, text: &str) -> Result<(String, Plan), SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::InputEmpty);
        }

        run.enter(Stage::Chunking);
        let chunks: Vec<&str> = self.chunker.chunks(text).map(|chunk| chunk.text).collect();
        tracing::info!(
            chunks = chunks.len(),
            chars = text.chars().count(),
            "text chunked"
        );

        if chunks.len() <= 1 {
            run.enter(Stage::SinglePass);
            let summary = run.invoke(&single_prompt(text))?;
            return Ok((summary, Plan::SinglePass));
        }

        run.enter(Stage::MapPhase);
        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            partials.push(run.invoke(&map_prompt(chunk))?);
        }

        run.enter(Stage::ReducePhase);
        let summary = self.reduce_partials(run, partials)?;
        Ok((
            summary,
            Plan::MapReduce {
                chunks: chunks.len(),
            },
        ))
    }

    fn reduce_partials(&self, run: &mut Run<'_>, mut partials: Vec<String>) -> Result<String, SummarizeError> {
        if self.reduce == ReduceStrategy::Recursive {
            let limit = self.chunker.policy().max_chunk_size;
            while partials.len() > 1 && joined_len(&partials) > limit {
                let groups = group_within(&partials, limit);
                if groups.len() == partials.len() {
                    // No two partials fit together; fall through to the single combine.
                    break;
                }
                tracing::debug!(
                    partials = partials.len(),
                    groups = groups.len(),
                    "collapsing partial summaries"
                );
                let mut collapsed = Vec::with_capacity(groups.len());
                for group in groups {
                    collapsed.push(run.invoke(&combine_prompt(&group.join(PARTIAL_SEPARATOR)))?);
                }
                partials = collapsed;
            }
        }
        run.invoke(&combine_prompt(&partials.join(PARTIAL_SEPARATOR)))
    }
}

struct Run<'a> {
    client: &'a dyn ModelClient,
    stage: Stage,
    invocations: usize,
}

impl<'a> Run<'a> {
    fn new(client: &'a dyn ModelClient) -> Self {
        Self {
            client,
            stage: Stage::Start,
            invocations: 0,
        }
    }

    fn enter(&mut self, next: Stage) {
        tracing::debug!(from = ?self.stage, to = ?next, "summarize stage");
        self.stage = next;
    }

    fn invoke(&mut self, prompt: &str) -> Result<String, SummarizeError> {
        self.invocations += 1;
        tracing::debug!(
            stage = ?self.stage,
            call = self.invocations,
            provider = %self.client.provider(),
            model = self.client.model(),
            "invoking model"
        );
        Ok(self.client.invoke(prompt)?)
    }
}

fn joined_len(parts: &[String]) -> usize {
    let separators = parts.len().saturating_sub(1) * PARTIAL_SEPARATOR.len();
    parts.iter().map(|part| part.chars().count()).sum::<usize>() + separators
}

/// Greedy, order-preserving groups whose joined length stays within `limit`.
fn group_within(parts: &[String], limit: usize) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for part in parts {
        current.push(part.clone());
        if current.len() > 1 && joined_len(&current) > limit {
            current.pop();
            groups.push(std::mem::take(&mut current));
            current.push(part.clone());
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}
