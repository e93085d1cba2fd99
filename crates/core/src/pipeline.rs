//! Pipeline for loading utterance corpora and rendering transcripts.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::conversation::{Conversation, Utterance};
use crate::normalize::TextNormalizer;
use crate::render::{render_thread, UtteranceFormatter};
use crate::thread::ReplyTree;

/// Failures while loading a corpus or writing transcripts.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}:{line}: invalid utterance record: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("{path}:{line}: utterance '{id}' carries no conversation id")]
    MissingConversationId {
        path: PathBuf,
        line: usize,
        id: String,
    },
    #[error("no .jsonl utterance files found under {0}")]
    Empty(PathBuf),
    #[error("failed to encode summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One line of an utterances JSONL file.
///
/// The conversation id is spelled `conversation_id` in current ConvoKit
/// exports and `root` in older ones; both are accepted.
#[derive(Debug, Deserialize)]
struct UtteranceRecord {
    id: String,
    speaker: String,
    #[serde(default)]
    text: String,
    #[serde(rename = "reply-to", default)]
    reply_to: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    root: Option<String>,
}

/// A loaded set of conversations, in encounter order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub conversations: Vec<Conversation>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Overwrite every utterance's stored text with its normalized form.
    pub fn normalize_in_place(&mut self, normalizer: &TextNormalizer) {
        for conv in &mut self.conversations {
            conv.normalize_in_place(normalizer);
        }
    }
}

/// Discover all `.jsonl` utterance files under a directory, sorted for
/// reproducible processing order.
pub fn discover_utterance_files(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "jsonl"))
        .map(|e| e.path().to_path_buf())
        .collect();
    paths.sort();
    paths
}

/// Load every utterance file under `root` and group records into
/// conversations, preserving encounter order within each conversation.
pub fn load_corpus(root: &Path) -> Result<Corpus, PipelineError> {
    let files = discover_utterance_files(root);
    if files.is_empty() {
        return Err(PipelineError::Empty(root.to_path_buf()));
    }

    let mut conversations: Vec<Conversation> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in files {
        let reader = BufReader::new(File::open(&path)?);
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: UtteranceRecord =
                serde_json::from_str(&line).map_err(|source| PipelineError::Json {
                    path: path.clone(),
                    line: lineno + 1,
                    source,
                })?;

            let conv_id = match record.conversation_id.or(record.root) {
                Some(id) => id,
                None => {
                    return Err(PipelineError::MissingConversationId {
                        path: path.clone(),
                        line: lineno + 1,
                        id: record.id,
                    })
                }
            };

            let slot = *index.entry(conv_id.clone()).or_insert_with(|| {
                conversations.push(Conversation::new(conv_id));
                conversations.len() - 1
            });
            let mut utt = Utterance::new(record.id, record.speaker, record.text);
            utt.reply_to = record.reply_to;
            utt.timestamp = record.timestamp;
            conversations[slot].push(utt);
        }
    }

    Ok(Corpus { conversations })
}

/// One successfully rendered conversation, with the degraded-data
/// observations carried alongside the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedConversation {
    pub id: String,
    pub transcript: String,
    pub ambiguous_root: bool,
    pub orphan_count: usize,
}

/// Outcome of rendering a whole corpus.
#[derive(Debug, Default)]
pub struct CorpusRenderResult {
    pub rendered: Vec<RenderedConversation>,
    /// (conversation id, error) pairs; one bad thread never aborts the batch.
    pub failures: Vec<(String, String)>,
}

/// Render every conversation in the corpus in parallel.
///
/// Conversations are read-only during rendering; each worker builds its own
/// ephemeral reply index and rank map.
pub fn render_corpus<F>(
    corpus: &Corpus,
    formatter: &F,
    limit: Option<usize>,
) -> CorpusRenderResult
where
    F: UtteranceFormatter + Sync,
{
    let outcomes: Vec<Result<RenderedConversation, (String, String)>> = corpus
        .conversations
        .par_iter()
        .map(|conv| {
            let tree = ReplyTree::build(conv).map_err(|e| (conv.id.clone(), e.to_string()))?;
            let transcript = render_thread(conv, &tree, formatter, limit)
                .map_err(|e| (conv.id.clone(), e.to_string()))?;
            Ok(RenderedConversation {
                id: conv.id.clone(),
                transcript,
                ambiguous_root: tree.ambiguous_root,
                orphan_count: tree.orphan_count,
            })
        })
        .collect();

    let mut result = CorpusRenderResult::default();
    for outcome in outcomes {
        match outcome {
            Ok(rendered) => result.rendered.push(rendered),
            Err(failure) => result.failures.push(failure),
        }
    }
    result
}

/// Aggregate counts written alongside the transcripts.
#[derive(Debug, Serialize)]
pub struct CorpusSummary {
    pub conversations_rendered: usize,
    pub conversations_failed: usize,
    pub ambiguous_roots: usize,
    pub orphaned_utterances: usize,
    pub failures: Vec<FailureRecord>,
}

#[derive(Debug, Serialize)]
pub struct FailureRecord {
    pub conversation: String,
    pub error: String,
}

/// Write one `.txt` transcript per rendered conversation plus a
/// `summary.json` with the aggregate counts.
pub fn write_transcripts(
    result: &CorpusRenderResult,
    out_dir: &Path,
) -> Result<CorpusSummary, PipelineError> {
    std::fs::create_dir_all(out_dir)?;

    for rendered in &result.rendered {
        let path = out_dir.join(format!("{}.txt", sanitize_file_stem(&rendered.id)));
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(rendered.transcript.as_bytes())?;
        file.flush()?;
    }

    let summary = CorpusSummary {
        conversations_rendered: result.rendered.len(),
        conversations_failed: result.failures.len(),
        ambiguous_roots: result.rendered.iter().filter(|r| r.ambiguous_root).count(),
        orphaned_utterances: result.rendered.iter().map(|r| r.orphan_count).sum(),
        failures: result
            .failures
            .iter()
            .map(|(conversation, error)| FailureRecord {
                conversation: conversation.clone(),
                error: error.clone(),
            })
            .collect(),
    };

    let summary_path = out_dir.join("summary.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    Ok(summary)
}

fn sanitize_file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
