//! Core logic for reconstructing and rendering threaded conversations.
//!
//! A conversation arrives as a flat set of utterances carrying parent
//! references. This crate rebuilds the reply tree from those references,
//! normalizes utterance text through an ordered rewrite pipeline, and
//! renders the whole thread as an indented transcript.

mod conversation;
pub mod normalize;
pub mod pipeline;
mod render;
mod thread;

pub mod stats;

pub use conversation::{Conversation, Utterance};
pub use normalize::{NormalizeError, TextNormalizer};
pub use pipeline::{
    discover_utterance_files, load_corpus, render_corpus, write_transcripts, Corpus,
    CorpusRenderResult, CorpusSummary, PipelineError, RenderedConversation,
};
pub use render::{
    chronological_ranks, render_conversation, render_thread, FnFormatter, SpeakerText,
    UtteranceFormatter, INDENT_WIDTH,
};
pub use thread::{ReplyTree, ThreadError};
