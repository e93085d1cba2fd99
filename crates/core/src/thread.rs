//! Reply-graph reconstruction: from flat parent references to an explicit
//! child-adjacency index rooted at the parentless utterance.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::conversation::Conversation;

/// Structural failures of a conversation's reply graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    /// No utterance without a parent reference; the thread has no
    /// discoverable root.
    #[error("conversation '{conversation}' has no root utterance")]
    MissingRoot { conversation: String },
    /// An utterance id was reached twice during traversal.
    #[error("reply cycle detected at utterance '{utterance}'")]
    Cycle { utterance: String },
}

/// Derived reply index for one conversation.
///
/// Ephemeral: built per render call, never stored back on the conversation.
/// The original parent references are input only; traversal runs entirely
/// over the explicit `children` adjacency.
#[derive(Debug, Clone)]
pub struct ReplyTree {
    /// Id of the selected root utterance.
    pub root: String,
    /// Direct children per utterance id, in input-encounter order.
    pub children: HashMap<String, Vec<String>>,
    /// More than one parentless utterance was found; the first in input
    /// order was selected. Degraded data, reported rather than hidden.
    pub ambiguous_root: bool,
    /// Utterances whose parent reference resolves to nothing in the set.
    /// They stay out of the rendered tree instead of crashing the walk.
    pub orphan_count: usize,
}

impl ReplyTree {
    /// Build the child index and identify the root in one scan.
    pub fn build(conv: &Conversation) -> Result<Self, ThreadError> {
        let ids: HashSet<&str> = conv.iter().map(|u| u.id.as_str()).collect();

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut roots: Vec<&str> = Vec::new();
        let mut orphan_count = 0;

        for utt in conv.iter() {
            match utt.reply_to.as_deref() {
                None => roots.push(&utt.id),
                Some(parent) if ids.contains(parent) => {
                    children
                        .entry(parent.to_string())
                        .or_default()
                        .push(utt.id.clone());
                }
                Some(_) => orphan_count += 1,
            }
        }

        let root = match roots.first() {
            Some(first) => (*first).to_string(),
            None => {
                return Err(ThreadError::MissingRoot {
                    conversation: conv.id.clone(),
                })
            }
        };

        Ok(Self {
            root,
            children,
            ambiguous_root: roots.len() > 1,
            orphan_count,
        })
    }

    /// Direct children of `id` in input-encounter order.
    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
