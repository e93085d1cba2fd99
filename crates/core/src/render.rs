//! Depth-first structured rendering of a reply tree.

use std::collections::{HashMap, HashSet};

use crate::conversation::{Conversation, Utterance};
use crate::normalize::TextNormalizer;
use crate::thread::{ReplyTree, ThreadError};

/// Spaces of indentation per reply depth.
pub const INDENT_WIDTH: usize = 4;

/// Per-utterance formatting seam for the renderer.
///
/// Implementors turn one utterance into one transcript line (without
/// indentation or the trailing newline).
pub trait UtteranceFormatter {
    fn format(&self, utt: &Utterance) -> String;
}

impl<T: UtteranceFormatter + ?Sized> UtteranceFormatter for &T {
    fn format(&self, utt: &Utterance) -> String {
        (*self).format(utt)
    }
}

/// Adapter for closure formatters.
pub struct FnFormatter<F>(pub F);

impl<F> UtteranceFormatter for FnFormatter<F>
where
    F: Fn(&Utterance) -> String,
{
    fn format(&self, utt: &Utterance) -> String {
        (self.0)(utt)
    }
}

/// Default formatter: `speaker: normalized text`.
#[derive(Default)]
pub struct SpeakerText {
    normalizer: TextNormalizer,
}

impl SpeakerText {
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }
}

impl UtteranceFormatter for SpeakerText {
    fn format(&self, utt: &Utterance) -> String {
        format!("{}: {}", utt.speaker, self.normalizer.normalize(&utt.text))
    }
}

/// Chronological ranks for every utterance, 1-based.
///
/// Ordered by timestamp, with input order breaking ties and standing in
/// entirely when timestamps are absent. The map is handed to the walk as an
/// explicit lookup; nothing is annotated onto the utterances themselves.
pub fn chronological_ranks(conv: &Conversation) -> HashMap<String, usize> {
    let mut order: Vec<(Option<i64>, usize, &str)> = conv
        .iter()
        .enumerate()
        .map(|(idx, utt)| (utt.timestamp, idx, utt.id.as_str()))
        .collect();
    order.sort_by_key(|&(ts, idx, _)| (ts, idx));
    order
        .into_iter()
        .enumerate()
        .map(|(rank, (_, _, id))| (id.to_string(), rank + 1))
        .collect()
}

/// Id lookup built once per render so the walk resolves each node in
/// constant time.
fn utterance_index(conv: &Conversation) -> HashMap<&str, &Utterance> {
    conv.iter().map(|utt| (utt.id.as_str(), utt)).collect()
}

/// Render a reply tree as an indented transcript.
///
/// Pre-order walk: each utterance's line first, then its children's subtrees
/// in child-index order, indented [`INDENT_WIDTH`] spaces per depth. Lines
/// are separated by single newlines with no blank line between nodes, and
/// the transcript ends with a trailing newline.
///
/// With `limit = Some(n)`, an utterance whose chronological rank exceeds `n`
/// contributes nothing and its subtree is not entered, even if descendants
/// individually rank within the limit.
pub fn render_thread<F>(
    conv: &Conversation,
    tree: &ReplyTree,
    formatter: F,
    limit: Option<usize>,
) -> Result<String, ThreadError>
where
    F: UtteranceFormatter,
{
    let ranks = limit.map(|_| chronological_ranks(conv));
    let index = utterance_index(conv);

    let mut out = String::new();
    let mut visited = HashSet::new();
    walk(
        &index,
        tree,
        &formatter,
        limit,
        ranks.as_ref(),
        &tree.root,
        0,
        &mut visited,
        &mut out,
    )?;
    Ok(out)
}

/// Build the reply tree and render it with the default formatter.
pub fn render_conversation(
    conv: &Conversation,
    limit: Option<usize>,
) -> Result<String, ThreadError> {
    let tree = ReplyTree::build(conv)?;
    render_thread(conv, &tree, SpeakerText::default(), limit)
}

#[allow(clippy::too_many_arguments)]
fn walk<F>(
    index: &HashMap<&str, &Utterance>,
    tree: &ReplyTree,
    formatter: &F,
    limit: Option<usize>,
    ranks: Option<&HashMap<String, usize>>,
    id: &str,
    depth: usize,
    visited: &mut HashSet<String>,
    out: &mut String,
) -> Result<(), ThreadError>
where
    F: UtteranceFormatter,
{
    // Every utterance has one parent, so a revisit means the data loops.
    if !visited.insert(id.to_string()) {
        return Err(ThreadError::Cycle {
            utterance: id.to_string(),
        });
    }

    if let (Some(limit), Some(ranks)) = (limit, ranks) {
        if ranks.get(id).copied().unwrap_or(usize::MAX) > limit {
            return Ok(());
        }
    }

    let Some(utt) = index.get(id) else {
        return Ok(());
    };

    out.push_str(&" ".repeat(depth * INDENT_WIDTH));
    out.push_str(&formatter.format(utt));
    out.push('\n');

    for child in tree.children_of(id) {
        walk(index, tree, formatter, limit, ranks, child, depth + 1, visited, out)?;
    }
    Ok(())
}
