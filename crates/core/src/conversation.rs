//! Conversation data model: utterances linked by reply references.

use serde::{Deserialize, Serialize};

use crate::normalize::TextNormalizer;

/// A single message within a conversation.
///
/// Deserializes from ConvoKit-style utterance records, where the parent
/// reference is spelled `reply-to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: String,
    pub speaker: String,
    /// Raw text. May be empty or a sentinel like `[deleted]`/`[removed]`.
    #[serde(default)]
    pub text: String,
    /// Id of the utterance this one replies to; `None` for a root.
    #[serde(rename = "reply-to", default)]
    pub reply_to: Option<String>,
    /// Creation time. Used only to derive chronological ranks when a
    /// truncation limit is requested at render time.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Utterance {
    pub fn new(id: impl Into<String>, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            speaker: speaker.into(),
            text: text.into(),
            reply_to: None,
            timestamp: None,
        }
    }

    pub fn reply(
        id: impl Into<String>,
        speaker: impl Into<String>,
        text: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        Self {
            reply_to: Some(parent.into()),
            ..Self::new(id, speaker, text)
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A set of utterances connected by reply references.
///
/// Utterances are kept in input order. That order is the documented stable
/// order for sibling rendering and for first-root selection when the data
/// carries more than one parentless utterance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    utterances: Vec<Utterance>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            utterances: Vec::new(),
        }
    }

    pub fn from_utterances(id: impl Into<String>, utterances: Vec<Utterance>) -> Self {
        Self {
            id: id.into(),
            utterances,
        }
    }

    pub fn push(&mut self, utterance: Utterance) {
        self.utterances.push(utterance);
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Iterate utterances in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Utterance> {
        self.utterances.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Utterance> {
        self.utterances.iter().find(|u| u.id == id)
    }

    /// Overwrite each utterance's stored text with its normalized form.
    ///
    /// This is the side-effecting counterpart of [`TextNormalizer::normalize`];
    /// use the pure variant when the source text must stay intact.
    pub fn normalize_in_place(&mut self, normalizer: &TextNormalizer) {
        for utt in &mut self.utterances {
            utt.text = normalizer.normalize(&utt.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_convokit_record() {
        let line = r#"{"id":"u2","speaker":"alice","text":"hi","reply-to":"u1","timestamp":1700000000}"#;
        let utt: Utterance = serde_json::from_str(line).unwrap();
        assert_eq!(utt.id, "u2");
        assert_eq!(utt.reply_to.as_deref(), Some("u1"));
        assert_eq!(utt.timestamp, Some(1700000000));
    }

    #[test]
    fn test_deserialize_root_record_defaults() {
        let line = r#"{"id":"u1","speaker":"bob"}"#;
        let utt: Utterance = serde_json::from_str(line).unwrap();
        assert_eq!(utt.text, "");
        assert!(utt.reply_to.is_none());
        assert!(utt.timestamp.is_none());
    }

    #[test]
    fn test_normalize_in_place_overwrites_text() {
        let mut conv = Conversation::from_utterances(
            "c1",
            vec![
                Utterance::new("u1", "alice", "one\ntwo"),
                Utterance::reply("u2", "bob", "plain reply", "u1"),
            ],
        );
        conv.normalize_in_place(&TextNormalizer::default());
        assert_eq!(conv.get("u1").unwrap().text, "one. two");
        assert_eq!(conv.get("u2").unwrap().text, "plain reply");
    }

    #[test]
    fn test_lookup_and_order() {
        let conv = Conversation::from_utterances(
            "c1",
            vec![
                Utterance::new("a", "x", ""),
                Utterance::reply("b", "y", "", "a"),
            ],
        );
        assert_eq!(conv.len(), 2);
        assert!(conv.get("b").is_some());
        assert!(conv.get("ghost").is_none());
        let ids: Vec<&str> = conv.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
