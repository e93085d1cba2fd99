//! Linear-scan corpus statistics: length distributions and substring scans.

use crate::conversation::Conversation;
use crate::pipeline::Corpus;

/// Utterance count of every conversation, in corpus order.
pub fn conversation_lengths(corpus: &Corpus) -> Vec<usize> {
    corpus.iter().map(Conversation::len).collect()
}

/// Population mean and standard deviation of a length distribution.
/// `None` for an empty distribution.
pub fn mean_std(lengths: &[usize]) -> Option<(f64, f64)> {
    if lengths.is_empty() {
        return None;
    }
    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<usize>() as f64 / n;
    let variance = lengths
        .iter()
        .map(|&len| (len as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    Some((mean, variance.sqrt()))
}

/// Fixed-range histogram of a length distribution.
///
/// Values outside `[low, high]` are dropped; `high` itself lands in the
/// last bin. Returns `bins` counts.
pub fn histogram(lengths: &[usize], low: usize, high: usize, bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    if bins == 0 || high <= low {
        return counts;
    }
    let width = (high - low) as f64 / bins as f64;
    for &len in lengths {
        if len < low || len > high {
            continue;
        }
        let bin = (((len - low) as f64 / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    counts
}

/// Count utterances across the corpus whose raw text contains `needle`.
pub fn count_utterances_containing(corpus: &Corpus, needle: &str) -> usize {
    corpus
        .iter()
        .flat_map(Conversation::iter)
        .filter(|utt| utt.text.contains(needle))
        .count()
}

/// First conversation (corpus order) with at least `min_matches` utterances
/// containing `needle`.
pub fn find_conversation_with_matches<'a>(
    corpus: &'a Corpus,
    needle: &str,
    min_matches: usize,
) -> Option<&'a Conversation> {
    corpus.iter().find(|conv| {
        conv.iter().filter(|utt| utt.text.contains(needle)).count() >= min_matches
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Utterance;

    fn corpus() -> Corpus {
        let mut c1 = Conversation::new("c1");
        c1.push(Utterance::new("a", "alice", "see http://x.y"));
        c1.push(Utterance::reply("b", "bob", "plain", "a"));
        let mut c2 = Conversation::new("c2");
        c2.push(Utterance::new("p", "pat", "http://one and https://two"));
        c2.push(Utterance::reply("q", "quinn", "more http://three", "p"));
        c2.push(Utterance::reply("r", "rae", "[removed]", "q"));
        Corpus {
            conversations: vec![c1, c2],
        }
    }

    #[test]
    fn test_conversation_lengths() {
        assert_eq!(conversation_lengths(&corpus()), vec![2, 3]);
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[2, 4]).unwrap();
        assert_eq!(mean, 3.0);
        assert_eq!(std, 1.0);
        assert!(mean_std(&[]).is_none());
    }

    #[test]
    fn test_mean_std_single_value() {
        let (mean, std) = mean_std(&[7]).unwrap();
        assert_eq!(mean, 7.0);
        assert_eq!(std, 0.0);
    }

    #[test]
    fn test_histogram_binning() {
        // range 0..10 over 5 bins of width 2
        let counts = histogram(&[0, 1, 2, 9, 10, 11], 0, 10, 5);
        assert_eq!(counts, vec![2, 1, 0, 0, 2]);
    }

    #[test]
    fn test_histogram_degenerate_ranges() {
        assert_eq!(histogram(&[1, 2], 5, 5, 3), vec![0, 0, 0]);
        assert!(histogram(&[1], 0, 10, 0).is_empty());
    }

    #[test]
    fn test_count_link_utterances() {
        assert_eq!(count_utterances_containing(&corpus(), "http"), 3);
        assert_eq!(count_utterances_containing(&corpus(), "[removed]"), 1);
    }

    #[test]
    fn test_find_conversation_with_matches() {
        let corpus = corpus();
        let found = find_conversation_with_matches(&corpus, "http", 2).unwrap();
        assert_eq!(found.id, "c2");
        assert_eq!(
            find_conversation_with_matches(&corpus, "http", 1).unwrap().id,
            "c1"
        );
        assert!(find_conversation_with_matches(&corpus, "http", 3).is_none());
    }
}
