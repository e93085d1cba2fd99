//! CLI tool for rendering threaded conversation transcripts.
//!
//! Reads ConvoKit-style `.jsonl` utterance files, rebuilds each
//! conversation's reply tree, and writes indented transcripts, plus a couple
//! of linear-scan corpus reports (length statistics and substring scans).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use threadview_core::{
    load_corpus, render_conversation, render_corpus, stats, write_transcripts, FnFormatter,
    SpeakerText, TextNormalizer, Utterance,
};

/// Render threaded conversation corpora as indented transcripts.
#[derive(Parser, Debug)]
#[command(name = "threadview")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every conversation in a corpus to transcript files.
    Render {
        /// Root directory containing .jsonl utterance files
        #[arg(long)]
        corpus: PathBuf,

        /// Output directory for transcripts and summary.json
        #[arg(long)]
        output: PathBuf,

        /// Render only utterances whose chronological rank is at most this
        #[arg(long)]
        limit: Option<usize>,

        /// Overwrite stored utterance text with its normalized form before
        /// rendering, instead of normalizing on the fly
        #[arg(long)]
        normalize_in_place: bool,
    },

    /// Report conversation-length statistics for a corpus.
    Stats {
        /// Root directory containing .jsonl utterance files
        #[arg(long)]
        corpus: PathBuf,

        /// Histogram lower bound (inclusive); enables the histogram
        #[arg(long)]
        low: Option<usize>,

        /// Histogram upper bound (inclusive); enables the histogram
        #[arg(long)]
        high: Option<usize>,

        /// Number of histogram bins
        #[arg(long, default_value = "30")]
        bins: usize,
    },

    /// Scan the corpus for utterances containing a substring.
    Links {
        /// Root directory containing .jsonl utterance files
        #[arg(long)]
        corpus: PathBuf,

        /// Substring to look for
        #[arg(long, default_value = "http")]
        needle: String,

        /// Minimum matching utterances for the conversation report
        #[arg(long, default_value = "2")]
        min_matches: usize,
    },
}

/// Metadata record written next to the transcripts: the run's configuration
/// plus the aggregate counts.
fn render_metadata(
    corpus: &std::path::Path,
    output: &std::path::Path,
    limit: Option<usize>,
    normalize_in_place: bool,
    summary: &threadview_core::CorpusSummary,
) -> serde_json::Value {
    serde_json::json!({
        "config": {
            "corpus": corpus.to_string_lossy(),
            "output": output.to_string_lossy(),
            "limit": limit,
            "normalize_in_place": normalize_in_place,
        },
        "counts": {
            "conversations_rendered": summary.conversations_rendered,
            "conversations_failed": summary.conversations_failed,
            "ambiguous_roots": summary.ambiguous_roots,
            "orphaned_utterances": summary.orphaned_utterances,
        },
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Command::Render {
            corpus,
            output,
            limit,
            normalize_in_place,
        } => {
            println!("Loading corpus from {:?}...", corpus);
            let mut loaded = load_corpus(&corpus)?;
            println!("Loaded {} conversations", loaded.len());

            let result = if normalize_in_place {
                loaded.normalize_in_place(&TextNormalizer::default());
                // Text is already normalized in storage; format it verbatim.
                let raw = FnFormatter(|u: &Utterance| format!("{}: {}", u.speaker, u.text));
                render_corpus(&loaded, &raw, limit)
            } else {
                render_corpus(&loaded, &SpeakerText::default(), limit)
            };

            for (conversation, error) in &result.failures {
                eprintln!("Skipping conversation {}: {}", conversation, error);
            }

            let summary = write_transcripts(&result, &output)?;

            let metadata_path = output.join("metadata.json");
            let metadata = render_metadata(&corpus, &output, limit, normalize_in_place, &summary);
            std::fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;

            println!("\n[summary]");
            println!("  Conversations rendered: {}", summary.conversations_rendered);
            println!("  Conversations failed: {}", summary.conversations_failed);
            println!("  Ambiguous roots: {}", summary.ambiguous_roots);
            println!("  Orphaned utterances: {}", summary.orphaned_utterances);
            println!("  Output: {:?}", output);
            println!("  Metadata: {:?}", metadata_path);
        }

        Command::Stats {
            corpus,
            low,
            high,
            bins,
        } => {
            let loaded = load_corpus(&corpus)?;
            let lengths = stats::conversation_lengths(&loaded);

            println!("Conversations: {}", lengths.len());
            match stats::mean_std(&lengths) {
                Some((mean, std)) => {
                    println!("Mean length: {:.2}", mean);
                    println!("Std length: {:.2}", std);
                }
                None => println!("Corpus contains no conversations"),
            }

            if let (Some(low), Some(high)) = (low, high) {
                let counts = stats::histogram(&lengths, low, high, bins);
                let width = (high - low) as f64 / bins.max(1) as f64;
                println!("\nLength histogram [{}, {}]:", low, high);
                for (i, count) in counts.iter().enumerate() {
                    let bin_low = low as f64 + width * i as f64;
                    let bin_high = low as f64 + width * (i + 1) as f64;
                    println!("  [{:8.1}, {:8.1})  {}", bin_low, bin_high, count);
                }
            }
        }

        Command::Links {
            corpus,
            needle,
            min_matches,
        } => {
            let loaded = load_corpus(&corpus)?;
            let total = stats::count_utterances_containing(&loaded, &needle);
            println!("Utterances containing {:?}: {}", needle, total);

            match stats::find_conversation_with_matches(&loaded, &needle, min_matches) {
                Some(conv) => {
                    println!(
                        "First conversation with >= {} matches: {}\n",
                        min_matches, conv.id
                    );
                    print!("{}", render_conversation(conv, None)?);
                }
                None => {
                    println!("No conversation has >= {} matching utterances", min_matches)
                }
            }
        }
    }

    Ok(())
}
