//! Integration tests for batched statistics aggregation.

mod common;

use common::RecordingStore;
use phalanx::corpus::{Dependency, Document, DocumentCount, Sentence, TaggedWord};
use phalanx::error::Result;
use phalanx::stats::{Statistic, StatisticsAggregator};
use phalanx::store::CorpusStore;

fn words(text: &str) -> Vec<TaggedWord> {
    text.split_whitespace()
        .map(|w| TaggedWord::new(w, w.to_lowercase(), "NN"))
        .collect()
}

/// Store holding one parsed document per entry of `documents`, each a list
/// of sentences.
fn parsed_store(documents: &[&[&str]]) -> Result<RecordingStore> {
    let store = RecordingStore::new();
    for (position, sentences) in documents.iter().enumerate() {
        let id = store.create_new_document(Document::new("a.jsonl", position as u64, ""), 1)?;
        let mut document = store.get_document(id)?;
        document.sentences = sentences
            .iter()
            .map(|text| {
                let tagged = words(text);
                let dependencies = (1..tagged.len())
                    .map(|i| Dependency::new("obj", i - 1, i))
                    .collect();
                Sentence::new(id, *text, tagged).with_dependencies(dependencies)
            })
            .collect();
        store.save_document(document)?;
    }
    store.finish_grammatical_processing()?;
    store.clear_calls();
    Ok(store)
}

#[test]
fn test_nine_rows_with_interval_four_commit_three_times() -> Result<()> {
    let store = parsed_store(&[&["one two three four five six seven eight nine"]])?;

    let written = StatisticsAggregator::new(4)?.count_words(&store)?;

    assert_eq!(written, 9);
    assert_eq!(store.count("set_word_count"), 9);
    assert_eq!(store.count("commit"), 3);

    // Commits come after the 4th and 8th record, then once for the rest.
    let calls = store.calls();
    let commits: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, call)| *call == "commit")
        .map(|(index, _)| index)
        .collect();
    assert_eq!(commits, vec![5, 10, 12]);

    Ok(())
}

#[test]
fn test_exact_multiple_has_no_trailing_commit() -> Result<()> {
    let store = parsed_store(&[&["one two three four five six seven eight"]])?;
    StatisticsAggregator::new(4)?.count_words(&store)?;
    assert_eq!(store.count("commit"), 2);
    Ok(())
}

#[test]
fn test_no_rows_no_commits() -> Result<()> {
    let store = parsed_store(&[])?;
    assert_eq!(StatisticsAggregator::new(4)?.count_words(&store)?, 0);
    assert_eq!(store.count("commit"), 0);
    Ok(())
}

#[test]
fn test_word_counts_are_overwritten_on_rerun() -> Result<()> {
    let store = parsed_store(&[&["cat sat", "cat ran"], &["cat slept"]])?;
    let aggregator = StatisticsAggregator::new(10)?;

    aggregator.count_words(&store)?;
    aggregator.count_words(&store)?;

    let cat = store.inner.word_id("cat", "cat", "NN").unwrap();
    let count = store.inner.word_count(cat).unwrap();
    assert_eq!(count.document_count, 2);
    assert_eq!(count.sentence_count, 3);

    Ok(())
}

#[test]
fn test_document_counts() -> Result<()> {
    let store = parsed_store(&[&["a b", "c d", "e f"], &["g h"]])?;

    let written = StatisticsAggregator::new(1)?.count_documents(&store)?;

    assert_eq!(written, 2);
    assert_eq!(store.count("commit"), 2);
    assert_eq!(
        store.inner.document_count(0),
        Some(DocumentCount { sentence_count: 3 })
    );
    assert_eq!(
        store.inner.document_count(1),
        Some(DocumentCount { sentence_count: 1 })
    );

    Ok(())
}

#[test]
fn test_dependency_and_bigram_counts() -> Result<()> {
    let store = parsed_store(&[&["big whale big whale"], &["big whale"]])?;
    let aggregator = StatisticsAggregator::new(100)?;

    aggregator.count_dependencies(&store)?;
    aggregator.count_bigrams(&store)?;

    let big = store.inner.word_id("big", "big", "NN").unwrap();
    let whale = store.inner.word_id("whale", "whale", "NN").unwrap();

    let bigram = store.inner.bigram_count(big, whale).unwrap();
    assert_eq!(bigram.frequency, 3);
    assert_eq!(bigram.sentence_count, 2);

    // obj(big, whale) occurs in both documents.
    let count = store.inner.dependency_count(0).unwrap();
    assert_eq!(count.document_count, 2);
    assert_eq!(count.sentence_count, 2);

    Ok(())
}

#[test]
fn test_tfidf_scores() -> Result<()> {
    let store = parsed_store(&[&["whale whale sea"], &["sea ship"]])?;

    StatisticsAggregator::new(3)?.calculate_tfidfs(&store)?;

    let whale = store.inner.word_id("whale", "whale", "NN").unwrap();
    let sea = store.inner.word_id("sea", "sea", "NN").unwrap();
    let whale_score = store.inner.tfidf(whale, 0).unwrap();
    assert!((whale_score - 2.0 * 2f64.ln()).abs() < 1e-9);
    assert_eq!(store.inner.tfidf(sea, 0), Some(0.0));
    assert_eq!(store.inner.tfidf(sea, 1), Some(0.0));

    Ok(())
}

#[test]
fn test_lin_similarity_pairs_words_sharing_contexts() -> Result<()> {
    let store = parsed_store(&[
        &["hunt whale", "hunt seal", "eat fish", "eat seal"],
        &["hunt whale", "sail ship"],
    ])?;

    let stored = StatisticsAggregator::new(2)?.calculate_lin_similarities(&store)?;
    assert!(stored > 0);

    let hunt = store.inner.word_id("hunt", "hunt", "NN").unwrap();
    let eat = store.inner.word_id("eat", "eat", "NN").unwrap();
    let sail = store.inner.word_id("sail", "sail", "NN").unwrap();

    let score = store.inner.similarity(hunt, eat).unwrap();
    assert!(score > 0.0 && score <= 1.0);
    assert_eq!(store.inner.similarity(eat, hunt), Some(score));
    assert_eq!(store.inner.similarity(hunt, sail), None);

    Ok(())
}

#[test]
fn test_min_similarity_filters_scores() -> Result<()> {
    let store = parsed_store(&[&["hunt whale", "hunt seal", "eat fish", "eat seal"]])?;

    let stored = StatisticsAggregator::new(2)?
        .with_min_similarity(1.0)
        .calculate_lin_similarities(&store)?;

    assert_eq!(stored, 0);
    assert_eq!(store.count("set_similarity"), 0);

    Ok(())
}

#[test]
fn test_run_dispatches_every_statistic() -> Result<()> {
    let store = parsed_store(&[&["hunt whale", "hunt seal"], &["eat seal"]])?;
    let aggregator = StatisticsAggregator::new(5)?;

    for statistic in Statistic::ALL {
        aggregator.run(statistic, &store)?;
    }

    assert!(store.count("set_word_count") > 0);
    assert!(store.count("set_dependency_count") > 0);
    assert_eq!(store.count("set_document_count"), 2);
    assert!(store.count("set_bigram_count") > 0);
    assert!(store.count("set_tfidf") > 0);
    assert_eq!(store.count("feature_rows"), 1);

    Ok(())
}
