//! Snapshot-committed corpus database.
//!
//! All tables live in memory behind a single lock. A commit serializes the
//! whole table set with bincode and replaces the snapshot file atomically,
//! so after a crash the database reopens at exactly its last commit.
//!
//! Every commit costs a write of the full corpus. The parse stage commits
//! once per document, so its total output grows quadratically with the
//! number of documents; a commit with no changes since the previous one
//! writes nothing.
//!
//! Snapshot layout:
//! ```text
//! [magic "PHCS"][version u8 major, u8 minor][bincode(CorpusTables)]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ahash::AHashSet;
use log::{debug, info};
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::corpus::{
    BigramCount, DependencyCount, DependencyId, Document, DocumentCount, DocumentId, Sentence,
    SentenceId, Sequence, WordCount, WordId,
};
use crate::error::{PhalanxError, Result};
use crate::storage::{Storage, read_all, write_atomic};
use crate::store::{
    BigramRow, CorpusStore, Feature, FeatureRow, OccurrenceRow, TermFrequencyRow,
};

/// Name of the snapshot file inside the storage.
pub const CORPUS_SNAPSHOT_FILE: &str = "corpus.bin";

const SNAPSHOT_MAGIC: &[u8; 4] = b"PHCS";
const SNAPSHOT_VERSION: [u8; 2] = [1, 0];

/// A vocabulary entry: one distinct (word, lemma, tag) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: WordId,
    pub word: String,
    pub lemma: String,
    pub tag: String,
}

/// One distinct relation between two vocabulary entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub id: DependencyId,
    pub relation: String,
    pub governor: WordId,
    pub dependent: WordId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct WordOccurrence {
    word_id: WordId,
    sentence_id: SentenceId,
    document_id: DocumentId,
    position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DependencyOccurrence {
    dependency_id: DependencyId,
    sentence_id: SentenceId,
    document_id: DocumentId,
}

/// Number of sentences and documents a phrase was indexed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseCount {
    pub sentence_count: u64,
    pub document_count: u64,
}

/// Row counts of the main tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusSummary {
    pub documents: usize,
    pub sentences: usize,
    pub vocabulary: usize,
    pub dependencies: usize,
    pub indexed_sentences: usize,
    pub sequences: usize,
    pub phrases: usize,
    pub tfidfs: usize,
    pub similarities: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CorpusTables {
    documents: BTreeMap<DocumentId, Document>,
    next_document_id: DocumentId,
    sentence_documents: BTreeMap<SentenceId, DocumentId>,
    next_sentence_id: SentenceId,
    /// Name of every fully extracted collection file, by file number.
    extracted_files: BTreeMap<u64, String>,

    vocabulary: BTreeMap<WordId, VocabularyEntry>,
    word_ids: BTreeMap<(String, String, String), WordId>,
    word_occurrences: Vec<WordOccurrence>,
    dependencies: BTreeMap<DependencyId, DependencyEntry>,
    dependency_ids: BTreeMap<(String, WordId, WordId), DependencyId>,
    dependency_occurrences: Vec<DependencyOccurrence>,

    sequences: BTreeMap<SentenceId, Vec<Sequence>>,
    phrases: BTreeMap<(bool, String), PhraseCount>,

    word_counts: BTreeMap<WordId, WordCount>,
    dependency_counts: BTreeMap<DependencyId, DependencyCount>,
    document_counts: BTreeMap<DocumentId, DocumentCount>,
    bigram_counts: BTreeMap<(WordId, WordId), BigramCount>,
    tfidfs: BTreeMap<(WordId, DocumentId), f64>,
    similarities: BTreeMap<(WordId, WordId), f64>,
}

impl CorpusTables {
    fn intern_word(&mut self, word: &str, lemma: &str, tag: &str) -> WordId {
        let key = (word.to_string(), lemma.to_string(), tag.to_string());
        if let Some(&id) = self.word_ids.get(&key) {
            return id;
        }
        let id = self.vocabulary.len() as WordId;
        self.vocabulary.insert(
            id,
            VocabularyEntry {
                id,
                word: key.0.clone(),
                lemma: key.1.clone(),
                tag: key.2.clone(),
            },
        );
        self.word_ids.insert(key, id);
        id
    }

    fn intern_dependency(&mut self, relation: &str, governor: WordId, dependent: WordId) -> DependencyId {
        let key = (relation.to_string(), governor, dependent);
        if let Some(&id) = self.dependency_ids.get(&key) {
            return id;
        }
        let id = self.dependencies.len() as DependencyId;
        self.dependencies.insert(
            id,
            DependencyEntry {
                id,
                relation: key.0.clone(),
                governor,
                dependent,
            },
        );
        self.dependency_ids.insert(key, id);
        id
    }

    fn sentence(&self, id: SentenceId) -> Result<&Sentence> {
        let document_id = self
            .sentence_documents
            .get(&id)
            .ok_or_else(|| PhalanxError::not_found(format!("sentence {id}")))?;
        self.documents
            .get(document_id)
            .and_then(|document| document.sentences.iter().find(|s| s.id == id))
            .ok_or_else(|| PhalanxError::not_found(format!("sentence {id}")))
    }

    fn remove_sentences_of(&mut self, document: &Document) {
        for sentence in &document.sentences {
            self.sentence_documents.remove(&sentence.id);
            self.sequences.remove(&sentence.id);
        }
    }
}

/// [`CorpusStore`] over a [`Storage`] snapshot file.
#[derive(Debug)]
pub struct CorpusDatabase {
    storage: Arc<dyn Storage>,
    tables: RwLock<CorpusTables>,
    dirty: AtomicBool,
    commits: AtomicU64,
}

impl CorpusDatabase {
    /// Open the database, loading the last committed snapshot if one exists.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        let tables = if storage.file_exists(CORPUS_SNAPSHOT_FILE) {
            let tables = Self::decode_snapshot(&read_all(storage.as_ref(), CORPUS_SNAPSHOT_FILE)?)?;
            info!(
                "Loaded corpus snapshot: {} documents, {} sentences",
                tables.documents.len(),
                tables.sentence_documents.len()
            );
            tables
        } else {
            CorpusTables::default()
        };

        Ok(CorpusDatabase {
            storage,
            tables: RwLock::new(tables),
            dirty: AtomicBool::new(false),
            commits: AtomicU64::new(0),
        })
    }

    fn encode_snapshot(tables: &CorpusTables) -> Result<Vec<u8>> {
        let payload = bincode::serde::encode_to_vec(tables, bincode::config::standard())
            .map_err(|e| PhalanxError::serialization(format!("Failed to encode corpus: {e}")))?;

        let mut bytes = Vec::with_capacity(payload.len() + 6);
        bytes.extend_from_slice(SNAPSHOT_MAGIC);
        bytes.extend_from_slice(&SNAPSHOT_VERSION);
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    fn decode_snapshot(bytes: &[u8]) -> Result<CorpusTables> {
        if bytes.len() < 6 || &bytes[..4] != SNAPSHOT_MAGIC {
            return Err(PhalanxError::storage("Invalid corpus snapshot format"));
        }
        if bytes[4] != SNAPSHOT_VERSION[0] {
            return Err(PhalanxError::storage(format!(
                "Unsupported corpus snapshot version: {}.{}",
                bytes[4], bytes[5]
            )));
        }

        let (tables, _): (CorpusTables, _) =
            bincode::serde::decode_from_slice(&bytes[6..], bincode::config::standard()).map_err(
                |e| PhalanxError::serialization(format!("Failed to decode corpus: {e}")),
            )?;
        Ok(tables)
    }

    /// Lock the tables for writing and mark them uncommitted.
    fn tables_mut(&self) -> RwLockWriteGuard<'_, CorpusTables> {
        let guard = self.tables.write();
        self.dirty.store(true, Ordering::SeqCst);
        guard
    }

    /// Number of snapshots written through this handle.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn summary(&self) -> CorpusSummary {
        let tables = self.tables.read();
        CorpusSummary {
            documents: tables.documents.len(),
            sentences: tables.sentence_documents.len(),
            vocabulary: tables.vocabulary.len(),
            dependencies: tables.dependencies.len(),
            indexed_sentences: tables.sequences.len(),
            sequences: tables.sequences.values().map(Vec::len).sum(),
            phrases: tables.phrases.len(),
            tfidfs: tables.tfidfs.len(),
            similarities: tables.similarities.len(),
        }
    }

    pub fn vocabulary_entry(&self, id: WordId) -> Option<VocabularyEntry> {
        self.tables.read().vocabulary.get(&id).cloned()
    }

    /// Look up the id of a (word, lemma, tag) triple.
    pub fn word_id(&self, word: &str, lemma: &str, tag: &str) -> Option<WordId> {
        let key = (word.to_string(), lemma.to_string(), tag.to_string());
        self.tables.read().word_ids.get(&key).copied()
    }

    pub fn dependency_entry(&self, id: DependencyId) -> Option<DependencyEntry> {
        self.tables.read().dependencies.get(&id).cloned()
    }

    pub fn sequences_of(&self, sentence_id: SentenceId) -> Vec<Sequence> {
        self.tables
            .read()
            .sequences
            .get(&sentence_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn phrase_count(&self, phrase: &str, lemmatized: bool) -> Option<PhraseCount> {
        self.tables
            .read()
            .phrases
            .get(&(lemmatized, phrase.to_string()))
            .copied()
    }

    pub fn word_count(&self, id: WordId) -> Option<WordCount> {
        self.tables.read().word_counts.get(&id).copied()
    }

    pub fn dependency_count(&self, id: DependencyId) -> Option<DependencyCount> {
        self.tables.read().dependency_counts.get(&id).copied()
    }

    pub fn document_count(&self, id: DocumentId) -> Option<DocumentCount> {
        self.tables.read().document_counts.get(&id).copied()
    }

    pub fn bigram_count(&self, first: WordId, second: WordId) -> Option<BigramCount> {
        self.tables.read().bigram_counts.get(&(first, second)).copied()
    }

    pub fn tfidf(&self, word_id: WordId, document_id: DocumentId) -> Option<f64> {
        self.tables.read().tfidfs.get(&(word_id, document_id)).copied()
    }

    /// Similarity of two words, in either order.
    pub fn similarity(&self, first: WordId, second: WordId) -> Option<f64> {
        let key = if first <= second { (first, second) } else { (second, first) };
        self.tables.read().similarities.get(&key).copied()
    }

    /// The `limit` most similar words to `word_id`, best first.
    pub fn most_similar(&self, word_id: WordId, limit: usize) -> Vec<(WordId, f64)> {
        let tables = self.tables.read();
        let mut similar: Vec<(WordId, f64)> = tables
            .similarities
            .iter()
            .filter_map(|(&(a, b), &score)| {
                if a == word_id {
                    Some((b, score))
                } else if b == word_id {
                    Some((a, score))
                } else {
                    None
                }
            })
            .collect();
        similar.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));
        similar.truncate(limit);
        similar
    }
}

impl CorpusStore for CorpusDatabase {
    fn create_new_document(
        &self,
        mut document: Document,
        file_sequence_number: u64,
    ) -> Result<DocumentId> {
        let mut tables = self.tables_mut();
        let id = tables.next_document_id;
        tables.next_document_id += 1;

        document.id = id;
        document.file_sequence_number = file_sequence_number;
        for sentence in &mut document.sentences {
            sentence.document_id = id;
        }
        tables.documents.insert(id, document);
        Ok(id)
    }

    fn discard_partial_file(&self, file_sequence_number: u64) -> Result<usize> {
        let mut tables = self.tables_mut();
        let partial: Vec<DocumentId> = tables
            .documents
            .values()
            .filter(|document| document.file_sequence_number == file_sequence_number)
            .map(|document| document.id)
            .collect();

        for id in &partial {
            if let Some(document) = tables.documents.remove(id) {
                tables.remove_sentences_of(&document);
            }
        }
        tables.extracted_files.remove(&file_sequence_number);
        if !partial.is_empty() {
            debug!(
                "Discarded {} documents of file {file_sequence_number}",
                partial.len()
            );
        }
        Ok(partial.len())
    }

    fn record_extracted_file(&self, file_sequence_number: u64, file_name: &str) -> Result<()> {
        self.tables_mut()
            .extracted_files
            .insert(file_sequence_number, file_name.to_string());
        Ok(())
    }

    fn extracted_files(&self) -> Result<BTreeMap<u64, String>> {
        Ok(self.tables.read().extracted_files.clone())
    }

    fn list_document_ids(&self) -> Result<Vec<DocumentId>> {
        Ok(self.tables.read().documents.keys().copied().collect())
    }

    fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.tables
            .read()
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| PhalanxError::not_found(format!("document {id}")))
    }

    fn save_document(&self, mut document: Document) -> Result<()> {
        let mut tables = self.tables_mut();
        let previous = tables
            .documents
            .remove(&document.id)
            .ok_or_else(|| PhalanxError::not_found(format!("document {}", document.id)))?;
        tables.remove_sentences_of(&previous);

        for sentence in &mut document.sentences {
            sentence.id = tables.next_sentence_id;
            sentence.document_id = document.id;
            tables.next_sentence_id += 1;
            tables.sentence_documents.insert(sentence.id, document.id);
        }
        tables.documents.insert(document.id, document);
        Ok(())
    }

    fn finish_grammatical_processing(&self) -> Result<()> {
        let mut guard = self.tables_mut();
        let tables = &mut *guard;
        let documents = std::mem::take(&mut tables.documents);

        tables.word_occurrences.clear();
        tables.dependency_occurrences.clear();

        let mut result = Ok(());
        'documents: for document in documents.values() {
            for sentence in &document.sentences {
                let word_ids: Vec<WordId> = sentence
                    .tagged
                    .iter()
                    .map(|w| tables.intern_word(&w.word, &w.lemma, &w.tag))
                    .collect();

                for (position, &word_id) in word_ids.iter().enumerate() {
                    tables.word_occurrences.push(WordOccurrence {
                        word_id,
                        sentence_id: sentence.id,
                        document_id: document.id,
                        position,
                    });
                }

                for dependency in &sentence.dependencies {
                    let (Some(&governor), Some(&dependent)) = (
                        word_ids.get(dependency.governor),
                        word_ids.get(dependency.dependent),
                    ) else {
                        result = Err(PhalanxError::parse(format!(
                            "Dependency '{}' of sentence {} points outside the sentence",
                            dependency.relation, sentence.id
                        )));
                        break 'documents;
                    };
                    let dependency_id =
                        tables.intern_dependency(&dependency.relation, governor, dependent);
                    tables.dependency_occurrences.push(DependencyOccurrence {
                        dependency_id,
                        sentence_id: sentence.id,
                        document_id: document.id,
                    });
                }
            }
        }

        tables.documents = documents;
        result?;

        info!(
            "Built vocabulary of {} words and {} dependencies",
            tables.vocabulary.len(),
            tables.dependencies.len()
        );
        Ok(())
    }

    fn list_unindexed_sentence_ids(&self) -> Result<Vec<SentenceId>> {
        let tables = self.tables.read();
        Ok(tables
            .sentence_documents
            .keys()
            .filter(|id| !tables.sequences.contains_key(id))
            .copied()
            .collect())
    }

    fn get_sentence(&self, id: SentenceId) -> Result<Sentence> {
        self.tables.read().sentence(id).cloned()
    }

    fn index_sequences(&self, sentence_id: SentenceId, sequences: Vec<Sequence>) -> Result<()> {
        let mut tables = self.tables_mut();
        if !tables.sentence_documents.contains_key(&sentence_id) {
            return Err(PhalanxError::not_found(format!("sentence {sentence_id}")));
        }
        tables.sequences.insert(sentence_id, sequences);
        Ok(())
    }

    fn finish_indexing_sequences(&self) -> Result<()> {
        let mut tables = self.tables_mut();

        let mut sentences: BTreeMap<(bool, String), u64> = BTreeMap::new();
        let mut documents: BTreeMap<(bool, String), BTreeSet<DocumentId>> = BTreeMap::new();
        for sequences in tables.sequences.values() {
            let distinct: BTreeSet<(bool, &str, DocumentId)> = sequences
                .iter()
                .map(|s| (s.is_lemmatized, s.sequence.as_str(), s.document_id))
                .collect();
            for (lemmatized, phrase, document_id) in distinct {
                let key = (lemmatized, phrase.to_string());
                *sentences.entry(key.clone()).or_default() += 1;
                documents.entry(key).or_default().insert(document_id);
            }
        }

        tables.phrases = sentences
            .into_iter()
            .map(|(key, sentence_count)| {
                let document_count = documents.get(&key).map_or(0, |d| d.len() as u64);
                (
                    key,
                    PhraseCount {
                        sentence_count,
                        document_count,
                    },
                )
            })
            .collect();

        info!("Indexed {} distinct phrases", tables.phrases.len());
        Ok(())
    }

    fn word_rows(&self) -> Result<Vec<OccurrenceRow>> {
        let tables = self.tables.read();
        let mut grouped: BTreeMap<WordId, (AHashSet<DocumentId>, AHashSet<SentenceId>)> =
            BTreeMap::new();
        for occurrence in &tables.word_occurrences {
            let entry = grouped.entry(occurrence.word_id).or_default();
            entry.0.insert(occurrence.document_id);
            entry.1.insert(occurrence.sentence_id);
        }
        Ok(occurrence_rows(grouped))
    }

    fn set_word_count(&self, id: WordId, count: WordCount) -> Result<()> {
        self.tables_mut().word_counts.insert(id, count);
        Ok(())
    }

    fn dependency_rows(&self) -> Result<Vec<OccurrenceRow>> {
        let tables = self.tables.read();
        let mut grouped: BTreeMap<DependencyId, (AHashSet<DocumentId>, AHashSet<SentenceId>)> =
            BTreeMap::new();
        for occurrence in &tables.dependency_occurrences {
            let entry = grouped.entry(occurrence.dependency_id).or_default();
            entry.0.insert(occurrence.document_id);
            entry.1.insert(occurrence.sentence_id);
        }
        Ok(occurrence_rows(grouped))
    }

    fn set_dependency_count(&self, id: DependencyId, count: DependencyCount) -> Result<()> {
        self.tables_mut().dependency_counts.insert(id, count);
        Ok(())
    }

    fn set_document_count(&self, id: DocumentId, count: DocumentCount) -> Result<()> {
        let mut tables = self.tables_mut();
        if !tables.documents.contains_key(&id) {
            return Err(PhalanxError::not_found(format!("document {id}")));
        }
        tables.document_counts.insert(id, count);
        Ok(())
    }

    fn bigram_rows(&self) -> Result<Vec<BigramRow>> {
        let tables = self.tables.read();

        let mut by_sentence: BTreeMap<SentenceId, Vec<(usize, WordId)>> = BTreeMap::new();
        for occurrence in &tables.word_occurrences {
            by_sentence
                .entry(occurrence.sentence_id)
                .or_default()
                .push((occurrence.position, occurrence.word_id));
        }

        let mut grouped: BTreeMap<(WordId, WordId), (u64, u64)> = BTreeMap::new();
        for words in by_sentence.values_mut() {
            words.sort_unstable();
            let mut seen: AHashSet<(WordId, WordId)> = AHashSet::new();
            for pair in words.windows(2) {
                let key = (pair[0].1, pair[1].1);
                let entry = grouped.entry(key).or_default();
                entry.1 += 1;
                if seen.insert(key) {
                    entry.0 += 1;
                }
            }
        }

        Ok(grouped
            .into_iter()
            .map(|((first, second), (sentence_count, frequency))| BigramRow {
                first,
                second,
                sentence_count,
                frequency,
            })
            .collect())
    }

    fn set_bigram_count(&self, first: WordId, second: WordId, count: BigramCount) -> Result<()> {
        self.tables_mut().bigram_counts.insert((first, second), count);
        Ok(())
    }

    fn term_frequency_rows(&self) -> Result<Vec<TermFrequencyRow>> {
        let tables = self.tables.read();
        let mut grouped: BTreeMap<(WordId, DocumentId), u64> = BTreeMap::new();
        for occurrence in &tables.word_occurrences {
            *grouped
                .entry((occurrence.word_id, occurrence.document_id))
                .or_default() += 1;
        }
        Ok(grouped
            .into_iter()
            .map(|((word_id, document_id), frequency)| TermFrequencyRow {
                word_id,
                document_id,
                frequency,
            })
            .collect())
    }

    fn set_tfidf(&self, word_id: WordId, document_id: DocumentId, score: f64) -> Result<()> {
        self.tables_mut().tfidfs.insert((word_id, document_id), score);
        Ok(())
    }

    fn feature_rows(&self) -> Result<Vec<FeatureRow>> {
        let tables = self.tables.read();
        let mut grouped: BTreeMap<(WordId, Feature), u64> = BTreeMap::new();
        for occurrence in &tables.dependency_occurrences {
            let Some(entry) = tables.dependencies.get(&occurrence.dependency_id) else {
                continue;
            };
            let governed = Feature {
                relation: entry.relation.clone(),
                other: entry.dependent,
                governs: true,
            };
            let governing = Feature {
                relation: entry.relation.clone(),
                other: entry.governor,
                governs: false,
            };
            *grouped.entry((entry.governor, governed)).or_default() += 1;
            *grouped.entry((entry.dependent, governing)).or_default() += 1;
        }
        Ok(grouped
            .into_iter()
            .map(|((word_id, feature), frequency)| FeatureRow {
                word_id,
                feature,
                frequency,
            })
            .collect())
    }

    fn set_similarity(&self, first: WordId, second: WordId, score: f64) -> Result<()> {
        let key = if first <= second { (first, second) } else { (second, first) };
        self.tables_mut().similarities.insert(key, score);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let tables = self.tables.read();
        if !self.dirty.swap(false, Ordering::SeqCst) {
            debug!("No corpus changes to commit");
            return Ok(());
        }
        let bytes = Self::encode_snapshot(&tables)
            .and_then(|bytes| {
                write_atomic(self.storage.as_ref(), CORPUS_SNAPSHOT_FILE, &bytes).map(|()| bytes)
            })
            .inspect_err(|_| self.dirty.store(true, Ordering::SeqCst))?;
        drop(tables);
        let commits = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Committed corpus snapshot #{commits} ({} bytes)", bytes.len());
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        *self.tables.write() = CorpusTables::default();
        self.dirty.store(false, Ordering::SeqCst);
        if self.storage.file_exists(CORPUS_SNAPSHOT_FILE) {
            self.storage.delete_file(CORPUS_SNAPSHOT_FILE)?;
        }
        self.storage.sync()?;
        info!("Corpus reset");
        Ok(())
    }
}

fn occurrence_rows(
    grouped: BTreeMap<u64, (AHashSet<DocumentId>, AHashSet<SentenceId>)>,
) -> Vec<OccurrenceRow> {
    grouped
        .into_iter()
        .map(|(id, (documents, sentences))| OccurrenceRow {
            id,
            document_count: documents.len() as u64,
            sentence_count: sentences.len() as u64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Dependency, TaggedWord};
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn storage() -> Arc<dyn Storage> {
        Arc::new(MemoryStorage::new(MemoryStorageConfig::default()))
    }

    fn tagged(words: &[&str]) -> Vec<TaggedWord> {
        words
            .iter()
            .map(|w| TaggedWord::new(*w, w.to_lowercase(), "WORD"))
            .collect()
    }

    fn parsed(db: &CorpusDatabase, id: DocumentId, sentences: &[&[&str]]) {
        let mut document = db.get_document(id).unwrap();
        document.sentences = sentences
            .iter()
            .map(|words| {
                let dependencies = (1..words.len())
                    .map(|i| Dependency::new("next", i - 1, i))
                    .collect();
                Sentence::new(id, words.join(" "), tagged(words)).with_dependencies(dependencies)
            })
            .collect();
        db.save_document(document).unwrap();
    }

    #[test]
    fn test_create_and_get_document() {
        let db = CorpusDatabase::open(storage()).unwrap();
        let first = db
            .create_new_document(Document::new("a.jsonl", 0, "One."), 1)
            .unwrap();
        let second = db
            .create_new_document(Document::new("a.jsonl", 1, "Two."), 1)
            .unwrap();

        assert_eq!((first, second), (0, 1));
        let document = db.get_document(second).unwrap();
        assert_eq!(document.id, 1);
        assert_eq!(document.file_sequence_number, 1);
        assert_eq!(db.list_document_ids().unwrap(), vec![0, 1]);
        assert!(db.get_document(7).is_err());
    }

    #[test]
    fn test_discard_partial_file() {
        let db = CorpusDatabase::open(storage()).unwrap();
        db.create_new_document(Document::new("a", 0, "x"), 1).unwrap();
        db.create_new_document(Document::new("b", 0, "y"), 2).unwrap();
        db.create_new_document(Document::new("b", 1, "z"), 2).unwrap();

        assert_eq!(db.discard_partial_file(2).unwrap(), 2);
        assert_eq!(db.discard_partial_file(2).unwrap(), 0);
        assert_eq!(db.list_document_ids().unwrap(), vec![0]);
    }

    #[test]
    fn test_save_document_assigns_sentence_ids() {
        let db = CorpusDatabase::open(storage()).unwrap();
        let a = db.create_new_document(Document::new("a", 0, ""), 1).unwrap();
        let b = db.create_new_document(Document::new("a", 1, ""), 1).unwrap();
        parsed(&db, a, &[&["The", "cat"], &["A", "dog"]]);
        parsed(&db, b, &[&["Birds", "fly"]]);

        assert_eq!(db.list_unindexed_sentence_ids().unwrap(), vec![0, 1, 2]);
        let sentence = db.get_sentence(2).unwrap();
        assert_eq!(sentence.document_id, b);
        assert_eq!(sentence.text, "Birds fly");

        // Re-saving replaces the old sentences with fresh ids.
        parsed(&db, a, &[&["Only", "one"]]);
        assert_eq!(db.list_unindexed_sentence_ids().unwrap(), vec![2, 3]);
        assert!(db.get_sentence(0).is_err());
    }

    #[test]
    fn test_uncommitted_changes_are_lost_on_reopen() {
        let storage = storage();
        let db = CorpusDatabase::open(storage.clone()).unwrap();
        db.create_new_document(Document::new("a", 0, "kept"), 1).unwrap();
        db.commit().unwrap();
        db.create_new_document(Document::new("a", 1, "lost"), 1).unwrap();
        assert_eq!(db.commit_count(), 1);

        let reopened = CorpusDatabase::open(storage).unwrap();
        assert_eq!(reopened.list_document_ids().unwrap(), vec![0]);
        assert_eq!(reopened.get_document(0).unwrap().text, "kept");
    }

    #[test]
    fn test_corrupt_snapshot_is_rejected() {
        let storage = storage();
        write_atomic(storage.as_ref(), CORPUS_SNAPSHOT_FILE, b"nope").unwrap();
        assert!(matches!(
            CorpusDatabase::open(storage),
            Err(PhalanxError::Storage(_))
        ));
    }

    #[test]
    fn test_reset_wipes_everything() {
        let storage = storage();
        let db = CorpusDatabase::open(storage.clone()).unwrap();
        db.create_new_document(Document::new("a", 0, "x"), 1).unwrap();
        db.commit().unwrap();

        db.reset().unwrap();
        assert!(db.list_document_ids().unwrap().is_empty());
        assert!(!storage.file_exists(CORPUS_SNAPSHOT_FILE));
        assert_eq!(
            db.create_new_document(Document::new("a", 0, "x"), 1).unwrap(),
            0
        );
    }

    #[test]
    fn test_index_sequences_replaces() {
        let db = CorpusDatabase::open(storage()).unwrap();
        let id = db.create_new_document(Document::new("a", 0, ""), 1).unwrap();
        parsed(&db, id, &[&["cat", "sat"]]);

        let sequence = Sequence {
            start_position: 0,
            sentence_id: 0,
            document_id: id,
            sequence: "cat".to_string(),
            is_lemmatized: false,
            has_function_words: false,
            all_function_words: false,
            words: tagged(&["cat"]),
        };
        db.index_sequences(0, vec![sequence.clone(), sequence.clone()]).unwrap();
        db.index_sequences(0, vec![sequence]).unwrap();

        assert_eq!(db.sequences_of(0).len(), 1);
        assert!(db.list_unindexed_sentence_ids().unwrap().is_empty());
        assert!(db.index_sequences(42, Vec::new()).is_err());

        db.finish_indexing_sequences().unwrap();
        assert_eq!(
            db.phrase_count("cat", false),
            Some(PhraseCount {
                sentence_count: 1,
                document_count: 1
            })
        );
    }

    #[test]
    fn test_statistics_rows() {
        let db = CorpusDatabase::open(storage()).unwrap();
        let a = db.create_new_document(Document::new("a", 0, ""), 1).unwrap();
        let b = db.create_new_document(Document::new("a", 1, ""), 1).unwrap();
        parsed(&db, a, &[&["cat", "sat", "cat", "sat"], &["cat"]]);
        parsed(&db, b, &[&["dog", "sat"]]);
        db.finish_grammatical_processing().unwrap();

        let cat = db.word_id("cat", "cat", "WORD").unwrap();
        let sat = db.word_id("sat", "sat", "WORD").unwrap();
        let dog = db.word_id("dog", "dog", "WORD").unwrap();

        let words = db.word_rows().unwrap();
        assert_eq!(words.len(), 3);
        let sat_row = words.iter().find(|r| r.id == sat).unwrap();
        assert_eq!((sat_row.document_count, sat_row.sentence_count), (2, 2));
        let cat_row = words.iter().find(|r| r.id == cat).unwrap();
        assert_eq!((cat_row.document_count, cat_row.sentence_count), (1, 2));

        let bigrams = db.bigram_rows().unwrap();
        let cat_sat = bigrams
            .iter()
            .find(|r| (r.first, r.second) == (cat, sat))
            .unwrap();
        assert_eq!((cat_sat.sentence_count, cat_sat.frequency), (1, 2));
        assert!(bigrams.iter().any(|r| (r.first, r.second) == (dog, sat)));

        let frequencies = db.term_frequency_rows().unwrap();
        let cat_in_a = frequencies
            .iter()
            .find(|r| r.word_id == cat && r.document_id == a)
            .unwrap();
        assert_eq!(cat_in_a.frequency, 3);

        let features = db.feature_rows().unwrap();
        assert!(features.iter().any(|r| r.word_id == dog
            && r.feature
                == Feature {
                    relation: "next".to_string(),
                    other: sat,
                    governs: true
                }));

        let dependencies = db.dependency_rows().unwrap();
        assert_eq!(dependencies.len(), 3);
    }

    #[test]
    fn test_dependency_out_of_range_is_parse_error() {
        let db = CorpusDatabase::open(storage()).unwrap();
        let id = db.create_new_document(Document::new("a", 0, ""), 1).unwrap();
        let mut document = db.get_document(id).unwrap();
        document.sentences = vec![
            Sentence::new(id, "cat", tagged(&["cat"]))
                .with_dependencies(vec![Dependency::new("bad", 0, 3)]),
        ];
        db.save_document(document).unwrap();

        assert!(matches!(
            db.finish_grammatical_processing(),
            Err(PhalanxError::Parse(_))
        ));
        assert_eq!(db.list_document_ids().unwrap(), vec![id]);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let db = CorpusDatabase::open(storage()).unwrap();
        db.set_similarity(5, 2, 0.5).unwrap();
        db.set_similarity(2, 9, 0.25).unwrap();

        assert_eq!(db.similarity(2, 5), Some(0.5));
        assert_eq!(db.similarity(5, 2), Some(0.5));
        assert_eq!(db.most_similar(2, 10), vec![(5, 0.5), (9, 0.25)]);
    }

    #[test]
    fn test_commit_without_changes_writes_nothing() {
        let storage = storage();
        let db = CorpusDatabase::open(storage.clone()).unwrap();

        db.commit().unwrap();
        assert!(!storage.file_exists(CORPUS_SNAPSHOT_FILE));

        db.create_new_document(Document::new("a", 0, "x"), 1).unwrap();
        db.commit().unwrap();
        db.commit().unwrap();
        assert_eq!(db.commit_count(), 1);

        db.set_tfidf(0, 0, 1.5).unwrap();
        db.commit().unwrap();
        assert_eq!(db.commit_count(), 2);
        assert_eq!(CorpusDatabase::open(storage).unwrap().tfidf(0, 0), Some(1.5));
    }

    #[test]
    fn test_extracted_files_survive_commit_and_discard() {
        let storage = storage();
        let db = CorpusDatabase::open(storage.clone()).unwrap();
        db.record_extracted_file(1, "a.jsonl").unwrap();
        db.create_new_document(Document::new("b.jsonl", 0, "y"), 2).unwrap();
        db.record_extracted_file(2, "b.jsonl").unwrap();
        db.commit().unwrap();

        let reopened = CorpusDatabase::open(storage).unwrap();
        assert_eq!(
            reopened.extracted_files().unwrap(),
            BTreeMap::from([(1, "a.jsonl".to_string()), (2, "b.jsonl".to_string())])
        );

        reopened.discard_partial_file(2).unwrap();
        assert_eq!(
            reopened.extracted_files().unwrap().into_keys().collect::<Vec<_>>(),
            vec![1]
        );
    }
}
