/// End-to-end integration tests for the kbrag pipeline.
///
/// Tests the complete flow:
///   Config → App → Ingest → Persist → Reopen → Ask → Catalog
use kbrag::answer::{AnswerGenerator, FALLBACK_ANSWER};
use kbrag::app::App;
use kbrag::chunker::Chunker;
use kbrag::config::{Config, Provider};
use kbrag::embedder::Embedder;
use kbrag::embedder::mock::MockEmbedder;
use kbrag::generator::mock::MockModel;
use kbrag::ingest::{Ingestor, UploadedFile};
use kbrag::store::VectorStore;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn sample_text(len: usize) -> String {
    let mut text = String::new();
    let mut i = 0;
    while text.chars().count() < len {
        text.push_str(&format!("Sentence {i} describes the knowledge base. "));
        i += 1;
    }
    text.chars().take(len).collect()
}

fn test_config(root: &Path) -> Config {
    Config {
        provider: Provider::Mock,
        upload_dir: root.join("uploads").to_string_lossy().into_owned(),
        store_dir: root.join("vector_store").to_string_lossy().into_owned(),
        documents_dir: root.join("docs").to_string_lossy().into_owned(),
        ..Config::default()
    }
}

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(MockEmbedder::new(64))
}

/// Full pipeline: ingest a 2500-char file, ask about a sentence in chunk 2
#[test]
fn test_full_pipeline() {
    let root = tempdir().unwrap();
    let store = Arc::new(VectorStore::open(root.path().join("store"), embedder()).unwrap());
    let ingestor = Ingestor::new(store.clone(), Chunker::default(), root.path().join("uploads"));

    let text = sample_text(2500);
    let report = ingestor
        .ingest(&[UploadedFile::new("notes.txt", text.clone().into_bytes())])
        .unwrap();
    assert_eq!(report.chunks, 3, "2500 chars at 1000/200 should give 3 chunks");

    // Chunk 2 covers characters 800..1800; chunk 1 ends at 1000 and chunk 3
    // starts at 1600, so this sentence appears in chunk 2 only.
    let question = "Sentence 25 describes the knowledge base.";
    let at = text.find(question).expect("sentence present in sample text");
    assert!(at >= 1000 && at + question.len() <= 1600, "sentence at {at}");

    let results = store.retrieve(question, 4).unwrap();
    assert_eq!(results.len(), 3);
    let hit = results
        .iter()
        .find(|r| r.position == 1)
        .expect("chunk 2 should be retrieved");
    assert_eq!(hit.char_offset, 800);
    assert_eq!(hit.content, text.chars().skip(800).take(1000).collect::<String>());
    assert!(hit.content.contains(question));
    assert_eq!(results.iter().filter(|r| r.content.contains(question)).count(), 1);
    assert!(results.iter().all(|r| r.metadata.source == "notes.txt"));

    let offsets: Vec<usize> = {
        let mut o: Vec<usize> = results.iter().map(|r| r.char_offset).collect();
        o.sort_unstable();
        o
    };
    assert_eq!(offsets, vec![0, 800, 1600]);

    let model = Arc::new(MockModel::replying("From the notes."));
    let generator = AnswerGenerator::new(store, model.clone());
    assert_eq!(generator.answer(question).unwrap(), "From the notes.");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&format!("Question: {question}")));
    // The prompt context carries chunk 2, which holds the sentence again.
    assert_eq!(prompts[0].matches(question).count(), 2);
}

/// Persist, drop, reopen: same results for the same query.
#[test]
fn test_persist_reopen_round_trip() {
    let root = tempdir().unwrap();
    let store_dir = root.path().join("store");
    let query = "Sentence 3 describes the knowledge base.";

    let before = {
        let store = Arc::new(VectorStore::open(&store_dir, embedder()).unwrap());
        let ingestor = Ingestor::new(store.clone(), Chunker::default(), root.path().join("up"));
        ingestor
            .ingest(&[
                UploadedFile::new("a.txt", sample_text(1500).into_bytes()),
                UploadedFile::new("b.txt", sample_text(300).into_bytes()),
            ])
            .unwrap();
        store.persist().unwrap();
        store.persist().unwrap();
        store.retrieve(query, 4).unwrap()
    };

    let store = VectorStore::open(&store_dir, embedder()).unwrap();
    let after = store.retrieve(query, 4).unwrap();
    assert_eq!(before, after);
    assert_eq!(store.len().unwrap(), 3);
}

/// Malformed model output becomes the fallback answer.
#[test]
fn test_malformed_response_fallback() {
    let store = Arc::new(VectorStore::open_in_memory(embedder()).unwrap());
    let generator = AnswerGenerator::new(store, Arc::new(MockModel::malformed()));
    assert_eq!(generator.answer("anything?").unwrap(), FALLBACK_ANSWER);
}

/// Unsupported-only batches succeed with no chunks and leave no staged files.
#[test]
fn test_unsupported_file_batch() {
    let root = tempdir().unwrap();
    let app = App::from_config(test_config(root.path())).unwrap();

    let report = app
        .ingest(&[UploadedFile::new("data.csv", b"id,name\n1,a\n".to_vec())])
        .unwrap();
    assert_eq!(report.chunks, 0);
    assert!(app.store.is_empty().unwrap());

    let uploads = root.path().join("uploads");
    assert!(!uploads.exists() || fs::read_dir(&uploads).unwrap().next().is_none());
}

/// The app archives ingested uploads and lists them in the catalog.
#[test]
fn test_app_archives_and_lists() {
    let root = tempdir().unwrap();
    let app = App::from_config(test_config(root.path())).unwrap();

    app.ingest(&[
        UploadedFile::new("hr-policy_2024.txt", sample_text(400).into_bytes()),
        UploadedFile::new("faq.txt", b"Q: Where? A: Here.".to_vec()),
    ])
    .unwrap();

    let docs = app.documents().unwrap();
    let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Faq", "Hr Policy 2024"]);
    assert!(docs.iter().all(|d| d.file_type == "TXT"));

    let answer = app.ask("Where?").unwrap();
    assert!(answer.starts_with("[mock]"));
}
