use std::path::Path;

use docent_core::bootstrap::{assemble, build_corpus, load_config};
use docent_core::config::{ScopeMode, UnsupportedFiles};
use docent_core::vault::EnvVaultProvider;
use docent_core::{Assistant, Config, NO_DOCUMENTS_REPLY, Reply};
use docent_llm::Role;
use docent_llm::hashing::HashEmbedder;
use docent_llm::mock::MockProvider;
use docent_memory::{Chunker, Degradation, DirectoryLoader, EmbeddingIndex};

// -- Helpers --

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.ingest.documents_dir = dir.to_path_buf();
    config
}

async fn assistant_for(config: &Config, provider: &MockProvider) -> Assistant<MockProvider> {
    assemble(config, provider.clone(), HashEmbedder::default().embed_fn())
        .await
        .unwrap()
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

// -- Degraded startup --

#[tokio::test]
async fn empty_directory_answers_with_fixed_message() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::default();
    let assistant = assistant_for(&config_for(dir.path()), &provider).await;

    let turn = assistant.ask("what is a join?").await;
    assert_eq!(turn.reply, Reply::NoDocuments(NO_DOCUMENTS_REPLY.into()));
    assert_eq!(assistant.documents_loaded(), 0);
    assert!(assistant.index().is_empty());
    assert_eq!(provider.chat_calls(), 0);
}

#[tokio::test]
async fn missing_directory_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir.path().join("nope"));

    let corpus = build_corpus(&config, HashEmbedder::default().embed_fn())
        .await
        .unwrap();
    assert!(corpus.index.is_none());
    assert_eq!(corpus.notice, Some(Degradation::NoDocumentsFound));
}

#[tokio::test]
async fn empty_files_give_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "blank.txt", "");

    let corpus = build_corpus(&config_for(dir.path()), HashEmbedder::default().embed_fn())
        .await
        .unwrap();
    assert_eq!(corpus.documents, 1);
    assert!(corpus.index.is_none());
    assert_eq!(corpus.notice, Some(Degradation::EmptyCorpus));
}

#[tokio::test]
async fn unsupported_files_can_be_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "notes.txt", "SELECT picks columns");
    write(dir.path(), "image.png", "not really a png");

    let mut config = config_for(dir.path());
    let corpus = build_corpus(&config, HashEmbedder::default().embed_fn())
        .await
        .unwrap();
    assert_eq!(corpus.documents, 1);

    config.ingest.unsupported = UnsupportedFiles::Error;
    let result = build_corpus(&config, HashEmbedder::default().embed_fn()).await;
    assert!(result.is_err());
}

// -- Scope filter --

#[tokio::test]
async fn out_of_domain_question_skips_generation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sql.txt", "SELECT picks columns from a table.");

    let mut config = config_for(dir.path());
    config.scope.mode = ScopeMode::Keywords;
    config.scope.keywords = vec!["sql".into(), "select".into()];
    config.scope.refusal = "I only answer SQL questions.".into();

    let provider = MockProvider::with_responses(vec!["SELECT reads rows.".into()]);
    let assistant = assistant_for(&config, &provider).await;

    let turn = assistant.ask("Best pizza in town?").await;
    assert_eq!(
        turn.reply,
        Reply::OutOfDomain("I only answer SQL questions.".into())
    );
    assert_eq!(provider.chat_calls(), 0);

    let turn = assistant.ask("What does SELECT do?").await;
    assert_eq!(turn.reply, Reply::Answer("SELECT reads rows.".into()));
    assert_eq!(provider.chat_calls(), 1);
}

// -- Chunking and retrieval --

#[tokio::test]
async fn long_document_splits_into_overlapping_windows() {
    let dir = tempfile::tempdir().unwrap();
    let text: String = ('a'..='z').cycle().take(1200).collect();
    write(dir.path(), "long.txt", &text);

    let outcome = DirectoryLoader::default().load(dir.path()).await.unwrap();
    let chunks = Chunker::default().split_all(&outcome.documents);

    let starts: Vec<_> = chunks.iter().map(|c| c.start_offset).collect();
    let lens: Vec<_> = chunks.iter().map(|c| c.text.chars().count()).collect();
    assert_eq!(starts, [0, 450, 900]);
    assert_eq!(lens, [500, 500, 300]);

    for pair in chunks.windows(2) {
        let tail: String = pair[0].text.chars().skip(450).collect();
        let head: String = pair[1].text.chars().take(50).collect();
        assert_eq!(tail, head);
    }
    let ids: Vec<_> = chunks.iter().map(|c| c.id).collect();
    assert_eq!(ids, [0, 1, 2]);
}

#[tokio::test]
async fn search_returns_at_most_k_ranked_hits() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", "joins combine rows from two tables");
    write(dir.path(), "b.txt", "indexes speed up lookups on a column");
    write(dir.path(), "c.md", "# Bread\nknead the dough for ten minutes");

    let outcome = DirectoryLoader::default().load(dir.path()).await.unwrap();
    let chunks = Chunker::default().split_all(&outcome.documents);
    let index = EmbeddingIndex::build(chunks, HashEmbedder::default().embed_fn())
        .await
        .unwrap()
        .into_index()
        .unwrap();
    assert_eq!(index.len(), 3);

    for k in [1, 2, 3, 10] {
        let hits = index.search("how do joins combine tables", k).await.unwrap();
        assert_eq!(hits.len(), k.min(3));
        let scores: Vec<f32> = hits.iter().map(|h| h.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    }

    let best = index.search("how do joins combine tables", 1).await.unwrap();
    assert!(best.iter().next().unwrap().chunk.source_path.ends_with("a.txt"));
}

// -- Answer path --

#[tokio::test]
async fn answer_uses_retrieved_context() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sql.txt", "A LEFT JOIN keeps every row of the left table.");

    let provider = MockProvider::with_responses(vec!["It keeps all left rows.".into()]);
    let assistant = assistant_for(&config_for(dir.path()), &provider).await;

    let turn = assistant.ask("What does a LEFT JOIN keep?").await;
    assert_eq!(turn.reply, Reply::Answer("It keeps all left rows.".into()));
    assert_eq!(
        turn.retrieved_context,
        "A LEFT JOIN keeps every row of the left table."
    );

    let seen = provider.seen_messages();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0][0].role, Role::System);
    assert_eq!(seen[0][1].role, Role::User);
    assert!(seen[0][1].content.contains("A LEFT JOIN keeps every row"));
    assert!(seen[0][1].content.contains("What does a LEFT JOIN keep?"));
}

#[tokio::test]
async fn generation_failure_is_reported_as_text() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sql.txt", "GROUP BY folds rows into groups.");

    let provider = MockProvider::failing();
    let assistant = assistant_for(&config_for(dir.path()), &provider).await;

    let turn = assistant.ask("what does group by do").await;
    assert!(matches!(turn.reply, Reply::Failed(_)));
    assert!(turn.reply.to_string().starts_with("Error: "));
}

#[tokio::test]
async fn reindex_picks_up_new_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let provider = MockProvider::with_responses(vec!["ok".into()]);
    let assistant = assistant_for(&config, &provider).await;
    assert!(assistant.index().is_empty());

    write(dir.path(), "new.txt", "HAVING filters groups after aggregation.");
    let chunks = assistant.reindex(&config).await.unwrap();
    assert_eq!(chunks, 1);
    assert_eq!(assistant.documents_loaded(), 1);

    let turn = assistant.ask("what does having filter").await;
    assert!(turn.reply.is_answer());
}

// -- Configuration --

#[tokio::test]
#[serial_test::serial]
async fn config_file_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    write(&docs, "sql.txt", &"x".repeat(250));

    let config_path = dir.path().join("docent.toml");
    std::fs::write(
        &config_path,
        format!(
            "[ingest]\ndocuments_dir = {:?}\n\n[chunking]\nchunk_size = 100\noverlap = 10\n\n[assistant]\ntop_k = 2\n",
            docs.display().to_string()
        ),
    )
    .unwrap();

    unsafe { std::env::set_var("DOCENT_API_KEY", "sk-integration") };
    let config = load_config(&config_path, &EnvVaultProvider).await;
    unsafe { std::env::remove_var("DOCENT_API_KEY") };
    let config = config.unwrap();

    assert_eq!(config.assistant.top_k, 2);
    assert_eq!(config.api_key().unwrap().expose(), "sk-integration");

    let corpus = build_corpus(&config, HashEmbedder::default().embed_fn())
        .await
        .unwrap();
    // windows start at 0, 90, 180
    assert_eq!(corpus.index.unwrap().len(), 3);
}

#[tokio::test]
#[serial_test::serial]
async fn missing_api_key_fails_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    unsafe { std::env::remove_var("DOCENT_API_KEY") };

    let err = load_config(&dir.path().join("absent.toml"), &EnvVaultProvider)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("DOCENT_API_KEY"));
}
