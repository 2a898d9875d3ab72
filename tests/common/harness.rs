//! Spawns a real `verity` server on an ephemeral port.
//!
//! The knowledge base is generated on the fly: snippets are embedded with the
//! stub encoder, persisted through [`FlatIpIndex::write_to`] and a JSON snippet
//! file, then loaded back through the normal artifact path.

use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use verity::config::Config;
use verity::embedding::{SentenceEmbedder, TextEncoder};
use verity::gateway::{AppState, create_router};
use verity::index::{FlatIpIndex, KnowledgeBaseEntry};
use verity::models::ModelManager;
use verity::retrieval::l2_normalize;

pub fn default_snippets() -> Vec<KnowledgeBaseEntry> {
    vec![
        KnowledgeBaseEntry::new(
            "Albert Einstein was a German-born theoretical physicist, born on 14 March 1879 in Ulm.",
            "Albert_Einstein",
        ),
        KnowledgeBaseEntry::new(
            "Einstein developed the theory of relativity, one of the two pillars of modern physics.",
            "Albert_Einstein",
        ),
        KnowledgeBaseEntry::new(
            "Python is a high-level programming language created by Guido van Rossum and first released in 1991.",
            "Python_(programming_language)",
        ),
        KnowledgeBaseEntry::new(
            "Mount Everest is Earth's highest mountain above sea level, located in the Himalayas.",
            "Mount_Everest",
        ),
        KnowledgeBaseEntry::new("The Moon is Earth's only natural satellite.", "Moon"),
    ]
}

pub struct TestServerConfig {
    pub snippets: Vec<KnowledgeBaseEntry>,
    pub rate_limit_per_minute: u32,
    pub cache_ttl_secs: u64,
    pub max_input_chars: usize,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            snippets: default_snippets(),
            rate_limit_per_minute: 1_000,
            cache_ttl_secs: 300,
            max_input_chars: 5_000,
        }
    }
}

pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    config: Config,
    _dir: TempDir,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Writes the index and snippet artifacts for `snippets` into `dir`.
pub fn write_knowledge_base(
    dir: &TempDir,
    snippets: &[KnowledgeBaseEntry],
) -> anyhow::Result<(std::path::PathBuf, std::path::PathBuf)> {
    let encoder = SentenceEmbedder::stub()?;
    let mut vectors = Vec::with_capacity(snippets.len());
    for entry in snippets {
        let mut v = encoder.encode(&entry.snippet)?;
        l2_normalize(&mut v).map_err(anyhow::Error::msg)?;
        vectors.push(v);
    }

    let index_path = dir.path().join("kb.index");
    FlatIpIndex::from_vectors(encoder.dim(), &vectors)?.write_to(&index_path)?;

    let snippets_path = dir.path().join("kb_snippets.json");
    std::fs::write(&snippets_path, serde_json::to_vec_pretty(snippets)?)?;

    Ok((index_path, snippets_path))
}

pub async fn spawn_test_server(options: TestServerConfig) -> anyhow::Result<TestServer> {
    let dir = TempDir::new()?;
    let (index_path, snippets_path) = write_knowledge_base(&dir, &options.snippets)?;

    let config = Config {
        port: 0,
        index_path,
        snippets_path,
        rate_limit_per_minute: options.rate_limit_per_minute,
        cache_ttl_secs: options.cache_ttl_secs,
        max_input_chars: options.max_input_chars,
        ..Default::default()
    };

    let models = Arc::new(ModelManager::from_config(&config));
    let loader = Arc::clone(&models);
    tokio::task::spawn_blocking(move || loader.load_models()).await??;

    let app = create_router(AppState::from_config(&config, models));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    Ok(TestServer {
        addr,
        handle,
        config,
        _dir: dir,
    })
}
