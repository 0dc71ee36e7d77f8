use clap::{Parser, ValueEnum};
use jobmatch_api::RestApi;
use jobmatch_core::MatchConfig;
use jobmatch_matcher::{
    EmbeddingProvider, HashingLoader, MatchOrchestrator, RemoteBackend, RemoteConfig, RemoteLoader,
};
use jobmatch_storage::{DocumentStore, HnswVectorIndex, LmdbStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Feature-hashing encoder, no external service
    Hashing,
    Ollama,
    Openai,
}

/// Semantic job matching service
#[derive(Parser, Debug)]
#[command(name = "jobmatch")]
#[command(about = "Semantic job search and CV matching", long_about = None)]
struct Args {
    /// Path to the LMDB data directory
    #[arg(short, long, env = "JOBMATCH_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, env = "JOBMATCH_HTTP_PORT", default_value_t = 5000)]
    http_port: u16,

    /// Log level (or a full filter directive)
    #[arg(long, env = "JOBMATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Embedding backend
    #[arg(long, env = "JOBMATCH_EMBEDDING_BACKEND", value_enum, default_value_t = Backend::Hashing)]
    embedding_backend: Backend,

    /// Base URL of the embedding server
    #[arg(long, env = "JOBMATCH_EMBEDDING_URL", default_value = "http://localhost:11434")]
    embedding_url: String,

    /// Embedding model name
    #[arg(long, env = "JOBMATCH_EMBEDDING_MODEL", default_value = "all-minilm")]
    embedding_model: String,

    /// API key for OpenAI-compatible servers
    #[arg(long, env = "JOBMATCH_EMBEDDING_API_KEY")]
    embedding_api_key: Option<String>,

    /// Embedding dimension shared by postings and queries
    #[arg(long, env = "JOBMATCH_EMBEDDING_DIM", default_value_t = 384)]
    embedding_dim: usize,

    /// Minimum raw score for text search results
    #[arg(long, env = "JOBMATCH_RELEVANCE_FLOOR", default_value_t = 0.3)]
    relevance_floor: f32,

    /// Candidates requested from the vector index per query
    #[arg(long, env = "JOBMATCH_CANDIDATE_POOL", default_value_t = 200)]
    candidate_pool: usize,

    /// Serve vector queries from an in-process HNSW index
    #[arg(long, env = "JOBMATCH_NATIVE_INDEX")]
    native_index: bool,
}

fn embedding_provider(args: &Args) -> EmbeddingProvider {
    let remote = |backend| RemoteLoader {
        config: RemoteConfig {
            backend,
            base_url: args.embedding_url.clone(),
            model: args.embedding_model.clone(),
            api_key: args.embedding_api_key.clone(),
            dimension: args.embedding_dim,
            timeout: Duration::from_secs(30),
        },
    };

    match args.embedding_backend {
        Backend::Hashing => EmbeddingProvider::new(HashingLoader { dim: args.embedding_dim }),
        Backend::Ollama => EmbeddingProvider::new(remote(RemoteBackend::Ollama)),
        Backend::Openai => EmbeddingProvider::new(remote(RemoteBackend::OpenAi)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting jobmatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("Embedding backend: {:?} (dim {})", args.embedding_backend, args.embedding_dim);

    let config = MatchConfig {
        embedding_dim: args.embedding_dim,
        relevance_floor: args.relevance_floor,
        candidate_pool: args.candidate_pool,
        ..MatchConfig::default()
    };
    config.validate()?;

    let store: Arc<dyn DocumentStore> = Arc::new(LmdbStore::open(&args.data_dir)?);
    info!("Storage initialized");

    let provider = Arc::new(embedding_provider(&args));
    let mut orchestrator = MatchOrchestrator::new(config, store.clone(), provider);
    if args.native_index {
        info!("Native HNSW index enabled");
        orchestrator = orchestrator.with_index(Arc::new(HnswVectorIndex::new(store, args.embedding_dim)));
    }
    let orchestrator = Arc::new(orchestrator);

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(orchestrator, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("jobmatch started: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
