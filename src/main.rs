//! Simdex: multimodal embedding store and similarity retrieval service

use anyhow::Result;
use clap::{Parser, Subcommand};
use simdex::{
    config::{Config, LogLevel},
    embedding::{create_image_provider, create_text_provider},
    engine::RetrievalEngine,
    server::HttpServer,
    store::{Metric, VectorStore},
    types::ContentRef,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "simdex")]
#[command(about = "Multimodal embedding store and similarity retrieval service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "simdex.toml")]
    config: PathBuf,

    /// Data directory (overrides the configured one)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file and data directory
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Start the HTTP API server
    Serve {
        /// Listen address
        #[arg(long)]
        listen: Option<String>,
    },

    /// Create a collection
    Create {
        /// Collection name
        collection: String,

        /// Content column name
        #[arg(long, default_value = "content")]
        column: String,

        /// Embedding dimensionality
        #[arg(long)]
        dimension: usize,

        /// Distance metric (cosine, euclidean)
        #[arg(long, default_value = "cosine")]
        metric: String,
    },

    /// Embed a text snippet and add it to a collection
    Add {
        /// Collection name
        collection: String,

        /// Text content
        content: String,

        /// Content column name
        #[arg(long, default_value = "content")]
        column: String,
    },

    /// Embed an image (path or URL) and add it to a collection
    AddImage {
        /// Collection name
        collection: String,

        /// Image path or http(s) URL
        reference: String,

        /// Content column name
        #[arg(long, default_value = "content")]
        column: String,
    },

    /// Search a collection by text
    Query {
        /// Collection name
        collection: String,

        /// Query text
        query: String,

        /// Content column name
        #[arg(long, default_value = "content")]
        column: String,

        /// Number of results
        #[arg(long, default_value = "5")]
        top_k: usize,

        /// Distance metric (cosine, euclidean)
        #[arg(long, default_value = "cosine")]
        metric: String,
    },

    /// Search a collection by image
    QueryImage {
        /// Collection name
        collection: String,

        /// Image path or http(s) URL
        reference: String,

        /// Content column name
        #[arg(long, default_value = "content")]
        column: String,

        /// Number of results
        #[arg(long, default_value = "5")]
        top_k: usize,

        /// Distance metric (cosine, euclidean)
        #[arg(long, default_value = "cosine")]
        metric: String,
    },

    /// Show collection statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load or fall back to the default config
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }

    // Setup logging; -v flags override the configured level
    match cli.verbose {
        0 => {}
        1 => config.logging.level = LogLevel::Debug,
        _ => config.logging.level = LogLevel::Trace,
    }
    config.logging.init();

    match cli.command {
        Commands::Init { path } => init_config(path),
        Commands::Serve { listen } => serve(config, listen).await,
        Commands::Create {
            collection,
            column,
            dimension,
            metric,
        } => create_collection(config, collection, column, dimension, metric),
        Commands::Add {
            collection,
            content,
            column,
        } => add_content(config, collection, column, ContentRef::Text(content)),
        Commands::AddImage {
            collection,
            reference,
            column,
        } => add_content(config, collection, column, ContentRef::image(reference)),
        Commands::Query {
            collection,
            query,
            column,
            top_k,
            metric,
        } => query_content(
            config,
            collection,
            column,
            ContentRef::Text(query),
            top_k,
            metric,
        ),
        Commands::QueryImage {
            collection,
            reference,
            column,
            top_k,
            metric,
        } => query_content(
            config,
            collection,
            column,
            ContentRef::image(reference),
            top_k,
            metric,
        ),
        Commands::Stats => show_stats(config),
    }
}

/// Build the engine with every provider the config carries
fn build_engine(config: &Config) -> Result<Arc<RetrievalEngine>> {
    let store = Arc::new(VectorStore::open(&config.store.data_dir, &config.store)?);
    let mut engine = RetrievalEngine::new(store);

    if let Some(text_config) = &config.embedding.text {
        engine = engine.with_text_provider(create_text_provider(text_config)?);
    }
    if let Some(image_config) = &config.embedding.image {
        engine = engine.with_image_provider(create_image_provider(image_config)?);
    }

    Ok(Arc::new(engine))
}

async fn serve(config: Config, listen: Option<String>) -> Result<()> {
    let mut http_config = config.http.clone();
    if let Some(addr) = listen {
        http_config.listen_addr = addr;
    }

    info!("Starting simdex...");
    info!("Data directory: {}", config.store.data_dir.display());

    let engine = build_engine(&config)?;
    let server = HttpServer::new(http_config, engine);
    server.run(&config.store.data_dir).await
}

fn create_collection(
    config: Config,
    collection: String,
    column: String,
    dimension: usize,
    metric: String,
) -> Result<()> {
    let metric = Metric::parse(&metric)?;
    let store = VectorStore::open(&config.store.data_dir, &config.store)?;
    store.create_collection(&collection, &column, dimension, metric)?;

    println!("Created collection '{collection}' ({dimension} dims, {metric})");
    Ok(())
}

fn add_content(
    config: Config,
    collection: String,
    column: String,
    content: ContentRef,
) -> Result<()> {
    let engine = build_engine(&config)?;
    let payload = content.payload();
    let id = engine.add_content(&collection, &column, content)?;

    println!("Added to '{collection}' with id {id}: {payload}");
    Ok(())
}

fn query_content(
    config: Config,
    collection: String,
    column: String,
    query: ContentRef,
    top_k: usize,
    metric: String,
) -> Result<()> {
    let metric = Metric::parse(&metric)?;
    let engine = build_engine(&config)?;
    let results = engine.query_content(&collection, &column, query, top_k, metric)?;

    println!("\nResults ({} found):\n", results.len());
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [score: {:.3}] id {}: {}",
            i + 1,
            result.score,
            result.id,
            result.content
        );
    }
    Ok(())
}

fn show_stats(config: Config) -> Result<()> {
    let store = VectorStore::open(&config.store.data_dir, &config.store)?;
    let stats = store.stats();

    println!("\nSimdex Statistics:");
    println!("==================");
    println!("Data directory: {}", config.store.data_dir.display());
    println!("Collections: {}", stats.len());
    for stat in stats {
        println!(
            "  {}: {} entries, {} dims, {} metric (column '{}')",
            stat.name, stat.entries, stat.dimension, stat.metric, stat.content_column
        );
    }
    Ok(())
}

fn init_config(path: PathBuf) -> Result<()> {
    let config_path = path.join("simdex.toml");

    let toml_content = r#"# Simdex Configuration

[store]
data_dir = ".simdex"
hnsw_m = 16
hnsw_ef_construction = 200
hnsw_ef_search = 100
max_capacity = 1000000

# Text embeddings via any OpenAI-compatible endpoint.
# [embedding.text]
# endpoint = "https://api.openai.com/v1/embeddings"
# model = "text-embedding-3-small"
# dimensions = 1536

# Image embeddings via a local ONNX vision encoder.
# [embedding.image]
# model_path = ".simdex/models/clip-vit-base-patch32/model.onnx"
# dimensions = 512

[http]
enabled = true
listen_addr = "127.0.0.1:8080"
cors_enabled = false

[logging]
format = "text"
level = "info"
"#;

    std::fs::write(&config_path, toml_content)?;
    println!("Created configuration file: {}", config_path.display());

    let data_dir = path.join(".simdex");
    std::fs::create_dir_all(&data_dir)?;
    println!("Created data directory: {}", data_dir.display());

    Ok(())
}
