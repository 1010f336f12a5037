//! TalentRAG — retrieval-augmented answers to recruitment questions.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use talentrag_core::RagConfig;
use talentrag_rag::RagPipeline;
use talentrag_registry::{
    FileRegistry, MlflowRegistry, ModelMetadataCache, ModelMetadataSnapshot,
};
use talentrag_server::{build_router, validate, AppState};

fn resolve_data_dir() -> PathBuf {
    std::env::var("TALENTRAG_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Metadata comes from MLflow when a tracking URI is configured, otherwise
/// from the registry manifest in the data directory.
async fn load_metadata(config: &RagConfig) -> ModelMetadataCache {
    match &config.registry_uri {
        Some(uri) => match MlflowRegistry::new(uri.as_str()) {
            Ok(registry) => ModelMetadataCache::build(&registry, &config.model_name).await,
            Err(e) => {
                warn!("MLflow client unavailable: {}", e);
                ModelMetadataCache::from_snapshot(ModelMetadataSnapshot::unavailable(
                    &config.model_name,
                    e.to_string(),
                ))
            }
        },
        None => {
            let registry = FileRegistry::new(&config.data_paths.registry_file);
            ModelMetadataCache::build(&registry, &config.model_name).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--validate" | "validate" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                let report = validate::validate(&data_dir);
                validate::print_report(&report);
                std::process::exit(if report.is_ready() { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("TalentRAG — recruitment question answering over historical profiles");
                println!();
                println!("Usage: talentrag [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  validate [data-dir]      Check corpus, models and registry settings");
                println!("  help                     Show this help message");
                println!();
                println!("Environment:");
                println!("  TALENTRAG_DATA_DIR       Data directory (default: data)");
                println!("  PORT                     HTTP port (default: 3000)");
                println!("  MLFLOW_TRACKING_URI      MLflow server for /info metadata");
                println!("  TALENTRAG_MODEL_NAME     Registered model name (default: RAG_Recrutamento)");
                println!("  TALENTRAG_TOP_K          Contexts per query (default: 3)");
                println!("  TALENTRAG_MAX_NEW_TOKENS Answer length in tokens (default: 256)");
                println!("  TALENTRAG_MAX_MODEL_TOKENS Generator window (default: 1024)");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'talentrag help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = RagConfig::from_env(&data_dir)?;
    let port = config.port;
    let paths = &config.data_paths;

    let index = talentrag_corpus::load_corpus(&paths.embeddings, &paths.contexts)
        .map_err(|e| anyhow::anyhow!("Failed to load corpus: {}", e))?;

    // Corpus vectors were produced by this encoder; a missing model is fatal.
    let encoder = talentrag_infer::create_embedder(&paths.encoder_dir)
        .map_err(|e| anyhow::anyhow!("Failed to load encoder: {}", e))?;
    let generator =
        talentrag_infer::create_generator(&paths.generator_dir, config.generation.max_model_tokens)
            .map_err(|e| anyhow::anyhow!("Failed to load generator: {}", e))?;

    let pipeline = RagPipeline::new(
        Arc::new(index),
        encoder,
        generator.engine,
        generator.tokens,
        config.generation,
    )?;

    let metadata = load_metadata(&config).await;
    if let Some(e) = metadata.get().error() {
        warn!("Serving without model metadata: {}", e);
    }

    let state = Arc::new(AppState::new(config, pipeline, metadata));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("TalentRAG server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
