use chrono::Utc;
use clap::{Parser, Subcommand};
use jobscout_core::{
    assemble_context, stores::chroma::DEFAULT_COLLECTION, ChromaStore, Document, DocumentIndexer,
    GeminiEmbedder, MarketReport, Retriever, DEFAULT_EMBEDDING_MODEL, DEFAULT_PROVIDER_URL,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "jobscout", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Chroma base URL
    #[arg(long, default_value = "http://localhost:8000", env = "CHROMA_DB_URL")]
    chroma_url: String,

    /// Chroma collection name
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Embedding model name
    #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,
}

#[derive(Subcommand)]
enum Command {
    /// Embed and upsert scraped listings from a JSON file.
    Index {
        /// JSON array of scraped listings.
        #[arg(long)]
        input: String,
        /// Listings per embedding call and per upsert.
        #[arg(long, default_value = "100")]
        batch_size: usize,
    },
    /// Retrieve listings for a free-text query and print the prompt context.
    Search {
        /// Search query
        #[arg(long)]
        query: String,
        /// Number of candidates to retrieve.
        #[arg(long, default_value = "10")]
        top_k: usize,
        /// Character cap for the assembled context block.
        #[arg(long, default_value = "800000")]
        max_context_chars: usize,
    },
    /// Find listings similar to an already-indexed one.
    Similar {
        /// Listing URL (the vector-store id).
        #[arg(long)]
        url: String,
        /// Number of similar listings to return.
        #[arg(long, default_value = "5")]
        top_k: usize,
    },
    /// Parse a saved generative response into market-report sections.
    Report {
        /// Text file holding the raw model response.
        #[arg(long)]
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder = GeminiEmbedder::new(
        DEFAULT_PROVIDER_URL,
        &cli.gemini_api_key,
        &cli.embedding_model,
    );
    let store = ChromaStore::new(&cli.chroma_url, &cli.collection);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "jobscout boot"
    );

    match cli.command {
        Command::Index { input, batch_size } => {
            let raw = tokio::fs::read_to_string(&input).await?;
            let documents: Vec<Document> = serde_json::from_str(&raw)?;
            info!(input = %input, listings = documents.len(), "indexing scraped listings");

            store
                .connect()
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            let indexer = DocumentIndexer::new(embedder, store);
            let report = indexer
                .index(&documents, batch_size)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!(
                "{} listings upserted, {} skipped at {}",
                report.upserted,
                report.skipped,
                Utc::now().to_rfc3339()
            );
        }
        Command::Search {
            query,
            top_k,
            max_context_chars,
        } => {
            let retriever = Retriever::new(embedder, store);
            let candidates = retriever
                .query_by_text(&query, top_k)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("query: {query}");
            for candidate in &candidates {
                println!(
                    "[{}] distance={:.4} url={}",
                    candidate.rank, candidate.distance, candidate.id
                );
                println!("  {}", candidate.snippet());
            }

            println!("--- prompt context ---");
            println!("{}", assemble_context(&candidates, max_context_chars));
        }
        Command::Similar { url, top_k } => {
            let retriever = Retriever::new(embedder, store);
            let candidates = retriever
                .query_by_source_id(&url, top_k, true)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("similar to: {url}");
            for candidate in &candidates {
                println!(
                    "[{}] distance={:.4} url={}",
                    candidate.rank, candidate.distance, candidate.id
                );
                if let Some(title) = &candidate.metadata.title {
                    println!("  title={title}");
                }
                println!("  {}", candidate.snippet());
            }
        }
        Command::Report { input } => {
            let raw = tokio::fs::read_to_string(&input).await?;
            let report = MarketReport::from_analysis(&raw)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("== Common Tech Stack ==\n{}\n", report.common_stack);
            println!("== Suggested Project Ideas ==\n{}\n", report.project_ideas);
            println!("== Job Prioritization ==\n{}\n", report.job_prioritization);
            println!(
                "== Experience Level Summary ==\n{}\n",
                report.experience_summary
            );
            println!("== Overall Market Insights ==\n{}\n", report.market_insights);
            println!("== Detailed Market Trends ==\n{}\n", report.detailed_trends);
            println!(
                "== Competitive Landscape ==\n{}",
                report.competitive_landscape
            );
        }
    }

    Ok(())
}
