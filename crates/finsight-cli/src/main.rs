//! Command-line interface for finsight
//!
//! Wires the index, market gateway, narrator, and orchestrator together and
//! exposes them as subcommands. The index is in-memory and seeded with the
//! built-in explainer corpus on startup, so conceptual questions work out of
//! the box.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use finsight_core::Modality;
use finsight_index::{Chunker, Embedder, HashEmbedder, Retriever, RetrieverConfig, VectorIndex};
use finsight_index::seed::seed_corpus;
use finsight_llm::{GeminiEmbedder, GeminiProvider, Narrator, NarratorConfig};
use finsight_market::{AlphaVantageProvider, GatewayConfig, MarketGateway};
use finsight_runtime::{
    Assistant, IngestRequest, Orchestrator, OrchestratorConfig, QueryRequest, QueryResponse,
};

#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(about = "Finance assistant: grounded answers over documents and market data", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a question
    Query {
        /// The question text
        text: String,
        /// Treat the text as a transcribed voice query
        #[arg(long)]
        voice: bool,
    },
    /// Ingest text files into the document index, then report counts
    Ingest {
        /// Paths of text files to ingest
        files: Vec<PathBuf>,
    },
    /// Print the market brief for the configured index symbols
    Brief,
}

async fn build_assistant() -> anyhow::Result<Assistant> {
    let embedder: Arc<dyn Embedder> = match GeminiEmbedder::from_env() {
        Ok(gemini) => Arc::new(gemini),
        Err(_) => {
            warn!("GEMINI_API_KEY not set, using offline hash embeddings");
            Arc::new(HashEmbedder::default())
        }
    };

    let index = Arc::new(VectorIndex::new(
        Arc::clone(&embedder),
        Chunker::default(),
    ));
    index
        .ingest(&seed_corpus())
        .await
        .context("seeding the document index")?;

    let retriever = Arc::new(Retriever::new(
        embedder,
        Arc::clone(&index),
        RetrieverConfig::default(),
    ));

    let market = match AlphaVantageProvider::from_env() {
        Ok(provider) => provider,
        Err(_) => {
            warn!("ALPHA_VANTAGE_API_KEY not set, using the restricted demo key");
            AlphaVantageProvider::new("demo", 5)
        }
    };
    let gateway = Arc::new(MarketGateway::new(
        Arc::new(market),
        GatewayConfig::default(),
    ));

    let provider = GeminiProvider::from_env().context("GEMINI_API_KEY is required for answers")?;
    let narrator = Arc::new(Narrator::new(
        Arc::new(provider),
        NarratorConfig::default(),
    )?);

    let orchestrator = Orchestrator::new(
        retriever,
        gateway,
        narrator,
        OrchestratorConfig::default(),
    );
    Ok(Assistant::new(orchestrator, index))
}

fn print_response(response: &QueryResponse) {
    println!("{}", response.answer_text);
    println!();
    println!(
        "confidence: {:.2}  citations: {}  degraded: {}",
        response.confidence,
        response.citations.len(),
        response.degraded
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = finsight_utils::Config::from_env();
    if config.json_logs {
        finsight_utils::init_tracing_json();
    } else {
        finsight_utils::init_tracing();
    }

    let args = Args::parse();
    let assistant = build_assistant().await?;

    match args.command {
        Command::Query { text, voice } => {
            let modality = if voice { Modality::Voice } else { Modality::Text };
            let response = assistant.query(QueryRequest { text, modality }).await;
            print_response(&response);
        }
        Command::Ingest { files } => {
            let mut documents = Vec::with_capacity(files.len());
            for path in &files {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                documents.push(text);
            }

            let response = assistant.ingest(IngestRequest { documents }).await?;
            println!("ingested {} document(s)", response.ingested);
            for error in &response.errors {
                eprintln!("failed {}: {}", error.document_id, error.reason);
            }
        }
        Command::Brief => {
            let response = assistant.market_brief().await;
            print_response(&response);
        }
    }

    Ok(())
}
