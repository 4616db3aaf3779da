use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use polirag_core::{
    BalancedChain, BalancedOptions, Chain, Config, DocumentStore, PartyDatabase, Provider,
    RagChain, RagOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "polirag")]
#[command(about = "Ask what the German parties say about a topic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question from several document sources, weighted equally
    Ask {
        /// The question
        #[arg(required = true)]
        question: Vec<String>,

        /// Document source as SOURCE_TYPE=PATH (repeatable, order is kept)
        #[arg(long = "db", required = true, value_parser = parse_db)]
        dbs: Vec<(String, PathBuf)>,

        /// Output parser: "json" or "str"
        #[arg(long)]
        parser: Option<String>,

        /// Documents per party and source
        #[arg(long)]
        k: Option<usize>,

        /// Answer language
        #[arg(long)]
        language: Option<String>,

        /// Include the joined context and retrieved documents
        #[arg(long)]
        return_context: bool,
    },
    /// Answer a question from a single document source
    AskSingle {
        /// The question
        #[arg(required = true)]
        question: Vec<String>,

        /// Document source as SOURCE_TYPE=PATH
        #[arg(long = "db", value_parser = parse_db)]
        db: (String, PathBuf),

        /// Output parser: "json" or "str"
        #[arg(long)]
        parser: Option<String>,

        /// Documents to retrieve
        #[arg(long)]
        k: Option<usize>,

        /// Include the question and retrieved documents
        #[arg(long)]
        verbose: bool,
    },
    /// Print the default configuration
    Config,
}

fn parse_db(s: &str) -> Result<(String, PathBuf), String> {
    let (source_type, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SOURCE_TYPE=PATH, got '{s}'"))?;
    if source_type.is_empty() || path.is_empty() {
        return Err(format!("expected SOURCE_TYPE=PATH, got '{s}'"));
    }
    Ok((source_type.to_string(), PathBuf::from(path)))
}

/// Loads a document store, rejecting files without documents.
fn open_store(path: &Path, source_type: String) -> Result<Arc<DocumentStore>> {
    let store = DocumentStore::open(path, source_type)
        .wrap_err_with(|| format!("Failed to load {}", path.display()))?;
    if store.is_empty() {
        return Err(eyre!("{} contains no documents", path.display()));
    }
    tracing::info!(path = %path.display(), documents = store.len(), "Loaded document source");
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,polirag_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            question,
            dbs,
            parser,
            k,
            language,
            return_context,
        } => {
            let config = Config::load().wrap_err("Failed to load configuration")?;

            let mut chain_config = config.chain.clone();
            if let Some(parser) = parser {
                chain_config.output_parser = parser;
            }
            if let Some(k) = k {
                chain_config.k = k;
            }
            if let Some(language) = language {
                chain_config.language = language;
            }
            chain_config.return_context |= return_context;
            let options = BalancedOptions::from_config(&chain_config)?;

            let databases = dbs
                .into_iter()
                .map(|(source_type, path)| {
                    open_store(&path, source_type).map(|store| store as Arc<dyn PartyDatabase>)
                })
                .collect::<Result<Vec<_>>>()?;

            let llm = Provider::build_from_config(&config.llm)?;
            let chain = BalancedChain::new(databases, llm, options)?;

            let output = chain.invoke(question.join(" ").into()).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::AskSingle {
            question,
            db: (source_type, path),
            parser,
            k,
            verbose,
        } => {
            let config = Config::load().wrap_err("Failed to load configuration")?;

            let mut chain_config = config.chain.clone();
            if let Some(parser) = parser {
                chain_config.output_parser = parser;
            }
            chain_config.verbose |= verbose;
            let options = RagOptions::from_config(&chain_config)?;

            let retriever = open_store(&path, source_type)?.as_retriever(k.unwrap_or(chain_config.k));

            let llm = Provider::build_from_config(&config.llm)?;
            let chain = RagChain::new(retriever, llm, options);

            let output = chain.invoke(question.join(" ").into()).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_db() {
        let (source_type, path) = parse_db("debates=data/debates.json").unwrap();
        assert_eq!(source_type, "debates");
        assert_eq!(path, PathBuf::from("data/debates.json"));

        assert!(parse_db("debates").is_err());
        assert!(parse_db("=data.json").is_err());
    }

    #[test]
    fn test_open_store_rejects_empty_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let err = open_store(file.path(), "debates".to_string()).unwrap_err();
        assert!(err.to_string().contains("contains no documents"));
    }

    #[test]
    fn test_open_store_loads_documents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"party": "spd", "text": "Solar auf jedes Dach."}}]"#
        )
        .unwrap();

        let store = open_store(file.path(), "manifestos".to_string()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cli_parses_repeated_dbs() {
        let cli = Cli::try_parse_from([
            "polirag",
            "ask",
            "Wie",
            "steht",
            "die",
            "SPD",
            "zu",
            "Solar?",
            "--db",
            "debates=a.json",
            "--db",
            "manifestos=b.json",
            "--parser",
            "str",
        ])
        .unwrap();

        let Commands::Ask { question, dbs, parser, .. } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(question.join(" "), "Wie steht die SPD zu Solar?");
        assert_eq!(dbs[0].0, "debates");
        assert_eq!(dbs[1].0, "manifestos");
        assert_eq!(parser.as_deref(), Some("str"));
    }
}
