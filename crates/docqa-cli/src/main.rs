//! CLI entry point for docqa: process PDFs and ask questions about them.

mod chat;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use docqa_core::{
    default_config_path, extract_text, load_config, load_documents, status, Answer, Config,
    ConversationSession, Providers, TextSplitter,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "docqa: ask questions about your PDF documents")]
struct Cli {
    /// Config file (default: config.toml in the platform config directory).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log pipeline progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status and the effective provider settings.
    Status,
    /// Show where docqa looks for its config file.
    ConfigPath,
    /// Print the text extracted from PDFs (files or directories).
    Extract {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show how the extracted text is split into chunks.
    Chunks {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Process PDFs and answer a single question.
    Ask {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long)]
        question: String,
        /// Print the answer and its sources as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive chat. PDFs given here are processed before the first question.
    Chat {
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command.unwrap_or(Commands::Status), &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands, config: &Config) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Status => {
            let p = &config.provider;
            println!("docqa backend");
            println!("  core: {}", status());
            println!("  provider: {:?} at {}", p.kind, p.base_url());
            println!("  embed model: {}", p.embed_model());
            println!("  chat model: {}", p.chat_model());
            println!(
                "  chunking: {} chars, {} overlap",
                config.chunking.chunk_size, config.chunking.chunk_overlap
            );
            println!("  api key: {}", if p.api_key.is_some() { "set" } else { "not set" });
        }
        Commands::ConfigPath => match default_config_path() {
            Some(p) => println!("{}", p.display()),
            None => eprintln!("Could not determine config directory."),
        },
        Commands::Extract { paths } => {
            let raw = extract_text(&load_documents(&paths)?)?;
            println!("{}", raw.text);
            eprintln!("{} document(s), {} page(s)", raw.documents, raw.pages);
        }
        Commands::Chunks { paths } => {
            let raw = extract_text(&load_documents(&paths)?)?;
            let splitter = TextSplitter::from_config(&config.chunking)?;
            let mut count = 0;
            for chunk in splitter.chunks(&raw.text) {
                println!("  #{:<4} {:>5} chars  {}", chunk.index, chunk.len(), preview(&chunk.text));
                count += 1;
            }
            println!("{}", chunk_summary(count, raw.pages, &splitter));
        }
        Commands::Ask {
            paths,
            question,
            json,
        } => {
            let mut session = new_session(config)?;
            ask_once(&mut session, &paths, &question, json, &mut std::io::stdout()).await?;
        }
        Commands::Chat { paths } => {
            let mut session = new_session(config)?;
            if !paths.is_empty() {
                chat::process_paths(&mut session, &paths).await?;
            }
            chat::run(&mut session).await?;
        }
    }
    Ok(())
}

/// Processes `paths`, answers `question` and writes only the answer to `out`.
async fn ask_once(
    session: &mut ConversationSession,
    paths: &[PathBuf],
    question: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    chat::process_paths(session, paths).await?;
    let answer = session.ask(question).await?;
    writeln!(out, "{}", render_answer(&answer, json)?)?;
    Ok(())
}

fn render_answer(answer: &Answer, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(answer)
    } else {
        Ok(answer.answer.clone())
    }
}

fn chunk_summary(count: usize, pages: usize, splitter: &TextSplitter) -> String {
    format!(
        "{} chunk(s) from {} page(s) ({} chars, {} overlap)",
        count,
        pages,
        splitter.chunk_size(),
        splitter.overlap()
    )
}

fn new_session(config: &Config) -> Result<ConversationSession, Box<dyn Error>> {
    let providers = Providers::from_config(&config.provider)?;
    Ok(ConversationSession::new(config, providers)?)
}

/// First line of `text`, cut to 60 chars.
fn preview(text: &str) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() > 60 {
        format!("{}...", line.chars().take(60).collect::<String>())
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use docqa_core::{ChatModel, Embedder, Message, ProviderError};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    use super::*;

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn embed_model(&self) -> &str {
            "constant"
        }
    }

    struct FixedChat;

    #[async_trait]
    impl ChatModel for FixedChat {
        async fn complete(&self, _messages: &[Message]) -> Result<String, ProviderError> {
            Ok("Paris.".into())
        }

        fn chat_model(&self) -> &str {
            "fixed"
        }
    }

    /// A one-page PDF showing `text`.
    fn pdf_bytes(text: &str) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn ask_json_writes_only_json_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("capitals.pdf");
        std::fs::write(&pdf, pdf_bytes("The capital of France is Paris")).unwrap();

        let providers = Providers::new(Arc::new(ConstantEmbedder), Arc::new(FixedChat));
        let mut session = ConversationSession::new(&Config::default(), providers).unwrap();
        let mut stdout = Vec::new();
        ask_once(&mut session, &[pdf], "Capital of France?", true, &mut stdout)
            .await
            .unwrap();

        let v: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
        assert_eq!(v["question"], "Capital of France?");
        assert_eq!(v["answer"], "Paris.");
        assert!(v["sources"][0]["chunk"]["text"]
            .as_str()
            .unwrap()
            .contains("Paris"));
    }

    #[test]
    fn plain_answer_is_just_the_text() {
        let answer = Answer {
            question: "Q?".into(),
            standalone_question: None,
            answer: "A.".into(),
            sources: Vec::new(),
        };
        assert_eq!(render_answer(&answer, false).unwrap(), "A.");
    }

    #[test]
    fn chunk_summary_reports_splitter_sizes() {
        let splitter = TextSplitter::new(500, 50, "\n").unwrap();
        assert_eq!(
            chunk_summary(3, 2, &splitter),
            "3 chunk(s) from 2 page(s) (500 chars, 50 overlap)"
        );
    }

    #[test]
    fn preview_cuts_long_lines_on_char_boundaries() {
        assert_eq!(preview("\n  short line\nnext"), "short line");
        let long = "ü".repeat(80);
        assert_eq!(preview(&long), format!("{}...", "ü".repeat(60)));
    }

    #[test]
    fn cli_parses_ask() {
        let cli = Cli::try_parse_from(["docqa", "ask", "a.pdf", "dir", "-q", "Why?", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Ask {
                paths,
                question,
                json,
            }) => {
                assert_eq!(paths, vec![PathBuf::from("a.pdf"), PathBuf::from("dir")]);
                assert_eq!(question, "Why?");
                assert!(json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn extract_requires_a_path() {
        assert!(Cli::try_parse_from(["docqa", "extract"]).is_err());
    }
}
