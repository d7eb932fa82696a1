//! Interactive chat loop. Renders the transcript by parity: even = you, odd = bot.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use docqa_core::{load_documents, ConversationSession, Message, SessionError, Transcript};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Ask a question, or use :process <PATH>... to load PDFs, :history, :quit.";

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Quit,
    History,
    Help,
    Process(Vec<PathBuf>),
    Question(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Input::Question(line);
        };
        let mut words = command.split_whitespace();
        match words.next().unwrap_or("") {
            "q" | "quit" | "exit" => Input::Quit,
            "history" => Input::History,
            "process" => Input::Process(words.map(PathBuf::from).collect()),
            _ => Input::Help,
        }
    }
}

/// Loads and processes documents. Progress goes to stderr so stdout carries only answers.
pub async fn process_paths<P: AsRef<Path>>(
    session: &mut ConversationSession,
    paths: &[P],
) -> Result<(), Box<dyn Error>> {
    let docs = load_documents(paths)?;
    eprintln!("Processing {} document(s)...", docs.len());
    let stats = session.process(&docs).await?;
    eprintln!(
        "Processed {} document(s), {} page(s) into {} chunk(s).",
        stats.documents, stats.pages, stats.chunks
    );
    Ok(())
}

/// Reads lines from stdin until EOF or `:quit`. Failed actions are reported and the loop continues.
pub async fn run(session: &mut ConversationSession) -> Result<(), Box<dyn Error>> {
    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match Input::parse(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => println!("{}", HELP),
            Input::History => render_transcript(session.transcript()),
            Input::Process(paths) if paths.is_empty() => println!("usage: :process <PATH>..."),
            Input::Process(paths) => {
                if let Err(e) = process_paths(session, &paths).await {
                    eprintln!("error: {}", e);
                }
            }
            Input::Question(question) => match session.ask(question).await {
                Ok(_) => {
                    let messages = session.transcript().messages();
                    let first = messages.len().saturating_sub(2);
                    render_messages(first, &messages[first..]);
                }
                Err(e @ SessionError::NotInitialized) => println!("{}", e),
                Err(e) => eprintln!("error: {}", e),
            },
        }
    }
    Ok(())
}

fn render_transcript(transcript: &Transcript) {
    if transcript.is_empty() {
        println!("(no messages yet)");
    }
    render_messages(0, transcript.messages());
}

/// `offset` is the position of `messages[0]` in the transcript.
fn render_messages(offset: usize, messages: &[Message]) {
    for (i, message) in messages.iter().enumerate() {
        println!("{}", speaker_line(offset + i, message));
    }
}

fn speaker_line(position: usize, message: &Message) -> String {
    let speaker = if position % 2 == 0 { "you" } else { "bot" };
    format!("{speaker}: {}", message.content)
}
