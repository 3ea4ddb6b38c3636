use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mockingbird")]
#[command(about = "Mock conversational responder for chatbot test harnesses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Print the canned conversation scripts and utterance groups as JSON.
    Fixtures,

    /// Chat with the mock responder (interactive). Replies arrive after the
    /// configured delay plus the accumulated slowdown.
    Chat {
        /// Capability JSON file (answers, welcomeMessages, responseDelayMs,
        /// responseDelayIncreaseMs). Defaults apply when omitted.
        #[arg(long, short, value_name = "PATH")]
        capabilities: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("mockingbird {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Fixtures) => {
            if let Err(e) = run_fixtures() {
                log::error!("fixtures failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { capabilities }) => {
            if let Err(e) = run_chat(capabilities).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_fixtures() -> anyhow::Result<()> {
    let (convos, utterances) = lib::fixtures::import_fixtures();
    let doc = serde_json::json!({ "convos": convos, "utterances": utterances });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn load_capabilities(path: Option<PathBuf>) -> anyhow::Result<lib::config::Capabilities> {
    match path {
        None => Ok(lib::config::Capabilities::default()),
        Some(p) => {
            let s = std::fs::read_to_string(&p)
                .with_context(|| format!("reading capabilities from {}", p.display()))?;
            serde_json::from_str(&s)
                .with_context(|| format!("parsing capabilities from {}", p.display()))
        }
    }
}

async fn run_chat(capabilities: Option<PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let caps = load_capabilities(capabilities)?;
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let sink = Arc::new(lib::delay::QueueSink::new(tx));

    let mut connector = lib::connector::MockConnector::new(sink, caps);
    connector.validate()?;
    connector.build()?;
    connector.start().await?;
    log::info!("chatting in session {}", connector.session_id());

    let printer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            println!("< {}", msg.message_text.as_deref().unwrap_or("-"));
        }
    });

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if let Err(e) = connector.user_says(lib::message::InboundMessage::text(input)) {
            eprintln!("send failed: {}", e);
        }
    }

    connector.stop().await?;
    drop(connector);
    printer.abort();
    Ok(())
}
