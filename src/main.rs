//! Kivvy chat - terminal front end
//!
//! Reads one message per line from stdin and prints the assistant's side of
//! the transcript as it changes.

use kivvy_chat::{
    CannedReplyGenerator, ChatConfig, ChatEvent, ConversationController, HttpReplyGenerator,
    LoggingGenerator, MessageStatus, ReplyGenerator, Sender, SubmitError,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const QUIT_COMMAND: &str = "/quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kivvy_chat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ChatConfig::from_env();

    let backend: Arc<dyn ReplyGenerator> = if let Some(url) = &config.backend_url {
        tracing::info!(url = %url, "Using HTTP reply backend");
        Arc::new(HttpReplyGenerator::new(url)?)
    } else {
        tracing::warn!("KIVVY_BACKEND_URL not set, using canned replies");
        Arc::new(CannedReplyGenerator::default())
    };

    let chat = ConversationController::new(&config, LoggingGenerator::new(backend));
    let printer = tokio::spawn(print_updates(chat.updates()));

    println!("I'm Kivvy 🐥 Let's talk and have fun together! ({QUIT_COMMAND} to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == QUIT_COMMAND {
            break;
        }

        match chat.submit(&line) {
            // Validation notices arrive through the update stream
            Ok(()) | Err(SubmitError::Invalid(_)) => {}
            Err(SubmitError::RequestInFlight) => println!("   (still thinking, hang on...)"),
            Err(e) => {
                tracing::error!(error = %e, "Conversation stopped");
                break;
            }
        }
    }

    chat.dispose();
    printer.abort();
    println!("Bye! 👋");
    Ok(())
}

async fn print_updates(updates: impl tokio_stream::Stream<Item = ChatEvent>) {
    tokio::pin!(updates);
    while let Some(event) = updates.next().await {
        match event {
            ChatEvent::ComposingChanged { composing: true } => println!("🤖 ..."),
            ChatEvent::MessageUpdated { message } if message.sender == Sender::Assistant => {
                match message.status {
                    MessageStatus::Failed => println!("🤖 ⚠ {}", message.text),
                    _ => println!("🤖 {}", message.text),
                }
            }
            ChatEvent::InputRejected { reason } => println!("   ({reason})"),
            _ => {}
        }
    }
}
