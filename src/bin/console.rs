use pyme_risk_console::{
    AnalysisOrchestrator, ConsoleConfig, HttpAnalysisGateway, Message, QuickAction,
    RejectReason, Submission, SubmitOutcome,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_messages(messages: &[Message]) {
    for message in messages {
        println!(
            "\n[{}] {}:\n{}",
            message.timestamp.format("%H:%M:%S"),
            message.sender,
            message.text
        );
    }
}

fn print_help() {
    println!("\nEscribe un RUC o el nombre de una empresa.");
    println!("Acciones rápidas:");
    for action in QuickAction::ALL {
        println!("  /{:<12} {}", action.key(), action.user_text());
    }
    println!("  /quit         salir");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConsoleConfig::from_env()?;
    let gateway = Arc::new(HttpAnalysisGateway::from_config(&config)?);
    let orchestrator = Arc::new(AnalysisOrchestrator::from_config(gateway, &config));

    info!(
        session_id = %orchestrator.session_id(),
        backend = %config.api_base_url,
        "Console session started"
    );

    let mut seen = 0;
    let initial = orchestrator.messages_since(seen);
    seen += initial.len();
    print_messages(&initial);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        let submission = match line.strip_prefix('/') {
            Some("quit") | Some("exit") => break,
            Some("help") => {
                print_help();
                continue;
            }
            Some(key) => match QuickAction::from_key(key) {
                Some(action) => Submission::Quick(action),
                None => {
                    println!("Acción desconocida: /{}", key);
                    print_help();
                    continue;
                }
            },
            None => Submission::Text(line.to_string()),
        };

        match orchestrator.submit(submission).await {
            SubmitOutcome::Rejected(RejectReason::EmptyInput) => continue,
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                println!("⏳ Hay un análisis en curso, espera a que termine.");
                continue;
            }
            SubmitOutcome::Completed(_) => {}
        }

        let new_messages = orchestrator.messages_since(seen);
        seen += new_messages.len();
        print_messages(&new_messages);
    }

    Ok(())
}
