//! Slotbook - slot reservation client
//!
//! Terminal front end: lists the slots of one collection and lets the
//! participant book, release or assign them against the backend.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod booking;
mod commands;
mod state;
mod terminal;
mod viewmodel;

fn main() {
    // Logs go to stderr so they do not interleave with the listing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Slotbook");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let mut app = match state::AppState::new() {
            Ok(app) => app,
            Err(e) => {
                tracing::error!("Failed to initialize application: {}", e);
                eprintln!("slotbook: {}", e);
                std::process::exit(1);
            }
        };

        terminal::run(&mut app).await;
    });

    tracing::info!("Slotbook stopped");
}
