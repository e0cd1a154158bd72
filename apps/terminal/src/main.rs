//! # Contable Terminal Entry Point
//!
//! The setup lives in `lib.rs` so it can be tested; this only reports a
//! failed start.

#[tokio::main]
async fn main() {
    if let Err(e) = contable_terminal::run().await {
        tracing::error!(error = %e, "Terminal failed to start");
        eprintln!("contable-terminal: {}", e);
        std::process::exit(1);
    }
}
