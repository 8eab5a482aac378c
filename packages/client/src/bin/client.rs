//! Interactive chat client.
//!
//! Connects to the chat server on 127.0.0.1:12345, asks for a username and
//! then sends every line typed at the prompt.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client
//! cargo run --bin hiroba-client -- --debug
//! ```

use clap::Parser;

use hiroba_client::{
    error::ClientError,
    runner::{SERVER_ADDR, run_client},
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "Interactive client for the Hiroba TCP chat server", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.debug { "debug" } else { "warn" };
    setup_logger(&[env!("CARGO_PKG_NAME"), "hiroba_shared"], level);

    match run_client(SERVER_ADDR).await {
        Ok(end) => {
            println!("\n{}", end.farewell());
            std::process::exit(0);
        }
        Err(ClientError::ConnectionRefused(_)) => {
            println!("Unable to connect to the server. Make sure it's running.");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Client error: {}", e);
            eprintln!("Client error: {}", e);
            std::process::exit(1);
        }
    }
}
