//! Hiroba chat server.
//!
//! Type on the console to broadcast as SERVER, `/help` for operator commands,
//! `quit` to shut down.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --debug --port 3000
//! ```

use clap::Parser;

use hiroba_server::{
    Server, ServerConfig,
    domain::DEFAULT_HISTORY_CAPACITY,
    ui::{DEFAULT_HOST, DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT},
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Multi-client TCP chat server", long_about = None)]
struct Args {
    /// Show diagnostic logs on stderr
    #[arg(short = 'd', long)]
    debug: bool,

    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of chat events replayed to newly joined users
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    history_size: usize,

    /// Longest accepted line in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.debug { "debug" } else { "warn" };
    setup_logger(&[env!("CARGO_PKG_NAME"), "hiroba_shared"], level);

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        history_capacity: args.history_size,
        max_line_length: args.max_line_length,
        ..ServerConfig::default()
    };

    let server = match Server::new(config).start().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    println!("Server listening on {}", server.local_addr());
    server.run_until_stopped().await;
    println!("Server shut down successfully.");
}
