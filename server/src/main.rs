use anyhow::Result;
use axum::Router;
use clap::Parser;
use hotel_core::{build_store, HotelSearch, WordIndex};
use hotel_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Hotels metadata JSON file
    #[arg(long, default_value = "input/hotels/hotels.json")]
    hotels: PathBuf,
    /// Root directory of review JSON files
    #[arg(long, default_value = "input/reviews")]
    reviews: PathBuf,
    /// Worker-pool size for parsing and tokenizing
    #[arg(long, default_value_t = 4)]
    threads: usize,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    // The indexes build once at startup; requests only ever read them.
    let store = build_store(Some(&args.hotels), Some(&args.reviews), args.threads)?;
    let words = WordIndex::build(&store, args.threads);
    let search = Arc::new(HotelSearch::new(store, words));

    let app: Router = build_app(search);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
