use clap::Parser;
use std::sync::Arc;
use yt_fetch_server::config::{Args, Config};
use yt_fetch_server::logging::init_logging;
use yt_fetch_server::proxy::ApiServer;
use yt_fetch_server::youtube::YtDlp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_format);

    let config = Config::from(&args);
    let extractor = Arc::new(YtDlp::new(config.yt_dlp.clone()));

    let server = ApiServer::new(config, extractor);
    server.run().await?;

    Ok(())
}
