use clap::Parser;
use neuro_harness::PageKind;
use neuro_harness::core::config::{self, CliOverrides};
use neuro_harness::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "neuro-harness", about = "Demo harness for a game-integration client")]
struct Args {
    /// Demo page to run
    #[arg(short, long, value_enum)]
    page: Option<PageKind>,

    /// Server URL handed to the client on connect
    #[arg(long)]
    server_url: Option<String>,

    /// Game name announced on connect
    #[arg(short, long = "game")]
    game_name: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config().map_err(std::io::Error::other)?;
    let cli = CliOverrides {
        page: args.page,
        server_url: args.server_url,
        game_name: args.game_name,
        log_level: args.log_level,
    };
    let resolved = config::resolve(&file_config, &cli);

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    let level = LevelFilter::from_str(&resolved.log_level).unwrap_or(LevelFilter::Debug);

    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    log::info!(
        "neuro-harness starting: page={:?}, server={}, game={}",
        resolved.page,
        resolved.server_url,
        resolved.game_name
    );

    tui::run(resolved)
}
