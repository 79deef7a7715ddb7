use clap::Parser;
use tracing::error;

use hedgelock::cli::{self, output, Cli};
use hedgelock::config::Config;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(output::OutputConfig { json: cli.json });

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            output::error(&format!("failed to load config: {e}"));
            std::process::exit(1);
        }
    };
    config.init_logging();
    config.apply_egress_proxy();

    if let Err(e) = cli::dispatch(cli, &config).await {
        error!(error = %e, "command failed");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
