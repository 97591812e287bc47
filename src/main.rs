use std::{io, process::ExitCode};

use clap::Parser;
use cryptofolio::{
    api::{CoinGeckoClient, PriceSource},
    cli::App,
    config::Args,
    errors::AppError,
};
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // .env first: clap reads its env fallbacks while parsing
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cryptofolio stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    if args.offline {
        let source = args.static_prices();
        info!(prices = args.prices.len(), "starting offline");
        let mut app = App::new(&source, None, &args.vs_currency, args.market_limit, &args.export_path);
        return app.run(stdin.lock(), stdout.lock());
    }

    let client = CoinGeckoClient::new(args.coingecko_config())?;
    info!(api_url = %args.api_url, vs_currency = client.vs_currency(), "starting online");
    let source: &dyn PriceSource = &client;
    let mut app = App::new(source, Some(&client), client.vs_currency(), args.market_limit, &args.export_path);
    app.run(stdin.lock(), stdout.lock())
}
