use clap::Parser;
use log::debug;

use http_file_runner::cli::{Cli, OutputFormat};
use http_file_runner::{normalize_within, render, render_json, Dispatcher, HyperTransport, RequestSpec};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => logger.parse_filters(&filters),
        Err(_) => logger.filter_level(cli.log_level.clone().into()),
    };
    logger.init();

    let matching = cli.matching();
    let specs = RequestSpec::parse_http_file(&cli.file, matching)?;

    let dispatcher: Dispatcher = cli.dispatcher();
    let outcomes = dispatcher.dispatch_all(&specs, &HyperTransport).await?;

    for outcome in outcomes {
        println!("### {}", outcome.title);

        let view = match outcome.result {
            Ok(response) => normalize_within(response, matching, dispatcher.timeout).await,
            Err(err) => Err(err),
        };

        match view {
            Ok(view) => match cli.format {
                OutputFormat::Pretty => println!("{}\n", render(&view, !cli.no_body)),
                OutputFormat::Json => println!("{}", render_json(&view)?),
            },
            Err(err) => {
                debug!("request #{} failed: {err:?}", outcome.index);
                eprintln!("{err}\n");
            }
        }
    }

    Ok(())
}
