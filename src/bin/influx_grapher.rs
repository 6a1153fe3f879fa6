use influx_grapher::cli::{app, config_from_matches};
use influx_grapher::parser::read_lines;
use influx_grapher::pipeline::{run, GrapherConfig};
use influx_grapher::render::SvgRenderer;
use influx_grapher::Result;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// RUST_LOG wins over the verbosity flag.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn grapher(config: &GrapherConfig) -> Result<()> {
    info!("read data from {}", config.csv_file.display());
    let lines = read_lines(&config.csv_file)?;
    let mut renderer = SvgRenderer::new(&config.outdir, config.title);
    let reports = run(config, &lines, &mut renderer)?;
    let written = reports.iter().filter(|r| r.output.is_some()).count();
    info!("processed {} series, wrote {} chart(s)", reports.len(), written);
    Ok(())
}

fn main() {
    let cli_args = app().get_matches();
    setup_logging(cli_args.is_present("verbose"));
    let result = config_from_matches(&cli_args).and_then(|config| grapher(&config));
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
