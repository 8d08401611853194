mod cli;

use clap::error::ErrorKind;
use clap::Parser;
use cli::Cli;
use lea_harness::{Fault, Harness};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Usage errors exit 1 like every other fault, not clap's default of 2
            let fault = Fault::Usage(e.render().to_string());
            eprint!("{fault}");
            std::process::exit(fault.exit_code());
        }
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let mut builder = Harness::builder(&cli.module)
        .entry_point(cli.entry_point)
        .profile(cli.profile)
        .colors(cli.color.apply());
    if let Some(report) = cli.report {
        builder = builder.report(report);
    }

    std::process::exit(builder.build().execute());
}
