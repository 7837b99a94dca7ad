//! `find-invalid-chars`: reports group members whose directory properties
//! hold characters that are not valid in XML.

use std::error::Error as _;
use std::io::{self, Write};
use std::process::ExitCode;

use ad_invalid_chars::directory::snapshot;
use ad_invalid_chars::{Error, ScanConfig, logging, run};
use clap::Parser;
use tracing::error;

fn main() -> ExitCode {
    let config = ScanConfig::parse();
    if let Err(err) = logging::init(config.log_level()) {
        let _ = writeln!(io::stderr(), "failed to install the log subscriber: {err}");
    }

    let outcome = snapshot::load(&config.snapshot)
        .map_err(|source| Error::NoSearchProvider {
            path: config.snapshot.clone(),
            source,
        })
        .and_then(|directory| {
            let mut input = io::stdin().lock();
            let mut output = io::stdout().lock();
            run(&directory, &config, &mut input, &mut output)
        });

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) if err.is_graceful() => {
            let _ = writeln!(io::stdout(), "{err}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "run failed");
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                let _ = writeln!(stderr, "  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
