// SPDX: CC0-1.0

use anyhow::Context;
use log::info;
use std::{
    io::{stdin, stdout, BufWriter, Write},
    process::ExitCode,
};
use termcalc::{config::Config, session::Session};

fn main() -> ExitCode {
    // keep the session quiet unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    info!(
        "variable '{}', history in {}",
        config.variable,
        config.history.display()
    );

    let mut stdout = BufWriter::new(stdout());
    writeln!(
        stdout,
        "{} {}, a terminal calculator",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )?;
    Session::new(config).run(stdin().lock(), &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
