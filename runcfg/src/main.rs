//! `runcfg` - validate and inspect training-run configuration files

use clap::Parser;

use runcfg::cli::args::Cli;
use runcfg::cli::commands;
use runcfg::error::ExitCode;
use runcfg::observability::init_logging;

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let code = if e.use_stderr() {
            ExitCode::USAGE_ERROR
        } else {
            ExitCode::SUCCESS
        };
        let _ = e.print();
        std::process::exit(code);
    });

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
