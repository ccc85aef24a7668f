use clap::Parser;
use signalbourse::cli::{run, Cli};
use signalbourse::logging::init_tracing;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}
