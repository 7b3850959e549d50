//! pw-dedup CLI: `pw-dedup <output> <input>...`

use clap::Parser;
use pw_dedup::engine::Cli;
use pw_dedup::types::DedupOpts;
use pw_dedup::{DedupError, dedup_paths};

fn main() {
    let cli = Cli::parse();
    pw_dedup::utils::setup_logging(cli.verbose);

    let opts = DedupOpts::from(&cli);
    if let Err(err) = dedup_paths(&cli.inputs, &cli.output, &opts) {
        eprintln!("pw-dedup: error: {err:#}");
        let code = err
            .downcast_ref::<DedupError>()
            .map(DedupError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
