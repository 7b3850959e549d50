//! Logging setup: `env_logger` backend, crate-scoped level, colorized output.

use colored::Colorize;
use env_logger::Builder;
use log::Level;
use std::io::Write;

/// Initialize logging. `verbose` raises the crate's own level to `Debug`; dependencies stay
/// capped at `Warn` regardless, so a noisy dependency never drowns out our own diagnostics.
pub fn setup_logging(verbose: bool) {
    use log::LevelFilter;

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // The crate's module path uses underscores even though the package name has a hyphen;
    // filter_module matches against the module path, so it must use the same separator.
    let crate_module = env!("CARGO_PKG_NAME").replace('-', "_");

    Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(&crate_module, level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!("[{} {} {}] {}", name.cyan(), level_str, path, record.args())
                }
                _ => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .init();
}
