//! Logger bootstrap for binaries and tests.
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initialises the global logger.
///
/// When `verbose` is `true`, per-tick debug messages from the physics core
/// are printed. Otherwise only info level and above are shown. `RUST_LOG`
/// takes precedence over both defaults.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // `try_init` only fails if a logger was already set. Ignore that case so
    // tests can call `init` multiple times without panicking.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn repeated_initialisation_is_harmless() {
        init(false);
        init(true);
        log::info!("logger initialised twice");
    }
}
