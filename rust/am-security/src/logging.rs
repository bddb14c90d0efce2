use tracing_subscriber::EnvFilter;

/// Log level directives for the console, e.g. `info` or `stackable_am_security=debug`.
pub const CONSOLE_LOG_ENV: &str = "CONSOLE_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Installs the console subscriber. Logs go to stderr, stdout is reserved for command output.
pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_env(CONSOLE_LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}
