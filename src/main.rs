use tickethours::commands::Cli;
use tickethours::libs::messages::macros::is_debug_mode;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    if is_debug_mode() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tickethours=debug".into()))
            .with_writer(std::io::stderr)
            .init();
    }

    Cli::menu()
}
