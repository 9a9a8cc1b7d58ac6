use super::ApplicationEnv;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

///
/// Compact console output plus a daily rolling log file, both behind a
/// single `RUST_LOG` filter defaulting to INFO.
///
pub fn setup_tracing(env: &ApplicationEnv) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;

    let console_layer = tracing_subscriber::fmt::layer().compact().with_target(false);

    let file_appender = tracing_appender::rolling::daily(&env.log_directory, &env.log_filename);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(())
}
