use std::path::Path;

use anyhow::Result;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging. `dir` – when set, JSON lines go to an hourly rolling
/// `shardsim.log` there; otherwise plain text goes to stderr. `level` – default
/// level, overridable through `RUST_LOG`.
pub fn init(dir: Option<&Path>, level: Level) -> Result<()> {
    let layer = match dir {
        Some(dir) => {
            let file_appender = RollingFileAppender::new(Rotation::HOURLY, dir, "shardsim.log");
            fmt::layer()
                .with_writer(file_appender)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_filter(filter(level))
                .boxed()
        }
        None => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter(level))
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}
