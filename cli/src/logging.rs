use tracing_forest::{ForestLayer, printer::PrettyPrinter};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the forest subscriber on stderr; stdout is reserved for the run report.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(ForestLayer::from(PrettyPrinter::new().writer(std::io::stderr)))
        .init();
}
