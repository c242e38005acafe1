use tracing::error;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    if let Err(err) = waycube::app::run() {
        error!("setup failed: {err:#}");
        std::process::exit(1);
    }
}
