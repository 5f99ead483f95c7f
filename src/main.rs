use chessvision::app::ChessApp;
use chessvision::{AppContext, AppError, Settings};
use tracing::Level;

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = Settings::load()?;
    init_logging(&settings.log_level);
    let context = AppContext::initialize(settings);
    ChessApp::start_gui(context)
}
