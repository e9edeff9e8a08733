mod logging;
mod multi_progress;
mod progress_style;

pub use logging::init_tracing;
pub use multi_progress::MultiProgressNew;
pub use progress_style::ProgressStyleTemplate;
