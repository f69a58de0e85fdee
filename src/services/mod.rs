pub mod parameter_writer;
pub mod result_viewer;
pub mod scraper_invoker;

pub use parameter_writer::*;
pub use result_viewer::*;
pub use scraper_invoker::*;
