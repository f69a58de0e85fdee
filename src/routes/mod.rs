pub mod app;
pub mod default_route;

pub use app::*;
