pub mod console_route;
pub mod export_route;
