pub mod language;
pub mod notification;
pub mod result_set;
pub mod scrape_request;
