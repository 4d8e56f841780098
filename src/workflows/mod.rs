pub mod prerequisites;
pub mod scrape;
pub mod walker;
