pub mod catalog;
pub mod http;
pub mod interrupt;
pub mod retry;
