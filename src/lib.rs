pub mod api;
pub mod history;
pub mod output;
pub mod search;
