pub mod query;
pub mod searcher;
pub mod collector;
pub mod fuzzy;
pub mod inverted;
