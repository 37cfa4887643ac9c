pub mod reader_pool;
pub mod frame;
