pub mod ask;
pub mod classify;
pub mod utils;
