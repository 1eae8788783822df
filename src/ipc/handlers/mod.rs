pub mod config;
pub mod core;
pub mod grade_pass;
pub mod snapshot;
pub mod students;
pub mod table;
