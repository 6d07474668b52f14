pub mod common_options;
pub mod logging;
pub mod shell;
pub mod table;
