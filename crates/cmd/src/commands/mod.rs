pub mod cat;
pub mod log;
pub mod mv;
pub mod rm;
pub mod save;
pub mod serve;

pub use cat::cat_command;
pub use log::log_command;
pub use mv::mv_command;
pub use rm::rm_command;
pub use save::save_command;
pub use serve::serve_command;
