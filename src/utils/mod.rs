mod command_to_string;
mod detect_software;
mod path_utils;

pub use detect_software::can_spawn;
pub use detect_software::check_tools;

pub use path_utils::expand_and_resolve;

pub use command_to_string::command_to_string;
