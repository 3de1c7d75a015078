use std::ffi::OsString;

/// Render a program and its arguments as a single line, for logs
pub fn command_to_string(program: &str, args: &[OsString]) -> String {
    let args = args
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args)
    }
}
