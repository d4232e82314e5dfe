use std::process::ExitCode;

fn main() -> ExitCode {
    markrun::cli::run()
}
