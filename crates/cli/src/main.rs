use std::process::ExitCode;

fn main() -> ExitCode {
    donorway_cli::run()
}
