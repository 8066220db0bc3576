use std::process::ExitCode;

fn main() -> ExitCode {
    match paste_app::platform::run_app() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("just_paste: {err}");
            ExitCode::FAILURE
        }
    }
}
