use std::process::ExitCode;

fn main() -> ExitCode {
    match bboxer::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            bboxer::report_error(&err);
            ExitCode::FAILURE
        }
    }
}
