use qeeg_rs::QeegError;

pub const SUCCESS: i32 = 0;
pub const EXECUTION_ERROR: i32 = 1;
pub const INPUT_ERROR: i32 = 2;
pub const PARTIAL_FAILURE: i32 = 4;

/// Exit code for a library error: bad input files and configuration are input errors
pub fn for_error(error: &QeegError) -> i32 {
    match error {
        QeegError::UnreadableRecording(_)
        | QeegError::UnsupportedFormat(_)
        | QeegError::InvalidConfig(_)
        | QeegError::InvalidBand(_) => INPUT_ERROR,
        _ => EXECUTION_ERROR,
    }
}
