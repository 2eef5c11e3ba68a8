//! Child-process helpers used to launch the capture tool.
//!
//! - Windows console suppression for spawned children
//! - Command-line rendering with secrets masked, for logs
//! - Operator-facing exit status descriptions

use std::ffi::OsStr;
use std::process::ExitStatus;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Placeholder written in place of a secret argument.
pub const REDACTED: &str = "<redacted>";

/// Keep spawned children from opening a console window on Windows.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self) -> &mut Self;
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
        self
    }
}

/// Create a `tokio::process::Command` that never pops a console window.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Render a program and its arguments as one line, masking every argument
/// that equals one of `secrets`.
///
/// Empty secrets are ignored so an unset password does not blank out
/// unrelated empty arguments.
pub fn redact_args<S: AsRef<str>>(program: &str, args: &[S], secrets: &[&str]) -> String {
    let mut line = String::from(program);
    for arg in args {
        let arg = arg.as_ref();
        line.push(' ');
        if secrets.iter().any(|s| !s.is_empty() && *s == arg) {
            line.push_str(REDACTED);
        } else if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Describe how a child exited.
pub fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(0) => "exited successfully".to_string(),
        Some(code) => format!("exited with code {code}"),
        None => terminated_description(status),
    }
}

#[cfg(unix)]
fn terminated_description(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {signal}"),
        None => "terminated without an exit code".to_string(),
    }
}

#[cfg(not(unix))]
fn terminated_description(_status: &ExitStatus) -> String {
    "terminated without an exit code".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_masks_secret_arguments() {
        let args = ["--afreeca-username", "alice", "--afreeca-password", "hunter2"];
        let line = redact_args("streamlink", &args, &["hunter2"]);
        assert_eq!(
            line,
            "streamlink --afreeca-username alice --afreeca-password <redacted>"
        );
    }

    #[test]
    fn test_redact_ignores_empty_secret() {
        let args = ["-o", ""];
        let line = redact_args("streamlink", &args, &[""]);
        assert_eq!(line, "streamlink -o \"\"");
    }

    #[test]
    fn test_redact_quotes_whitespace() {
        let args = ["-o", "my dir/a.ts"];
        assert_eq!(
            redact_args("streamlink", &args, &[]),
            "streamlink -o \"my dir/a.ts\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_describe_exit_codes() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(
            describe_exit(&ExitStatus::from_raw(0)),
            "exited successfully"
        );
        // Raw wait status: exit code lives in the high byte.
        assert_eq!(
            describe_exit(&ExitStatus::from_raw(2 << 8)),
            "exited with code 2"
        );
        assert_eq!(
            describe_exit(&ExitStatus::from_raw(9)),
            "terminated by signal 9"
        );
    }
}
