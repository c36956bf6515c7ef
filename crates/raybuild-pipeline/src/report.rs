// SPDX-License-Identifier: CEPL-1.0
use std::io::{self, Write};

use tracing::{error, warn};

use crate::command::{CommandLine, CommandResult};

/// Console presentation of captured compiler output.
///
/// Stdout is echoed verbatim. Stderr goes line by line through the log as
/// `WARN` (exit 0) or `ERROR` (failure) events, so it picks up the
/// subscriber's level colouring and stands out in a build log.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reporter;

impl Reporter {
    pub fn report(&self, command: &CommandLine, result: &CommandResult) {
        let stdout = io::stdout();
        self.report_to(command, result, &mut stdout.lock());
    }

    /// Write failures are ignored; reporting never aborts a build.
    pub fn report_to(&self, command: &CommandLine, result: &CommandResult, out: &mut dyn Write) {
        if !result.stdout.is_empty() {
            let _ = out.write_all(result.stdout.as_bytes());
            if !result.stdout.ends_with('\n') {
                let _ = out.write_all(b"\n");
            }
            let _ = out.flush();
        }

        let program = command.program();
        let ok = result.success();
        for line in result.stderr.lines() {
            if ok {
                warn!("{program}: {line}");
            } else {
                error!("{program}: {line}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct LogBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuf {
        type Writer = LogBuf;
        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Returns (stdout, log) produced by one report.
    fn render(result: &CommandResult) -> (String, String) {
        let log = LogBuf::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .finish();
        let mut out = Vec::new();
        tracing::subscriber::with_default(subscriber, || {
            Reporter.report_to(&CommandLine::new("glslc"), result, &mut out);
        });
        let log = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        (String::from_utf8(out).unwrap(), log)
    }

    #[test]
    fn silent_result_prints_nothing() {
        for code in [Some(0), Some(1), None] {
            let res = CommandResult {
                code,
                ..Default::default()
            };
            assert_eq!(render(&res), (String::new(), String::new()));
        }
    }

    #[test]
    fn stdout_is_verbatim() {
        let res = CommandResult {
            stdout: "Timings:\n  parse 1ms\n".into(),
            stderr: String::new(),
            code: Some(0),
        };
        let (out, log) = render(&res);
        assert_eq!(out, "Timings:\n  parse 1ms\n");
        assert!(log.is_empty());
    }

    #[test]
    fn stderr_is_marked_by_outcome() {
        let mut res = CommandResult {
            stdout: String::new(),
            stderr: "a\nb\n".into(),
            code: Some(0),
        };
        let (out, log) = render(&res);
        assert!(out.is_empty());
        assert_eq!(log.lines().count(), 2);
        assert!(log.lines().all(|l| l.contains("WARN")));
        assert!(log.contains("glslc: a") && log.contains("glslc: b"));

        res.code = Some(2);
        let (_, log) = render(&res);
        assert_eq!(log.lines().count(), 2);
        assert!(log.lines().all(|l| l.contains("ERROR")));
    }

    #[test]
    fn broken_sink_does_not_panic() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
        }
        let res = CommandResult {
            stdout: "x".into(),
            stderr: "y".into(),
            code: Some(1),
        };
        Reporter.report_to(&CommandLine::new("odin"), &res, &mut Broken);
    }
}
