use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Chainable, Result};

/// Turns diagram source into image bytes.
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, source: &str) -> Result<Vec<u8>>;
}

impl<R: DiagramRenderer + ?Sized> DiagramRenderer for &R {
    fn render(&self, source: &str) -> Result<Vec<u8>> {
        (**self).render(source)
    }
}

impl<R: DiagramRenderer + ?Sized> DiagramRenderer for Arc<R> {
    fn render(&self, source: &str) -> Result<Vec<u8>> {
        (**self).render(source)
    }
}

impl<R: DiagramRenderer + ?Sized> DiagramRenderer for Box<R> {
    fn render(&self, source: &str) -> Result<Vec<u8>> {
        (**self).render(source)
    }
}

/// Renders diagrams by running Graphviz's `dot` as a child process.
///
/// The source is written to the child's stdin, which is then closed, while
/// stdout and stderr are drained on their own threads so that neither side
/// can stall on a full pipe.
#[derive(Debug, Clone)]
pub struct Dot {
    program: OsString,
    args: Vec<OsString>,
    timeout: Duration,
    header_lines: usize,
}

impl Default for Dot {
    fn default() -> Self {
        Dot {
            program: Dot::PROGRAM.into(),
            args: vec!["-Tsvg".into()],
            timeout: Dot::TIMEOUT,
            header_lines: Dot::HEADER_LINES,
        }
    }
}

impl Dot {
    pub const PROGRAM: &'static str = "dot";

    pub const TIMEOUT: Duration = Duration::from_secs(30);

    /// `dot -Tsvg` opens its output with an XML declaration and a DOCTYPE
    /// that spans two lines. This is a positional assumption about `dot`'s
    /// output, not a parse of it: a different renderer or output format will
    /// need a different count.
    pub const HEADER_LINES: usize = 3;

    /// How long, once the renderer has exited or been killed, its pipes may
    /// stay open before the run is abandoned.
    pub const PIPE_GRACE: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Dot::default()
    }

    pub fn program<P: Into<OsString>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
        where I: IntoIterator<Item = A>, A: Into<OsString>
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how long the renderer may run. On expiry the renderer is killed.
    /// Anything it spawned that still holds its pipes is not waited for
    /// beyond [`Dot::PIPE_GRACE`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of leading output lines to discard.
    pub fn header_lines(mut self, n: usize) -> Self {
        self.header_lines = n;
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Runs the renderer on `input` and returns everything it wrote to stdout.
    pub fn run(&self, input: &[u8]) -> Result<Vec<u8>> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| error! {
                "failed to start diagram renderer",
                "program" => self.program_name(),
                "cause" => e,
                "hint" => "is Graphviz installed and on the PATH?",
            })?;

        let mut child = Reaper(child);
        let (stdin, stdout, stderr) = child.pipes()?;

        let input = input.to_vec();
        let written = pipe_thread(move || {
            let mut stdin = stdin;
            stdin.write_all(&input)?;
            stdin.flush()
        });

        let stdout = pipe_thread(move || drain(stdout));
        let stderr = pipe_thread(move || drain(stderr));
        let status = child.wait_timeout(self.timeout);

        // Processes the renderer spawned may still hold its pipes open.
        let deadline = Instant::now() + Dot::PIPE_GRACE;
        let written = collect(written, deadline);
        let stdout = collect(stdout, deadline);
        let stderr = collect(stderr, deadline);

        let status = status.chain_with(|| error! {
            "diagram renderer did not finish",
            "program" => self.program_name(),
        })?;

        if !status.success() {
            let stderr = stderr.unwrap_or_default();
            return err! {
                "diagram renderer failed",
                "program" => self.program_name(),
                "status" => status,
                "stderr" => String::from_utf8_lossy(&stderr).trim(),
            };
        }

        // A renderer may exit successfully without reading all of its input.
        match written {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(e).chain_with(|| error! {
                    "failed to write diagram source to renderer",
                    "program" => self.program_name(),
                });
            }
            _ => {}
        }

        stdout.chain_with(|| error! {
            "failed to read diagram renderer output",
            "program" => self.program_name(),
        })
    }
}

impl DiagramRenderer for Dot {
    fn render(&self, source: &str) -> Result<Vec<u8>> {
        let output = self.run(source.as_bytes())?;
        let image = skip_lines(&output, self.header_lines);
        if image.iter().all(u8::is_ascii_whitespace) {
            return err! {
                "diagram renderer produced no image",
                "program" => self.program_name(),
                "output bytes" => output.len(),
                "header lines skipped" => self.header_lines,
            };
        }

        tracing::trace!(bytes = image.len(), "rendered diagram");
        Ok(image.to_vec())
    }
}

/// Returns `bytes` without its first `n` newline-terminated lines.
pub fn skip_lines(bytes: &[u8], n: usize) -> &[u8] {
    let mut rest = bytes;
    for _ in 0..n {
        match memchr::memchr(b'\n', rest) {
            Some(i) => rest = &rest[i + 1..],
            None => return &rest[rest.len()..],
        }
    }

    rest
}

/// Runs `f` on a detached thread, handing back its result over a channel.
fn pipe_thread<T, F>(f: F) -> mpsc::Receiver<io::Result<T>>
    where T: Send + 'static, F: FnOnce() -> io::Result<T> + Send + 'static
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });

    rx
}

fn collect<T>(rx: mpsc::Receiver<io::Result<T>>, deadline: Instant) -> io::Result<T> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "renderer pipe was not closed after the renderer exited",
        )),
        Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
            io::ErrorKind::Other,
            "diagram renderer i/o thread panicked",
        )),
    }
}

fn drain<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Owns a child process; kills and reaps it if it's still around on drop.
struct Reaper(Child);

impl Reaper {
    fn pipes(&mut self) -> Result<(std::process::ChildStdin, std::process::ChildStdout, std::process::ChildStderr)> {
        match (self.0.stdin.take(), self.0.stdout.take(), self.0.stderr.take()) {
            (Some(i), Some(o), Some(e)) => Ok((i, o, e)),
            _ => err!("diagram renderer pipes were not captured"),
        }
    }

    /// Polls for exit until `timeout` elapses. The child is killed on every
    /// error path so that pipe readers observe EOF.
    fn wait_timeout(&mut self, timeout: Duration) -> Result<ExitStatus> {
        let start = Instant::now();
        loop {
            match self.0.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if start.elapsed() >= timeout => {
                    let _ = self.0.kill();
                    return err!("diagram renderer timed out", "timeout" => format!("{timeout:?}"));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(5)),
                Err(e) => {
                    let _ = self.0.kill();
                    return Err(e.into());
                }
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            let _ = self.0.kill();
        }

        let _ = self.0.wait();
    }
}
