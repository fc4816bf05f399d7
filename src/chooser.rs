//! External line chooser (dmenu and friends).
//!
//! Names go out on the child's stdin from a separate thread so a chooser
//! that answers before draining its input cannot deadlock us.

use crate::error::LaunchError;
use log::{debug, warn};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

pub struct Chooser {
    program: String,
    args: Vec<String>,
    max_response_bytes: usize,
}

impl Chooser {
    pub fn new(program: impl Into<String>, args: Vec<String>, max_response_bytes: usize) -> Self {
        Self {
            program: program.into(),
            args,
            max_response_bytes,
        }
    }

    /// Build a chooser from a shell-style command line such as `rofi -dmenu -i`.
    pub fn from_command_line(command: &str, max_response_bytes: usize) -> Result<Self, LaunchError> {
        let mut words = shell_words::split(command).map_err(|source| {
            LaunchError::InvalidChooserCommand {
                command: command.to_string(),
                source,
            }
        })?;
        if words.is_empty() {
            return Err(LaunchError::EmptyChooserCommand);
        }
        let program = words.remove(0);
        Ok(Self::new(program, words, max_response_bytes))
    }

    /// Present `names` and return the chosen line, or None if nothing was chosen.
    pub fn choose(&self, names: Vec<String>) -> Result<Option<String>, LaunchError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| LaunchError::ChooserSpawn {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("chooser stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("chooser stdout unavailable"))?;

        let writer = thread::spawn(move || write_names(stdin, &names));

        // stdout is dropped inside read_response, before we wait on the child.
        let response = read_response(stdout, self.max_response_bytes);

        let status = child.wait()?;
        if !status.success() {
            debug!("Chooser {} exited with {}", self.program, status);
        }

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!("Chooser closed its input early");
            }
            Ok(Err(err)) => warn!("Writing to chooser failed: {}", err),
            Err(_) => warn!("Chooser writer thread panicked"),
        }

        Ok(response?)
    }
}

fn write_names<W: Write>(sink: W, names: &[String]) -> io::Result<()> {
    let mut out = BufWriter::new(sink);
    for name in names {
        writeln!(out, "{}", name)?;
    }
    out.flush()
}

/// Read one line of at most `cap` bytes. Empty output means no selection,
/// and so does a line longer than `cap`: a cut-off answer could equal a
/// shorter name.
fn read_response<R: Read>(source: R, cap: usize) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    BufReader::new(source.take(cap as u64 + 1)).read_until(b'\n', &mut buf)?;

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > cap {
        warn!("Chooser answer exceeds {} bytes, ignoring it", cap);
        return Ok(None);
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    if buf.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
