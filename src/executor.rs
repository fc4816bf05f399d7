use crate::config::{FieldCodeMode, LaunchConfig};
use crate::error::LaunchError;
use crate::model::Candidate;
use log::info;
use std::collections::HashMap;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Rewrites `%X` field codes in an Exec= value before it reaches the shell.
pub trait FieldCodes {
    fn substitute(&self, exec: &str) -> String;
}

/// Drops every `%` together with the character after it.
pub struct StripFieldCodes;

impl FieldCodes for StripFieldCodes {
    fn substitute(&self, exec: &str) -> String {
        let mut out = String::with_capacity(exec.len());
        let mut chars = exec.chars();
        while let Some(c) = chars.next() {
            if c == '%' {
                chars.next();
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// Passes the command line through untouched.
pub struct KeepFieldCodes;

impl FieldCodes for KeepFieldCodes {
    fn substitute(&self, exec: &str) -> String {
        exec.to_string()
    }
}

impl FieldCodeMode {
    pub fn strategy(self) -> Box<dyn FieldCodes> {
        match self {
            FieldCodeMode::Strip => Box::new(StripFieldCodes),
            FieldCodeMode::Keep => Box::new(KeepFieldCodes),
        }
    }
}

/// First candidate whose display name equals `choice` exactly.
pub fn select<'a>(candidates: &'a [Candidate], choice: &str) -> Option<&'a Candidate> {
    candidates.iter().find(|c| c.name == choice)
}

pub struct Launcher {
    field_codes: Box<dyn FieldCodes>,
    env: HashMap<String, String>,
}

impl Launcher {
    pub fn new(field_codes: Box<dyn FieldCodes>) -> Self {
        Self {
            field_codes,
            env: HashMap::new(),
        }
    }

    pub fn from_config(config: &LaunchConfig) -> Self {
        let mut launcher = Self::new(config.field_codes.strategy());
        launcher.env = config.env.clone();
        launcher
    }

    pub fn command_line(&self, candidate: &Candidate) -> String {
        self.field_codes.substitute(&candidate.command)
    }

    /// Start the candidate through `sh -c` in its own session and return without waiting.
    pub fn launch(&self, candidate: &Candidate) -> Result<(), LaunchError> {
        let command_line = self.command_line(candidate);

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .envs(&self.env);

        unsafe {
            command.pre_exec(|| {
                nix::unistd::setsid().map_err(io::Error::from)?;
                Ok(())
            });
        }

        let child = command.spawn().map_err(|source| LaunchError::Execution {
            command: command_line.clone(),
            source,
        })?;
        info!("Launched {:?} as pid {}", candidate.name, child.id());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_field_codes_in_pairs() {
        assert_eq!(StripFieldCodes.substitute("app %f --opt %U"), "app  --opt ");
        assert_eq!(StripFieldCodes.substitute("a%%b"), "ab");
        assert_eq!(StripFieldCodes.substitute("trailing %"), "trailing ");
        assert_eq!(StripFieldCodes.substitute("plain"), "plain");
    }

    #[test]
    fn keep_leaves_command_alone() {
        assert_eq!(KeepFieldCodes.substitute("app %f"), "app %f");
    }

    #[test]
    fn selection_is_exact_and_first() {
        let candidates = vec![
            Candidate::new("A", "a"),
            Candidate::new("B", "b"),
            Candidate::new("C", "c"),
        ];
        assert_eq!(select(&candidates, "B").map(|c| c.command.as_str()), Some("b"));
        assert!(select(&candidates, "b").is_none());
        assert!(select(&candidates, "B ").is_none());
        assert!(select(&candidates, "").is_none());
    }

    #[test]
    fn launcher_applies_configured_strategy() {
        let config = LaunchConfig {
            field_codes: FieldCodeMode::Keep,
            env: HashMap::from([("DESKRUN_TEST".to_string(), "1".to_string())]),
        };
        assert_eq!(Launcher::from_config(&config).env, config.env);
        let candidate = Candidate::new("Viewer", "viewer %F");
        assert_eq!(Launcher::from_config(&config).command_line(&candidate), "viewer %F");
        assert_eq!(
            Launcher::new(Box::new(StripFieldCodes)).command_line(&candidate),
            "viewer "
        );
    }

    #[test]
    fn launch_returns_without_waiting() {
        let launcher = Launcher::new(Box::new(StripFieldCodes));
        let started = std::time::Instant::now();
        launcher.launch(&Candidate::new("Sleeper", "sleep 5 %u")).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(4));
    }
}
