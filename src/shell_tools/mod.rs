use crate::error::{DeployError, Result};
use std::fmt;
use std::process::{Command, Stdio};

/// A program, its arguments and extra environment variables. Arguments are
/// handed to the program as-is (no shell in between), so nothing needs quoting.
/// The environment is not part of the printable form.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandLine {
    pub fn new(program: &str) -> Self {
        CommandLine {
            program: program.to_string(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// `--name value`
    pub fn opt<S: AsRef<str>>(self, name: &str, value: S) -> Self {
        self.arg(format!("--{}", name)).arg(value)
    }

    /// Set on top of the inherited environment
    pub fn env<S: AsRef<str>>(mut self, key: &str, value: S) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }
}

#[cfg(test)]
impl CommandLine {
    /// true if the command line contains `--name value`
    pub fn has_opt(&self, name: &str, value: &str) -> bool {
        let flag = format!("--{}", name);
        self.args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    pub fn opt_value(&self, name: &str) -> Option<&str> {
        let flag = format!("--{}", name);
        self.args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            match arg.contains(char::is_whitespace) {
                true => write!(f, " '{}'", arg)?,
                false => write!(f, " {}", arg)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub command: String,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turns a non-zero exit code into an error carrying stderr
    pub fn check(self) -> Result<RunResult> {
        match self.success() {
            true => Ok(self),
            false => Err(DeployError::CommandFailed {
                command: self.command,
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            }),
        }
    }
}

/// Anything able to run a command line and report its outcome
pub trait CommandRunner {
    fn run(&self, command: &CommandLine) -> Result<RunResult>;

    fn exists(&self, program: &str) -> bool;
}

/// Runs commands on the local machine
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRunner;

impl CommandRunner for LocalRunner {
    fn run(&self, command: &CommandLine) -> Result<RunResult> {
        let output = Command::new(command.program())
            .args(command.args())
            .envs(command.envs().iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| DeployError::CommandNotFound {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        Ok(RunResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            // killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
            command: command.to_string(),
        })
    }

    fn exists(&self, program: &str) -> bool {
        check_command_exist(program)
    }
}

pub fn check_command_exist(command: &str) -> bool {
    if command.is_empty() || command.contains(' ') {
        return false;
    }
    Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}
