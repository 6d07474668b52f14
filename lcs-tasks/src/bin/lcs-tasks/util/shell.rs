use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Result;
use xshell::{cmd, Shell};

/// A single external command: program, arguments and the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path arguments are passed on as given, with `/` separators on every host.
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().replace('\\', "/");
        self.arg(arg)
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.current_dir {
            write!(f, "(in {}) ", dir.display())?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Executes [`Invocation`]s.
pub trait Runner {
    /// Runs the command with inherited stdio and fails if it exits unsuccessfully.
    fn run(&mut self, invocation: &Invocation) -> Result<()>;

    /// Runs the command and returns its captured standard output.
    fn read(&mut self, invocation: &Invocation) -> Result<String>;

    /// Whether commands are only printed. Tasks then leave the file system untouched too.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Spawns real processes through an [`xshell::Shell`].
pub struct ShellRunner {
    sh: Shell,
}

impl ShellRunner {
    pub fn new() -> Result<Self> {
        Ok(Self { sh: Shell::new()? })
    }
}

impl Runner for ShellRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        let sh = &self.sh;
        let _dir = invocation.dir().map(|dir| sh.push_dir(dir));
        let program = invocation.program();
        let args = invocation.arguments();

        cmd!(sh, "{program} {args...}").quiet().run()?;

        Ok(())
    }

    fn read(&mut self, invocation: &Invocation) -> Result<String> {
        let sh = &self.sh;
        let _dir = invocation.dir().map(|dir| sh.push_dir(dir));
        let program = invocation.program();
        let args = invocation.arguments();

        let output = cmd!(sh, "{program} {args...}").quiet().read()?;

        Ok(output)
    }
}

/// Prints every command instead of running it.
#[derive(Default)]
pub struct DryRunner;

impl Runner for DryRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        println!("[dry-run] {invocation}");
        Ok(())
    }

    fn read(&mut self, invocation: &Invocation) -> Result<String> {
        self.run(invocation)?;
        Ok(String::new())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

/// Records invocations and answers every `read` with a canned output.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRunner {
    pub invocations: Vec<Invocation>,
    pub output: String,
}

#[cfg(test)]
impl RecordingRunner {
    pub fn with_output(output: impl Into<String>) -> Self {
        Self {
            invocations: Vec::new(),
            output: output.into(),
        }
    }

    /// Rendered command lines, in execution order.
    pub fn commands(&self) -> Vec<String> {
        self.invocations.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
impl Runner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.invocations.push(invocation.clone());
        Ok(())
    }

    fn read(&mut self, invocation: &Invocation) -> Result<String> {
        self.invocations.push(invocation.clone());
        Ok(self.output.clone())
    }
}
