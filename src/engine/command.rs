//! Engine invocation: program resolution and the two command-line shapes.

use crate::config::EngineConfig;
use crate::engine::Framing;
use crate::export::ImageFormat;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Program name looked up on `PATH` when nothing else is configured
pub const FALLBACK_PROGRAM: &str = "plantuml";

/// A resolved engine launcher: program plus leading arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    program: PathBuf,
    args: Vec<OsString>,
    charset: String,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>, charset: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            charset: charset.into(),
        }
    }

    /// Resolve the launcher from configuration.
    ///
    /// An explicit program wins. Otherwise a runtime bundled beside the
    /// executable (`../jre/bin/java -jar ../bin/plantuml.jar`) is used when
    /// both files exist, and `plantuml` on `PATH` is the last resort.
    pub fn from_config(config: &EngineConfig) -> Self {
        if let Some(program) = &config.program {
            let args = config.args.iter().map(OsString::from).collect();
            return Self::new(program.clone(), args, config.charset.clone());
        }

        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        if let Some((java, jar)) = exe_dir.as_deref().and_then(bundled_runtime) {
            log::debug!("Using bundled engine {} with {}", java.display(), jar.display());
            let mut args = vec![OsString::from("-jar"), jar.into_os_string()];
            args.extend(config.args.iter().map(OsString::from));
            return Self::new(java, args, config.charset.clone());
        }

        let args = config.args.iter().map(OsString::from).collect();
        Self::new(FALLBACK_PROGRAM, args, config.charset.clone())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for the long-lived interactive process
    pub fn streaming_args(&self, framing: &Framing) -> Vec<OsString> {
        let mut args = self.args.clone();
        args.extend(["-pipe", "-tsvg", "-charset"].map(OsString::from));
        args.push(OsString::from(&self.charset));
        if let Some(delimiter) = framing.pipe_delimiter() {
            args.push(OsString::from("-pipedelimitor"));
            args.push(OsString::from(delimiter));
        }
        args
    }

    /// Arguments for a one-shot file conversion
    pub fn batch_args(&self, format: ImageFormat, input: &Path) -> Vec<OsString> {
        let mut args = self.args.clone();
        args.push(OsString::from(format.engine_flag()));
        args.push(OsString::from("-charset"));
        args.push(OsString::from(&self.charset));
        args.push(input.as_os_str().to_os_string());
        args
    }

    /// Interactive process with all three standard streams piped
    pub fn streaming(&self, framing: &Framing) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.streaming_args(framing))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Batch process; stdout is discarded and stderr captured for diagnostics
    pub fn batch(&self, format: ImageFormat, input: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.batch_args(format, input))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

fn bundled_runtime(exe_dir: &Path) -> Option<(PathBuf, PathBuf)> {
    let root = exe_dir.parent()?;
    let java = if cfg!(windows) {
        root.join("jre").join("bin").join("java.exe")
    } else {
        root.join("jre").join("bin").join("java")
    };
    let jar = root.join("bin").join("plantuml.jar");
    (java.is_file() && jar.is_file()).then_some((java, jar))
}
