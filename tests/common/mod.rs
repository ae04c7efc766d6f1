#![allow(dead_code)]

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pumlpad::config::{Config, EngineConfig, ExportConfig, RenderConfig};
use pumlpad::dialogs::PresetDialogs;
use pumlpad::engine::FramingMode;
use pumlpad::Application;
use tokio::time::{timeout, Duration};

const OPERATION_TIMEOUT_MS: u64 = 10_000;

pub const TWO_STEP: &str = "@startuml\nAlice -> Bob: step one\nBob -> Alice: step two\n@enduml\n";

pub fn fake_engine() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("fake-plantuml.sh")
}

/// Configuration that runs the shell stand-in instead of a real engine
pub fn config(framing: FramingMode, timeout_ms: u64, temp_dir: &Path) -> Config {
    Config {
        engine: EngineConfig {
            program: Some(PathBuf::from("sh")),
            args: vec![fake_engine().display().to_string()],
            framing,
            ..EngineConfig::default()
        },
        render: RenderConfig { timeout_ms },
        export: ExportConfig {
            temp_dir: Some(temp_dir.to_path_buf()),
            ..ExportConfig::default()
        },
    }
}

pub fn app(config: &Config, dialogs: PresetDialogs) -> Arc<Application> {
    Arc::new(Application::new(config, Arc::new(dialogs)))
}

/// Single-diagram markup whose rendering shows `label`
pub fn diagram(label: &str) -> String {
    format!("@startuml\n{label}\n@enduml\n")
}

pub async fn within<F: Future>(future: F) -> F::Output {
    timeout(Duration::from_millis(OPERATION_TIMEOUT_MS), future)
        .await
        .expect("operation did not finish in time")
}

/// Sorted entries of `dir`; empty when it does not exist
pub fn entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = read.map(|entry| entry.unwrap().path()).collect();
    paths.sort();
    paths
}

pub fn kill_process(pid: u32) {
    let status = std::process::Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .status()
        .expect("run kill");
    assert!(status.success(), "kill -9 {pid} failed");
}
