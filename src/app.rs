//! Application wiring and the bridge boundary.
//!
//! [`Application`] builds every component from a [`Config`] and exposes the
//! operations the presentation layer may call. Each operation answers with a
//! result value from [`messages`]; no error escapes as a fault.

pub mod messages;
pub mod runtime;

use crate::config::Config;
use crate::dialogs::FileDialogs;
use crate::engine::{EngineCommand, EngineSupervisor, Framing, Renderer};
use crate::export::Exporter;
use crate::files::FileBridge;
use crate::gate::BusyGate;
use messages::{BridgeRequest, BridgeResponse, ExportResult, OpenFileResult, RenderResult, SaveResult};
use std::path::Path;
use std::sync::Arc;

pub struct Application {
    supervisor: Arc<EngineSupervisor>,
    renderer: Renderer,
    exporter: Exporter,
    files: FileBridge,
}

impl Application {
    /// Wire the components together. No process is started until the first render.
    pub fn new(config: &Config, dialogs: Arc<dyn FileDialogs>) -> Self {
        let command = EngineCommand::from_config(&config.engine);
        let framing = Framing::from_config(&config.engine);
        log::debug!(
            "Engine program {} with {:?} framing",
            command.program().display(),
            config.engine.framing
        );

        let supervisor = Arc::new(EngineSupervisor::new(command.clone(), framing));
        supervisor.on_exit(|report| {
            log::info!(
                "Engine process {:?} exited ({:?}); it will be restarted on the next render",
                report.pid,
                report.status
            );
        });

        // Export, open and save-as share one gate.
        let gate = BusyGate::new();
        let renderer = Renderer::new(Arc::clone(&supervisor), config.render.timeout());
        let exporter = Exporter::new(command, &config.export, Arc::clone(&dialogs), gate.clone());
        let files = FileBridge::new(dialogs, gate);

        Self {
            supervisor,
            renderer,
            exporter,
            files,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn supervisor(&self) -> &Arc<EngineSupervisor> {
        &self.supervisor
    }

    pub async fn render(&self, markup: &str) -> RenderResult {
        RenderResult::from(self.renderer.render(markup).await)
    }

    pub async fn export_image(&self, code: &str) -> ExportResult {
        self.exporter.export_to_file(code).await
    }

    pub async fn open_file(&self) -> OpenFileResult {
        self.files.open_file().await
    }

    pub async fn save_file(&self, path: &Path, content: &str) -> SaveResult {
        self.files.save_file(path, content).await
    }

    pub async fn save_file_as(&self, content: &str) -> SaveResult {
        self.files.save_file_as(content).await
    }

    /// Dispatch one bridge request
    pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        match request {
            BridgeRequest::Render { markup } => BridgeResponse::Render(self.render(&markup).await),
            BridgeRequest::ExportImage { code } => {
                BridgeResponse::Save(self.export_image(&code).await)
            }
            BridgeRequest::OpenFile => BridgeResponse::Open(self.open_file().await),
            BridgeRequest::SaveFile { file_path, content } => {
                BridgeResponse::Save(self.save_file(&file_path, &content).await)
            }
            BridgeRequest::SaveFileAs { content } => {
                BridgeResponse::Save(self.save_file_as(&content).await)
            }
        }
    }

    /// Stop the streaming engine process, if one is running.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
    }
}
