//! Line-delimited JSON transport for the bridge.
//!
//! Each input line is one request object carrying an `id` and an `op`; each
//! output line is `{"id": .., "result": ..}` or, for lines that could not be
//! parsed, `{"id": .., "error": ..}`. Requests run concurrently, so responses
//! may arrive out of order and are matched by `id`.

use crate::app::messages::{BridgeRequest, BridgeResponse};
use crate::app::Application;
use crate::error::{PumlpadError, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

/// Correlation id chosen by the client
pub type ClientRequestId = u64;

#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    pub id: Option<ClientRequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BridgeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    fn result(id: ClientRequestId, response: BridgeResponse) -> Self {
        Self {
            id: Some(id),
            result: Some(response),
            error: None,
        }
    }

    fn error(id: Option<ClientRequestId>, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Split a request line into its id and operation.
pub fn parse_request(
    line: &str,
) -> std::result::Result<(ClientRequestId, BridgeRequest), ResponseEnvelope> {
    let mut value: Value = serde_json::from_str(line)
        .map_err(|e| ResponseEnvelope::error(None, format!("Invalid JSON: {e}")))?;

    let id = value.get("id").and_then(Value::as_u64);
    if let Some(object) = value.as_object_mut() {
        object.remove("id");
    }
    let Some(id) = id else {
        return Err(ResponseEnvelope::error(None, "Request is missing a numeric id"));
    };

    let request = serde_json::from_value(value)
        .map_err(|e| ResponseEnvelope::error(Some(id), format!("Invalid request: {e}")))?;
    Ok((id, request))
}

/// Serve requests from `input` until it closes, then return `output`.
///
/// In-flight requests are allowed to finish before the function returns.
pub async fn serve<R, W>(app: Arc<Application>, input: R, output: W) -> Result<W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<ResponseEnvelope>();
    let writer = tokio::spawn(write_responses(rx, output));

    let mut lines = LinesStream::new(BufReader::new(input).lines());
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next().await {
        let line = line.map_err(|e| PumlpadError::file_error("Failed to read request", e))?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_request(&line) {
            Ok((id, request)) => {
                let app = Arc::clone(&app);
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let response = app.handle(request).await;
                    send(&tx, ResponseEnvelope::result(id, response));
                });
            }
            Err(envelope) => send(&tx, envelope),
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(err) = joined {
            log::error!("Bridge request task failed: {err}");
        }
    }
    drop(tx);

    match writer.await {
        Ok(written) => written.map_err(|e| PumlpadError::file_error("Failed to write response", e)),
        Err(err) => Err(PumlpadError::other(format!("Response writer failed: {err}"))),
    }
}

fn send(tx: &UnboundedSender<ResponseEnvelope>, envelope: ResponseEnvelope) {
    if tx.send(envelope).is_err() {
        log::error!("Response writer is gone; dropping response");
    }
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
    mut output: W,
) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(envelope) = rx.recv().await {
        let mut line = match serde_json::to_string(&envelope) {
            Ok(line) => line,
            Err(err) => {
                log::error!("Failed to encode response: {err}");
                continue;
            }
        };
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(output)
}
