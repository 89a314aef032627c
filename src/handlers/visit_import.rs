//! Visit import message handlers
//!
//! `salesops.visit_import.preview` validates an upload and reports counts.
//! `salesops.visit_import.run` does the same and writes the valid rows.

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use base64::Engine;
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth;
use crate::services::visit_import::VisitImporter;
use crate::types::{ErrorResponse, Request, SuccessResponse, VisitImportRequest};

/// Which kind of pass a subject triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Preview,
    Run,
}

impl ImportMode {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Preview => "salesops.visit_import.preview",
            Self::Run => "salesops.visit_import.run",
        }
    }
}

/// Handle visit_import.preview / visit_import.run messages
pub async fn handle_visit_import(
    client: Client,
    mut subscriber: Subscriber,
    importer: Arc<VisitImporter>,
    jwt_secret: Arc<String>,
    mode: ImportMode,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received {} message", mode.subject());

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let response = process_message(&importer, &jwt_secret, mode, &msg.payload).await?;
        let _ = client.publish(reply, response.into()).await;
    }

    Ok(())
}

/// Run one request through auth, decoding and the pipeline.
///
/// Always yields a serialized reply; only serialization itself can fail.
async fn process_message(
    importer: &VisitImporter,
    jwt_secret: &str,
    mode: ImportMode,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let request: Request<VisitImportRequest> = match serde_json::from_slice(payload) {
        Ok(req) => req,
        Err(e) => {
            error!("Failed to parse request: {}", e);
            let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
            return Ok(serde_json::to_vec(&error)?);
        }
    };

    let auth_info = match auth::extract_auth(&request, jwt_secret) {
        Ok(info) => info,
        Err(_) => {
            let error = ErrorResponse::new(request.id, "UNAUTHORIZED", "Authentication required");
            return Ok(serde_json::to_vec(&error)?);
        }
    };

    if !auth_info.can_import_visits() {
        warn!("User {} with role {} tried a visit import", auth_info.user_id, auth_info.role);
        let error = ErrorResponse::new(
            request.id,
            "FORBIDDEN",
            "Visit import requires a manager or executive role",
        );
        return Ok(serde_json::to_vec(&error)?);
    }

    let encoded = request.payload.content_base64.trim();
    let estimated_size = encoded.len() / 4 * 3;
    if estimated_size > importer.max_upload_bytes() + 3 {
        let error = ErrorResponse::new(
            request.id,
            "PAYLOAD_TOO_LARGE",
            format!("Upload exceeds {} bytes", importer.max_upload_bytes()),
        );
        return Ok(serde_json::to_vec(&error)?);
    }

    let bytes = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            let error = ErrorResponse::new(
                request.id,
                "INVALID_REQUEST",
                format!("contentBase64 is not valid base64: {}", e),
            );
            return Ok(serde_json::to_vec(&error)?);
        }
    };

    let file_name = request.payload.file_name.as_deref().unwrap_or("<unnamed>");
    info!(
        "Visit import {:?} by user {}: {} ({} bytes)",
        mode,
        auth_info.user_id,
        file_name,
        bytes.len()
    );

    let result = match mode {
        ImportMode::Preview => importer
            .preview(&bytes)
            .await
            .map(|summary| serde_json::to_vec(&SuccessResponse::new(request.id, summary))),
        ImportMode::Run => importer
            .run(&bytes)
            .await
            .map(|summary| serde_json::to_vec(&SuccessResponse::new(request.id, summary))),
    };

    match result {
        Ok(response) => Ok(response?),
        Err(e) => {
            warn!("Visit import {:?} of {} failed: {}", mode, file_name, e);
            let error = ErrorResponse::new(request.id, e.code(), e.to_string());
            Ok(serde_json::to_vec(&error)?)
        }
    }
}
