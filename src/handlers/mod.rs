//! NATS message handlers

pub mod visit_import;

use std::sync::Arc;
use anyhow::Result;
use async_nats::Client;
use sqlx::PgPool;
use tracing::{info, error};
use tokio::select;

use crate::config::Config;
use crate::services::visit_import::VisitImporter;
use visit_import::ImportMode;

/// Start all message handlers
pub async fn start_handlers(client: Client, pool: PgPool, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    let importer = Arc::new(VisitImporter::postgres(pool, config.max_upload_bytes));
    let jwt_secret = Arc::new(config.jwt_secret.clone());

    // Subscribe to all subjects
    let preview_sub = client.subscribe(ImportMode::Preview.subject()).await?;
    let run_sub = client.subscribe(ImportMode::Run.subject()).await?;

    info!(
        "Subscribed to {}, {} (upload limit {} bytes)",
        ImportMode::Preview.subject(),
        ImportMode::Run.subject(),
        config.max_upload_bytes
    );

    let client_preview = client.clone();
    let importer_preview = Arc::clone(&importer);
    let jwt_secret_preview = Arc::clone(&jwt_secret);
    let preview_handle = tokio::spawn(async move {
        visit_import::handle_visit_import(
            client_preview,
            preview_sub,
            importer_preview,
            jwt_secret_preview,
            ImportMode::Preview,
        )
        .await
    });

    let client_run = client.clone();
    let run_handle = tokio::spawn(async move {
        visit_import::handle_visit_import(
            client_run,
            run_sub,
            importer,
            jwt_secret,
            ImportMode::Run,
        )
        .await
    });

    // Wait for any handler to finish (which shouldn't happen normally)
    select! {
        result = preview_handle => {
            error!("Visit import preview handler finished: {:?}", result);
        }
        result = run_handle => {
            error!("Visit import run handler finished: {:?}", result);
        }
    }

    Ok(())
}
