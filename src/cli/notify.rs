//! Notification intake from the command line
//!
//! Reads one provider notification (JSON) from a file or stdin, runs any
//! sync it queues, and prints the acknowledgement.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::settings::Settings;
use crate::connector::{Connector, ScriptedConnector};
use crate::error::LedgerResult;
use crate::services::{LedgerReconciler, NotificationIntake};
use crate::storage::Storage;
use crate::sync::SyncWorker;

use super::build_connector;

/// Handle `notify [--file <path>]`
pub async fn handle_notify_command(
    storage: &Arc<Storage>,
    settings: &Settings,
    file: Option<PathBuf>,
) -> LedgerResult<()> {
    let body = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            body
        }
    };

    // Status notifications still apply without a provider; only syncs need one
    let (connector, run_syncs) = match build_connector(settings) {
        Ok(connector) => (connector, true),
        Err(e) => {
            tracing::warn!(error = %e, "No provider configured, queued syncs will be dropped");
            (Arc::new(ScriptedConnector::new()) as Arc<dyn Connector>, false)
        }
    };

    let reconciler = Arc::new(LedgerReconciler::new(Arc::clone(storage), connector, settings));
    let mut worker = SyncWorker::new(reconciler, settings.sync.queue_capacity);
    if run_syncs {
        worker.start();
    }

    let intake = NotificationIntake::new(Arc::clone(storage), worker.handle());
    let ack = intake.handle_json(&body);

    worker.shutdown().await;

    println!("{}", serde_json::to_string(&ack)?);
    Ok(())
}
