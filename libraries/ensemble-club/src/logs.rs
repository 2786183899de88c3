//! Audit log review

use crate::club::Club;
use ensemble_core::types::ExportedLog;
use ensemble_core::{Action, Actor, Collection, LogEntry, Result};
use tracing::warn;

impl Club {
    /// Stored entries, newest first
    pub async fn logs(&self, actor: &Actor) -> Result<Vec<LogEntry>> {
        self.policy.authorize(Some(actor), Action::ReviewLogs)?;
        Ok(self.state.lock().await.logs.clone())
    }

    /// Drop every entry. Clearing is not itself logged.
    pub async fn clear_logs(&self, actor: &Actor) -> Result<()> {
        self.policy.authorize(Some(actor), Action::ReviewLogs)?;

        let mut state = self.lock().await;
        let empty: Vec<LogEntry> = Vec::new();
        self.store.save(Collection::Logs, &empty).await?;
        state.logs = empty;
        warn!(actor = %actor.name, "Audit log cleared");
        Ok(())
    }

    /// Pretty-printed JSON array of `{timestamp, actor, action, metadata}`
    pub async fn export_logs(&self, actor: &Actor) -> Result<String> {
        let logs = self.logs(actor).await?;
        let exported: Vec<ExportedLog> = logs.iter().map(LogEntry::export).collect();
        Ok(serde_json::to_string_pretty(&exported)?)
    }
}
