use super::{open_workflow, record_span};
use crate::cli::RecordArgs;
use crate::lifecycle::derived;
use anyhow::Result;
use tracing::Instrument;

pub struct ShowCommand {
    pub record: RecordArgs,
    pub json: bool,
}

impl ShowCommand {
    pub fn new(record: RecordArgs) -> Self {
        Self { record, json: false }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        self.run().instrument(record_span("show", &self.record)).await
    }

    async fn run(&self) -> Result<()> {
        let workflow = open_workflow().await?;
        let record = workflow.load(self.record.kind, &self.record.id).await?;
        let wire = serde_json::to_string_pretty(&record.to_wire()?)?;

        if self.json {
            println!("{wire}");
            return Ok(());
        }

        let envelope = &record.envelope;
        println!(
            "📄 {} form #{} ({})",
            record.kind(),
            self.record.id,
            derived::document_number(record.kind(), record.payload.reference_date())
        );
        println!("   Status: {}", record.status());
        if let (Some(by), Some(at)) = (&envelope.submitted_by, envelope.submitted_at) {
            println!("   Submitted by {by} at {}", at.format("%Y-%m-%d %H:%M"));
        }
        if let (Some(by), Some(at)) = (&envelope.reviewed_by, envelope.reviewed_at) {
            println!("   Reviewed by {by} at {}", at.format("%Y-%m-%d %H:%M"));
        }
        if let Some(comments) = &envelope.comments {
            println!("   💬 {comments}");
        }
        if let Some(composition) = record.payload.composition().filter(|c| !c.is_empty()) {
            println!("   Batch composition: {composition}");
        }

        let permissions = workflow.permissions(&record);
        let actions: Vec<&str> = permissions.actions().iter().map(|a| a.as_str()).collect();
        if actions.is_empty() {
            println!("   🔒 No actions available to {}", workflow.user().role);
        } else {
            println!("   ▶️  Available: {}", actions.join(", "));
        }
        println!();
        println!("{wire}");
        Ok(())
    }
}

pub struct HistoryCommand {
    pub record: RecordArgs,
}

impl HistoryCommand {
    pub fn new(record: RecordArgs) -> Self {
        Self { record }
    }

    pub async fn execute(&self) -> Result<()> {
        self.run().instrument(record_span("history", &self.record)).await
    }

    async fn run(&self) -> Result<()> {
        let workflow = open_workflow().await?;
        let record = workflow.load(self.record.kind, &self.record.id).await?;

        println!("🕑 History of {} form #{}", record.kind(), self.record.id);
        for entry in workflow.history(&record) {
            let at = entry
                .at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("   {:<10} {:<16} {:<12} {}", entry.action, at, entry.user, entry.details);
        }
        Ok(())
    }
}
