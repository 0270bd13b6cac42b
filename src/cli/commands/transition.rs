use super::{open_workflow, record_span};
use crate::cli::TransitionArgs;
use crate::lifecycle::types::Action;
use anyhow::Result;
use chrono::Utc;
use tracing::Instrument;

/// Runs one of the six lifecycle actions against a stored form
pub struct TransitionCommand {
    pub action: Action,
    pub args: TransitionArgs,
}

impl TransitionCommand {
    pub fn new(action: Action, args: TransitionArgs) -> Self {
        Self { action, args }
    }

    pub async fn execute(&self) -> Result<()> {
        self.run().instrument(record_span(self.action.as_str(), &self.args.record)).await
    }

    async fn run(&self) -> Result<()> {
        let workflow = open_workflow().await?;
        let record = workflow
            .load(self.args.record.kind, &self.args.record.id)
            .await?;

        let transition = workflow
            .perform(&record, self.action, self.args.comment.clone(), Utc::now())
            .await?;

        let audit = &transition.audit;
        println!(
            "✅ {} {} form #{}: {} → {}",
            audit.action,
            record.kind(),
            self.args.record.id,
            audit.from,
            transition.record.status()
        );
        if let Some(comments) = &transition.record.envelope.comments {
            println!("   💬 {comments}");
        }
        Ok(())
    }
}
