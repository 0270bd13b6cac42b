use super::{open_workflow, parse_patch, record_span};
use crate::cli::RecordArgs;
use crate::lifecycle::types::{Action, FormKind};
use crate::telemetry::create_form_span;
use anyhow::Result;
use chrono::Utc;
use tracing::Instrument;

pub struct NewCommand {
    pub kind: FormKind,
    pub set: Option<String>,
}

impl NewCommand {
    pub fn new(kind: FormKind) -> Self {
        Self { kind, set: None }
    }

    pub fn with_fields(mut self, set: Option<String>) -> Self {
        self.set = set;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        self.run().instrument(create_form_span("new", self.kind.as_str(), None)).await
    }

    async fn run(&self) -> Result<()> {
        let patch = self.set.as_deref().map(parse_patch).transpose()?;
        let workflow = open_workflow().await?;
        let now = Utc::now();

        let mut draft = workflow.new_blank(self.kind, now.date_naive());
        if let Some(patch) = patch {
            draft = workflow.edit(&draft, &patch)?;
        }
        let saved = workflow.perform(&draft, Action::SaveDraft, None, now).await?;

        println!(
            "📝 Created {} draft #{}",
            self.kind,
            saved.record.id().unwrap_or("?")
        );
        Ok(())
    }
}

pub struct EditCommand {
    pub record: RecordArgs,
    pub set: String,
}

impl EditCommand {
    pub fn new(record: RecordArgs, set: String) -> Self {
        Self { record, set }
    }

    pub async fn execute(&self) -> Result<()> {
        self.run().instrument(record_span("edit", &self.record)).await
    }

    async fn run(&self) -> Result<()> {
        let patch = parse_patch(&self.set)?;
        let workflow = open_workflow().await?;
        let record = workflow.load(self.record.kind, &self.record.id).await?;

        let edited = workflow.edit(&record, &patch)?;
        let saved = workflow.save(&edited).await?;

        let fields: Vec<&str> = patch.keys().map(String::as_str).collect();
        println!(
            "✅ Saved {} on {} form #{} ({})",
            fields.join(", "),
            saved.kind(),
            self.record.id,
            saved.status()
        );
        Ok(())
    }
}
