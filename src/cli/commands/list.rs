use super::{open_workflow, summary_line};
use crate::lifecycle::types::{FormKind, FormStatus};
use anyhow::Result;

pub struct ListCommand {
    pub kind: FormKind,
    pub status: Option<FormStatus>,
}

impl ListCommand {
    pub fn new(kind: FormKind) -> Self {
        Self { kind, status: None }
    }

    pub fn with_status(mut self, status: Option<FormStatus>) -> Self {
        self.status = status;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let workflow = open_workflow().await?;
        let records = match self.status {
            Some(status) => workflow.list_by_status(self.kind, status).await?,
            None => workflow.list(self.kind).await?,
        };

        println!("📋 {} forms for {} ({})", self.kind, workflow.user().name, workflow.user().role);
        println!();
        if records.is_empty() {
            println!("   No forms found");
            return Ok(());
        }
        for record in &records {
            println!("   {}", summary_line(record));
        }
        println!();
        println!("   {} form(s)", records.len());
        Ok(())
    }
}
