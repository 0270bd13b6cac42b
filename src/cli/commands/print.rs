use super::{open_workflow, record_span};
use crate::api::EmailRequest;
use crate::cli::RecordArgs;
use anyhow::Result;
use std::path::PathBuf;
use tracing::Instrument;

pub struct PdfCommand {
    pub record: RecordArgs,
    pub output: Option<PathBuf>,
}

impl PdfCommand {
    pub fn new(record: RecordArgs) -> Self {
        Self { record, output: None }
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        self.run().instrument(record_span("pdf", &self.record)).await
    }

    async fn run(&self) -> Result<()> {
        let workflow = open_workflow().await?;
        let record = workflow.load(self.record.kind, &self.record.id).await?;
        let bytes = workflow.download_pdf(&record).await?;

        let output = self.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!("{}-{}.pdf", self.record.kind.as_str(), self.record.id))
        });
        tokio::fs::write(&output, &bytes).await?;
        println!("📥 Saved {} bytes to {}", bytes.len(), output.display());
        Ok(())
    }
}

pub struct EmailCommand {
    pub record: RecordArgs,
    pub request: EmailRequest,
}

impl EmailCommand {
    pub fn new(record: RecordArgs, to: String) -> Self {
        Self {
            record,
            request: EmailRequest::new(to),
        }
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        if let Some(subject) = subject {
            self.request = self.request.with_subject(subject);
        }
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        if let Some(body) = body {
            self.request = self.request.with_body(body);
        }
        self
    }

    pub async fn execute(&self) -> Result<()> {
        self.run().instrument(record_span("email", &self.record)).await
    }

    async fn run(&self) -> Result<()> {
        self.request.validate()?;
        let workflow = open_workflow().await?;
        let record = workflow.load(self.record.kind, &self.record.id).await?;
        workflow.email_pdf(&record, &self.request).await?;
        println!("📧 Sent {} form #{} to {}", record.kind(), self.record.id, self.request.to);
        Ok(())
    }
}
