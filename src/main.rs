use anyhow::Result;
use clap::Parser;
use tracing::Instrument;

use inspection_forms::cli::commands::{
    EditCommand, EmailCommand, HistoryCommand, ListCommand, LoginCommand, LogoutCommand,
    NewCommand, PdfCommand, PermissionsCommand, ShowCommand, TransitionCommand, UsersCommand,
    WhoamiCommand,
};
use inspection_forms::cli::{Cli, Commands};
use inspection_forms::observability::{api_metrics, create_workflow_span};
use inspection_forms::telemetry::{generate_correlation_id, init_telemetry};
use inspection_forms::{config, init_config, Action};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config()?;
    init_telemetry(&settings.observability.log_level)?;
    init_config()?;

    let Some(command) = cli.command else {
        return show_getting_started();
    };

    let correlation_id = generate_correlation_id();
    let span = create_workflow_span(command_name(&command), &correlation_id);
    let result = tokio::runtime::Runtime::new()?.block_on(run(command).instrument(span));

    if settings.observability.metrics_enabled {
        api_metrics().log_stats();
    }
    result
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            LoginCommand::new(username, password).execute().await
        }
        Commands::Logout => LogoutCommand::new().execute().await,
        Commands::Whoami => WhoamiCommand::new().execute().await,
        Commands::Users { role } => UsersCommand::new().with_role(role).execute().await,
        Commands::List { kind, status } => {
            ListCommand::new(kind).with_status(status).execute().await
        }
        Commands::Show { record, json } => ShowCommand::new(record).with_json(json).execute().await,
        Commands::History { record } => HistoryCommand::new(record).execute().await,
        Commands::New { kind, set } => NewCommand::new(kind).with_fields(set).execute().await,
        Commands::Edit { record, set } => EditCommand::new(record, set).execute().await,
        Commands::Permissions {
            kind,
            id,
            role,
            status,
        } => {
            PermissionsCommand::new(kind)
                .with_id(id)
                .with_role(role)
                .with_status(status)
                .execute()
                .await
        }
        Commands::SaveDraft(args) => TransitionCommand::new(Action::SaveDraft, args).execute().await,
        Commands::Submit(args) => TransitionCommand::new(Action::Submit, args).execute().await,
        Commands::QaSubmit(args) => TransitionCommand::new(Action::QaSubmit, args).execute().await,
        Commands::QaReject(args) => TransitionCommand::new(Action::QaReject, args).execute().await,
        Commands::Approve(args) => TransitionCommand::new(Action::Approve, args).execute().await,
        Commands::Reject(args) => TransitionCommand::new(Action::Reject, args).execute().await,
        Commands::Pdf { record, output } => PdfCommand::new(record).with_output(output).execute().await,
        Commands::Email {
            record,
            to,
            subject,
            body,
        } => {
            EmailCommand::new(record, to)
                .with_subject(subject)
                .with_body(body)
                .execute()
                .await
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Login { .. } => "login",
        Commands::Logout => "logout",
        Commands::Whoami => "whoami",
        Commands::Users { .. } => "users",
        Commands::List { .. } => "list",
        Commands::Show { .. } => "show",
        Commands::History { .. } => "history",
        Commands::New { .. } => "new",
        Commands::Edit { .. } => "edit",
        Commands::Permissions { .. } => "permissions",
        Commands::SaveDraft(_) => "save-draft",
        Commands::Submit(_) => "submit",
        Commands::QaSubmit(_) => "qa-submit",
        Commands::QaReject(_) => "qa-reject",
        Commands::Approve(_) => "approve",
        Commands::Reject(_) => "reject",
        Commands::Pdf { .. } => "pdf",
        Commands::Email { .. } => "email",
    }
}

fn show_getting_started() -> Result<()> {
    println!("🧪 Inspection Forms - QA form approvals");
    println!();
    println!("To get started:");
    println!("  🔐 inspection-forms login <username> -p <password>");
    println!("  📋 inspection-forms list coating         # Forms waiting on you");
    println!("  📝 inspection-forms new printing         # Start a new draft");
    println!("  📄 inspection-forms show coating <id>    # Inspect a form");
    println!();
    println!("Review commands:");
    println!("  ✅ inspection-forms approve coating <id>");
    println!("  ↩️  inspection-forms reject coating <id> -m \"reason\"");
    println!();
    println!("💡 Run 'inspection-forms --help' for every command");
    Ok(())
}
