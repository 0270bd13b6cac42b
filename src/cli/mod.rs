use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::lifecycle::types::{FormKind, FormStatus, Role};

pub mod commands;

#[derive(Parser)]
#[command(name = "inspection-forms")]
#[command(about = "Manufacturing inspection form approvals from the command line")]
#[command(long_about = "Create, fill in and route QA inspection forms (coating, printing, line clearance, \
                       incoming quality and general inspection) through the operator -> QA -> AVP approval \
                       workflow. Start with 'inspection-forms login'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// A stored form addressed by kind and id
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Form kind: coating, printing, clearance, quality or inspection
    pub kind: FormKind,
    /// Record id
    pub id: String,
}

/// A stored form plus an optional review comment
#[derive(Args, Debug, Clone)]
pub struct TransitionArgs {
    #[command(flatten)]
    pub record: RecordArgs,
    /// Comment recorded with the transition (required for rejections)
    #[arg(long, short = 'm')]
    pub comment: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the user for later commands
    Login {
        /// Backend user name
        username: String,
        /// Password
        #[arg(long, short = 'p')]
        password: String,
    },
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List backend users
    Users {
        /// Only users holding this role
        #[arg(long)]
        role: Option<Role>,
    },
    /// List the forms relevant to your role
    List {
        /// Form kind
        kind: FormKind,
        /// List every form in this status instead of your role's default view
        #[arg(long)]
        status: Option<FormStatus>,
    },
    /// Show a form with its status, stamps and available actions
    Show {
        #[command(flatten)]
        record: RecordArgs,
        /// Print the backend JSON only
        #[arg(long)]
        json: bool,
    },
    /// Show who created, submitted and reviewed a form
    History {
        #[command(flatten)]
        record: RecordArgs,
    },
    /// Create a new draft from the blank template
    New {
        /// Form kind
        kind: FormKind,
        /// JSON object of fields to fill in before saving
        #[arg(long)]
        set: Option<String>,
    },
    /// Edit fields of a stored form
    Edit {
        #[command(flatten)]
        record: RecordArgs,
        /// JSON object of top-level fields to replace
        #[arg(long)]
        set: String,
    },
    /// Show what a role may do with a form
    Permissions {
        /// Form kind
        kind: FormKind,
        /// Record id; omit to look up a role and status directly
        id: Option<String>,
        /// Role to resolve for (defaults to the logged-in user)
        #[arg(long)]
        role: Option<Role>,
        /// Status to resolve for when no id is given
        #[arg(long, default_value = "DRAFT")]
        status: FormStatus,
    },
    /// Save a form as a draft
    SaveDraft(TransitionArgs),
    /// Submit a form for review
    Submit(TransitionArgs),
    /// Sign a submitted form as QA and forward it for approval
    QaSubmit(TransitionArgs),
    /// Reject a submitted form as QA (requires --comment)
    QaReject(TransitionArgs),
    /// Approve a submitted form
    Approve(TransitionArgs),
    /// Reject a submitted form (requires --comment)
    Reject(TransitionArgs),
    /// Download the PDF rendering of a form
    Pdf {
        #[command(flatten)]
        record: RecordArgs,
        /// Output file (defaults to <kind>-<id>.pdf)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Email the PDF rendering of a form
    Email {
        #[command(flatten)]
        record: RecordArgs,
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Subject line
        #[arg(long)]
        subject: Option<String>,
        /// Message body
        #[arg(long)]
        body: Option<String>,
    },
}
