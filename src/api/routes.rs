//! Per-collection route table
//!
//! Every form kind lives in its own backend collection, and the collections
//! disagree on how status filters, PDF downloads and email requests are
//! addressed. The differences are captured here as data.

use crate::lifecycle::types::{FormKind, FormStatus, Role};
use std::fmt;

/// Path segments plus query parameters, joined onto the API base URL by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub segments: Vec<String>,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusFilter {
    PathSegment,
    QueryParam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitterFilter {
    PathSegment,
    /// No server-side filter; list everything and filter on `submittedBy`
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PdfRoute {
    /// `/{id}/pdf?userName=`
    UserNameQuery,
    /// `/{id}/pdf/{user}`
    UserSegment,
    /// `/pdf/{id}?user=`
    Leading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmailRoute {
    /// `/{id}/email-pdf/{user}`
    UserSegment,
    /// `/{id}/email-pdf`
    Anonymous,
    /// `/email/{id}`
    Leading,
}

/// Where a query for a role's working list goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    All,
    ByStatus(FormStatus),
    BySubmitter(String),
}

impl ListQuery {
    /// Operators see their own submissions, reviewers the review queue, masters everything
    pub fn for_role(role: Role, user_name: &str) -> Self {
        match role {
            Role::Operator => ListQuery::BySubmitter(user_name.to_string()),
            Role::Qa | Role::Avp => ListQuery::ByStatus(FormStatus::Submitted),
            Role::Master => ListQuery::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routes {
    kind: FormKind,
    collection: &'static str,
    status_filter: StatusFilter,
    submitter_filter: SubmitterFilter,
    pdf: PdfRoute,
    email: EmailRoute,
}

impl Routes {
    pub const fn for_kind(kind: FormKind) -> Self {
        match kind {
            FormKind::Coating => Self {
                kind,
                collection: "coating-inspection-reports",
                status_filter: StatusFilter::PathSegment,
                submitter_filter: SubmitterFilter::PathSegment,
                pdf: PdfRoute::UserNameQuery,
                email: EmailRoute::UserSegment,
            },
            FormKind::Printing => Self {
                kind,
                collection: "printing-inspection",
                status_filter: StatusFilter::QueryParam,
                submitter_filter: SubmitterFilter::Client,
                pdf: PdfRoute::Leading,
                email: EmailRoute::Leading,
            },
            FormKind::LineClearance => Self {
                kind,
                collection: "line-clearance-reports",
                status_filter: StatusFilter::PathSegment,
                submitter_filter: SubmitterFilter::PathSegment,
                pdf: PdfRoute::UserNameQuery,
                email: EmailRoute::UserSegment,
            },
            FormKind::Quality => Self {
                kind,
                collection: "incoming-quality-reports",
                status_filter: StatusFilter::PathSegment,
                submitter_filter: SubmitterFilter::PathSegment,
                pdf: PdfRoute::UserSegment,
                email: EmailRoute::UserSegment,
            },
            FormKind::Inspection => Self {
                kind,
                collection: "inspection-forms",
                status_filter: StatusFilter::PathSegment,
                submitter_filter: SubmitterFilter::PathSegment,
                pdf: PdfRoute::UserSegment,
                email: EmailRoute::Anonymous,
            },
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// Cache key prefix shared by every read of this collection
    pub fn cache_prefix(&self) -> String {
        format!("/api/{}", self.collection)
    }

    pub fn list(&self) -> Endpoint {
        Endpoint::new(["api", self.collection])
    }

    pub fn item(&self, id: &str) -> Endpoint {
        Endpoint::new(["api", self.collection, id])
    }

    pub fn by_status(&self, status: FormStatus) -> Endpoint {
        match self.status_filter {
            StatusFilter::PathSegment => {
                Endpoint::new(["api", self.collection, "status", status.as_str()])
            }
            StatusFilter::QueryParam => Endpoint::new(["api", self.collection, "status"])
                .with_query("status", status.as_str()),
        }
    }

    /// `None` when the collection has no submitter filter
    pub fn by_submitter(&self, submitter: &str) -> Option<Endpoint> {
        match self.submitter_filter {
            SubmitterFilter::PathSegment => {
                Some(Endpoint::new(["api", self.collection, "submitter", submitter]))
            }
            SubmitterFilter::Client => None,
        }
    }

    pub fn pdf(&self, id: &str, user_name: &str) -> Endpoint {
        match self.pdf {
            PdfRoute::UserNameQuery => {
                Endpoint::new(["api", self.collection, id, "pdf"]).with_query("userName", user_name)
            }
            PdfRoute::UserSegment => Endpoint::new(["api", self.collection, id, "pdf", user_name]),
            PdfRoute::Leading => {
                Endpoint::new(["api", self.collection, "pdf", id]).with_query("user", user_name)
            }
        }
    }

    pub fn email(&self, id: &str, user_name: &str) -> Endpoint {
        match self.email {
            EmailRoute::UserSegment => {
                Endpoint::new(["api", self.collection, id, "email-pdf", user_name])
            }
            EmailRoute::Anonymous => Endpoint::new(["api", self.collection, id, "email-pdf"]),
            EmailRoute::Leading => Endpoint::new(["api", self.collection, "email", id]),
        }
    }
}

pub fn login(username: &str, password: &str) -> Endpoint {
    Endpoint::new(["api", "users", "login"])
        .with_query("username", username)
        .with_query("password", password)
}

pub fn users() -> Endpoint {
    Endpoint::new(["api", "users"])
}

pub fn users_by_role(role: Role) -> Endpoint {
    Endpoint::new(["api", "users", "role", role.as_str()])
}
