use super::{open_workflow, session_store};
use crate::config::config;
use crate::lifecycle::permissions::{resolve, Capability, PermissionSet};
use crate::lifecycle::types::{FormKind, FormStatus, Role};
use anyhow::{bail, Result};

pub struct PermissionsCommand {
    pub kind: FormKind,
    pub id: Option<String>,
    pub role: Option<Role>,
    pub status: FormStatus,
}

impl PermissionsCommand {
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            id: None,
            role: None,
            status: FormStatus::Draft,
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    pub fn with_status(mut self, status: FormStatus) -> Self {
        self.status = status;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let (role, status, permissions) = match &self.id {
            Some(id) => {
                let workflow = open_workflow().await?;
                let record = workflow.load(self.kind, id).await?;
                let role = self.role.unwrap_or(workflow.user().role);
                let permissions = resolve(self.kind, role, record.status());
                (role, record.status(), permissions)
            }
            None => {
                let role = match self.role {
                    Some(role) => role,
                    None => match session_store(config()?).load().await? {
                        Some(session) => session.user.role,
                        None => bail!("pass --role or log in first"),
                    },
                };
                (role, self.status, resolve(self.kind, role, self.status))
            }
        };

        println!("🔑 {} on a {} {} form", role, status, self.kind);
        print_permissions(permissions);
        Ok(())
    }
}

fn print_permissions(permissions: PermissionSet) {
    for capability in Capability::ALL {
        let mark = if permissions.allows(capability) { "✅" } else { "❌" };
        println!("   {mark} {}", capability.name());
    }
    if permissions.is_read_only() {
        println!("   🔒 read-only");
    }
}
