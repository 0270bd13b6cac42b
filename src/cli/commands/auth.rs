use super::{open_workflow, session_store};
use crate::api::{FormsApi, FormsApiClient};
use crate::config::config;
use crate::lifecycle::types::Role;
use crate::session::Session;
use anyhow::Result;
use chrono::Utc;

pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

impl LoginCommand {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    pub async fn execute(&self) -> Result<()> {
        let settings = config()?;
        let client = FormsApiClient::new(&settings.api)?;

        print!("🔐 Logging in to {}... ", client.base_url());
        std::io::Write::flush(&mut std::io::stdout())?;

        let user = match client.login(&self.username, &self.password).await {
            Ok(user) => {
                println!("✅");
                user
            }
            Err(e) => {
                println!("❌");
                return Err(e.into());
            }
        };

        session_store(settings)
            .save(&Session::new(user.clone(), Utc::now()))
            .await?;
        println!("👤 {} ({})", user.name, user.role);
        Ok(())
    }
}

pub struct LogoutCommand;

impl LogoutCommand {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self) -> Result<()> {
        if session_store(config()?).clear().await? {
            println!("👋 Logged out");
        } else {
            println!("ℹ️  No active session");
        }
        Ok(())
    }
}

impl Default for LogoutCommand {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WhoamiCommand;

impl WhoamiCommand {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self) -> Result<()> {
        match session_store(config()?).load().await? {
            Some(session) => {
                println!("👤 {} ({})", session.user.name, session.user.role);
                println!(
                    "   Logged in {}",
                    session.logged_in_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            None => {
                println!("ℹ️  Not logged in");
                println!("   → inspection-forms login <username> --password <password>");
            }
        }
        Ok(())
    }
}

impl Default for WhoamiCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Lists backend users, optionally for a single role
pub struct UsersCommand {
    pub role: Option<Role>,
}

impl UsersCommand {
    pub fn new() -> Self {
        Self { role: None }
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let workflow = open_workflow().await?;
        let users = workflow.users(self.role).await?;

        match self.role {
            Some(role) => println!("👥 Users with role {role}"),
            None => println!("👥 Users"),
        }
        if users.is_empty() {
            println!("   No users found");
            return Ok(());
        }
        for user in &users {
            println!("   {:<6} {} ({})", user.id.as_deref().unwrap_or("-"), user.name, user.role);
        }
        Ok(())
    }
}

impl Default for UsersCommand {
    fn default() -> Self {
        Self::new()
    }
}
