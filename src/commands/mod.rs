pub mod hours;
pub mod init;
#[cfg(debug_assertions)]
pub mod migrations;
pub mod milestone;
pub mod query;
pub mod report;
pub mod roadmap;
pub mod ticket;
pub mod user;

use crate::libs::env::Env;
use crate::libs::messages::Message;
use crate::web::component::ComponentManager;
use crate::web::request::{Method, Request, Response};
use crate::{msg_success, msg_warning};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Create, show, comment on and delete tickets")]
    Ticket(ticket::TicketArgs),
    #[command(about = "Manage milestones")]
    Milestone(milestone::MilestoneArgs),
    #[command(about = "Log hours worked on a ticket")]
    Add(hours::AddArgs),
    #[command(about = "Change or remove logged hours of a ticket")]
    Edit(hours::EditArgs),
    #[command(about = "Show the hours logged on a ticket")]
    Show(hours::ShowArgs),
    #[command(about = "Hours report over the tickets matching a query")]
    Report(report::ReportArgs),
    #[command(about = "Manage saved report queries")]
    Query(query::QueryArgs),
    #[command(about = "Hours by user")]
    User(user::UserArgs),
    #[command(about = "Estimated and worked hours per milestone")]
    Roadmap,
    #[cfg(debug_assertions)]
    #[command(about = "Database migration management (debug builds only)")]
    Migrations(migrations::MigrationsArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    /// Act as this user instead of the configured default
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        let user = cli.user;
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Ticket(args) => ticket::cmd(args, Host::open(user)?),
            Commands::Milestone(args) => milestone::cmd(args, Host::open(user)?),
            Commands::Add(args) => hours::add(args, Host::open(user)?),
            Commands::Edit(args) => hours::edit(args, Host::open(user)?),
            Commands::Show(args) => hours::show(args, Host::open(user)?),
            Commands::Report(args) => report::cmd(args, Host::open(user)?),
            Commands::Query(args) => query::cmd(args, Host::open(user)?),
            Commands::User(args) => user::cmd(args, Host::open(user)?),
            Commands::Roadmap => roadmap::cmd(Host::open(user)?),
            #[cfg(debug_assertions)]
            Commands::Migrations(args) => migrations::cmd(args),
        }
    }
}

/// The opened tracker together with the acting user, standing in for the
/// web host when commands run from the terminal.
pub struct Host {
    pub env: Env,
    pub manager: ComponentManager,
    pub user: Option<String>,
}

impl Host {
    pub fn open(user: Option<String>) -> Result<Self> {
        Ok(Self::with_env(Env::new()?, user))
    }

    /// Falls back to the configured default user.
    pub fn with_env(env: Env, user: Option<String>) -> Self {
        let user = user.or_else(|| env.config.default_user.clone());
        Host {
            env,
            manager: ComponentManager::new(),
            user,
        }
    }

    /// Name recorded as author or submitter.
    pub fn author(&self) -> String {
        self.user.clone().unwrap_or_else(|| Message::AnonymousUser.to_string())
    }

    pub fn request(&self, method: Method, path: &str) -> Request {
        let perm = self.env.config.permissions_for(self.user.as_deref());
        Request::new(method, path).user(self.user.as_deref(), perm)
    }

    /// Dispatches `req`, printing any warnings it produced.
    pub fn send(&mut self, req: &Request) -> Result<Response> {
        let response = self.manager.dispatch(&mut self.env, req)?;
        for warning in &response.warnings {
            msg_warning!(warning);
        }
        Ok(response)
    }
}

/// Writes exported content to `output`, or to stdout.
pub fn write_output(bytes: &[u8], output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, bytes)?;
            msg_success!(Message::ExportCompleted(path.display().to_string()));
        }
        None => std::io::stdout().write_all(bytes)?,
    }
    Ok(())
}
