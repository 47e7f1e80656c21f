use super::Host;
use crate::{
    db::tickets::Tickets,
    libs::{formatter::end_of_day, formatter::parse_date, messages::Message},
    msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct MilestoneArgs {
    #[command(subcommand)]
    command: MilestoneCommand,
}

#[derive(Debug, Subcommand)]
enum MilestoneCommand {
    /// Create a milestone
    New {
        name: String,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
}

pub fn cmd(args: MilestoneArgs, host: Host) -> Result<()> {
    match args.command {
        MilestoneCommand::New { name, due } => {
            let due = due.as_deref().map(parse_date).transpose()?.map(end_of_day);
            Tickets::new(&host.env.db.conn).create_milestone(&name, due)?;
            msg_success!(Message::MilestoneCreated(name));
            Ok(())
        }
    }
}
