use super::Host;
use crate::{
    db::saved_queries::SavedQueries,
    libs::{messages::Message, view::View},
    msg_info, msg_print, msg_success,
    web::{
        page::Page,
        request::{parse_query_string, Content, Method},
    },
};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(subcommand)]
    command: QueryCommand,
}

#[derive(Debug, Subcommand)]
enum QueryCommand {
    /// List saved queries
    List,
    /// Save a report query, e.g. `status=new&col=id&col=summary`
    New {
        query: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Edit a saved query interactively
    Edit { id: i64 },
    /// Delete a saved query
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub fn cmd(args: QueryArgs, host: Host) -> Result<()> {
    match args.command {
        QueryCommand::List => handle_list(host),
        QueryCommand::New { query, title, description } => handle_save(host, 0, &title, &description, &query),
        QueryCommand::Edit { id } => handle_edit(host, id),
        QueryCommand::Delete { id, yes } => handle_delete(host, id, yes),
    }
}

fn handle_list(mut host: Host) -> Result<()> {
    let req = host.request(Method::Get, "/hours/query/list");
    let Content::Html(page) = host.send(&req)?.content else {
        return Ok(());
    };
    if let Page::Queries(queries) = *page {
        if queries.is_empty() {
            msg_info!(Message::NoQueriesFound);
            return Ok(());
        }
        View::queries(&queries)?;
    }
    Ok(())
}

fn handle_save(mut host: Host, id: i64, title: &str, description: &str, query: &str) -> Result<()> {
    let req = host
        .request(Method::Post, "/hours/query")
        .arg("id", &id.to_string())
        .arg("title", title)
        .arg("description", description)
        .arg("query", query.trim_start_matches('?'));
    let response = host.send(&req)?;
    if let Some(location) = response.location() {
        let saved = location
            .split_once('?')
            .map(|(_, query)| parse_query_string(query))
            .and_then(|args| args.into_iter().find(|(k, _)| k == "query_id"))
            .and_then(|(_, v)| v.parse::<i64>().ok())
            .unwrap_or(id);
        msg_success!(Message::QuerySaved(saved));
        msg_print!(location);
    }
    Ok(())
}

fn handle_edit(host: Host, id: i64) -> Result<()> {
    let current = SavedQueries::new(&host.env.db.conn).get(id)?;
    let theme = ColorfulTheme::default();

    let title: String = Input::with_theme(&theme)
        .with_prompt(Message::PromptQueryTitle.to_string())
        .default(current.title.clone())
        .interact_text()?;
    let description: String = Input::with_theme(&theme)
        .with_prompt(Message::PromptQueryDescription.to_string())
        .default(current.description.clone())
        .allow_empty(true)
        .interact_text()?;
    let query: String = Input::with_theme(&theme)
        .with_prompt(Message::PromptQuery.to_string())
        .default(current.query.clone())
        .interact_text()?;

    handle_save(host, id, &title, &description, &query)
}

fn handle_delete(mut host: Host, id: i64, yes: bool) -> Result<()> {
    let query = SavedQueries::new(&host.env.db.conn).get(id)?;
    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteQuery(query.title.clone()).to_string())
            .default(false)
            .interact()?;
    if !confirmed {
        msg_info!(Message::OperationCancelled);
        return Ok(());
    }

    let req = host
        .request(Method::Get, "/hours")
        .arg("delete_query", "1")
        .arg("query_id", &id.to_string());
    host.send(&req)?;
    msg_success!(Message::QueryDeleted(id));
    Ok(())
}
