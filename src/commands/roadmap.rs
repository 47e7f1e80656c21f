use super::Host;
use crate::{
    db::tickets::Tickets,
    libs::{messages::Message, view::View},
    msg_info,
    web::{page::HostPage, request::Method},
};
use anyhow::Result;

pub fn cmd(mut host: Host) -> Result<()> {
    let milestones = Tickets::new(&host.env.db.conn).milestones()?;
    let req = host.request(Method::Get, "/roadmap");
    let mut page = HostPage::Roadmap {
        milestones,
        overlays: Vec::new(),
    };
    host.manager.filter_page(&mut host.env, &req, &mut page)?;

    let HostPage::Roadmap { overlays, .. } = page else {
        return Ok(());
    };
    if overlays.is_empty() {
        msg_info!(Message::NoHoursFound);
        return Ok(());
    }
    View::milestones(&overlays)?;
    Ok(())
}
