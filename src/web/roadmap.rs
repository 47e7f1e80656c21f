//! Estimated and worked hours on the roadmap and milestone pages.

use super::component::{Component, Interface, TemplateFilter};
use super::page::HostPage;
use super::request::Request;
use crate::libs::env::Env;
use crate::libs::error::Result;
use crate::libs::permission::Capability;
use crate::libs::summary::milestone_hours;

pub struct RoadmapHours;

impl Component for RoadmapHours {
    fn name(&self) -> &'static str {
        "RoadmapHours"
    }

    fn interfaces(&self) -> Vec<Interface> {
        vec![Interface::TemplateFilter]
    }

    fn template_filter(&self) -> Option<&dyn TemplateFilter> {
        Some(self)
    }
}

impl TemplateFilter for RoadmapHours {
    /// Milestones without estimates or hours get no overlay.
    fn filter_page(&self, env: &mut Env, req: &Request, page: &mut HostPage) -> Result<()> {
        if !req.perm.has(Capability::TicketViewHours) {
            return Ok(());
        }

        match page {
            HostPage::Roadmap { milestones, overlays } => {
                overlays.clear();
                for milestone in milestones.iter() {
                    if let Some(hours) = milestone_hours(&env.db.conn, milestone)? {
                        overlays.push(hours);
                    }
                }
            }
            HostPage::Milestone { milestone, overlay } => {
                *overlay = milestone_hours(&env.db.conn, milestone)?;
            }
            HostPage::Ticket { .. } => {}
        }
        Ok(())
    }
}
