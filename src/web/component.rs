//! Extension points of the host tracker and the registry that dispatches to
//! the components implementing them.
//!
//! A component declares the interfaces it implements and hands out a typed
//! handle for each. The manager asks every registered component for the
//! handle of the interface at hand, in registration order.

use super::by_comment::HoursByComment;
use super::hours::HoursModule;
use super::page::HostPage;
use super::request::{Link, Request, Response};
use super::roadmap::RoadmapHours;
use super::ticket_change::TicketChange;
use super::user_hours::UserHoursModule;
use crate::libs::env::Env;
use crate::libs::error::{HoursError, Result};
use crate::libs::messages::Message;
use crate::libs::permission::Capability;
use crate::libs::ticket::Ticket;
use crate::msg_debug;

#[cfg(feature = "email")]
use super::email::EmailMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    RequestHandler,
    NavigationContributor,
    TemplateFilter,
    TicketChangeListener,
    TicketManipulator,
    PermissionRequestor,
    #[cfg(feature = "email")]
    EmailHandler,
}

pub trait RequestHandler {
    fn match_request(&self, req: &Request) -> bool;
    fn process_request(&self, env: &mut Env, req: &Request) -> Result<Response>;
}

/// An entry of the host's navigation bars.
#[derive(Debug, Clone, PartialEq)]
pub struct NavItem {
    pub category: String,
    pub name: String,
    pub link: Link,
}

pub trait NavigationContributor {
    /// Name of the navigation item highlighted for `req`.
    fn active_navigation_item(&self, req: &Request) -> &str;
    fn navigation_items(&self, req: &Request) -> Vec<NavItem>;
}

/// Decorates pages rendered by the host.
pub trait TemplateFilter {
    fn filter_page(&self, env: &mut Env, req: &Request, page: &mut HostPage) -> Result<()>;
}

pub trait TicketChangeListener {
    fn ticket_created(&self, _env: &mut Env, _ticket: &Ticket) -> Result<()> {
        Ok(())
    }
    fn ticket_changed(&self, env: &mut Env, ticket: &Ticket, comment: &str, author: &str) -> Result<()>;
    fn ticket_deleted(&self, env: &mut Env, ticket: &Ticket) -> Result<()>;
}

/// A field name (or `None` for the change as a whole) and what is wrong
/// with it.
pub type FieldProblem = (Option<String>, Message);

pub trait TicketManipulator {
    /// Checks and may rewrite a pending change. Any returned problem
    /// rejects the change.
    fn validate_ticket(&self, env: &mut Env, req: &Request, change: &mut TicketChange) -> Result<Vec<FieldProblem>>;
}

pub trait PermissionRequestor {
    fn permission_actions(&self) -> Vec<Capability>;
}

#[cfg(feature = "email")]
pub trait EmailHandler {
    fn match_message(&self, env: &Env, message: &EmailMessage) -> Result<bool>;
    fn invoke(&self, env: &Env, message: EmailMessage) -> Result<EmailMessage>;
}

pub trait Component {
    fn name(&self) -> &'static str;

    fn interfaces(&self) -> Vec<Interface>;

    fn request_handler(&self) -> Option<&dyn RequestHandler> {
        None
    }

    fn navigation_contributor(&self) -> Option<&dyn NavigationContributor> {
        None
    }

    fn template_filter(&self) -> Option<&dyn TemplateFilter> {
        None
    }

    fn ticket_change_listener(&self) -> Option<&dyn TicketChangeListener> {
        None
    }

    fn ticket_manipulator(&self) -> Option<&dyn TicketManipulator> {
        None
    }

    fn permission_requestor(&self) -> Option<&dyn PermissionRequestor> {
        None
    }

    #[cfg(feature = "email")]
    fn email_handler(&self) -> Option<&dyn EmailHandler> {
        None
    }
}

pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentManager {
    /// Registry holding every hours component.
    pub fn new() -> Self {
        Self::with(vec![
            Box::new(HoursModule),
            Box::new(UserHoursModule),
            Box::new(RoadmapHours),
            Box::new(HoursByComment),
        ])
    }

    pub fn with(components: Vec<Box<dyn Component>>) -> Self {
        ComponentManager { components }
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    pub fn implementing(&self, interface: Interface) -> impl Iterator<Item = &dyn Component> {
        self.components().filter(move |c| c.interfaces().contains(&interface))
    }

    /// Hands the request to the first handler matching it.
    pub fn dispatch(&self, env: &mut Env, req: &Request) -> Result<Response> {
        let handler = self
            .implementing(Interface::RequestHandler)
            .filter_map(|c| c.request_handler())
            .find(|h| h.match_request(req))
            .ok_or_else(|| HoursError::not_found(Message::UnknownRoute(req.path_info.clone())))?;
        msg_debug!(format!("Dispatching {}", req.path_info));
        handler.process_request(env, req)
    }

    pub fn navigation_items(&self, req: &Request) -> Vec<NavItem> {
        self.implementing(Interface::NavigationContributor)
            .filter_map(|c| c.navigation_contributor())
            .flat_map(|n| n.navigation_items(req))
            .collect()
    }

    pub fn permission_actions(&self) -> Vec<Capability> {
        let mut actions: Vec<Capability> = self
            .implementing(Interface::PermissionRequestor)
            .filter_map(|c| c.permission_requestor())
            .flat_map(|p| p.permission_actions())
            .collect();
        actions.sort();
        actions.dedup();
        actions
    }

    pub fn filter_page(&self, env: &mut Env, req: &Request, page: &mut HostPage) -> Result<()> {
        for filter in self.implementing(Interface::TemplateFilter).filter_map(|c| c.template_filter()) {
            filter.filter_page(env, req, page)?;
        }
        Ok(())
    }

    pub(crate) fn manipulators(&self) -> impl Iterator<Item = &dyn TicketManipulator> {
        self.implementing(Interface::TicketManipulator).filter_map(|c| c.ticket_manipulator())
    }

    pub(crate) fn listeners(&self) -> impl Iterator<Item = &dyn TicketChangeListener> {
        self.implementing(Interface::TicketChangeListener).filter_map(|c| c.ticket_change_listener())
    }

    /// Runs an incoming mail through every handler matching it.
    #[cfg(feature = "email")]
    pub fn process_email(&self, env: &Env, mut message: EmailMessage) -> Result<EmailMessage> {
        for handler in self.implementing(Interface::EmailHandler).filter_map(|c| c.email_handler()) {
            if handler.match_message(env, &message)? {
                message = handler.invoke(env, message)?;
            }
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_interfaces_have_handles() {
        let manager = ComponentManager::new();
        for component in manager.components() {
            for interface in component.interfaces() {
                let present = match interface {
                    Interface::RequestHandler => component.request_handler().is_some(),
                    Interface::NavigationContributor => component.navigation_contributor().is_some(),
                    Interface::TemplateFilter => component.template_filter().is_some(),
                    Interface::TicketChangeListener => component.ticket_change_listener().is_some(),
                    Interface::TicketManipulator => component.ticket_manipulator().is_some(),
                    Interface::PermissionRequestor => component.permission_requestor().is_some(),
                    #[cfg(feature = "email")]
                    Interface::EmailHandler => component.email_handler().is_some(),
                };
                assert!(present, "{} lacks {:?}", component.name(), interface);
            }
        }
    }

    #[test]
    fn hours_capabilities_are_requested() {
        assert_eq!(
            ComponentManager::new().permission_actions(),
            vec![Capability::TicketViewHours, Capability::TicketAddHours]
        );
    }
}
