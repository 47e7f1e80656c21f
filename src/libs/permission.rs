//! Capabilities gating hours operations.
//!
//! The host tracker owns users and grants; this module only names the
//! capabilities the hours tracker checks and carries the set a request was
//! made with.

use crate::libs::error::{HoursError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "TICKET_VIEW")]
    TicketView,
    #[serde(rename = "TICKET_VIEW_HOURS")]
    TicketViewHours,
    #[serde(rename = "TICKET_ADD_HOURS")]
    TicketAddHours,
    #[serde(rename = "TICKET_ADMIN")]
    TicketAdmin,
    #[serde(rename = "TRAC_ADMIN")]
    TracAdmin,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TicketView => "TICKET_VIEW",
            Capability::TicketViewHours => "TICKET_VIEW_HOURS",
            Capability::TicketAddHours => "TICKET_ADD_HOURS",
            Capability::TicketAdmin => "TICKET_ADMIN",
            Capability::TracAdmin => "TRAC_ADMIN",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capabilities held by the caller of a request.
///
/// `TRAC_ADMIN` implies every other capability, `TICKET_ADMIN` implies the
/// ticket-level ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    granted: BTreeSet<Capability>,
}

impl Permissions {
    pub fn new<I: IntoIterator<Item = Capability>>(caps: I) -> Self {
        Self { granted: caps.into_iter().collect() }
    }

    pub fn all() -> Self {
        Self::new([Capability::TracAdmin])
    }

    pub fn has(&self, cap: Capability) -> bool {
        if self.granted.contains(&cap) || self.granted.contains(&Capability::TracAdmin) {
            return true;
        }
        cap != Capability::TracAdmin && self.granted.contains(&Capability::TicketAdmin)
    }

    pub fn require(&self, cap: Capability) -> Result<()> {
        if self.has(cap) {
            Ok(())
        } else {
            Err(HoursError::PermissionDenied(cap))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_implies_everything() {
        let perm = Permissions::all();
        assert!(perm.has(Capability::TicketAddHours));
        assert!(perm.has(Capability::TracAdmin));
    }

    #[test]
    fn ticket_admin_is_not_trac_admin() {
        let perm = Permissions::new([Capability::TicketAdmin]);
        assert!(perm.has(Capability::TicketViewHours));
        assert!(!perm.has(Capability::TracAdmin));
    }

    #[test]
    fn require_reports_missing_capability() {
        let perm = Permissions::new([Capability::TicketViewHours]);
        assert!(perm.require(Capability::TicketViewHours).is_ok());
        match perm.require(Capability::TicketAddHours) {
            Err(HoursError::PermissionDenied(cap)) => assert_eq!(cap, Capability::TicketAddHours),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
