//! Who is acting, and on which day
//!
//! Built once per request by the caller (HTTP auth layer, CLI) and passed
//! into every service entry point.

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// The acting account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// An authenticated user of the API
    User(String),
    /// The command line, trusted as admin
    Cli,
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Self::User(id) => id,
            Self::Cli => "cli",
        }
    }
}

/// Per-request context
#[derive(Debug, Clone)]
pub struct RequestContext {
    principal: Principal,
    is_admin: bool,
    today: NaiveDate,
}

impl RequestContext {
    /// Context for a user whose admin status has already been looked up
    pub fn new(principal: Principal, is_admin: bool, today: NaiveDate) -> Self {
        Self {
            principal,
            is_admin,
            today,
        }
    }

    /// Admin context for command-line runs
    pub fn cli(today: NaiveDate) -> Self {
        Self::new(Principal::Cli, true, today)
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Reject non-admin callers
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            tracing::warn!(principal = self.principal.id(), "Non-admin call rejected");
            Err(Error::forbidden("Not authorized."))
        }
    }

    /// Same caller, different day
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}
