//! Host account database access
use std::fmt;

/// A user account as seen by the identification protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: u32,
    pub name: String,
}

impl Account {
    pub fn new(uid: u32, name: impl Into<String>) -> Self {
        Account {
            uid,
            name: name.into(),
        }
    }
}

/// Source of account names.
///
/// Implementations are queried per request; nothing is cached between
/// sessions.
pub trait AccountDatabase {
    /// All accounts, in the store's own enumeration order
    fn accounts(&self) -> Vec<Account>;

    /// Name of the account owning `uid`, if there is one
    fn account_name(&self, uid: u32) -> Option<String>;
}

/// The host's passwd database (files, NSS, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccounts;

impl AccountDatabase for SystemAccounts {
    fn accounts(&self) -> Vec<Account> {
        // SAFETY: getpwent() keeps iteration state in libc; sessions run one
        // at a time so no other enumeration is in flight.
        let users = unsafe { uzers::all_users() };
        users
            .map(|user| Account::new(user.uid(), user.name().to_string_lossy()))
            .collect()
    }

    fn account_name(&self, uid: u32) -> Option<String> {
        uzers::get_user_by_uid(uid).map(|user| user.name().to_string_lossy().into_owned())
    }
}

/// Account name as presented to the router: `DOMAIN\name` or bare `name`
#[derive(Debug, Clone, Copy)]
pub struct QualifiedName<'a> {
    pub domain: Option<&'a str>,
    pub name: &'a str,
}

impl<'a> QualifiedName<'a> {
    pub fn new(domain: Option<&'a str>, name: &'a str) -> Self {
        QualifiedName { domain, name }
    }
}

impl fmt::Display for QualifiedName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.domain {
            Some(domain) => write!(f, "{}\\{}", domain, self.name),
            None => f.write_str(self.name),
        }
    }
}
