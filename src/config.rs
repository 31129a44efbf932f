//! Runtime configuration shared read-only by every session
use crate::accounts::QualifiedName;
use crate::conntable::ConnectionTables;
use crate::error::IdentError;
use crate::uid::UidRanges;

/// Port the router connects to
pub const DEFAULT_PORT: u16 = 14013;
/// Ordinary users usually start at 1000
pub const REAL_UID_MIN: u32 = 1000;
/// 'nobody' is usually 65534
pub const REAL_UID_MAX: u32 = 65533;

/// Immutable daemon configuration, built once before serving starts
#[derive(Debug, Clone)]
pub struct IdentConfig {
    pub port: u16,
    pub domain: Option<String>,
    pub uid_ranges: UidRanges,
    pub tables: ConnectionTables,
}

impl Default for IdentConfig {
    fn default() -> Self {
        IdentConfig {
            port: DEFAULT_PORT,
            domain: None,
            uid_ranges: UidRanges::with_defaults(REAL_UID_MIN, REAL_UID_MAX),
            tables: ConnectionTables::default(),
        }
    }
}

impl IdentConfig {
    /// Build a configuration admitting `[umin, umax]` plus the high uid range.
    pub fn new(
        port: u16,
        domain: Option<String>,
        umin: u32,
        umax: u32,
    ) -> Result<Self, IdentError> {
        if umin > umax {
            return Err(IdentError::InvalidConfig(format!(
                "Min. uid ({}) exceeds max. uid ({})!",
                umin, umax
            )));
        }

        Ok(IdentConfig {
            port,
            domain: domain.filter(|domain| !domain.is_empty()),
            uid_ranges: UidRanges::with_defaults(umin, umax),
            tables: ConnectionTables::default(),
        })
    }

    /// Read connection tables from somewhere other than `/proc/net`
    pub fn with_tables(mut self, tables: ConnectionTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn qualify<'a>(&'a self, name: &'a str) -> QualifiedName<'a> {
        QualifiedName::new(self.domain.as_deref(), name)
    }
}
