//! Operator commands.

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::host::PregenHost;
use crate::pregen::{PregenReport, PregenScheduler};
use crate::raster::CoverageRect;

pub const PREGEN_COMMAND: &str = "overlay pregen";

/// Privilege required for commands that stall the whole world.
pub const ADMIN_PRIVILEGE: &str = "server.admin";

/// Whoever issued a command.
#[derive(Clone, Debug, Default)]
pub struct Caller {
    pub name: String,
    pub privileges: Vec<String>,
}

impl Caller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privileges: Vec::new(),
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self::new(name).with_privilege(ADMIN_PRIVILEGE)
    }

    pub fn with_privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privileges.push(privilege.into());
        self
    }

    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.privileges.iter().any(|p| p == privilege)
    }
}

/// Pre-generate the whole coverage area. Only callers holding
/// [`ADMIN_PRIVILEGE`] may run it.
pub fn pregen(
    caller: &Caller,
    coverage: CoverageRect,
    config: &OverlayConfig,
    host: &mut dyn PregenHost,
) -> Result<PregenReport> {
    if !caller.has_privilege(ADMIN_PRIVILEGE) {
        log::warn!("{} tried '{}' without privilege", caller.name, PREGEN_COMMAND);
        return Err(OverlayError::PermissionDenied {
            command: PREGEN_COMMAND.to_string(),
            privilege: ADMIN_PRIVILEGE.to_string(),
        });
    }
    log::info!("{} started '{}'", caller.name, PREGEN_COMMAND);
    PregenScheduler::new(coverage, config).run(host)
}
