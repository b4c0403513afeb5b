use crate::process::{Disposal, ManagedProcess};
use crate::Result;
use std::path::Path;

/// The single broker process shared by the whole run.
///
/// Started once with a bind-any-port argument; the announced port is
/// resolved lazily on first use and cached. Scenarios receive this handle
/// read-only through the run context and never dispose it themselves; the
/// run tears it down (kill and drain) after the last scenario. Sharing one
/// broker trades test isolation for speed, deliberately.
pub struct Broker {
    process: ManagedProcess,
}

impl Broker {
    pub fn start(bin: impl AsRef<Path>) -> Result<Self> {
        let process = ManagedProcess::spawn(bin, &["-a", "//:0"], Disposal::KillAndDrain)?;
        Ok(Self { process })
    }

    /// `:<port>/<resource>` for the broker's announced port.
    pub fn address(&mut self, resource: &str) -> Result<String> {
        self.process.address(resource)
    }
}
