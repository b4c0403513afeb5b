use crate::broker::Broker;
use crate::cli::Config;
use crate::process;
use crate::Result;
use color_eyre::eyre::Report;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Optional build features of the example set. A scenario that needs an
/// absent capability is skipped, which is distinct from failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The C++11-only example binaries were built (`HAS_CPP11`).
    Cpp11,
}

/// One test scenario: a name, an optional capability gate, and a body that
/// spawns processes and checks their output.
pub struct Scenario {
    pub name: &'static str,
    pub requires: Option<Capability>,
    pub run: fn(&Ctx) -> Result<()>,
}

/// Read-only run context handed to every scenario.
///
/// Owns the configuration and the shared broker. The broker sits behind a
/// `RefCell` because resolving its port reads the output stream; the
/// runner is strictly single-threaded so the borrow is never contended.
/// Scenarios get address composition and binary lookup, never disposal
/// authority over the broker.
pub struct Ctx {
    config: Config,
    broker: RefCell<Broker>,
}

impl Ctx {
    pub fn new(config: Config, broker: Broker) -> Self {
        Self {
            config,
            broker: RefCell::new(broker),
        }
    }

    /// Path used to invoke an example binary.
    pub fn bin(&self, name: &str) -> PathBuf {
        self.config.bin(name)
    }

    /// `:<port>/<resource>` on the shared broker. Lazily resolves the
    /// broker's port on the first call of the run.
    pub fn broker_address(&self, resource: &str) -> Result<String> {
        self.broker.borrow_mut().address(resource)
    }

    pub fn certs_dir(&self) -> &Path {
        &self.config.certs_dir
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Cpp11 => self.config.cpp11,
        }
    }

    /// Fire-and-capture: run the named example to completion and return
    /// its combined output.
    pub fn capture(&self, name: &str, args: &[&str]) -> Result<String> {
        process::capture(self.bin(name), args)
    }
}

/// Per-run outcome accounting.
#[derive(Default)]
pub struct Summary {
    pub passed: Vec<&'static str>,
    pub failed: Vec<(&'static str, Report)>,
    pub skipped: Vec<&'static str>,
}

impl Summary {
    pub fn ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs scenarios sequentially. A failing scenario is recorded and the run
/// continues; only provisioning (which happens before this) aborts a run.
pub fn run(ctx: &Ctx, scenarios: &[Scenario], filter: Option<&str>) -> Summary {
    let mut summary = Summary::default();
    for scenario in scenarios {
        if let Some(filter) = filter {
            if !scenario.name.contains(filter) {
                continue;
            }
        }
        if let Some(capability) = scenario.requires {
            if !ctx.supports(capability) {
                info!(scenario = scenario.name, ?capability, "skipped");
                summary.skipped.push(scenario.name);
                continue;
            }
        }
        info!(scenario = scenario.name, "running");
        match (scenario.run)(ctx) {
            Ok(()) => {
                info!(scenario = scenario.name, "passed");
                summary.passed.push(scenario.name);
            }
            Err(report) => {
                error!(scenario = scenario.name, "failed: {report:#}");
                summary.failed.push((scenario.name, report));
            }
        }
    }
    summary
}
