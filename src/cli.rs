use crate::Result;
use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Black-box test harness for the messaging example programs
#[derive(Parser)]
#[command(name = "example-harness")]
#[command(about = "Runs the messaging example binaries and checks their output")]
#[command(version)]
pub struct Cli {
    /// Directory containing the example executables (default: rely on PATH)
    #[arg(long)]
    pub examples_dir: Option<PathBuf>,

    /// Directory containing the test SSL certificates
    /// (default: <examples-dir>/ssl-certs)
    #[arg(long)]
    pub certs_dir: Option<PathBuf>,

    /// Directory to (re)create the SASL credential database in
    #[arg(long, default_value = "sasl-conf")]
    pub sasl_conf_dir: PathBuf,

    /// Run only scenarios whose name contains this substring
    #[arg(long)]
    pub filter: Option<String>,

    /// List scenario names and exit
    #[arg(long)]
    pub list: bool,
}

/// Resolved harness configuration.
///
/// Environment is snapshotted here, once, so the rest of the harness never
/// reads ambient state: `SASLPASSWD` names the external credential tool
/// (absence disables provisioning) and `HAS_CPP11` marks the optional
/// C++11 example binaries as present.
#[derive(Debug, Clone)]
pub struct Config {
    pub examples_dir: Option<PathBuf>,
    pub certs_dir: PathBuf,
    pub sasl_conf_dir: PathBuf,
    pub saslpasswd: Option<OsString>,
    pub cpp11: bool,
    pub filter: Option<String>,
    pub list: bool,
}

impl Config {
    /// Parse command line arguments into configuration
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let certs_dir = cli.certs_dir.unwrap_or_else(|| match &cli.examples_dir {
            Some(dir) => dir.join("ssl-certs"),
            None => PathBuf::from("ssl-certs"),
        });

        Ok(Config {
            examples_dir: cli.examples_dir,
            certs_dir,
            sasl_conf_dir: cli.sasl_conf_dir,
            saslpasswd: env::var_os("SASLPASSWD"),
            cpp11: env::var_os("HAS_CPP11").is_some_and(|v| !v.is_empty()),
            filter: cli.filter,
            list: cli.list,
        })
    }

    /// Path used to invoke an example binary: joined onto the configured
    /// examples directory, or the bare name so PATH lookup applies.
    pub fn bin(&self, name: &str) -> PathBuf {
        match &self.examples_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}
