use crate::cli::Config;
use crate::Result;
use eyre::{bail, eyre, WrapErr};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Accepted mechanisms written into the server config.
const MECH_LIST: &str = "EXTERNAL DIGEST-MD5 SCRAM-SHA-1 CRAM-MD5 PLAIN ANONYMOUS";

/// One-shot SASL credential provisioning, run before any process spawns.
///
/// If no credential tool is configured this is a no-op. Otherwise the
/// credential directory is rebuilt from scratch and `PN_SASL_CONFIG_PATH`
/// is exported so every subsequently spawned example inherits it. Any
/// failure here is fatal to the whole run; the SSL/SASL scenarios cannot
/// mean anything without valid credentials.
pub fn provision(config: &Config) -> Result<()> {
    let Some(tool) = config.saslpasswd.as_deref() else {
        debug!("SASLPASSWD not set, skipping credential provisioning");
        return Ok(());
    };
    let dir = provision_at(tool, &config.sasl_conf_dir)?;
    env::set_var("PN_SASL_CONFIG_PATH", &dir);
    info!(dir = %dir.display(), "SASL credentials provisioned");
    Ok(())
}

/// Rebuilds the credential directory and runs the external password tool
/// once. Separated from [`provision`] so tests can exercise it without
/// touching the process environment.
///
/// The directory is removed if present and recreated, which makes repeated
/// provisioning converge on the same state. Returns the absolute directory
/// path.
pub fn provision_at(tool: &OsStr, conf_dir: &Path) -> Result<PathBuf> {
    let conf_dir = if conf_dir.is_absolute() {
        conf_dir.to_path_buf()
    } else {
        env::current_dir()?.join(conf_dir)
    };

    match fs::remove_dir_all(&conf_dir) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .wrap_err_with(|| format!("removing old credential dir {}", conf_dir.display()))
        }
    }
    fs::create_dir_all(&conf_dir)
        .wrap_err_with(|| format!("creating credential dir {}", conf_dir.display()))?;

    let db = conf_dir.join("proton.sasldb");
    let conf = conf_dir.join("proton-server.conf");
    fs::write(
        &conf,
        format!("sasldb_path: {}\nmech_list: {MECH_LIST}\n", db.display()),
    )
    .wrap_err_with(|| format!("writing {}", conf.display()))?;

    info!(tool = ?tool, db = %db.display(), "generating credential database");
    let mut child = Command::new(tool)
        .arg("-c")
        .arg("-p")
        .arg("-f")
        .arg(&db)
        .arg("-u")
        .arg("proton")
        .arg("user")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .wrap_err_with(|| format!("failed to run credential tool {tool:?}"))?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| eyre!("credential tool stdin not captured"))?;
    stdin.write_all(b"password\n")?;
    drop(stdin);
    let status = child.wait()?;
    if !status.success() {
        bail!("credential tool {tool:?} exited with {status}");
    }

    Ok(conf_dir)
}
