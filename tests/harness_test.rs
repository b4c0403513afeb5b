//! End-to-end tests for the harness itself.
//!
//! The example binaries are stood in for by small shell scripts written to
//! a temp directory, so these tests exercise the real spawn / readiness /
//! capture / disposal machinery without needing the messaging examples on
//! PATH.

use anyhow::Result;
use example_harness::broker::Broker;
use example_harness::cli::Config;
use example_harness::{expect, scenarios, suite};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Writes an executable `/bin/sh` script into `dir`.
fn fake_bin(dir: &Path, name: &str, body: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}"))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// A broker stand-in announcing port 9999 and then idling until killed.
fn harness_ctx(dir: &Path, cpp11: bool) -> Result<suite::Ctx> {
    fake_bin(dir, "broker", "echo \"broker listening on 9999\"\nexec sleep 30\n")?;
    let config = Config {
        examples_dir: Some(dir.to_path_buf()),
        certs_dir: dir.join("ssl-certs"),
        sasl_conf_dir: dir.join("sasl-conf"),
        saslpasswd: None,
        cpp11,
        filter: None,
        list: false,
    };
    let broker = Broker::start(config.bin("broker")).map_err(|e| anyhow::anyhow!("{e:#}"))?;
    Ok(suite::Ctx::new(config, broker))
}

/// A script that prints fixed text via a quoted heredoc.
fn print_script(text: &str) -> String {
    format!("cat <<'EOF'\n{text}EOF\n")
}

/// The standard 100-line receiver output.
const RECV_LOOP: &str = "i=1\n\
while [ $i -le 100 ]; do\n\
  printf '{\"sequence\"=%s}\\n' $i\n\
  i=$((i+1))\n\
done\n";

#[test]
fn helloworld_scenario_passes_against_the_shared_broker() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    fake_bin(tmp.path(), "helloworld", "echo 'Hello World!'\n")?;
    let ctx = harness_ctx(tmp.path(), false)?;

    let summary = suite::run(&ctx, &scenarios::all(), Some("helloworld"));
    assert_eq!(summary.passed, vec!["helloworld"]);
    assert!(summary.failed.is_empty());
    Ok(())
}

#[test]
fn mismatched_output_fails_the_scenario_with_both_strings() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    fake_bin(tmp.path(), "helloworld", "echo 'Goodbye World!'\n")?;
    let ctx = harness_ctx(tmp.path(), false)?;

    let summary = suite::run(&ctx, &scenarios::all(), Some("helloworld"));
    assert!(summary.passed.is_empty());
    assert_eq!(summary.failed.len(), 1);
    let (name, report) = &summary.failed[0];
    assert_eq!(*name, "helloworld");
    let msg = format!("{report:#}");
    assert!(msg.contains("Hello World!"), "missing expected text: {msg}");
    assert!(msg.contains("Goodbye World!"), "missing actual text: {msg}");
    Ok(())
}

#[test]
fn capability_gated_scenarios_are_skipped_not_failed() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    let ctx = harness_ctx(tmp.path(), false)?;

    let summary = suite::run(&ctx, &scenarios::all(), Some("multithreaded_client"));
    assert_eq!(summary.skipped, vec!["multithreaded_client"]);
    assert!(summary.failed.is_empty());
    assert!(summary.passed.is_empty());
    Ok(())
}

#[test]
fn sender_and_receiver_run_against_the_shared_broker() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    fake_bin(tmp.path(), "simple_send", "echo 'all messages confirmed'\n")?;
    fake_bin(tmp.path(), "simple_recv", RECV_LOOP)?;
    let ctx = harness_ctx(tmp.path(), false)?;

    scenarios::simple_send_recv(&ctx).map_err(|e| anyhow::anyhow!("{e:#}"))?;
    Ok(())
}

#[test]
fn background_server_address_reaches_the_client_before_it_spawns() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    // The receiver announces its own port; the sender stand-in only prints
    // the golden line when handed the fully resolved address, so a pass
    // proves the readiness handshake completed before the client ran.
    fake_bin(
        tmp.path(),
        "direct_recv",
        &format!("echo \"direct_recv listening on 7001\"\n{RECV_LOOP}"),
    )?;
    fake_bin(
        tmp.path(),
        "simple_send",
        "if [ \"$2\" = \":7001/example\" ]; then\n\
         \x20 echo 'all messages confirmed'\n\
         else\n\
         \x20 echo \"wrong address: $2\"\n\
         fi\n",
    )?;
    let ctx = harness_ctx(tmp.path(), false)?;

    scenarios::simple_send_direct_recv(&ctx).map_err(|e| anyhow::anyhow!("{e:#}"))?;
    Ok(())
}

#[test]
fn broker_scoped_server_is_checked_for_its_connected_line() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    // Long-running server: prints its readiness line then idles; the
    // kill-and-drain disposal has to tear it down at scope exit.
    fake_bin(
        tmp.path(),
        "server",
        "echo \"server connected to localhost\"\nexec sleep 30\n",
    )?;
    fake_bin(tmp.path(), "client", &print_script(expect::CLIENT_EXPECT))?;
    let ctx = harness_ctx(tmp.path(), false)?;

    scenarios::request_response(&ctx).map_err(|e| anyhow::anyhow!("{e:#}"))?;
    Ok(())
}

#[test]
fn server_without_connected_line_fails_the_scenario() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    fake_bin(tmp.path(), "server", "echo \"something unexpected\"\nexec sleep 30\n")?;
    fake_bin(tmp.path(), "client", &print_script(expect::CLIENT_EXPECT))?;
    let ctx = harness_ctx(tmp.path(), false)?;

    assert!(scenarios::request_response(&ctx).is_err());
    Ok(())
}

#[test]
fn token_stream_scenario_accepts_variable_counts() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    fake_bin(
        tmp.path(),
        "scheduled_send_03",
        "echo 'send send send'\necho 'send'\n",
    )?;
    let ctx = harness_ctx(tmp.path(), false)?;

    scenarios::scheduled_send_03(&ctx).map_err(|e| anyhow::anyhow!("{e:#}"))?;
    Ok(())
}

#[test]
fn token_stream_scenario_rejects_silence() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    fake_bin(tmp.path(), "scheduled_send_03", "true\n")?;
    let ctx = harness_ctx(tmp.path(), false)?;

    assert!(scenarios::scheduled_send_03(&ctx).is_err());
    Ok(())
}

#[test]
fn broker_startup_failure_surfaces_as_a_scenario_error() -> Result<()> {
    init_tracing();
    let tmp = TempDir::new()?;
    // Broker that dies without ever announcing a port.
    fake_bin(tmp.path(), "broker", "echo 'fatal: cannot bind'\nexit 1\n")?;
    fake_bin(tmp.path(), "helloworld", "echo 'Hello World!'\n")?;
    let config = Config {
        examples_dir: Some(tmp.path().to_path_buf()),
        certs_dir: tmp.path().join("ssl-certs"),
        sasl_conf_dir: tmp.path().join("sasl-conf"),
        saslpasswd: None,
        cpp11: false,
        filter: None,
        list: false,
    };
    let broker = Broker::start(config.bin("broker")).map_err(|e| anyhow::anyhow!("{e:#}"))?;
    let ctx = suite::Ctx::new(config, broker);

    let summary = suite::run(&ctx, &scenarios::all(), Some("helloworld"));
    assert_eq!(summary.failed.len(), 1);
    let msg = format!("{:#}", summary.failed[0].1);
    assert!(
        msg.contains("before announcing"),
        "unexpected failure report: {msg}"
    );
    Ok(())
}
