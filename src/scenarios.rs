//! The concrete test scenarios, one per example (or example pair).
//!
//! Four shapes appear here: fire-and-capture of a single process,
//! background server plus foreground client, broker-scoped pairs, and
//! timing-sensitive token streams. In every server/client shape the
//! server's readiness is observed strictly before the client is spawned,
//! by sequencing alone.

use crate::expect;
use crate::process::{Disposal, ManagedProcess};
use crate::suite::{Capability, Ctx, Scenario};
use crate::Result;

/// Every scenario in suite order.
pub fn all() -> Vec<Scenario> {
    fn s(name: &'static str, run: fn(&Ctx) -> Result<()>) -> Scenario {
        Scenario {
            name,
            requires: None,
            run,
        }
    }
    fn cpp11(name: &'static str, run: fn(&Ctx) -> Result<()>) -> Scenario {
        Scenario {
            name,
            requires: Some(Capability::Cpp11),
            run,
        }
    }

    vec![
        s("helloworld", helloworld),
        s("simple_send_recv", simple_send_recv),
        s("simple_recv_send", simple_recv_send),
        s("simple_send_direct_recv", simple_send_direct_recv),
        s("simple_recv_direct_send", simple_recv_direct_send),
        s("request_response", request_response),
        s("request_response_direct", request_response_direct),
        s("flow_control", flow_control),
        s("encode_decode", encode_decode),
        s("scheduled_send_03", scheduled_send_03),
        cpp11("scheduled_send", scheduled_send),
        s("message_properties", message_properties),
        cpp11("multithreaded_client", multithreaded_client),
        s("ssl", ssl),
        s("ssl_no_name", ssl_no_name),
        s("ssl_bad_name", ssl_bad_name),
        s("ssl_client_cert", ssl_client_cert),
    ]
}

pub fn helloworld(ctx: &Ctx) -> Result<()> {
    let addr = ctx.broker_address("example")?;
    let out = ctx.capture("helloworld", &[&addr])?;
    expect::exact(&out, expect::HELLO_WORLD)
}

pub fn simple_send_recv(ctx: &Ctx) -> Result<()> {
    let addr = ctx.broker_address("example")?;
    let out = ctx.capture("simple_send", &["-a", &addr])?;
    expect::exact(&out, expect::ALL_CONFIRMED)?;
    let out = ctx.capture("simple_recv", &["-a", &addr])?;
    expect::exact(&out, &expect::RECV_EXPECT)
}

/// Receiver waits on the broker in the background while the sender runs.
pub fn simple_recv_send(ctx: &Ctx) -> Result<()> {
    let addr = ctx.broker_address("example")?;
    let mut recv =
        ManagedProcess::spawn(ctx.bin("simple_recv"), &["-a", &addr], Disposal::Wait)?;
    let out = ctx.capture("simple_send", &["-a", &addr])?;
    expect::exact(&out, expect::ALL_CONFIRMED)?;
    expect::exact(&recv.communicate()?, &expect::RECV_EXPECT)
}

/// Receiver binds its own port; the sender connects directly to it.
pub fn simple_send_direct_recv(ctx: &Ctx) -> Result<()> {
    let mut recv =
        ManagedProcess::spawn(ctx.bin("direct_recv"), &["-a", "//:0"], Disposal::Wait)?;
    let addr = recv.address("example")?;
    let out = ctx.capture("simple_send", &["-a", &addr])?;
    expect::exact(&out, expect::ALL_CONFIRMED)?;
    expect::exact(&recv.communicate()?, &expect::RECV_EXPECT)
}

pub fn simple_recv_direct_send(ctx: &Ctx) -> Result<()> {
    let mut send =
        ManagedProcess::spawn(ctx.bin("direct_send"), &["-a", "//:0"], Disposal::Wait)?;
    let addr = send.address("example")?;
    let out = ctx.capture("simple_recv", &["-a", &addr])?;
    expect::exact(&out, &expect::RECV_EXPECT)?;
    expect::exact(&send.communicate()?, expect::ALL_CONFIRMED)
}

/// Broker-scoped server: readiness is a `connected to ...` line rather
/// than a port announcement, and the server never exits on its own.
pub fn request_response(ctx: &Ctx) -> Result<()> {
    let addr = ctx.broker_address("example")?;
    let mut server = ManagedProcess::spawn(
        ctx.bin("server"),
        &[&addr, "example"],
        Disposal::KillAndDrain,
    )?;
    expect::contains(&server.read_line()?, "connected to")?;
    let out = ctx.capture("client", &["-a", &addr])?;
    expect::exact(&out, expect::CLIENT_EXPECT)
}

pub fn request_response_direct(ctx: &Ctx) -> Result<()> {
    let mut server = ManagedProcess::spawn(
        ctx.bin("server_direct"),
        &["-a", "//:0"],
        Disposal::KillAndDrain,
    )?;
    let addr = server.address("example")?;
    let out = ctx.capture("client", &["-a", &addr])?;
    expect::exact(&out, expect::CLIENT_EXPECT)
}

pub fn flow_control(ctx: &Ctx) -> Result<()> {
    let out = ctx.capture("flow_control", &["--quiet"])?;
    expect::exact(&out, expect::FLOW_CONTROL)
}

pub fn encode_decode(ctx: &Ctx) -> Result<()> {
    let out = ctx.capture("encode_decode", &[])?;
    expect::exact(&out, expect::ENCODE_DECODE)
}

pub fn scheduled_send_03(ctx: &Ctx) -> Result<()> {
    let addr = ctx.broker_address("scheduled_send")?;
    let out = ctx.capture(
        "scheduled_send_03",
        &["-a", &addr, "-t", "0.1", "-i", "0.001"],
    )?;
    expect::tokens(&out, "send")
}

pub fn scheduled_send(ctx: &Ctx) -> Result<()> {
    let addr = ctx.broker_address("scheduled_send")?;
    let out = ctx.capture("scheduled_send", &["-a", &addr, "-t", "0.1", "-i", "0.001"])?;
    expect::tokens(&out, "send")
}

pub fn message_properties(ctx: &Ctx) -> Result<()> {
    let out = ctx.capture("message_properties", &[])?;
    expect::exact(&out, expect::MESSAGE_PROPERTIES)
}

pub fn multithreaded_client(ctx: &Ctx) -> Result<()> {
    let addr = ctx.broker_address("example")?;
    let out = ctx.capture("multithreaded_client", &[&addr, "examples", "10"])?;
    expect::contains(&out, expect::MULTITHREADED_CLIENT)
}

// The SSL examples spawn their own in-process server, so these are all
// fire-and-capture; only the verification mode differs.

pub fn ssl(ctx: &Ctx) -> Result<()> {
    let certs = ctx.certs_dir().display().to_string();
    let out = ctx.capture("ssl", &["-c", &certs])?;
    expect::contains(&out, expect::SSL)
}

pub fn ssl_no_name(ctx: &Ctx) -> Result<()> {
    let certs = ctx.certs_dir().display().to_string();
    let out = ctx.capture("ssl", &["-c", &certs, "-v", "noname"])?;
    expect::contains(&out, expect::SSL_NO_NAME)
}

pub fn ssl_bad_name(ctx: &Ctx) -> Result<()> {
    let certs = ctx.certs_dir().display().to_string();
    let out = ctx.capture("ssl", &["-c", &certs, "-v", "fail"])?;
    expect::contains(&out, expect::SSL_BAD_NAME)
}

pub fn ssl_client_cert(ctx: &Ctx) -> Result<()> {
    let certs = ctx.certs_dir().display().to_string();
    let out = ctx.capture("ssl_client_cert", &[&certs])?;
    expect::contains(&out, expect::SSL_CLIENT_CERT)
}
