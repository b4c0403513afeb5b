//! Golden output fixtures for the example binaries and the assertion
//! helpers that compare captured output against them.

use crate::Result;
use eyre::{bail, ensure};
use once_cell::sync::Lazy;

pub const HELLO_WORLD: &str = "Hello World!\n";

pub const ALL_CONFIRMED: &str = "all messages confirmed\n";

/// What the request/response client prints for its four canned requests.
pub const CLIENT_EXPECT: &str = "\
Twas brillig, and the slithy toves => TWAS BRILLIG, AND THE SLITHY TOVES
Did gire and gymble in the wabe. => DID GIRE AND GYMBLE IN THE WABE.
All mimsy were the borogroves, => ALL MIMSY WERE THE BOROGROVES,
And the mome raths outgrabe. => AND THE MOME RATHS OUTGRABE.
";

pub const FLOW_CONTROL: &str = "\
success: Example 1: simple credit
success: Example 2: basic drain
success: Example 3: drain without credit
success: Example 4: high/low watermark
";

/// Note the leading blank line; the example starts its report with one.
pub const ENCODE_DECODE: &str = r"
== Array, list and map of uniform type.
array<int>[int(1), int(2), int(3)]
[ 1 2 3 ]
list[int(1), int(2), int(3)]
[ 1 2 3 ]
map{string(one):int(1), string(two):int(2)}
{ one:1 two:2 }
map{string(z):int(3), string(a):int(4)}
[ z:3 a:4 ]
list[string(a), string(b), string(c)]

== List and map of mixed type values.
list[int(42), string(foo)]
[ 42 foo ]
map{int(4):string(four), string(five):int(5)}
{ 4:four five:5 }

== Insert with stream operators.
array<int>[int(1), int(2), int(3)]
list[int(42), boolean(0), symbol(x)]
map{string(k1):int(42), symbol(k2):boolean(0)}
";

pub const MESSAGE_PROPERTIES: &str = r#"using put/get: short=123 string=foo symbol=sym
using coerce: short(as long)=123
props[short]=123
props[string]=foo
props[symbol]=sym
short=42 string=bar
expected conversion_error: "unexpected type, want: uint got: int"
expected conversion_error: "unexpected type, want: uint got: string"
"#;

pub const MULTITHREADED_CLIENT: &str = "10 messages sent and received";

pub const SSL: &str = "Server certificate identity CN=test_server\nHello World!";

pub const SSL_NO_NAME: &str = "Outgoing client connection connected via SSL.  \
Server certificate identity CN=test_server\nHello World!";

pub const SSL_BAD_NAME: &str = "Expected failure of connection with wrong peer name";

pub const SSL_CLIENT_CERT: &str = "\
Inbound client certificate identity CN=test_client
Outgoing client connection connected via SSL.  Server certificate identity CN=test_server
Hello World!
";

/// What the receiver examples print for the standard 100-message run.
pub static RECV_EXPECT: Lazy<String> = Lazy::new(|| {
    (1..=100)
        .map(|i| format!("{{\"sequence\"={i}}}\n"))
        .collect()
});

/// Full-output equality; the error carries both strings for diffing.
pub fn exact(actual: &str, expected: &str) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    bail!("output mismatch\n--- expected ---\n{expected}\n--- actual ---\n{actual}");
}

/// Substring match, for examples whose surrounding output is noisy.
pub fn contains(actual: &str, needle: &str) -> Result<()> {
    if actual.contains(needle) {
        return Ok(());
    }
    bail!("output does not contain expected text\n--- expected (substring) ---\n{needle}\n--- actual ---\n{actual}");
}

/// Timing-sensitive token streams: the count varies run to run, so the
/// assertion is "at least one token, and every token equals `token`",
/// never an exact count.
pub fn tokens(actual: &str, token: &str) -> Result<()> {
    let produced: Vec<&str> = actual.split_whitespace().collect();
    ensure!(!produced.is_empty(), "no output tokens produced");
    for t in &produced {
        ensure!(
            *t == token,
            "unexpected token {t:?}, want every token to be {token:?}\n--- actual ---\n{actual}"
        );
    }
    Ok(())
}
