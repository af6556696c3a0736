//! Ask a running Packet Tracer for its version and logical workspace.
//!
//! Run with:
//!   cargo run --example appwindow-version -- 127.0.0.1:39000
//!
//! Packet Tracer must have IPC enabled and accept the
//! `net.ihitc.ptmptest` application with the `cisco` key.

use ptmp::session::{
    authentication, connect, generate_app_id, AuthenticationResponse, IpcCallInfo,
    NegotiationInfo,
};

const USERNAME: &str = "net.ihitc.ptmptest";
const PASSWORD: &str = "cisco";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1".to_string());

    let mut session = connect(&addr)?;
    let negotiation = NegotiationInfo::new(generate_app_id(), authentication::CLEARTEXT);
    let server = session.handshake(&negotiation, USERNAME, |_challenge| {
        // Plain key in place of a computed digest.
        AuthenticationResponse::new(USERNAME, PASSWORD, "")
    })?;
    eprintln!("Negotiated with {} (app {})", addr, server.app_id);

    for call_name in [
        "appWindow.getVersion",
        "appWindow.getActiveWorkspace.getLogicalWorkspace",
    ] {
        let call = IpcCallInfo::new(session.next_call_id(), call_name);
        let response = session.call(&call)?;
        let rendered: Vec<String> = response.rets.iter().map(ToString::to_string).collect();
        println!("{call_name} -> [{}]", rendered.join(", "));
    }

    session.disconnect("Finished")?;
    Ok(())
}
