//! Demonstration peer.
//!
//! Reads datagrams from a control channel and prints each one as
//! space-separated lowercase hex bytes on its own line:
//!
//! ```text
//! 05 00 00 00 ...
//! ```

use std::io::Write;

use tracing::{debug, info};

use crate::infrastructure::control_namespace::PeerSocket;

/// Formats `bytes` as `"0a 1b ff"`.
pub fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Prints every datagram received on `socket` to `out` until the channel
/// closes.  Returns the number of datagrams printed.
pub async fn run_hex_printer<W: Write>(mut socket: PeerSocket, mut out: W) -> std::io::Result<usize> {
    info!(channel = %socket.channel(), unit = %socket.unit(), "peer listening");
    let mut count = 0;
    while let Some(datagram) = socket.recv().await {
        writeln!(out, "{}", format_hex(&datagram))?;
        out.flush()?;
        count += 1;
        debug!(len = datagram.len(), "datagram printed");
    }
    info!(count, "channel closed; peer exiting");
    Ok(count)
}
