use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::context::Context;
use crate::handlers::{bad_request, handle_route, respond};
use crate::request::{read_request_line, skip_headers, Request};
use crate::router::classify;


const MODULE: &str = "SERVER";

/// How long a closed connection waits for the client's leftover bytes
const LINGER_TIMEOUT: Duration = Duration::from_millis(500);
const MAX_LINGER_BYTES: u64 = 1024 * 1024;


/// Serve one request: read the request line from `reader` and skip its
/// headers, answer on `writer`.
pub fn serve<R: BufRead, W: Write>(mut reader: R, writer: &mut W, ctx: &mut Context) -> io::Result<()> {
    let request = read_request_line(&mut reader)?.and_then(|line| Request::parse(&line));
    match skip_headers(&mut reader) {
        Ok(skipped) => debug!("[{}] Skipped {} header bytes of [{}]", MODULE, skipped, ctx.qid),
        Err(e) => debug!("[{}] Headers of [{}] not read: {}", MODULE, ctx.qid, e),
    }

    let (response, send_body) = match request {
        Ok(req) => {
            info!("New Request [qid={}]: method: {}; url: {}", ctx.qid, req.method, req.path);
            let route = classify(&req, &ctx.cfg);
            debug!("[{}] Request [{}] routed to {:?}", MODULE, ctx.qid, route);
            (handle_route(route, ctx), !req.is_head())
        }
        Err(e) => {
            warn!("[{}] Bad request [{}]: {}", MODULE, ctx.qid, e);
            (bad_request(&ctx.cfg), true)
        }
    };

    respond(writer, ctx, &response, send_body)
}

/// Serve a single request over `stream`, then close it.
pub fn handle_connection(stream: TcpStream, mut ctx: Context) {
    let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "unknown".to_string());
    debug!("[{}] Connection [{}] opened from {}", MODULE, ctx.qid, peer);

    if let Err(e) = stream.set_read_timeout(ctx.cfg.server.read_timeout())
        .and_then(|_| stream.set_write_timeout(ctx.cfg.server.write_timeout()))
    {
        warn!("[{}] Could not set timeouts for [{}]: {}", MODULE, ctx.qid, e);
    }

    let result = {
        let reader = BufReader::new(&stream);
        let mut writer = BufWriter::new(&stream);
        serve(reader, &mut writer, &mut ctx)
    };
    if let Err(e) = result {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                warn!("[{}] Connection [{}] timed out", MODULE, ctx.qid)
            }
            _ => error!("[{}] Connection [{}] failed: {}", MODULE, ctx.qid, e),
        }
    }

    match stream.shutdown(Shutdown::Write) {
        // Closing with unread input resets the connection
        Ok(()) => match linger(&stream) {
            Ok(n) if n > 0 => debug!("[{}] Discarded {} trailing bytes of [{}]", MODULE, n, ctx.qid),
            Ok(_) => {}
            Err(e) => debug!("[{}] Connection [{}] not drained: {}", MODULE, ctx.qid, e),
        },
        Err(e) => debug!("[{}] Error closing connection [{}]: {}", MODULE, ctx.qid, e),
    }
    debug!("[{}] Connection [{}] closed", MODULE, ctx.qid);
}

/// Read and discard whatever the client still sends until it closes its side.
fn linger(stream: &TcpStream) -> io::Result<u64> {
    stream.set_read_timeout(Some(LINGER_TIMEOUT))?;
    io::copy(&mut stream.take(MAX_LINGER_BYTES), &mut io::sink())
}
