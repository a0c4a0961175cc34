use std::io::{self, BufRead, Read};

use crate::utils::Result;


/// Longest request line accepted, terminator included
pub const MAX_REQUEST_LINE: u64 = 8 * 1024;
/// Most header bytes read and discarded after the request line
pub const MAX_HEADER_BLOCK: u64 = 64 * 1024;

pub const METHOD_GET: &str = "GET";
pub const METHOD_HEAD: &str = "HEAD";
pub const SUPPORTED_METHODS: [&str; 2] = [METHOD_GET, METHOD_HEAD];

pub const EMPTY_REQUEST_ERROR: &str = "empty request";
pub const MALFORMED_REQUEST_ERROR: &str = "malformed request line";
pub const TOO_LONG_REQUEST_ERROR: &str = "request line too long";
pub const ENCODING_ERROR: &str = "request line is not utf-8";


/// The first line of a request. Headers are skipped, the body is never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
}

impl Request {
    /// Split a request line on whitespace: the method is upper-cased,
    /// the path lower-cased and anything after them is ignored.
    pub fn parse(line: &str) -> Result<Request> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(method), Some(path)) => Ok(Request {
                method: method.to_uppercase(),
                path: path.to_lowercase(),
            }),
            (None, _) => Err(EMPTY_REQUEST_ERROR),
            (Some(_), None) => Err(MALFORMED_REQUEST_ERROR),
        }
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_METHODS.contains(&self.method.as_str())
    }

    pub fn is_head(&self) -> bool {
        self.method == METHOD_HEAD
    }

    /// Path without query string or fragment
    pub fn route_path(&self) -> &str {
        match self.path.find(|c: char| c == '?' || c == '#') {
            Some(idx) => &self.path[..idx],
            None => &self.path,
        }
    }
}


/// Read exactly one line from the connection.
///
/// Protocol problems (empty input, an over-long or non utf-8 line) come back
/// as `Ok(Err(..))` so they can be answered with 400; transport failures
/// are `Err` and end the connection.
pub fn read_request_line<R: BufRead>(reader: R) -> io::Result<Result<String>> {
    let mut buf = Vec::new();
    let read = reader.take(MAX_REQUEST_LINE).read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(Err(EMPTY_REQUEST_ERROR));
    }
    if !buf.ends_with(b"\n") && read as u64 == MAX_REQUEST_LINE {
        return Ok(Err(TOO_LONG_REQUEST_ERROR));
    }
    match String::from_utf8(buf) {
        Ok(line) => Ok(Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())),
        Err(_) => Ok(Err(ENCODING_ERROR)),
    }
}

/// Consume the header block up to and including the blank line.
///
/// Returns the number of bytes skipped. Stops early at EOF or once
/// [`MAX_HEADER_BLOCK`] bytes have been read.
pub fn skip_headers<R: BufRead>(reader: R) -> io::Result<u64> {
    let mut limited = reader.take(MAX_HEADER_BLOCK);
    let mut skipped = 0;
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = limited.read_until(b'\n', &mut line)?;
        skipped += read as u64;
        if read == 0 || line == b"\r\n" || line == b"\n" {
            return Ok(skipped);
        }
    }
}
