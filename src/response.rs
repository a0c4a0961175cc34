use std::io::{self, Write};

use crate::utils::http_date_now;


pub const HTTP_200: u16 = 200;
pub const HTTP_301: u16 = 301;
pub const HTTP_400: u16 = 400;
pub const HTTP_404: u16 = 404;
pub const HTTP_500: u16 = 500;
pub const HTTP_501: u16 = 501;

pub const HEADER_SERVER: &str = "Server";
pub const HEADER_DATE: &str = "Date";
pub const HEADER_CONTENT_TYPE: &str = "Content-type";
pub const HEADER_CONTENT_LENGTH: &str = "Content-length";
pub const HEADER_LOCATION: &str = "Location";

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &[u8] = b"\r\n";


pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        HTTP_200 => "OK",
        HTTP_301 => "Moved Permanently",
        HTTP_400 => "Bad Request",
        HTTP_404 => "File Not Found",
        HTTP_500 => "Internal Server Error",
        HTTP_501 => "Not Implemented",
        _ => "Unknown",
    }
}


#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Bodyless response carrying the mandatory `Server` and `Date` headers
    pub fn new(status: u16, server: &str) -> Response {
        Response {
            status,
            headers: vec![
                (HEADER_SERVER.to_string(), server.to_string()),
                (HEADER_DATE.to_string(), http_date_now()),
            ],
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Response {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Attach a body; `Content-length` always comes from the body itself.
    pub fn with_body(mut self, content_type: &str, body: Vec<u8>) -> Response {
        let length = body.len().to_string();
        self.body = body;
        self.with_header(HEADER_CONTENT_TYPE, content_type)
            .with_header(HEADER_CONTENT_LENGTH, &length)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn status_line(&self) -> String {
        format!("{} {} {}", HTTP_VERSION, self.status, reason_phrase(self.status))
    }

    /// Frame the response onto `out`: status line, headers, blank line, then
    /// the body when `send_body` is set. Returns the number of body bytes sent.
    pub fn write_to<W: Write>(&self, out: &mut W, send_body: bool) -> io::Result<usize> {
        out.write_all(self.status_line().as_bytes())?;
        out.write_all(CRLF)?;
        for (name, value) in &self.headers {
            write!(out, "{}: {}", name, value)?;
            out.write_all(CRLF)?;
        }
        out.write_all(CRLF)?;
        out.flush()?;

        if !send_body || self.body.is_empty() {
            return Ok(0);
        }
        out.write_all(&self.body)?;
        out.flush()?;
        Ok(self.body.len())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn split(raw: &[u8]) -> (String, Vec<u8>) {
        let pos = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        (String::from_utf8(raw[..pos].to_vec()).unwrap(), raw[pos + 4..].to_vec())
    }

    #[test]
    fn frames_headers_and_body_with_crlf() {
        let resp = Response::new(HTTP_200, "test").with_body("text/plain", b"hello".to_vec());
        let mut out = Vec::new();
        let sent = resp.write_to(&mut out, true).unwrap();
        assert_eq!(sent, 5);

        let (head, body) = split(&out);
        let lines: Vec<&str> = head.split("\r\n").collect();
        assert_eq!(lines[0], "HTTP/1.1 200 OK");
        assert_eq!(lines[1], "Server: test");
        assert!(lines[2].starts_with("Date: "));
        assert!(lines[2].ends_with(" GMT"));
        assert_eq!(lines[3], "Content-type: text/plain");
        assert_eq!(lines[4], "Content-length: 5");
        assert_eq!(body, b"hello");
    }

    #[test]
    fn head_keeps_length_but_sends_no_body() {
        let resp = Response::new(HTTP_200, "test").with_body("text/html", b"<p>hi</p>".to_vec());
        let mut out = Vec::new();
        assert_eq!(resp.write_to(&mut out, false).unwrap(), 0);

        let (head, body) = split(&out);
        assert!(head.contains("Content-length: 9"));
        assert!(body.is_empty());
    }

    #[test]
    fn bodyless_response_still_ends_headers() {
        let resp = Response::new(HTTP_301, "test").with_header(HEADER_LOCATION, "/dir/");
        let mut out = Vec::new();
        resp.write_to(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 301 Moved Permanently\r\n"));
        assert!(text.contains("\r\nLocation: /dir/\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
        assert_eq!(resp.header("location"), Some("/dir/"));
    }

    #[test]
    fn content_length_counts_bytes_not_chars() {
        let resp = Response::new(HTTP_200, "test").with_body("text/plain", "perché".as_bytes().to_vec());
        assert_eq!(resp.header(HEADER_CONTENT_LENGTH), Some("7"));
    }
}
