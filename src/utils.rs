use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;


pub type ErrorStr = &'static str;
pub type Result<T> = std::result::Result<T, ErrorStr>;
pub type ResultV = Result<()>;

const URL_ID_CHARSET: &[u8] = b"0123456789abcdef";

/// IMF-fixdate, the preferred `Date` header format of RFC 7231
const HTTP_DATE_FORMAT: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

pub fn generate_hex_id(length: u32) -> String {
    let mut rng = rand::thread_rng();

    (0..length).map(
        |_| {
            let idx = rng.gen_range(0..URL_ID_CHARSET.len());
            URL_ID_CHARSET[idx] as char
        }
    ).collect()
}


fn current_duration() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

pub fn time_us() -> u128 {
    current_duration().as_micros()
}

pub fn http_date(at: OffsetDateTime) -> String {
    at.format(HTTP_DATE_FORMAT).unwrap_or_default()
}

pub fn http_date_now() -> String {
    http_date(OffsetDateTime::now_utc())
}
