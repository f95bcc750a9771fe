//! Conversion between the date/time text used by form inputs and the text
//! the backend expects on the wire.
//!
//! Form inputs use `YYYY-MM-DD` dates and 24-hour `HH:MM` times. The backend
//! uses `DD-MM-YYYY` dates and 12-hour `hh:mm AM`/`hh:mm PM` times.
//!
//! The two directions fall back differently on malformed input: converting
//! towards the wire passes the input through unchanged, while converting
//! towards the form substitutes the current date or time.

use time::{Date, Time, macros::format_description};

/// Returns true if `text` has the same length as `pattern` and every `d` in
/// `pattern` lines up with an ASCII digit and every other character matches
/// exactly.
fn matches_pattern(text: &str, pattern: &str) -> bool {
    text.len() == pattern.len()
        && text
            .bytes()
            .zip(pattern.bytes())
            .all(|(actual, expected)| match expected {
                b'd' => actual.is_ascii_digit(),
                _ => actual == expected,
            })
}

/// Format `date` the way a date input expects it, e.g. "2025-03-07".
pub fn format_form_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Format `time` the way a time input expects it, e.g. "13:30".
pub fn format_form_time(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Convert a form date "YYYY-MM-DD" to the wire format "DD-MM-YYYY".
///
/// Input that does not match the form pattern is returned unchanged.
pub fn form_date_to_api(date: &str) -> String {
    if !matches_pattern(date, "dddd-dd-dd") {
        return date.to_owned();
    }

    let (year, month, day) = (&date[0..4], &date[5..7], &date[8..10]);

    format!("{day}-{month}-{year}")
}

/// Convert a wire date "DD-MM-YYYY" to the form format "YYYY-MM-DD".
///
/// Empty input, or input that does not match the wire pattern, produces
/// `today` in the form format instead.
pub fn api_date_to_form(date: &str, today: Date) -> String {
    if !matches_pattern(date, "dd-dd-dddd") {
        return format_form_date(today);
    }

    let (day, month, year) = (&date[0..2], &date[3..5], &date[6..10]);

    format!("{year}-{month}-{day}")
}

/// Convert a 24-hour form time "HH:MM" to the wire format "hh:mm AM/PM".
///
/// Midnight is "12 AM" and noon is "12 PM". Input that does not match the
/// pattern, or that names an hour above 23 or a minute above 59, is returned
/// unchanged.
pub fn form_time_to_api(time: &str) -> String {
    if !matches_pattern(time, "dd:dd") {
        return time.to_owned();
    }

    let (Ok(hour), Ok(minute)) = (time[0..2].parse::<u8>(), time[3..5].parse::<u8>()) else {
        return time.to_owned();
    };

    if hour > 23 || minute > 59 {
        return time.to_owned();
    }

    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour {
        0 => 12,
        13.. => hour - 12,
        _ => hour,
    };

    format!("{hour:02}:{minute:02} {suffix}")
}

/// Convert a wire time "hh:mm AM/PM" to the 24-hour form format "HH:MM".
///
/// The suffix is case-insensitive, may be preceded by whitespace, and the hour
/// may have one or two digits. If the input cannot be parsed, `now` is
/// returned in the form format instead.
pub fn api_time_to_form(time: &str, now: Time) -> String {
    match parse_api_time(time) {
        Some((hour, minute)) => format!("{hour:02}:{minute:02}"),
        None => format_form_time(now),
    }
}

/// Parse a wire time into a 24-hour (hour, minute) pair.
fn parse_api_time(time: &str) -> Option<(u8, u8)> {
    let time = time.trim();

    if time.len() < 2 || !time.is_char_boundary(time.len() - 2) {
        return None;
    }

    let (clock, suffix) = time.split_at(time.len() - 2);
    let is_pm = if suffix.eq_ignore_ascii_case("pm") {
        true
    } else if suffix.eq_ignore_ascii_case("am") {
        false
    } else {
        return None;
    };

    let (hour, minute) = clock.trim_end().split_once(':')?;

    if !(1..=2).contains(&hour.len()) || !matches_pattern(minute, "dd") {
        return None;
    }

    if !hour.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let hour: u8 = hour.parse().ok()?;
    let minute: u8 = minute.parse().ok()?;

    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, true) => hour + 12,
        (hour, false) => hour,
    };

    Some((hour, minute))
}

/// Parse a wire date "DD-MM-YYYY" into a calendar date.
///
/// Returns `None` for text that is not a real calendar date.
pub fn parse_api_date(date: &str) -> Option<Date> {
    if !matches_pattern(date, "dd-dd-dddd") {
        return None;
    }

    Date::parse(date, format_description!("[day]-[month]-[year]")).ok()
}

/// Parse a form date "YYYY-MM-DD" into a calendar date.
///
/// Returns `None` for text that is not a real calendar date.
pub fn parse_form_date(date: &str) -> Option<Date> {
    if !matches_pattern(date, "dddd-dd-dd") {
        return None;
    }

    Date::parse(date, format_description!("[year]-[month]-[day]")).ok()
}
