//! Resolving the user's local time from a canonical timezone name.

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The UTC offset of `canonical_timezone` right now, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date and time in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if the name is not a known timezone.
pub fn local_now(canonical_timezone: &str) -> Result<PrimitiveDateTime, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))?;

    let now = OffsetDateTime::now_utc().to_offset(offset);

    Ok(PrimitiveDateTime::new(now.date(), now.time()))
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;

    use crate::Error;

    use super::{get_local_offset, local_now};

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_now("Mars/Olympus_Mons"),
            Err(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }

    #[test]
    fn local_now_matches_utc_for_utc() {
        let now = local_now("Etc/UTC").unwrap();
        let utc = time::OffsetDateTime::now_utc();

        assert!((utc.date() - now.date()).whole_days().abs() <= 1);
    }
}
