//! Timecode parsing and formatting.
//!
//! Accepts `HH:MM:SS`, `MM:SS`, or plain `SS`. Hours and minutes are whole
//! numbers; the seconds field may carry a fraction (`00:01:15.5`).

use std::time::Duration;

use crate::error::VidkitError;

/// Parse a timecode into a [`Duration`].
///
/// # Errors
///
/// Returns [`VidkitError::InvalidTimecode`] for empty input, more than three
/// `:`-separated fields, any field that is negative or not a number, or a
/// total too large for a [`Duration`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// assert_eq!(vidkit::parse_timecode("01:30")?, Duration::from_secs(90));
/// assert_eq!(vidkit::parse_timecode("00:01:30")?, Duration::from_secs(90));
/// assert_eq!(vidkit::parse_timecode("90")?, Duration::from_secs(90));
/// # Ok::<(), vidkit::VidkitError>(())
/// ```
pub fn parse_timecode(value: &str) -> Result<Duration, VidkitError> {
    let trimmed = value.trim();
    let invalid = || VidkitError::InvalidTimecode(value.to_string());

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [hours, minutes, seconds] => (
            parse_whole(hours).ok_or_else(invalid)?,
            parse_whole(minutes).ok_or_else(invalid)?,
            *seconds,
        ),
        [minutes, seconds] => (0, parse_whole(minutes).ok_or_else(invalid)?, *seconds),
        [seconds] => (0, 0, *seconds),
        _ => return Err(invalid()),
    };

    let seconds = seconds.trim().parse::<f64>().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|hours| minutes.checked_mul(60)?.checked_add(hours))
        .ok_or_else(invalid)?;
    Duration::try_from_secs_f64(whole as f64 + seconds).map_err(|_| invalid())
}

/// Render a [`Duration`] as `HH:MM:SS.mmm`.
///
/// ```
/// use std::time::Duration;
///
/// assert_eq!(vidkit::format_timecode(Duration::from_millis(3_723_500)), "01:02:03.500");
/// ```
pub fn format_timecode(duration: Duration) -> String {
    let total_millis = duration.as_millis();
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis / 60_000) % 60;
    let seconds = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

fn parse_whole(field: &str) -> Option<u64> {
    field.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timecode_formats() {
        assert_eq!(parse_timecode("75").unwrap().as_secs(), 75);
        assert_eq!(parse_timecode("01:15").unwrap().as_secs(), 75);
        assert_eq!(parse_timecode("00:01:15").unwrap().as_secs(), 75);
        assert_eq!(parse_timecode("1:00:00").unwrap().as_secs(), 3600);
    }

    #[test]
    fn fractional_seconds() {
        assert_eq!(parse_timecode("00:01:15.5").unwrap(), Duration::from_millis(75_500));
        assert_eq!(parse_timecode("2.25").unwrap(), Duration::from_millis(2250));
    }

    #[test]
    fn rejects_malformed() {
        for text in [
            "",
            "  ",
            "1:2:3:4",
            "aa:10",
            "1:bb",
            "-5",
            "01:-2",
            "1.5:10",
            "1e300",
            "6000000000000000:00:00",
            "00:400000000000000000:00",
        ] {
            assert!(
                matches!(parse_timecode(text), Err(VidkitError::InvalidTimecode(_))),
                "'{text}' should not parse"
            );
        }
    }

    #[test]
    fn format_round_trips_whole_millis() {
        let duration = Duration::from_millis(5_500);
        assert_eq!(format_timecode(duration), "00:00:05.500");
        assert_eq!(parse_timecode(&format_timecode(duration)).unwrap(), duration);
    }
}
