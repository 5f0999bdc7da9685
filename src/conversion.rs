//! Internal timestamp conversions.
//!
//! Streams count time in their own rational time base; the trimmer and the
//! transcoder move between those ticks, seconds, and FFmpeg's microsecond
//! `AV_TIME_BASE`.

use std::time::Duration;

use ffmpeg_next::Rational;

/// Convert seconds to ticks of `time_base`, rounded to the nearest tick.
///
/// Rounding keeps times that sit exactly on a tick from landing one tick
/// early through float error.
pub(crate) fn seconds_to_stream_timestamp(seconds: f64, time_base: Rational) -> i64 {
    let numerator = f64::from(time_base.numerator());
    let denominator = f64::from(time_base.denominator());
    (seconds * denominator / numerator).round() as i64
}

/// Convert ticks of `time_base` to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a [`Duration`] to a container seek target in `AV_TIME_BASE`
/// (microseconds), as expected by `Input::seek` with no stream selected.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros() as i64
}

/// Seconds as a [`Duration`], clamping negatives and NaN to zero and
/// values too large for a `Duration` to [`Duration::MAX`].
pub(crate) fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_timestamps() {
        let millis = Rational::new(1, 1000);
        assert_eq!(seconds_to_stream_timestamp(1.5, millis), 1500);
        assert_eq!(pts_to_seconds(1500, millis), 1.5);

        let pal = Rational::new(1, 25);
        assert_eq!(seconds_to_stream_timestamp(2.0, pal), 50);
        assert_eq!(seconds_to_stream_timestamp(2.07, pal), 52);
        assert_eq!(seconds_to_stream_timestamp(2.01, pal), 50);
    }

    #[test]
    fn exact_tick_times_are_not_truncated() {
        // 0.29 * 100 is 28.999999999999996 in floating point.
        assert_eq!(seconds_to_stream_timestamp(0.29, Rational::new(1, 100)), 29);
        assert_eq!(seconds_to_stream_timestamp(0.04, Rational::new(1, 90000)), 3600);
        assert_eq!(seconds_to_stream_timestamp(1.0 / 3.0, Rational::new(1001, 30000)), 10);
    }

    #[test]
    fn seek_timestamps_are_microseconds() {
        assert_eq!(duration_to_seek_timestamp(Duration::from_millis(2500)), 2_500_000);
    }

    #[test]
    fn negative_seconds_clamp() {
        assert_eq!(seconds_to_duration(-0.5), Duration::ZERO);
        assert_eq!(seconds_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(seconds_to_duration(2.0), Duration::from_secs(2));
        assert_eq!(seconds_to_duration(f64::INFINITY), Duration::MAX);
        assert_eq!(seconds_to_duration(1e300), Duration::MAX);
    }
}
