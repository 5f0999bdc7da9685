//! Command-line value parsing: bitrates, timecodes, and trim ranges.

use std::time::Duration;

use vidkit::{Bitrate, CompressionTarget, TrimRange, VidkitError, format_timecode, parse_timecode};

#[test]
fn equivalent_timecode_spellings() {
    for text in ["75", "01:15", "00:01:15", "1:15", "75.0"] {
        assert_eq!(
            parse_timecode(text).unwrap(),
            Duration::from_secs(75),
            "'{text}'"
        );
    }
}

#[test]
fn fractional_seconds() {
    assert_eq!(
        parse_timecode("00:00:01.25").unwrap(),
        Duration::from_millis(1250)
    );
    assert_eq!(parse_timecode("0.5").unwrap(), Duration::from_millis(500));
}

#[test]
fn malformed_timecodes() {
    for text in [
        "",
        "1:2:3:4",
        "aa:10",
        "1.5:00",
        "-3",
        "00:-1:00",
        "10:",
        ":",
        "1e300",
        "6000000000000000:00:00",
    ] {
        let error = parse_timecode(text).unwrap_err();
        assert!(
            matches!(error, VidkitError::InvalidTimecode(_)),
            "'{text}' gave {error:?}"
        );
    }
}

#[test]
fn timecode_error_names_the_input() {
    let error = parse_timecode("1:2:3:4").unwrap_err();
    assert_eq!(error.to_string(), "Invalid time format: 1:2:3:4");
}

#[test]
fn formatting_is_zero_padded() {
    assert_eq!(format_timecode(Duration::ZERO), "00:00:00.000");
    assert_eq!(format_timecode(Duration::from_secs(75)), "00:01:15.000");
    assert_eq!(format_timecode(Duration::from_secs(36_000)), "10:00:00.000");
}

#[test]
fn bitrate_spellings() {
    let one_megabit = Bitrate::from_bits_per_second(1_000_000);
    assert_eq!("1000".parse::<Bitrate>().unwrap(), one_megabit);
    assert_eq!("1000k".parse::<Bitrate>().unwrap(), one_megabit);
    assert_eq!("1M".parse::<Bitrate>().unwrap(), one_megabit);
    assert_eq!("2M".parse::<Bitrate>().unwrap().bits_per_second(), 2_000_000);
}

#[test]
fn bitrate_error_message() {
    let error = "fast".parse::<Bitrate>().unwrap_err();
    assert_eq!(
        error.to_string(),
        "Bitrate value 'fast' is not valid. Use format like '1000' or '1000k'."
    );
}

#[test]
fn oversized_bitrates_are_errors() {
    for text in ["18446744073709552", "1e30k", "99999999999999999999M"] {
        let error = text.parse::<Bitrate>().unwrap_err();
        assert!(
            matches!(error, VidkitError::InvalidBitrate(_)),
            "'{text}' gave {error:?}"
        );
    }
}

#[test]
fn bitrates_order_by_rate() {
    let low: Bitrate = "500k".parse().unwrap();
    let high: Bitrate = "1.2M".parse().unwrap();
    assert!(low < high);
    assert_eq!(high.kilobits(), 1200);
}

#[test]
fn compression_target_prefers_size() {
    assert_eq!(
        CompressionTarget::from_arguments(Some("2M"), Some(8.0)).unwrap(),
        CompressionTarget::FileSize(8.0)
    );
    assert_eq!(
        CompressionTarget::from_arguments(Some("2M"), None).unwrap(),
        CompressionTarget::Bitrate(Bitrate::from_kilobits(2000))
    );
}

#[test]
fn trim_range_from_start_and_end() {
    let range = TrimRange::from_arguments(Some("00:01:30"), Some("00:02:30"), None).unwrap();
    assert_eq!(
        range,
        TrimRange::Between {
            start: Duration::from_secs(90),
            end: Duration::from_secs(150),
        }
    );
    assert_eq!(range.length(), Duration::from_secs(60));
}

#[test]
fn trim_range_end_before_start() {
    let error = TrimRange::from_arguments(Some("2:00"), Some("1:00"), None).unwrap_err();
    assert!(matches!(error, VidkitError::InvalidRange { .. }));
    let message = error.to_string();
    assert!(message.contains("00:02:00.000"), "{message}");
    assert!(message.contains("00:01:00.000"), "{message}");
}

#[test]
fn trim_range_bad_timecode_surfaces() {
    let error = TrimRange::from_arguments(None, None, Some("soon")).unwrap_err();
    assert!(matches!(error, VidkitError::InvalidTimecode(_)));
}
