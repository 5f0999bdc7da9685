//! Bitrate values as users type them and as encoders consume them.
//!
//! A [`Bitrate`] is a plain bits-per-second count. It parses from the forms
//! accepted on the command line and renders in the kilobit form FFmpeg's
//! tools use (`"514k"`), truncating any sub-kilobit remainder.
//!
//! | Input     | Bits per second |
//! |-----------|-----------------|
//! | `"1000"`  | 1 000 000 (bare numbers are kilobits) |
//! | `"1000k"` | 1 000 000 |
//! | `"2M"`    | 2 000 000 |
//! | `"1.5m"`  | 1 500 000 |

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::VidkitError;

/// A bitrate in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bitrate(u64);

impl Bitrate {
    /// Wrap a raw bits-per-second value.
    pub const fn from_bits_per_second(bits_per_second: u64) -> Self {
        Self(bits_per_second)
    }

    /// Build a bitrate from kilobits per second, saturating at `u64::MAX`
    /// bits per second.
    pub const fn from_kilobits(kilobits: u64) -> Self {
        Self(kilobits.saturating_mul(1000))
    }

    /// The value in bits per second.
    pub const fn bits_per_second(self) -> u64 {
        self.0
    }

    /// The value in whole kilobits per second (truncated).
    pub const fn kilobits(self) -> u64 {
        self.0 / 1000
    }
}

impl Display for Bitrate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}k", self.kilobits())
    }
}

impl FromStr for Bitrate {
    type Err = VidkitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || VidkitError::InvalidBitrate(value.to_string());

        let (number, multiplier) = match trimmed.char_indices().last() {
            Some((index, 'k' | 'K')) => (&trimmed[..index], 1_000.0),
            Some((index, 'm' | 'M')) => (&trimmed[..index], 1_000_000.0),
            Some(_) => {
                // Bare numbers are kilobits and must be whole.
                let kilobits = trimmed.parse::<u64>().map_err(|_| invalid())?;
                if kilobits == 0 {
                    return Err(invalid());
                }
                let bits_per_second = kilobits.checked_mul(1000).ok_or_else(invalid)?;
                log::debug!("Interpreting bitrate '{trimmed}' as {kilobits}k");
                return Ok(Self(bits_per_second));
            }
            None => return Err(invalid()),
        };

        let amount = number.parse::<f64>().map_err(|_| invalid())?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(invalid());
        }
        let product = amount * multiplier;
        // `u64::MAX as f64` rounds up to 2^64, which no u64 can hold.
        if product >= u64::MAX as f64 {
            return Err(invalid());
        }
        let bits_per_second = product as u64;
        if bits_per_second == 0 {
            return Err(invalid());
        }
        Ok(Self(bits_per_second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_numbers_are_kilobits() {
        assert_eq!("1000".parse::<Bitrate>().unwrap().bits_per_second(), 1_000_000);
        assert_eq!(" 750 ".parse::<Bitrate>().unwrap().to_string(), "750k");
    }

    #[test]
    fn suffixes() {
        assert_eq!("1000k".parse::<Bitrate>().unwrap().bits_per_second(), 1_000_000);
        assert_eq!("1000K".parse::<Bitrate>().unwrap().bits_per_second(), 1_000_000);
        assert_eq!("2M".parse::<Bitrate>().unwrap().bits_per_second(), 2_000_000);
        assert_eq!("1.5m".parse::<Bitrate>().unwrap().bits_per_second(), 1_500_000);
    }

    #[test]
    fn rejects_garbage() {
        for text in [
            "",
            "k",
            "abc",
            "12.5",
            "-3k",
            "0",
            "0k",
            "fastk",
            "18446744073709552",
            "1e30k",
            "1e300M",
        ] {
            assert!(
                matches!(text.parse::<Bitrate>(), Err(VidkitError::InvalidBitrate(_))),
                "'{text}' should not parse"
            );
        }
    }

    #[test]
    fn largest_bare_kilobits() {
        let bitrate = "18446744073709551".parse::<Bitrate>().unwrap();
        assert_eq!(bitrate.kilobits(), 18_446_744_073_709_551);
        assert_eq!(Bitrate::from_kilobits(u64::MAX).bits_per_second(), u64::MAX);
    }

    #[test]
    fn display_truncates() {
        assert_eq!(Bitrate::from_bits_per_second(514_999).to_string(), "514k");
        assert_eq!(Bitrate::from_bits_per_second(999).to_string(), "0k");
    }
}
