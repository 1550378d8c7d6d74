use std::time::{Duration, SystemTime};

pub trait SystemTimeExt {
    /// Whole seconds relative to the Unix epoch, negative for earlier times.
    fn unix_seconds(&self) -> i64;
}

impl SystemTimeExt for SystemTime {
    fn unix_seconds(&self) -> i64 {
        match self.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(after) => saturating_secs(after),
            Err(before) => {
                let before = before.duration();
                // Round towards negative infinity, like a floor of the fractional timestamp
                let secs = saturating_secs(before);
                if before.subsec_nanos() > 0 {
                    -secs - 1
                } else {
                    -secs
                }
            }
        }
    }
}

fn saturating_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
