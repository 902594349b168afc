//! Display formatting for timer values and durations.

/// Countdown display, `MM:SS`. Minutes are not wrapped into hours, so a
/// 120-minute countdown reads `120:00`. Partial seconds round up so the
/// display only reaches `00:00` when the countdown is actually over.
pub fn countdown(remaining_ms: u64) -> String {
    let secs = remaining_ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Stopwatch display with centiseconds: `MM:SS.cc`, or `HH:MM:SS.cc` once
/// an hour has passed.
pub fn stopwatch(elapsed_ms: u64) -> String {
    let hours = elapsed_ms / 3_600_000;
    let minutes = (elapsed_ms % 3_600_000) / 60_000;
    let seconds = (elapsed_ms % 60_000) / 1000;
    let centis = (elapsed_ms % 1000) / 10;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{centis:02}")
    } else {
        format!("{minutes:02}:{seconds:02}.{centis:02}")
    }
}

/// Human-readable duration for reports: `1h 05m 09s`, `5m 09s` or `9s`.
pub fn duration(ms: u64) -> String {
    let total = ms / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds:02}s"),
        _ => format!("{hours}h {minutes:02}m {seconds:02}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_format() {
        assert_eq!(countdown(30 * 60_000), "30:00");
        assert_eq!(countdown(120 * 60_000), "120:00");
        assert_eq!(countdown(61_000), "01:01");
        assert_eq!(countdown(400), "00:01");
        assert_eq!(countdown(0), "00:00");
    }

    #[test]
    fn stopwatch_format() {
        assert_eq!(stopwatch(0), "00:00.00");
        assert_eq!(stopwatch(65_432), "01:05.43");
        assert_eq!(stopwatch(3_723_450), "01:02:03.45");
    }

    #[test]
    fn duration_format() {
        assert_eq!(duration(9_000), "9s");
        assert_eq!(duration(309_000), "5m 09s");
        assert_eq!(duration(3_909_000), "1h 05m 09s");
    }
}
