use regex::Regex;

// Per-interval server report line: stream index, time range, byte count,
// bandwidth, jitter, lost/total with percentage. Anchored at line end so the
// cumulative totals line (which carries a trailing marker) does not match.
const INTERVAL_PATTERN: &str = r"^\[\s*\d+\]\s+([\d.]+)-([\d.]+)\s+sec\s+[\d.]+\s+\w*Bytes\s+([\d.]+)\s+Mbits/sec\s+([\d.]+)\s+ms\s+\d+/\d+\s+\(([\d.]+)%\)\s*$";

// Same grammar with trailing content after the loss parenthetical, which
// marks the run's overall accounting rather than one interval.
const TOTALS_PATTERN: &str = r"^\[\s*\d+\]\s+[\d.]+-[\d.]+\s+sec\s+[\d.]+\s+\w*Bytes\s+([\d.]+)\s+Mbits/sec\s+([\d.]+)\s+ms\s+\d+/\d+\s+\(([\d.]+)%\)\s+\S";

/// One per-interval line from the receiver-side transcript.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerInterval {
    pub start: f64,
    pub end: f64,
    pub bandwidth_mbps: f64,
    pub jitter_ms: f64,
    pub loss_pct: f64,
}

/// End-of-run accounting computed by the receiver, more trustworthy than an
/// average over interval samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerTotals {
    pub bandwidth_mbps: f64,
    pub jitter_ms: f64,
    pub loss_pct: f64,
}

/// Extracts the per-interval lines from a receiver-side transcript.
/// Unmatched lines are diagnostic noise and are skipped.
pub fn parse_intervals(transcript: &str) -> Vec<ServerInterval> {
    let re = Regex::new(INTERVAL_PATTERN).unwrap();
    transcript
        .lines()
        .filter_map(|line| {
            let cap = re.captures(line)?;
            Some(ServerInterval {
                start: cap.get(1)?.as_str().parse().ok()?,
                end: cap.get(2)?.as_str().parse().ok()?,
                bandwidth_mbps: cap.get(3)?.as_str().parse().ok()?,
                jitter_ms: cap.get(4)?.as_str().parse().ok()?,
                loss_pct: cap.get(5)?.as_str().parse().ok()?,
            })
        })
        .collect()
}

/// Locates the cumulative totals line. The last candidate wins, matching the
/// receiver's final accounting in real transcripts.
pub fn parse_totals(transcript: &str) -> Option<ServerTotals> {
    let re = Regex::new(TOTALS_PATTERN).unwrap();
    transcript
        .lines()
        .filter_map(|line| {
            let cap = re.captures(line)?;
            Some(ServerTotals {
                bandwidth_mbps: cap.get(1)?.as_str().parse().ok()?,
                jitter_ms: cap.get(2)?.as_str().parse().ok()?,
                loss_pct: cap.get(3)?.as_str().parse().ok()?,
            })
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "\
Accepted connection from 10.0.0.2, port 40104
[  5] local 10.0.0.1 port 5201 connected to 10.0.0.2 port 51883
[ ID] Interval           Transfer     Bitrate         Jitter    Lost/Total Datagrams
[  5]   0.00-1.00   sec  1.19 MBytes  9.99 Mbits/sec  0.107 ms  0/862 (0%)
[ 5]   2.00-3.00  sec  1.25 MBytes  10.5 Mbits/sec  3.200 ms  12/500 (2.4%)
[  5]   0.00-10.04  sec  11.8 MBytes  9.86 Mbits/sec  0.079 ms  123/8976 (1.4%)  receiver
";

    #[test]
    fn parses_interval_lines_and_skips_noise() {
        let intervals = parse_intervals(TRANSCRIPT);
        assert_eq!(intervals.len(), 2);
        assert_eq!(
            intervals[1],
            ServerInterval {
                start: 2.0,
                end: 3.0,
                bandwidth_mbps: 10.5,
                jitter_ms: 3.2,
                loss_pct: 2.4,
            }
        );
    }

    #[test]
    fn line_without_loss_parenthetical_is_skipped() {
        let intervals = parse_intervals("[  5]   4.00-5.00  sec  1.19 MBytes  9.99 Mbits/sec\n");
        assert!(intervals.is_empty());
    }

    #[test]
    fn trailing_content_excludes_line_from_intervals() {
        let line = "[  5]   0.00-10.04  sec  11.8 MBytes  9.86 Mbits/sec  0.079 ms  123/8976 (1.4%)  receiver";
        assert!(parse_intervals(line).is_empty());
    }

    #[test]
    fn finds_cumulative_totals_line() {
        let totals = parse_totals(TRANSCRIPT).expect("totals line present");
        assert_eq!(
            totals,
            ServerTotals {
                bandwidth_mbps: 9.86,
                jitter_ms: 0.079,
                loss_pct: 1.4,
            }
        );
    }

    #[test]
    fn no_totals_in_interval_only_transcript() {
        let transcript = "[  5]   0.00-1.00   sec  1.19 MBytes  9.99 Mbits/sec  0.107 ms  0/862 (0%)\n";
        assert!(parse_totals(transcript).is_none());
    }
}
