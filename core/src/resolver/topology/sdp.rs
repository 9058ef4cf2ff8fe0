//! Session-description rewriting.
//!
//! Every gathered address line is swapped for one line per batch candidate, the
//! candidate's position doubling as the line's foundation. Whichever line wins the
//! connectivity check then names its candidate through that foundation.

use std::sync::LazyLock;

use lanprobe_common::capability::SessionDescription;
use regex::{Captures, Regex};

static CANDIDATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^a=candidate:(\d+) (\d+) (\w+) (\d+) (.*?) (\d+) (.*?)$")
        .expect("candidate line pattern is valid")
});

/// Replaces the address of every candidate line with each of `hostnames` in turn.
pub fn rewrite(desc: &SessionDescription, hostnames: &[&str]) -> SessionDescription {
    let line_break = if desc.sdp.contains("\r\n") { "\r\n" } else { "\n" };

    let sdp = CANDIDATE_LINE.replace_all(&desc.sdp, |caps: &Captures| {
        hostnames
            .iter()
            .enumerate()
            .map(|(i, hostname)| {
                format!(
                    "a=candidate:{i} {} {} {} {hostname} {} {}",
                    &caps[2], &caps[3], &caps[4], &caps[6], &caps[7]
                )
            })
            .collect::<Vec<String>>()
            .join(line_break)
    });

    SessionDescription {
        kind: desc.kind,
        sdp: sdp.into_owned(),
    }
}

/// Maps a selected foundation back to a position in a batch of `len`.
pub fn foundation_index(foundation: &str, len: usize) -> Option<usize> {
    foundation.parse::<usize>().ok().filter(|i| *i < len)
}

/// Addresses of every candidate line, keyed by foundation.
pub fn candidate_addresses(sdp: &str) -> Vec<(String, String)> {
    CANDIDATE_LINE
        .captures_iter(sdp)
        .map(|caps| (caps[1].to_string(), caps[5].to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanprobe_common::capability::SdpKind;

    const OFFER: &str = "v=0\r\n\
        o=- 4611731400430051336 2 IN IP4 127.0.0.1\r\n\
        a=candidate:842163049 1 udp 1677729535 192.168.1.23 56143 typ srflx generation 0\r\n\
        a=candidate:2999745851 1 tcp 1518280447 10.0.0.4 9 typ host tcptype active\r\n\
        a=end-of-candidates\r\n";

    fn offer() -> SessionDescription {
        SessionDescription {
            kind: SdpKind::Offer,
            sdp: OFFER.to_string(),
        }
    }

    #[test]
    fn every_candidate_line_is_fanned_out() {
        let rewritten = rewrite(&offer(), &["alices-imac.local", "bobs-imac.local"]);
        let addresses = candidate_addresses(&rewritten.sdp);

        assert_eq!(
            addresses,
            [
                ("0".to_string(), "alices-imac.local".to_string()),
                ("1".to_string(), "bobs-imac.local".to_string()),
                ("0".to_string(), "alices-imac.local".to_string()),
                ("1".to_string(), "bobs-imac.local".to_string()),
            ]
        );
        assert_eq!(rewritten.kind, SdpKind::Offer);
    }

    #[test]
    fn untouched_lines_and_line_breaks_survive() {
        let rewritten = rewrite(&offer(), &["imac.local"]);

        assert!(rewritten.sdp.starts_with("v=0\r\no=- 4611731400430051336"));
        assert!(rewritten.sdp.ends_with("a=end-of-candidates\r\n"));
        assert!(rewritten.sdp.contains(
            "a=candidate:0 1 udp 1677729535 imac.local 56143 typ srflx generation 0\r\n"
        ));
        assert!(!rewritten.sdp.contains("\r\r"));
    }

    #[test]
    fn bare_newlines_stay_bare() {
        let desc = SessionDescription {
            kind: SdpKind::Answer,
            sdp: OFFER.replace("\r\n", "\n"),
        };
        let rewritten = rewrite(&desc, &["a.local", "b.local"]);

        assert!(!rewritten.sdp.contains('\r'));
        assert!(rewritten.sdp.contains("a.local 56143 typ srflx generation 0\na=candidate:1 "));
    }

    #[test]
    fn foundation_outside_batch_is_ignored() {
        assert_eq!(foundation_index("2", 3), Some(2));
        assert_eq!(foundation_index("3", 3), None);
        assert_eq!(foundation_index("842163049", 3), None);
        assert_eq!(foundation_index("x", 3), None);
    }
}
