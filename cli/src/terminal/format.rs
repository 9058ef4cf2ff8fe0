use std::time::Duration;

use colored::*;
use lanprobe_common::candidate::ResolvedCandidate;

use crate::terminal::colors;

type Detail = (String, ColoredString);

pub fn ping(ping: Duration) -> ColoredString {
    let ms: f64 = ping.as_secs_f64() * 1_000.0;
    let color: Color = match ping.as_millis() {
        0..=50 => colors::PING_FAST,
        51..=200 => colors::PING_MEDIUM,
        _ => colors::PING_SLOW,
    };
    format!("{ms:.1}ms").color(color)
}

pub fn to_details(resolved: &ResolvedCandidate) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::new();
    if let Some(label) = resolved.label() {
        details.push(("Label".to_string(), label.color(colors::LABEL)));
    }
    details.push(("Ping".to_string(), ping(resolved.ping)));
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanprobe_common::candidate::Candidate;

    #[test]
    fn label_detail_only_when_present() {
        let plain = Candidate::new("imac.local").resolved(Duration::from_millis(3));
        assert_eq!(to_details(&plain).len(), 1);

        let labelled = Candidate::new("alices-imac.local")
            .with_label("alice")
            .resolved(Duration::from_millis(3));
        let details = to_details(&labelled);
        assert_eq!(details[0].0, "Label");
        assert_eq!(details[1].0, "Ping");
    }

    #[test]
    fn ping_is_printed_in_milliseconds() {
        colored::control::set_override(false);
        assert_eq!(ping(Duration::from_micros(40_200)).to_string(), "40.2ms");
    }
}
