use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use colored::*;
use tracing::{Instrument, info, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::commands::{ResolveArgs, Tuning};
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};
use lanprobe_common::{
    candidate::{Candidate, ResolvedCandidate},
    config::{ResolverConfig, StrategyConfig},
    pattern,
};
use lanprobe_core::{
    Capabilities, Resolver, StrategyKind,
    network::{LookupGate, lookup::LookupSurfaceHost, tcp::TcpHandshakeProbe},
};

pub async fn resolve(args: ResolveArgs, q_level: u8) -> anyhow::Result<()> {
    let candidates: Vec<Candidate> = collect_candidates(&args)?;
    if candidates.is_empty() {
        bail!("nothing to probe: pass hostnames, --file, or --name");
    }

    let kind: StrategyKind = args.strategy;
    let cfg: ResolverConfig = args.tuning.apply(ResolverConfig::default(), kind);
    let resolver: Resolver = native_resolver(cfg);

    print::header("getting ready to probe", q_level);
    info!("Probing {} candidates with the {kind} strategy", candidates.len());

    let span = info_span!("probing", indicatif.pb_show = true);
    span.pb_set_style(&spinner::style());
    span.pb_set_message("Waiting for the first hostname to resolve...");

    let found: AtomicUsize = AtomicUsize::new(0);
    let on_found = |resolved: &ResolvedCandidate| {
        let count: usize = found.fetch_add(1, Ordering::Relaxed) + 1;
        spinner::report_progress(&span, count);
        info!(
            "Resolved {} in {}",
            resolved.hostname().color(colors::PRIMARY),
            format::ping(resolved.ping)
        );
    };

    let start_time: Instant = Instant::now();
    let results: Vec<ResolvedCandidate> = resolver
        .resolve(kind, &candidates, Some(&on_found))
        .instrument(span.clone())
        .await
        .with_context(|| format!("{kind} resolution failed"))?;
    drop(span);

    resolution_ends(&results, start_time.elapsed(), q_level);
    Ok(())
}

/// Resolver wired to the primitives available outside a browser.
pub fn native_resolver(cfg: ResolverConfig) -> Resolver {
    let lookups = LookupGate::default();
    let caps = Capabilities::default()
        .with_http(Arc::new(TcpHandshakeProbe::default().with_lookups(lookups.clone())))
        .with_surfaces(Arc::new(LookupSurfaceHost::new().with_lookups(lookups)));
    Resolver::new(caps, cfg)
}

impl Tuning {
    fn apply(&self, mut cfg: ResolverConfig, kind: StrategyKind) -> ResolverConfig {
        let target: &mut StrategyConfig = match kind {
            StrategyKind::Fetch => &mut cfg.fetch,
            StrategyKind::Frame => &mut cfg.frame,
            StrategyKind::Topology => &mut cfg.topology,
        };
        if let Some(limit) = self.concurrency {
            target.concurrency_limit = limit;
        }
        if let Some(ms) = self.timeout_ms {
            target.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.threshold_ms {
            target.confirm_threshold = Duration::from_millis(ms);
        }
        if let Some(ms) = self.delay_ms {
            target.inter_batch_delay = Duration::from_millis(ms);
        }
        cfg
    }
}

fn collect_candidates(args: &ResolveArgs) -> anyhow::Result<Vec<Candidate>> {
    let mut candidates: Vec<Candidate> =
        args.hostnames.iter().filter_map(|l| parse_line(l)).collect();

    if let Some(path) = &args.file {
        let content: String = std::fs::read_to_string(path)
            .with_context(|| format!("reading candidates from {}", path.display()))?;
        candidates.extend(content.lines().filter_map(parse_line));
    }

    if !args.names.is_empty() {
        let patterns: Vec<String> = if args.patterns.is_empty() {
            pattern::default_patterns(pattern::DEVICE_BASE_NAMES)
        } else {
            args.patterns.clone()
        };
        candidates.extend(pattern::expand(&patterns, &args.names));
    } else {
        candidates.extend(pattern::expand(&args.patterns, &[]));
    }

    Ok(candidates)
}

/// Parses `hostname` or `label=hostname`. Blank lines and `#` comments yield nothing.
fn parse_line(line: &str) -> Option<Candidate> {
    let line: &str = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match line.split_once('=') {
        Some((label, hostname)) => {
            Some(Candidate::new(hostname.trim().to_lowercase()).with_label(label.trim()))
        }
        None => Some(Candidate::new(line.to_lowercase())),
    }
}

fn resolution_ends(results: &[ResolvedCandidate], total_time: Duration, q_level: u8) {
    if results.is_empty() {
        no_hostnames_resolved(q_level);
        return;
    }

    if q_level > 0 {
        mprint!();
    }

    print::header("resolved hostnames", q_level);
    print_results(results, q_level);
    print_summary(results.len(), total_time, q_level);
}

fn no_hostnames_resolved(q_level: u8) {
    print::header("no hostname resolved", q_level);
    if q_level < 2 {
        print::no_results();
    }
}

fn print_results(results: &[ResolvedCandidate], q_level: u8) {
    for (idx, resolved) in results.iter().enumerate() {
        match q_level {
            2 => print::print(resolved.hostname()),
            _ => {
                print::tree_head(idx, resolved.hostname());
                print::as_tree_one_level(format::to_details(resolved));
                if idx + 1 != results.len() {
                    mprint!();
                }
            }
        }
    }
}

fn print_summary(count: usize, total_time: Duration, q_level: u8) {
    if q_level > 1 {
        return;
    }
    let resolved: ColoredString = format!("{count} hostnames").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!("Probing complete: {resolved} resolved in {total_time}");

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => {
            mprint!();
            info!("{}", output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_may_carry_a_label() {
        let candidate = parse_line(" Alice = Alices-iMac.local ").unwrap();
        assert_eq!(candidate.hostname, "alices-imac.local");
        assert_eq!(candidate.label.as_deref(), Some("Alice"));

        assert_eq!(parse_line("imac.local").unwrap().label, None);
        assert!(parse_line("# comment").is_none());
        assert!(parse_line("   ").is_none());
    }

    #[test]
    fn tuning_only_touches_the_selected_strategy() {
        let tuning = Tuning {
            concurrency: Some(5),
            timeout_ms: Some(250),
            ..Tuning::default()
        };
        let cfg = tuning.apply(ResolverConfig::default(), StrategyKind::Frame);

        assert_eq!(cfg.frame.concurrency_limit, 5);
        assert_eq!(cfg.frame.probe_timeout, Duration::from_millis(250));
        assert_eq!(cfg.fetch, StrategyConfig::fetch());
    }

    #[test]
    fn names_fall_back_to_default_patterns() {
        let args = ResolveArgs {
            hostnames: vec!["router.local".into()],
            file: None,
            patterns: vec![],
            names: vec!["Bob".into()],
            strategy: StrategyKind::Fetch,
            tuning: Tuning::default(),
        };
        let candidates = collect_candidates(&args).unwrap();

        assert_eq!(candidates[0].hostname, "router.local");
        assert!(candidates.iter().any(|c| c.hostname == "bobs-macbook-pro.local"));
        assert!(candidates.iter().any(|c| c.hostname == "mac.local" && c.label.is_none()));
    }
}
