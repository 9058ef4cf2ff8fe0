use colored::*;
use lanprobe_core::{Resolver, StrategyKind};

use crate::terminal::{colors, print};

pub fn strategies(resolver: &Resolver, q_level: u8) {
    print::header("probe strategies", q_level);
    for kind in StrategyKind::ALL {
        let status: ColoredString = match resolver.strategy(kind) {
            Ok(_) => "available".green().bold(),
            Err(e) => e.to_string().color(colors::WARNING),
        };
        print::aligned_line(kind.as_str(), status);
    }
}
