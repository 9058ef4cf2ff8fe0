use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 102, g: 217, b: 239 };
pub const ACCENT: Color = Color::TrueColor { r: 166, g: 226, b: 46 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const LABEL: Color = Color::TrueColor { r: 230, g: 219, b: 116 };
pub const WARNING: Color = Color::Yellow;

pub const PING_FAST: Color = Color::Green;
pub const PING_MEDIUM: Color = Color::Yellow;
pub const PING_SLOW: Color = Color::Red;
