use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 120, g: 200, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 190, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const IPV4_ADDR: Color = Color::TrueColor { r: 130, g: 220, b: 130 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 200, g: 150, b: 255 };
pub const SERVICE: Color = Color::Cyan;
