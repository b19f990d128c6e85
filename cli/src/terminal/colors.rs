use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 110, g: 190, b: 255 };
pub const SECONDARY: Color = Color::TrueColor { r: 170, g: 140, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 200, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_BLOCK: Color = Color::TrueColor { r: 120, g: 220, b: 140 };
pub const IPV6_BLOCK: Color = Color::TrueColor { r: 90, g: 200, b: 200 };
pub const DEFAULT_ROUTE: Color = Color::TrueColor { r: 255, g: 150, b: 80 };
