use num_format::{Locale, ToFormattedString};

pub mod assets;
pub mod charts;
pub mod html;
pub mod zip;

/// `1234567` as `1 234 567`.
pub fn group_thousands(n: u64) -> String {
    n.to_formatted_string(&Locale::en).replace(',', " ")
}
