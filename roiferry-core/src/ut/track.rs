// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use chrono;
use colored::*;
use serde::{Deserialize, Serialize};

/// How much progress information is printed to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Silent,
    #[default]
    Info,
    Debug,
}

impl Verbosity {
    pub fn info(&self) -> bool {
        *self >= Verbosity::Info
    }

    pub fn debug(&self) -> bool {
        *self >= Verbosity::Debug
    }
}

/// A standardized timestamp prefix for console messages
pub fn progress_timestamp(desc: &str) -> String {
    let time = chrono::Local::now();
    let ymd = time.format("%Y-%m-%dT").to_string();
    let ymd = &ymd[..ymd.len() - 1];
    let hms = time.format("%H:%M:%S").to_string();
    let time = format!("{} | {}", ymd, hms);

    format!(
        "{} {} {} {} {} {}",
        "[".bold(),
        time,
        "|".bold(),
        "roiferry".truecolor(103, 194, 69).bold(),
        "]".bold(),
        desc,
    )
}

/// Print timestamped statements to console
pub fn progress_log(desc: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", progress_timestamp(desc));
}

/// Print timestamped diagnostic statements to console
pub fn debug_log(desc: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", progress_timestamp(&format!("{} {}", "debug".dimmed(), desc)));
}

/// Print timestamped warnings to stderr regardless of verbosity
pub fn warn_log(desc: &str) {
    eprintln!(
        "{}",
        progress_timestamp(&format!("{} {}", "warning".yellow().bold(), desc))
    );
}

/// Format numbers to readaable thousands format
pub fn thousands_format<T>(number: T) -> String
where
    T: std::fmt::Display,
{
    let number = number.to_string();
    if number.len() > 4 {
        number
            .as_bytes()
            .rchunks(3)
            .rev()
            .map(std::str::from_utf8)
            .collect::<Result<Vec<&str>, _>>()
            .unwrap()
            .join(",")
    } else {
        number.to_string()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert!(!Verbosity::Silent.info());
        assert!(Verbosity::Info.info());
        assert!(!Verbosity::Info.debug());
        assert!(Verbosity::Debug.info());
        assert!(Verbosity::Debug.debug());
    }

    #[test]
    fn test_thousands_format() {
        assert_eq!(thousands_format(999), "999");
        assert_eq!(thousands_format(12345), "12,345");
        assert_eq!(thousands_format(1234567), "1,234,567");
    }
}
