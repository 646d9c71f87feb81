//! Readers for mapping text. They only see `&str`; the caller does the I/O.

pub mod proguard;
pub mod tsrg;

use std::fmt;
use std::str::FromStr;

use super::MappingTable;
use crate::error::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MappingFormat {
    /// ProGuard / Mojang `named -> obfuscated` maps.
    Proguard,
    /// Searge TSRG (v1).
    Tsrg,
}

impl MappingFormat {
    /// Guesses the format from the first meaningful line.
    pub fn detect(text: &str) -> MappingFormat {
        let first = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'));
        match first {
            Some(line) if line.contains(" -> ") => MappingFormat::Proguard,
            _ => MappingFormat::Tsrg,
        }
    }

    pub fn parse(self, text: &str) -> Result<MappingTable> {
        match self {
            MappingFormat::Proguard => proguard::parse(text),
            MappingFormat::Tsrg => tsrg::parse(text),
        }
    }
}

impl FromStr for MappingFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "proguard" | "mojang" => Ok(MappingFormat::Proguard),
            "tsrg" | "searge" => Ok(MappingFormat::Tsrg),
            other => Err(format!("unknown mapping format '{other}'")),
        }
    }
}

impl fmt::Display for MappingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingFormat::Proguard => f.write_str("proguard"),
            MappingFormat::Tsrg => f.write_str("tsrg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(
            MappingFormat::detect("# header\ncom.a.B -> a:\n"),
            MappingFormat::Proguard
        );
        assert_eq!(MappingFormat::detect("a com/a/B\n\tb field\n"), MappingFormat::Tsrg);
        assert_eq!("Mojang".parse::<MappingFormat>(), Ok(MappingFormat::Proguard));
        assert!("srg2".parse::<MappingFormat>().is_err());
    }
}
