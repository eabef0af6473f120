use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Number of enumerants a field must exceed before an `enum class` is
/// synthesized for it
pub const ENUM_THRESHOLD: usize = 1;
/// Namespace wrapping every generated header and the `Bitfield` support header
pub const DEFAULT_NAMESPACE: &str = "donut";
/// IRQ bound to instances whose peripheral declares no interrupt
pub const DEFAULT_IRQ: &str = "0xFF";

#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub namespace: String,
    pub ident_case: IdentCase,
    pub enum_threshold: usize,
    pub default_irq: String,
    pub check_overlaps: bool,
    pub generic_header: bool,
    pub output_dir: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.into(),
            ident_case: IdentCase::default(),
            enum_threshold: ENUM_THRESHOLD,
            default_irq: DEFAULT_IRQ.into(),
            check_overlaps: false,
            generic_header: false,
            output_dir: None,
            input: None,
            log_level: None,
        }
    }
}

/// Case policy applied to every generated identifier
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum IdentCase {
    /// `UART_CR1` becomes `UartCr1`
    #[default]
    Title,
    /// `UART_CR1` becomes `uart_cr1`
    Lower,
    /// Characters outside the identifier set are dropped, case is kept
    Verbatim,
}

impl IdentCase {
    pub fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "title" => IdentCase::Title,
            "lower" => IdentCase::Lower,
            "verbatim" => IdentCase::Verbatim,
            _ => bail!("unknown identifier case {}", s),
        })
    }
}

pub const IDENT_CASE_NAMES: [&str; 3] = ["title", "lower", "verbatim"];

/// Format of a configuration file
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfigFormat {
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "json")]
    Json,
}

impl ConfigFormat {
    /// Make a new [`ConfigFormat`] from a given extension.
    pub fn from_extension(s: &str) -> Option<Self> {
        match s {
            #[cfg(feature = "yaml")]
            "yml" | "yaml" => Some(Self::Yaml),
            #[cfg(feature = "json")]
            "json" => Some(Self::Json),
            _ => None,
        }
    }
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}
