use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Decoder verbosity, mapped onto tracing filter levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum LogLevel {
    None,
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl LogLevel {
    pub fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::None => "off",
            LogLevel::Low => "warn",
            LogLevel::Medium => "info",
            LogLevel::High => "debug",
            LogLevel::VeryHigh => "trace",
        }
    }

    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::new(self.filter_directive())
    }
}

/// Receiver construction parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RxConfig {
    /// Strip trailing fill bits from octet-aligned PDUs (23.4.3.2).
    /// Disabling leaves the padding on every SDU handed to the LLC.
    pub remove_fill_bits: bool,
    pub log_level: LogLevel,
    /// Instantiate the capture-export sink
    pub wireshark_output: bool,
}

impl Default for RxConfig {
    fn default() -> Self {
        RxConfig {
            remove_fill_bits: true,
            log_level: LogLevel::Low,
            wireshark_output: false,
        }
    }
}

impl RxConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Install the global logging subscriber for this configuration.
    /// Safe to call more than once; the first caller wins.
    pub fn setup_logging(&self) {
        tetra_core::debug::setup_logging(self.log_level.env_filter(), None);
    }
}
