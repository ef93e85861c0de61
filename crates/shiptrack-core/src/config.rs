//! Configuration types for shiptrack
//!
//! Configuration is read once (TOML), validated, and then moved into the
//! carrier interfaces. Every carrier section is optional: identification
//! and validation need no credentials, only tracking does.
//!
//! ```toml
//! testing = false
//!
//! [ups]
//! license_number = "XXXXXXXXXXXXXXXX"
//! user_id = "XXXX"
//! password = "XXXX"
//!
//! [usps]
//! userid = "XXXXXXXXXXXX"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Main shiptrack configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Sandbox mode: carrier test endpoints and documented test numbers
    #[serde(default)]
    pub testing: bool,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// UPS credentials
    #[serde(default)]
    pub ups: Option<UpsConfig>,

    /// FedEx credentials
    #[serde(default)]
    pub fedex: Option<FedexConfig>,

    /// USPS credentials
    #[serde(default)]
    pub usps: Option<UspsConfig>,

    /// DHL credentials
    #[serde(default)]
    pub dhl: Option<DhlConfig>,
}

impl TrackerConfig {
    /// Create a configuration with no credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable testing mode
    pub fn with_testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: TrackerConfig = toml::from_str(s)?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        if let Some(ups) = &self.ups {
            ups.validate()?;
        }
        if let Some(fedex) = &self.fedex {
            fedex.validate()?;
        }
        if let Some(usps) = &self.usps {
            usps.validate()?;
        }
        if let Some(dhl) = &self.dhl {
            dhl.validate()?;
        }
        Ok(())
    }
}

fn require(section: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::config(format!("[{}] {} cannot be empty", section, field)));
    }
    Ok(())
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::config("[http] timeout_secs must be > 0"));
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// UPS Tracking API credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct UpsConfig {
    pub license_number: String,
    pub user_id: String,
    pub password: String,
}

impl UpsConfig {
    pub fn validate(&self) -> Result<()> {
        require("ups", "license_number", &self.license_number)?;
        require("ups", "user_id", &self.user_id)?;
        require("ups", "password", &self.password)
    }
}

impl fmt::Debug for UpsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpsConfig")
            .field("license_number", &"<REDACTED>")
            .field("user_id", &self.user_id)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// FedEx Web Services credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct FedexConfig {
    pub key: String,
    pub password: String,
    pub account_number: String,
    pub meter_number: String,
    /// Use the FedEx test server even outside testing mode
    #[serde(default)]
    pub use_test_server: bool,
    #[serde(default)]
    pub express_region_code: Option<String>,
    #[serde(default)]
    pub integrator_id: Option<String>,
}

impl FedexConfig {
    pub fn validate(&self) -> Result<()> {
        require("fedex", "key", &self.key)?;
        require("fedex", "password", &self.password)?;
        require("fedex", "account_number", &self.account_number)?;
        require("fedex", "meter_number", &self.meter_number)
    }
}

impl fmt::Debug for FedexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FedexConfig")
            .field("key", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .field("account_number", &self.account_number)
            .field("meter_number", &self.meter_number)
            .field("use_test_server", &self.use_test_server)
            .field("express_region_code", &self.express_region_code)
            .field("integrator_id", &self.integrator_id)
            .finish()
    }
}

/// USPS Web Tools servers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UspsServer {
    Test,
    SecureTest,
    Production,
    Secure,
}

/// USPS Web Tools credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct UspsConfig {
    pub userid: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Server override; defaults to test/production per testing mode
    #[serde(default)]
    pub server: Option<UspsServer>,
}

impl UspsConfig {
    pub fn validate(&self) -> Result<()> {
        require("usps", "userid", &self.userid)
    }
}

impl fmt::Debug for UspsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UspsConfig")
            .field("userid", &"<REDACTED>")
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("server", &self.server)
            .finish()
    }
}

/// DHL Shipment Tracking API credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct DhlConfig {
    pub api_key: String,
}

impl DhlConfig {
    pub fn validate(&self) -> Result<()> {
        require("dhl", "api_key", &self.api_key)
    }
}

impl fmt::Debug for DhlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhlConfig")
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}
