//! Runtime configuration for decoding records.
//!
//! The buoy firmware fixes its sensor counts at build time, and nothing in a record says how
//! many sensors there are, so the decoder must be told. The defaults match the largest chain the
//! firmware supports.
//!
//! # Examples
//!
//! Configs are usually specified in TOML files:
//!
//! ```
//! use icedrifter::Config;
//! let config = Config::from_path("fixtures/config.toml").unwrap();
//! assert_eq!(340, config.max_chunk_length);
//! ```

use failure::Error as FailureError;
use record::{BASE_RECORD_LENGTH, LIGHT_SENSOR_FIELDS};
use std::path::Path;

/// The maximum chunk length used by the buoys.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = ::rockblock::MAX_CHUNK_LENGTH;

/// The most temperature sensors a chain can have.
pub const DEFAULT_TEMPERATURE_SENSORS: usize = 160;

/// The most light sensors a chain can have.
pub const DEFAULT_LIGHT_SENSORS: usize = 64;

/// Configure the record layout and chunking.
///
/// # Examples
///
/// ```
/// use icedrifter::Config;
/// let config = Config::default();
/// assert_eq!(868, config.record_length());
/// assert_eq!(3, config.max_chunks());
/// assert_eq!(36, Config::without_chain().record_length());
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The largest chunk, header included.
    pub max_chunk_length: usize,

    /// The temperature and light chain.
    pub chain: ChainConfig,
}

/// Temperature and light chain configuration.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChainConfig {
    /// Is there a chain attached, and is its data in the record?
    pub enabled: bool,

    /// The number of temperature sensors on the chain.
    pub temperature_sensors: usize,

    /// The number of light sensors on the chain.
    pub light_sensors: usize,
}

/// A configuration error.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The maximum chunk length does not leave room for any data after the header.
    #[fail(display = "max chunk length {} leaves no room for data", _0)]
    ChunkLengthTooSmall(usize),

    /// A record with this chain would not fit in the chunks a buoy can send.
    #[fail(
        display = "a chain of {} temperature and {} light sensors is too long to send",
        temperature_sensors,
        light_sensors
    )]
    ChainTooLong {
        /// The configured number of temperature sensors.
        temperature_sensors: usize,

        /// The configured number of light sensors.
        light_sensors: usize,
    },
}

impl Config {
    /// Reads configuration from a toml file.
    ///
    /// Missing values take their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// let config = icedrifter::Config::from_path("fixtures/config.toml").unwrap();
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, FailureError> {
        use std::fs::File;
        use std::io::Read;
        use toml;

        let mut file = File::open(path)?;
        let mut string = String::new();
        file.read_to_string(&mut string)?;
        let config: Config = toml::from_str(&string)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a configuration for buoys without a chain.
    pub fn without_chain() -> Config {
        Config {
            chain: ChainConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Checks that chunks built with this configuration can carry data, and that a whole record
    /// fits in as many chunks as a sequence number can count.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Config, config::Error};
    /// let mut config = Config::default();
    /// assert!(config.validate().is_ok());
    /// config.max_chunk_length = 8;
    /// assert_eq!(Error::ChunkLengthTooSmall(8), config.validate().unwrap_err());
    /// ```
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_chunk_data_length() == 0 {
            return Err(Error::ChunkLengthTooSmall(self.max_chunk_length));
        }
        match self.checked_record_length() {
            Some(length)
                if ::rockblock::max_chunks(length, self.max_chunk_length)
                    <= usize::from(u16::max_value()) + 1 =>
            {
                Ok(())
            }
            _ => Err(Error::ChainTooLong {
                temperature_sensors: self.chain.temperature_sensors,
                light_sensors: self.chain.light_sensors,
            }),
        }
    }

    /// Returns true if records carry chain data.
    pub fn chain_enabled(&self) -> bool {
        self.chain.enabled
    }

    /// Returns the number of bytes of chain data in a record.
    ///
    /// Zero if the chain is disabled.
    pub fn chain_length(&self) -> usize {
        self.record_length() - BASE_RECORD_LENGTH
    }

    /// Returns the total number of bytes in a record.
    ///
    /// Saturates if the chain is too long to count, which `validate` rejects.
    pub fn record_length(&self) -> usize {
        self.checked_record_length().unwrap_or_else(usize::max_value)
    }

    fn checked_record_length(&self) -> Option<usize> {
        if !self.chain.enabled {
            return Some(BASE_RECORD_LENGTH);
        }
        self.chain
            .light_sensors
            .checked_mul(LIGHT_SENSOR_FIELDS)
            .and_then(|n| n.checked_add(self.chain.temperature_sensors))
            .and_then(|n| n.checked_mul(2))
            .and_then(|n| n.checked_add(BASE_RECORD_LENGTH))
    }

    /// Returns the number of record bytes each chunk can carry.
    pub fn max_chunk_data_length(&self) -> usize {
        ::rockblock::max_chunk_data_length(self.max_chunk_length)
    }

    /// Returns the number of chunks needed to carry one record.
    pub fn max_chunks(&self) -> usize {
        ::rockblock::max_chunks(self.record_length(), self.max_chunk_length)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            chain: ChainConfig::default(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> ChainConfig {
        ChainConfig {
            enabled: true,
            temperature_sensors: DEFAULT_TEMPERATURE_SENSORS,
            light_sensors: DEFAULT_LIGHT_SENSORS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture() {
        let config = Config::from_path("fixtures/config.toml").unwrap();
        assert_eq!(Config::default(), config);
        let config = Config::from_path("fixtures/no-chain.toml").unwrap();
        assert_eq!(Config::without_chain(), config);
    }

    #[test]
    fn empty_toml_is_default() {
        let config: Config = ::toml::from_str("").unwrap();
        assert_eq!(Config::default(), config);
    }

    #[test]
    fn small_chain() {
        let config: Config =
            ::toml::from_str("[chain]\ntemperature_sensors = 16\nlight_sensors = 6").unwrap();
        assert_eq!(36 + 32 + 48, config.record_length());
        assert_eq!(1, config.max_chunks());
    }

    #[test]
    fn chain_too_long() {
        let config: Config = ::toml::from_str("[chain]\ntemperature_sensors = 100000000").unwrap();
        assert_eq!(
            Error::ChainTooLong {
                temperature_sensors: 100000000,
                light_sensors: 64,
            },
            config.validate().unwrap_err()
        );

        let config = Config {
            chain: ChainConfig {
                light_sensors: usize::max_value() / LIGHT_SENSOR_FIELDS + 1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(usize::max_value(), config.record_length());
        assert_eq!(
            Error::ChainTooLong {
                temperature_sensors: 160,
                light_sensors: usize::max_value() / LIGHT_SENSOR_FIELDS + 1,
            },
            config.validate().unwrap_err()
        );
    }

    #[test]
    fn invalid_chunk_length() {
        use tempfile;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        ::std::fs::write(&path, "max_chunk_length = 4").unwrap();
        assert_eq!(
            Error::ChunkLengthTooSmall(4),
            Config::from_path(&path).unwrap_err().downcast().unwrap()
        );
    }
}
