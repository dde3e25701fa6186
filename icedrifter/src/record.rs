//! Icedrifter records map directly onto the bytes the buoy builds for each report.
//!
//! All fields are little-endian, laid out without padding:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 1 | switches |
//! | 1 | 1 | chain errors |
//! | 2 | 2 | temperature chain byte count |
//! | 4 | 2 | light chain byte count |
//! | 6 | 2 | spare |
//! | 8 | 4 | last boot time |
//! | 12 | 4 | GPS time |
//! | 16 | 4 | latitude |
//! | 20 | 4 | longitude |
//! | 24 | 4 | temperature |
//! | 28 | 4 | pressure |
//! | 32 | 4 | remote temperature |
//! | 36 | ... | chain data, if enabled |
//!
//! Nothing in the record describes its own layout, so reading one always takes a `Config`.
//!
//! # Examples
//!
//! ```
//! use icedrifter::{Config, Record};
//! let path = "fixtures/300234010000000-20181002050602.dat";
//! let record = Record::from_path(path, &Config::default()).unwrap();
//! assert_eq!(1538456762, record.gps_time);
//! ```

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use chrono::{DateTime, TimeZone, Utc};
use endian;
use failure::Error as FailureError;
use rockblock::{self, Chunk};
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;
use Config;

/// The number of bytes in a record before the chain data.
pub const BASE_RECORD_LENGTH: usize = 36;

/// Each light sensor reports clear, red, green, and blue counts.
pub const LIGHT_SENSOR_FIELDS: usize = 4;

/// Set in `switches` when the remote temperature probe was read.
pub const REMOTE_TEMPERATURE_SWITCH: u8 = 0x01;

/// Set in `switches` when the chain was read.
pub const CHAIN_DATA_SWITCH: u8 = 0x02;

/// An icedrifter record.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Record {
    /// Which optional sensors were read.
    pub switches: u8,

    /// Chain error bits.
    pub errors: u8,

    /// The number of bytes received from the temperature chain.
    pub temperature_byte_count: u16,

    /// The number of bytes received from the light chain.
    pub light_byte_count: u16,

    /// Unused.
    pub spare: u16,

    /// The last time the buoy booted [s since epoch].
    pub last_boot_time: u32,

    /// The time of the GPS fix [s since epoch].
    pub gps_time: u32,

    /// Latitude [deg].
    pub latitude: f32,

    /// Longitude [deg].
    pub longitude: f32,

    /// Air temperature [C].
    pub temperature: f32,

    /// Barometric pressure [Pa].
    pub pressure: f32,

    /// Water temperature from the remote probe [C].
    pub remote_temperature: f32,

    /// The temperature and light chain, if the record was read with the chain enabled.
    pub chain: Option<Chain>,
}

/// Raw temperature and light chain readings.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Chain {
    /// One raw word per temperature sensor, top of the chain first.
    pub temperatures: Vec<u16>,

    /// Clear, red, green, and blue counts for each light sensor.
    pub light: Vec<[u16; LIGHT_SENSOR_FIELDS]>,
}

/// Chain errors, in bit order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChainError {
    /// The temperature chain stopped talking.
    TemperatureTimeout,

    /// The temperature chain sent more than expected.
    TemperatureOverrun,

    /// The light chain stopped talking.
    LightTimeout,

    /// The light chain sent more than expected.
    LightOverrun,
}

/// An error returned when reading or writing a record.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The bytes are not the length the configuration calls for.
    #[fail(
        display = "malformed record: expected {} bytes, got {}",
        expected,
        actual
    )]
    MalformedRecord {
        /// The configured record length.
        expected: usize,

        /// The number of bytes provided.
        actual: usize,
    },

    /// The record's chain does not have the configured number of sensors.
    #[fail(
        display = "chain mismatch: expected {} temperature and {} light sensors, got {} and {}",
        expected_temperature_sensors,
        expected_light_sensors,
        temperature_sensors,
        light_sensors
    )]
    ChainMismatch {
        /// The configured number of temperature sensors.
        expected_temperature_sensors: usize,

        /// The configured number of light sensors.
        expected_light_sensors: usize,

        /// The number of temperature readings in the record.
        temperature_sensors: usize,

        /// The number of light readings in the record.
        light_sensors: usize,
    },
}

impl Record {
    /// Reads a record from a `.dat` file.
    pub fn from_path<P: AsRef<Path>>(path: P, config: &Config) -> Result<Record, FailureError> {
        let bytes = ::std::fs::read(path)?;
        Record::read_from(&bytes, config)
    }

    /// Reassembles a record from its chunks.
    ///
    /// When the chain is enabled, its words are converted from the sensors' big-endian order.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Config, Record};
    /// let config = Config::without_chain();
    /// let record = Record { gps_time: 1538456762, latitude: 44.123456, ..Default::default() };
    /// let chunks = record.encode_at_gps_time(&config).unwrap();
    /// assert_eq!(record, Record::from_chunks(chunks, &config).unwrap());
    /// ```
    pub fn from_chunks<I>(chunks: I, config: &Config) -> Result<Record, FailureError>
    where
        I: IntoIterator<Item = Chunk>,
    {
        config.validate()?;
        let mut bytes =
            rockblock::reassemble(chunks, config.record_length(), config.max_chunk_length)?;
        if config.chain_enabled() {
            endian::swap_u16(&mut bytes[BASE_RECORD_LENGTH..])?;
        }
        Record::read_from(&bytes, config)
    }

    /// Reads a record from its canonical bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Config, Record, record::Error};
    /// let record = Record::read_from(&[0; 36], &Config::without_chain()).unwrap();
    /// assert_eq!(Record::default(), record);
    /// assert_eq!(
    ///     Error::MalformedRecord { expected: 868, actual: 36 },
    ///     Record::read_from(&[0; 36], &Config::default()).unwrap_err().downcast().unwrap()
    /// );
    /// ```
    pub fn read_from(bytes: &[u8], config: &Config) -> Result<Record, FailureError> {
        if bytes.len() != config.record_length() {
            return Err(Error::MalformedRecord {
                expected: config.record_length(),
                actual: bytes.len(),
            }.into());
        }
        let mut cursor = Cursor::new(bytes);
        let mut record = Record {
            switches: cursor.read_u8()?,
            errors: cursor.read_u8()?,
            temperature_byte_count: cursor.read_u16::<LittleEndian>()?,
            light_byte_count: cursor.read_u16::<LittleEndian>()?,
            spare: cursor.read_u16::<LittleEndian>()?,
            last_boot_time: cursor.read_u32::<LittleEndian>()?,
            gps_time: cursor.read_u32::<LittleEndian>()?,
            latitude: cursor.read_f32::<LittleEndian>()?,
            longitude: cursor.read_f32::<LittleEndian>()?,
            temperature: cursor.read_f32::<LittleEndian>()?,
            pressure: cursor.read_f32::<LittleEndian>()?,
            remote_temperature: cursor.read_f32::<LittleEndian>()?,
            chain: None,
        };
        if config.chain_enabled() {
            record.chain = Some(Chain::read_from(
                &mut cursor,
                config.chain.temperature_sensors,
                config.chain.light_sensors,
            )?);
        }
        Ok(record)
    }

    /// Writes this record to a `.dat` file.
    ///
    /// Nothing is written if the record does not fit the configured layout.
    pub fn to_path<P: AsRef<Path>>(&self, path: P, config: &Config) -> Result<(), FailureError> {
        self.check(config)?;
        ::std::fs::write(path, self.to_bytes()).map_err(FailureError::from)
    }

    /// Checks that this record has exactly the layout the configuration calls for.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Config, Record, record::Error};
    /// let record = Record::default();
    /// assert!(record.check(&Config::without_chain()).is_ok());
    /// assert_eq!(
    ///     Error::MalformedRecord { expected: 868, actual: 36 },
    ///     record.check(&Config::default()).unwrap_err()
    /// );
    /// ```
    pub fn check(&self, config: &Config) -> Result<(), Error> {
        let length = self.byte_length();
        if length != config.record_length() || self.chain.is_some() != config.chain_enabled() {
            return Err(Error::MalformedRecord {
                expected: config.record_length(),
                actual: length,
            });
        }
        if let Some(ref chain) = self.chain {
            if chain.temperatures.len() != config.chain.temperature_sensors
                || chain.light.len() != config.chain.light_sensors
            {
                return Err(Error::ChainMismatch {
                    expected_temperature_sensors: config.chain.temperature_sensors,
                    expected_light_sensors: config.chain.light_sensors,
                    temperature_sensors: chain.temperatures.len(),
                    light_sensors: chain.light.len(),
                });
            }
        }
        Ok(())
    }

    /// Returns this record's canonical bytes, as stored in `.dat` files.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::Record;
    /// let record = Record { switches: 1, gps_time: 0x01020304, ..Default::default() };
    /// let bytes = record.to_bytes();
    /// assert_eq!(36, bytes.len());
    /// assert_eq!(1, bytes[0]);
    /// assert_eq!([4, 3, 2, 1], bytes[12..16]);
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        self.image::<LittleEndian>()
    }

    /// Returns this record's bytes as the buoy transmits them, with chain words big-endian.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Chain, Record};
    /// let record = Record {
    ///     chain: Some(Chain { temperatures: vec![0x0102], light: vec![] }),
    ///     ..Default::default()
    /// };
    /// assert_eq!([0x02, 0x01], record.to_bytes()[36..]);
    /// assert_eq!([0x01, 0x02], record.to_transmit_bytes()[36..]);
    /// ```
    pub fn to_transmit_bytes(&self) -> Vec<u8> {
        self.image::<BigEndian>()
    }

    /// Splits this record into chunks, all stamped with `send_time`.
    ///
    /// The record must fit the configured layout, so the chunks decode back into the same record.
    pub fn encode(&self, send_time: u32, config: &Config) -> Result<Vec<Chunk>, FailureError> {
        self.check(config)?;
        rockblock::encode(&self.to_transmit_bytes(), send_time, config.max_chunk_length)
            .map_err(FailureError::from)
    }

    /// Splits this record into chunks stamped with the GPS time, as the buoy does.
    pub fn encode_at_gps_time(&self, config: &Config) -> Result<Vec<Chunk>, FailureError> {
        self.encode(self.gps_time, config)
    }

    /// Returns true if the remote temperature probe was read.
    pub fn has_remote_temperature(&self) -> bool {
        self.switches & REMOTE_TEMPERATURE_SWITCH != 0
    }

    /// Returns true if the buoy read its chain for this record.
    pub fn has_chain_data(&self) -> bool {
        self.switches & CHAIN_DATA_SWITCH != 0
    }

    /// Returns the chain errors flagged in this record, in bit order.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Record, record::ChainError};
    /// let record = Record { errors: 0x05, ..Default::default() };
    /// assert_eq!(
    ///     vec![ChainError::TemperatureTimeout, ChainError::LightTimeout],
    ///     record.chain_errors()
    /// );
    /// ```
    pub fn chain_errors(&self) -> Vec<ChainError> {
        ChainError::ALL
            .iter()
            .cloned()
            .filter(|error| self.errors & error.bit() != 0)
            .collect()
    }

    /// Returns the last boot time.
    pub fn last_boot_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp(i64::from(self.last_boot_time), 0)
    }

    /// Returns the time of the GPS fix.
    pub fn gps_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp(i64::from(self.gps_time), 0)
    }

    fn byte_length(&self) -> usize {
        BASE_RECORD_LENGTH
            + self.chain.as_ref().map_or(0, |chain| {
                2 * (chain.temperatures.len() + LIGHT_SENSOR_FIELDS * chain.light.len())
            })
    }

    fn image<B: ByteOrder>(&self) -> Vec<u8> {
        let mut bytes = vec![0; BASE_RECORD_LENGTH];
        bytes[0] = self.switches;
        bytes[1] = self.errors;
        LittleEndian::write_u16(&mut bytes[2..4], self.temperature_byte_count);
        LittleEndian::write_u16(&mut bytes[4..6], self.light_byte_count);
        LittleEndian::write_u16(&mut bytes[6..8], self.spare);
        LittleEndian::write_u32(&mut bytes[8..12], self.last_boot_time);
        LittleEndian::write_u32(&mut bytes[12..16], self.gps_time);
        LittleEndian::write_f32(&mut bytes[16..20], self.latitude);
        LittleEndian::write_f32(&mut bytes[20..24], self.longitude);
        LittleEndian::write_f32(&mut bytes[24..28], self.temperature);
        LittleEndian::write_f32(&mut bytes[28..32], self.pressure);
        LittleEndian::write_f32(&mut bytes[32..36], self.remote_temperature);
        if let Some(ref chain) = self.chain {
            let words = chain
                .temperatures
                .iter()
                .chain(chain.light.iter().flat_map(|fields| fields.iter()));
            for &word in words {
                let mut buf = [0; 2];
                B::write_u16(&mut buf, word);
                bytes.extend_from_slice(&buf);
            }
        }
        bytes
    }
}

impl Chain {
    /// Reads little-endian chain words.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::Chain;
    /// let chain = Chain::read_from(&[1, 0, 2, 0, 3, 0, 4, 0, 5, 0][..], 1, 1).unwrap();
    /// assert_eq!(vec![1], chain.temperatures);
    /// assert_eq!(vec![[2, 3, 4, 5]], chain.light);
    /// ```
    pub fn read_from<R: Read>(
        mut read: R,
        temperature_sensors: usize,
        light_sensors: usize,
    ) -> Result<Chain, FailureError> {
        let mut chain = Chain {
            temperatures: Vec::with_capacity(temperature_sensors),
            light: Vec::with_capacity(light_sensors),
        };
        for _ in 0..temperature_sensors {
            chain.temperatures.push(read.read_u16::<LittleEndian>()?);
        }
        for _ in 0..light_sensors {
            let mut fields = [0; LIGHT_SENSOR_FIELDS];
            read.read_u16_into::<LittleEndian>(&mut fields)?;
            chain.light.push(fields);
        }
        Ok(chain)
    }
}

impl ChainError {
    /// Every chain error, in bit order.
    pub const ALL: [ChainError; 4] = [
        ChainError::TemperatureTimeout,
        ChainError::TemperatureOverrun,
        ChainError::LightTimeout,
        ChainError::LightOverrun,
    ];

    /// Returns this error's bit in the record's error byte.
    pub fn bit(self) -> u8 {
        match self {
            ChainError::TemperatureTimeout => 0x01,
            ChainError::TemperatureOverrun => 0x02,
            ChainError::LightTimeout => 0x04,
            ChainError::LightOverrun => 0x08,
        }
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChainError::TemperatureTimeout => write!(f, "Temperature chain timeout."),
            ChainError::TemperatureOverrun => write!(f, "Temperature chain overrun."),
            ChainError::LightTimeout => write!(f, "Light chain timeout."),
            ChainError::LightOverrun => write!(f, "Light chain overrun."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drifter() -> Record {
        Record {
            switches: REMOTE_TEMPERATURE_SWITCH,
            last_boot_time: 1538395200,
            gps_time: 1538456762,
            latitude: 44.123456,
            longitude: -87.654321,
            temperature: 2.50,
            pressure: 1013.25,
            remote_temperature: -1.75,
            ..Default::default()
        }
    }

    fn chained(config: &Config) -> Record {
        let mut record = drifter();
        record.switches |= CHAIN_DATA_SWITCH;
        record.temperature_byte_count = 320;
        record.light_byte_count = 512;
        record.chain = Some(Chain {
            temperatures: (0..config.chain.temperature_sensors)
                .map(|n| (n * 37) as u16)
                .collect(),
            light: (0..config.chain.light_sensors)
                .map(|n| {
                    let n = n as u16;
                    [1000 + n, 500 + n, 250 + n, 125 + n]
                }).collect(),
        });
        record
    }

    #[test]
    fn fixture() {
        let config = Config::default();
        let record =
            Record::from_path("fixtures/300234010000000-20181002050602.dat", &config).unwrap();
        assert!(record.has_chain_data());
        assert!(record.has_remote_temperature());
        let chain = record.chain.unwrap();
        assert_eq!(160, chain.temperatures.len());
        assert_eq!(64, chain.light.len());
    }

    #[test]
    fn without_chain_is_one_chunk() {
        let config = Config::without_chain();
        let record = drifter();
        let chunks = record.encode_at_gps_time(&config).unwrap();
        assert_eq!(1, chunks.len());
        assert_eq!(44, chunks[0].to_bytes().len());
        let decoded = Record::from_chunks(chunks, &config).unwrap();
        assert_eq!(record, decoded);
        assert_eq!(44.123456f32.to_bits(), decoded.latitude.to_bits());
        assert_eq!((-87.654321f32).to_bits(), decoded.longitude.to_bits());
        assert_eq!(1013.25f32.to_bits(), decoded.pressure.to_bits());
        assert_eq!(2.50f32.to_bits(), decoded.temperature.to_bits());
    }

    #[test]
    fn chain_is_three_chunks() {
        let config = Config::default();
        let record = chained(&config);
        let chunks = record.encode(1538456800, &config).unwrap();
        assert_eq!(
            vec![332, 332, 204],
            chunks.iter().map(|c| c.data().len()).collect::<Vec<_>>()
        );
        let reversed = chunks.into_iter().rev().collect::<Vec<_>>();
        assert_eq!(record, Record::from_chunks(reversed, &config).unwrap());
    }

    #[test]
    fn round_trip_many_chunk_lengths() {
        let config = Config::default();
        let record = chained(&config);
        for &max_chunk_length in &[9, 50, 100, 339, 340, 868 + 8, 2048] {
            let config = Config {
                max_chunk_length: max_chunk_length,
                ..config.clone()
            };
            let chunks = record.encode_at_gps_time(&config).unwrap();
            assert_eq!(config.max_chunks(), chunks.len());
            assert_eq!(record, Record::from_chunks(chunks, &config).unwrap());
        }
    }

    #[test]
    fn chain_is_big_endian_on_the_wire() {
        let config = Config::default();
        let record = chained(&config);
        let chunks = record.encode_at_gps_time(&config).unwrap();
        // Temperature sensor 1 is 37 == 0x0025.
        assert_eq!([0x00, 0x25], chunks[0].data()[38..40]);
        assert_eq!([0x25, 0x00], record.to_bytes()[38..40]);
    }

    #[test]
    fn missing_base_chunk() {
        let config = Config::default();
        let chunks = chained(&config)
            .encode_at_gps_time(&config)
            .unwrap()
            .into_iter()
            .skip(1);
        assert_eq!(
            rockblock::reassembler::Error::MissingBaseChunk,
            Record::from_chunks(chunks, &config)
                .unwrap_err()
                .downcast()
                .unwrap()
        );
    }

    #[test]
    fn persistence() {
        use tempfile;
        let config = Config::default();
        let record = chained(&config);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.dat");
        record.to_path(&path, &config).unwrap();
        assert_eq!(868, ::std::fs::metadata(&path).unwrap().len());
        assert_eq!(record, Record::from_path(&path, &config).unwrap());
        assert_eq!(
            Error::MalformedRecord {
                expected: 36,
                actual: 868
            },
            Record::from_path(&path, &Config::without_chain())
                .unwrap_err()
                .downcast()
                .unwrap()
        );
    }

    #[test]
    fn encode_checks_layout() {
        let config = Config::default();
        assert_eq!(
            Error::MalformedRecord {
                expected: 868,
                actual: 36
            },
            drifter()
                .encode_at_gps_time(&config)
                .unwrap_err()
                .downcast()
                .unwrap()
        );
        assert_eq!(
            Error::MalformedRecord {
                expected: 36,
                actual: 868
            },
            chained(&config)
                .encode_at_gps_time(&Config::without_chain())
                .unwrap_err()
                .downcast()
                .unwrap()
        );

        let mut record = chained(&config);
        if let Some(ref mut chain) = record.chain {
            chain.temperatures.truncate(156);
            chain.light.push([0; LIGHT_SENSOR_FIELDS]);
        }
        assert_eq!(
            Error::ChainMismatch {
                expected_temperature_sensors: 160,
                expected_light_sensors: 64,
                temperature_sensors: 156,
                light_sensors: 65,
            },
            record.encode_at_gps_time(&config).unwrap_err().downcast().unwrap()
        );
    }

    #[test]
    fn to_path_checks_layout() {
        use tempfile;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.dat");
        assert!(drifter().to_path(&path, &Config::default()).is_err());
        assert!(!path.exists());
        assert!(
            chained(&Config::default())
                .to_path(&path, &Config::without_chain())
                .is_err()
        );
        assert!(!path.exists());
    }

    #[test]
    fn datetimes() {
        let record = drifter();
        assert_eq!(
            "2018-10-02 05:06:02",
            record.gps_datetime().format("%Y-%m-%d %H:%M:%S").to_string()
        );
        assert_eq!(
            "2018-10-01 12:00:00",
            record
                .last_boot_datetime()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        );
    }
}
