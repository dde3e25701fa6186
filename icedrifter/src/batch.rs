//! Batches of chunk files that belong to one report from one buoy.
//!
//! Chunk files are named `<device id>-<anything>`, where the device id is the RockBLOCK's
//! IMEI. Every file in a batch must come from the same buoy:
//!
//! ```
//! use icedrifter::{Batch, Config};
//! let batch = Batch::from_paths(
//!     &["fixtures/300234010000000-20181002050602-0.bin"],
//!     &Config::default(),
//! ).unwrap();
//! assert_eq!("300234010000000-20181002050602", batch.file_stem());
//! ```

use failure::Error as FailureError;
use regex::Regex;
use report;
use rockblock::Chunk;
use std::path::{Path, PathBuf};
use {Config, Record};

const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// A reconstructed report and the buoy that sent it.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    device_id: String,
    record: Record,
    config: Config,
}

/// An error returned when putting together a batch.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The file name does not start with a device id followed by a dash.
    #[fail(display = "invalid icedrifter file name: {}", _0)]
    InvalidFileName(String),

    /// Two chunks in one batch came from different buoys.
    #[fail(
        display = "device id {} does not match the batch's device id {}",
        actual,
        expected
    )]
    DeviceIdentifierMismatch {
        /// The device id of the first chunk.
        expected: String,

        /// The device id that did not match.
        actual: String,
    },

    /// The batch has no chunks.
    #[fail(display = "no chunks were provided")]
    NoChunks,
}

impl Batch {
    /// Reconstructs a report from raw chunk files.
    ///
    /// The device ids in all file names are checked before any file is read.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Batch, Config, batch::Error};
    /// let error = Batch::from_paths(&[
    ///     "fixtures/300234010000000-20181002050602-0.bin",
    ///     "fixtures/300234099999999-20181002050602-1.bin",
    /// ], &Config::default()).unwrap_err();
    /// assert_eq!(
    ///     Error::DeviceIdentifierMismatch {
    ///         expected: "300234010000000".to_string(),
    ///         actual: "300234099999999".to_string(),
    ///     },
    ///     error.downcast().unwrap()
    /// );
    /// ```
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], config: &Config) -> Result<Batch, FailureError> {
        let device_ids = paths
            .iter()
            .map(|path| device_id(path))
            .collect::<Result<Vec<_>, _>>()?;
        let device_id = common_device_id(device_ids)?;
        let chunks = paths
            .iter()
            .map(|path| Chunk::from_path(path, config.max_chunk_length))
            .collect::<Result<Vec<_>, _>>()?;
        Batch::new(device_id, chunks, config)
    }

    /// Reconstructs a report from Iridium SBD messages, using their IMEIs as device ids.
    ///
    /// # Examples
    ///
    /// ```
    /// use icedrifter::{Batch, Config};
    /// let batch = Batch::from_sbd_paths(&[
    ///     "fixtures/chunk-1.sbd",
    ///     "fixtures/chunk-0.sbd",
    ///     "fixtures/chunk-2.sbd",
    /// ], &Config::default()).unwrap();
    /// assert_eq!("300234010000000", batch.device_id());
    /// ```
    pub fn from_sbd_paths<P: AsRef<Path>>(
        paths: &[P],
        config: &Config,
    ) -> Result<Batch, FailureError> {
        let chunks = paths
            .iter()
            .map(|path| Chunk::from_sbd_path(path, config.max_chunk_length))
            .collect::<Result<Vec<_>, _>>()?;
        let device_id = common_device_id(
            chunks
                .iter()
                .map(|chunk| chunk.imei().unwrap_or_default().to_string()),
        )?;
        Batch::new(device_id, chunks, config)
    }

    /// Reconstructs a report from chunks that are already known to come from `device_id`.
    pub fn new(
        device_id: String,
        chunks: Vec<Chunk>,
        config: &Config,
    ) -> Result<Batch, FailureError> {
        if chunks.is_empty() {
            return Err(Error::NoChunks.into());
        }
        let count = chunks.len();
        match Record::from_chunks(chunks, config) {
            Ok(record) => {
                info!(
                    "reconstructed record from {} for {} out of {} chunk(s)",
                    device_id,
                    record.gps_datetime(),
                    count
                );
                Ok(Batch {
                    device_id: device_id,
                    record: record,
                    config: config.clone(),
                })
            }
            Err(err) => {
                warn!("could not reconstruct record from {}: {}", device_id, err);
                Err(err)
            }
        }
    }

    /// Returns the device id of the buoy that sent this report.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns a reference to the reconstructed record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Returns the reconstructed record.
    pub fn into_record(self) -> Record {
        self.record
    }

    /// Returns true if the record was reconstructed with chain data.
    pub fn chain_enabled(&self) -> bool {
        self.config.chain_enabled()
    }

    /// Returns `<device id>-<GPS time>`, the name shared by this report's output files.
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}",
            self.device_id,
            self.record.gps_datetime().format(DATETIME_FORMAT)
        )
    }

    /// Returns this batch's report.
    pub fn report(&self) -> String {
        report::render(&self.record, self.chain_enabled())
    }

    /// Writes the text report and the `.dat` record into a directory.
    ///
    /// Returns the paths of the `.txt` and `.dat` files, in that order. Either both files are
    /// written or neither is.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use icedrifter::{Batch, Config};
    /// let paths = ["300234010000000-20181002050602-0.bin"];
    /// let batch = Batch::from_paths(&paths, &Config::default()).unwrap();
    /// let (txt, dat) = batch.write_to(".").unwrap();
    /// ```
    pub fn write_to<P: AsRef<Path>>(
        &self,
        directory: P,
    ) -> Result<(PathBuf, PathBuf), FailureError> {
        let report = self.report();
        let stem = self.file_stem();
        let txt = directory.as_ref().join(format!("{}.txt", stem));
        let dat = directory.as_ref().join(format!("{}.dat", stem));
        ::std::fs::write(&txt, report)?;
        if let Err(err) = self.record.to_path(&dat, &self.config) {
            if let Err(remove_err) = ::std::fs::remove_file(&txt) {
                warn!("could not remove {}: {}", txt.display(), remove_err);
            }
            return Err(err);
        }
        info!("wrote {} and {}", txt.display(), dat.display());
        Ok((txt, dat))
    }
}

/// Returns the device id from a chunk file name.
///
/// Any leading directories are ignored, whether they are separated by `/` or `\`.
///
/// # Examples
///
/// ```
/// use icedrifter::batch::device_id;
/// assert_eq!("300234010000000", device_id("data/300234010000000-20181002050602-0.bin").unwrap());
/// assert_eq!("300234010000000", device_id("C:\\data\\300234010000000-1.bin").unwrap());
/// assert!(device_id("chunk.bin").is_err());
/// ```
pub fn device_id<P: AsRef<Path>>(path: P) -> Result<String, Error> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^(?P<device_id>[^-]+)-").unwrap();
    }
    let path = path.as_ref().to_string_lossy();
    let file_name = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or("");
    RE.captures(file_name)
        .and_then(|captures| captures.name("device_id"))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidFileName(path.to_string()))
}

fn common_device_id<I: IntoIterator<Item = String>>(device_ids: I) -> Result<String, Error> {
    let mut device_ids = device_ids.into_iter();
    let expected = device_ids.next().ok_or(Error::NoChunks)?;
    for actual in device_ids {
        if actual != expected {
            return Err(Error::DeviceIdentifierMismatch {
                expected: expected,
                actual: actual,
            });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile;

    fn fixture(sequence_number: usize) -> String {
        format!(
            "fixtures/300234010000000-20181002050602-{}.bin",
            sequence_number
        )
    }

    #[test]
    fn fixtures() {
        let config = Config::default();
        let batch = Batch::from_paths(&[fixture(2), fixture(0), fixture(1)], &config).unwrap();
        let record =
            Record::from_path("fixtures/300234010000000-20181002050602.dat", &config).unwrap();
        assert_eq!(&record, batch.record());
        assert!(batch.chain_enabled());
        assert_eq!(
            ::std::fs::read_to_string("fixtures/300234010000000-20181002050602.txt").unwrap(),
            batch.report()
        );
    }

    #[test]
    fn sbd_matches_bin() {
        let config = Config::default();
        let bin = Batch::from_paths(&[fixture(0), fixture(1), fixture(2)], &config).unwrap();
        let sbd = Batch::from_sbd_paths(
            &[
                "fixtures/chunk-0.sbd",
                "fixtures/chunk-1.sbd",
                "fixtures/chunk-2.sbd",
            ],
            &config,
        ).unwrap();
        assert_eq!(bin, sbd);
    }

    #[test]
    fn invalid_file_name() {
        assert_eq!(
            Error::InvalidFileName("fixtures/chunk.bin".to_string()),
            Batch::from_paths(&["fixtures/chunk.bin"], &Config::default())
                .unwrap_err()
                .downcast()
                .unwrap()
        );
    }

    #[test]
    fn no_chunks() {
        let paths: [&str; 0] = [];
        assert_eq!(
            Error::NoChunks,
            Batch::from_paths(&paths, &Config::default())
                .unwrap_err()
                .downcast()
                .unwrap()
        );
    }

    #[test]
    fn mismatch_is_checked_before_reading() {
        let error = Batch::from_paths(
            &[fixture(0), "does/not/exist/300234099999999-0.bin".to_string()],
            &Config::default(),
        ).unwrap_err();
        assert_eq!(
            Error::DeviceIdentifierMismatch {
                expected: "300234010000000".to_string(),
                actual: "300234099999999".to_string(),
            },
            error.downcast().unwrap()
        );
    }

    #[test]
    fn write_to() {
        let dir = tempfile::tempdir().unwrap();
        let batch = Batch::from_paths(&[fixture(0), fixture(1), fixture(2)], &Config::default())
            .unwrap();
        let (txt, dat) = batch.write_to(dir.path()).unwrap();
        assert_eq!(
            dir.path().join("300234010000000-20181002050602.txt"),
            txt
        );
        assert_eq!(batch.report(), ::std::fs::read_to_string(&txt).unwrap());
        assert_eq!(
            ::std::fs::read("fixtures/300234010000000-20181002050602.dat").unwrap(),
            ::std::fs::read(&dat).unwrap()
        );
    }

    #[test]
    fn dat_failure_removes_txt() {
        let dir = tempfile::tempdir().unwrap();
        let batch = Batch::from_paths(&[fixture(0), fixture(1), fixture(2)], &Config::default())
            .unwrap();
        let dat = dir.path().join("300234010000000-20181002050602.dat");
        ::std::fs::create_dir(&dat).unwrap();
        assert!(batch.write_to(dir.path()).is_err());
        assert!(!dir.path().join("300234010000000-20181002050602.txt").exists());
        assert!(dat.is_dir());
    }

    #[test]
    fn failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = Batch::from_paths(&[fixture(1), fixture(2)], &Config::default())
            .and_then(|batch| batch.write_to(dir.path()));
        assert!(result.is_err());
        assert_eq!(0, ::std::fs::read_dir(dir.path()).unwrap().count());
    }
}
