//! Human-readable reports.
//!
//! The report is the same text the field team has always received for each buoy:
//!
//! ```text
//! Last Boot:   Mon Oct  1 12:00:00 2018
//! GPS time:    Tue Oct  2 05:06:02 2018
//! Temp chain bytes received 0
//! Light chain bytes received 0
//!
//! latitude:    44.123455
//! ...
//! ```

use failure::Error as FailureError;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use Record;

const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// A record, ready to be displayed.
///
/// # Examples
///
/// ```
/// use icedrifter::{Record, report::Report};
/// let record = Record::default();
/// let text = Report::new(&record, false).to_string();
/// assert!(text.starts_with("Last Boot:   Thu Jan  1 00:00:00 1970\n"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Report<'a> {
    record: &'a Record,
    chain_enabled: bool,
}

impl<'a> Report<'a> {
    /// Creates a new report.
    ///
    /// Chain readings are only included if `chain_enabled` is true and the buoy read its chain
    /// for this record.
    pub fn new(record: &'a Record, chain_enabled: bool) -> Report<'a> {
        Report {
            record: record,
            chain_enabled: chain_enabled,
        }
    }
}

impl<'a> fmt::Display for Report<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let record = self.record;
        writeln!(
            f,
            "Last Boot:   {}",
            record.last_boot_datetime().format(ASCTIME_FORMAT)
        )?;
        writeln!(
            f,
            "GPS time:    {}",
            record.gps_datetime().format(ASCTIME_FORMAT)
        )?;

        let errors = record.chain_errors();
        if !errors.is_empty() {
            writeln!(f, "\nError(s) found!!!")?;
            for error in errors {
                writeln!(f, "*** {}", error)?;
            }
            writeln!(f)?;
        }

        writeln!(
            f,
            "Temp chain bytes received {}",
            record.temperature_byte_count
        )?;
        writeln!(f, "Light chain bytes received {}\n", record.light_byte_count)?;

        writeln!(f, "latitude:    {:.6}", record.latitude)?;
        writeln!(f, "longitude:   {:.6}", record.longitude)?;
        writeln!(f, "temperature: {:.6} C", record.temperature)?;
        writeln!(f, "pressure:    {:.6} Pa", record.pressure)?;
        if record.has_remote_temperature() {
            writeln!(f, "remote temp: {:.6} C\n", record.remote_temperature)?;
        }

        let chain = record
            .chain
            .as_ref()
            .filter(|_| self.chain_enabled && record.has_chain_data());
        if let Some(chain) = chain {
            for (i, &raw) in chain.temperatures.iter().enumerate() {
                writeln!(f, "Chain temperature sensor {:3} = {:.6}", i, celsius(raw))?;
            }
            writeln!(f)?;
            for (i, &light) in chain.light.iter().enumerate() {
                let (red, green, blue) = rgb(light);
                writeln!(
                    f,
                    "Chain light sensor {:2} = {:5} {:5} {:5} {:5}  RGB {:3} {:3} {:3}",
                    i, light[0], light[1], light[2], light[3], red, green, blue
                )?;
            }
        }
        Ok(())
    }
}

/// Renders a record as text.
///
/// # Examples
///
/// ```
/// use icedrifter::{Record, report};
/// let record = Record { errors: 0x02, ..Default::default() };
/// let text = report::render(&record, true);
/// assert!(text.contains("\nError(s) found!!!\n*** Temperature chain overrun.\n\n"));
/// ```
pub fn render(record: &Record, chain_enabled: bool) -> String {
    Report::new(record, chain_enabled).to_string()
}

/// Writes a record's report to a writer.
pub fn write_report<W: Write>(
    record: &Record,
    chain_enabled: bool,
    mut write: W,
) -> io::Result<()> {
    write!(write, "{}", Report::new(record, chain_enabled))
}

/// Writes a record's report to the named file, or to standard output if there is no name.
pub fn write_report_to<P: AsRef<Path>>(
    record: &Record,
    chain_enabled: bool,
    path: Option<P>,
) -> Result<(), FailureError> {
    if let Some(path) = path {
        let file = ::std::fs::File::create(path)?;
        write_report(record, chain_enabled, file)?;
    } else {
        let stdout = io::stdout();
        write_report(record, chain_enabled, stdout.lock())?;
    }
    Ok(())
}

/// Converts a raw chain temperature word to degrees Celsius.
///
/// The word is a signed 16-bit count of 1/128 degrees.
///
/// # Examples
///
/// ```
/// use icedrifter::report::celsius;
/// assert_eq!(2.5, celsius(0x0140));
/// assert_eq!(-1.0, celsius(0xff80));
/// assert_eq!(-256.0, celsius(0x8000));
/// ```
pub fn celsius(raw: u16) -> f32 {
    f32::from(raw as i16) / 128.0
}

/// Returns the 0-255 red, green, and blue ratios of a light sensor's clear, red, green, and blue
/// counts.
///
/// # Examples
///
/// ```
/// use icedrifter::report::rgb;
/// assert_eq!((255, 127, 0), rgb([100, 100, 50, 0]));
/// assert_eq!((0, 0, 0), rgb([0, 100, 50, 25]));
/// ```
pub fn rgb(light: [u16; 4]) -> (u8, u8, u8) {
    let clear = light[0];
    if clear == 0 {
        return (0, 0, 0);
    }
    let ratio = |channel: u16| (f64::from(f32::from(channel) / f32::from(clear)) * 255.0) as u8;
    (ratio(light[1]), ratio(light[2]), ratio(light[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use record::{Chain, CHAIN_DATA_SWITCH, REMOTE_TEMPERATURE_SWITCH};

    fn record() -> Record {
        Record {
            switches: REMOTE_TEMPERATURE_SWITCH | CHAIN_DATA_SWITCH,
            temperature_byte_count: 4,
            light_byte_count: 8,
            last_boot_time: 1538395200,
            gps_time: 1538456762,
            latitude: 44.5,
            longitude: -87.25,
            temperature: 2.5,
            pressure: 101325.0,
            remote_temperature: -1.75,
            chain: Some(Chain {
                temperatures: vec![0x0140, 0xff80],
                light: vec![[1000, 500, 250, 125]],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn full() {
        assert_eq!(
            "Last Boot:   Mon Oct  1 12:00:00 2018
GPS time:    Tue Oct  2 05:06:02 2018
Temp chain bytes received 4
Light chain bytes received 8

latitude:    44.500000
longitude:   -87.250000
temperature: 2.500000 C
pressure:    101325.000000 Pa
remote temp: -1.750000 C

Chain temperature sensor   0 = 2.500000
Chain temperature sensor   1 = -1.000000

Chain light sensor  0 =  1000   500   250   125  RGB 127  63  31
",
            render(&record(), true)
        );
    }

    #[test]
    fn chain_disabled() {
        let text = render(&record(), false);
        assert!(text.ends_with("remote temp: -1.750000 C\n\n"));
        assert!(!text.contains("Chain"));
    }

    #[test]
    fn chain_not_read() {
        let mut record = record();
        record.switches = REMOTE_TEMPERATURE_SWITCH;
        assert!(record.chain.is_some());
        let text = render(&record, true);
        assert!(!text.contains("Chain"));
        assert!(text.ends_with("remote temp: -1.750000 C\n\n"));
    }

    #[test]
    fn no_remote_temperature() {
        let mut record = record();
        record.switches = 0;
        let text = render(&record, false);
        assert!(!text.contains("remote temp"));
        assert!(text.ends_with("pressure:    101325.000000 Pa\n"));
    }

    #[test]
    fn errors() {
        let mut record = record();
        assert!(!render(&record, false).contains("Error"));
        record.errors = 0x0f;
        assert!(render(&record, false).contains(
            "GPS time:    Tue Oct  2 05:06:02 2018

Error(s) found!!!
*** Temperature chain timeout.
*** Temperature chain overrun.
*** Light chain timeout.
*** Light chain overrun.

Temp chain bytes received 4
"
        ));
    }

    #[test]
    fn write_to_file() {
        use tempfile;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        write_report_to(&record(), true, Some(&path)).unwrap();
        assert_eq!(
            render(&record(), true),
            ::std::fs::read_to_string(&path).unwrap()
        );
    }

    #[test]
    fn rgb_saturates() {
        assert_eq!((255, 255, 255), rgb([1, 2, 3, 4]));
    }
}
