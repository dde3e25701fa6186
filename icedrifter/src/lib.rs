//! Reconstruct, store, and print icedrifter buoy records.
//!
//! An icedrifter wakes up, reads its GPS, temperature, pressure, and (optionally) a chain of
//! temperature and light sensors hanging below the ice, and packs everything into a fixed-layout
//! `Record`. The record is split into chunks by the `rockblock` crate and sent over Iridium.
//!
//! Back on the ground, a `Batch` of chunk files is checked, merged, and turned back into a
//! `Record`, which can then be written to a `.dat` file and rendered as a text report:
//!
//! ```
//! use icedrifter::{Batch, Config};
//! let batch = Batch::from_paths(&[
//!     "fixtures/300234010000000-20181002050602-2.bin",
//!     "fixtures/300234010000000-20181002050602-0.bin",
//!     "fixtures/300234010000000-20181002050602-1.bin",
//! ], &Config::default()).unwrap();
//! assert_eq!("300234010000000", batch.device_id());
//! let report = icedrifter::report::render(batch.record(), true);
//! ```

#![deny(missing_docs, missing_debug_implementations, unsafe_code)]

extern crate byteorder;
extern crate chrono;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate regex;
extern crate rockblock;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;

#[cfg(test)]
extern crate tempfile;

pub mod batch;
pub mod config;
pub mod endian;
pub mod record;
pub mod report;

pub use batch::Batch;
pub use config::{ChainConfig, Config};
pub use record::{Chain, Record};
