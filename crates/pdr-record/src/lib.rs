// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error record data model and single-line report encoder.
//!
//! An [`ErrorRecord`] describes one reportable provisioning failure: a
//! reason, an ordered set of supporting fields, the reporting agent and the
//! instant it was built. [`encode`] renders a record plus an instance
//! identifier into the `|`-delimited line written to the host's diagnostic
//! channel.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use pdr_record::{Agent, ErrorRecord, FixedClock, encode};
//!
//! let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
//! let record = ErrorRecord::builder("failure to obtain DHCP lease")
//!     .field("duration", 5.6)
//!     .agent(Agent::new("Cloud-Init", "24.1"))
//!     .build_with(&clock);
//!
//! assert_eq!(
//!     encode(&record, "vm-1"),
//!     "result=error|reason=failure to obtain DHCP lease|agent=Cloud-Init/24.1\
//!      |duration=5.6|vm_id=vm-1|timestamp=2024-05-01T12:00:00.000000+00:00\
//!      |documentation_url=https://aka.ms/linuxprovisioningerror"
//! );
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod clock;
mod data;
mod encode;
mod record;
mod value;

pub use agent::{Agent, DEFAULT_PRODUCT, PackageVersion, VersionProvider};
pub use clock::{Clock, FixedClock, SystemClock};
pub use data::SupportingData;
pub use encode::{
    DELIMITER, QUOTE, encode, encode_fields, format_timestamp, needs_quoting, quote_field,
};
pub use record::{ErrorRecord, RecordBuilder, Reportable};
pub use value::{FieldValue, NULL_SPELLING};

/// Help resource attached to every error report.
pub const DOCUMENTATION_URL: &str = "https://aka.ms/linuxprovisioningerror";
