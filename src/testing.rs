//! Testing utilities for conversions.
//!
//! This module provides what tests of schema mappings usually need:
//!
//! - **Fixtures**: ready-made schemas and row builders
//! - **Mock I/O**: an in-memory [`RecordSink`](crate::convert::RecordSink)
//!   with failure injection, and temporary files
//!
//! # Quick Start
//!
//! ```
//! use csv2avro::convert::Converter;
//! use csv2avro::record::Value;
//! use csv2avro::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = employee_schema();
//! let mut session = Converter::new(&schema, MemorySink::new());
//! session.append(&["Lee", "34"])?;
//!
//! let records = session.sink().records();
//! assert_eq!(records[0].get("age"), Some(&Value::Int(34)));
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod mock_io;

pub use fixtures::*;
pub use mock_io::*;
