//! Testing utilities for translations.
//!
//! - **Fixtures**: [`TsvFixture`] writes an input file and both mapping files
//!   into a temporary directory that lives as long as the fixture.
//! - **Generators**: [`generated_lines`] builds larger inputs for partitioning
//!   and ordering tests.
//! - **Assertions**: [`assert_tables_equal`] and [`assert_rows_equal`] report
//!   the first differing row instead of dumping both tables.
//!
//! # Example
//!
//! ```no_run
//! use tsvmap::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let fx = TsvFixture::new()?
//!     .header(&["Id", "Col1"])
//!     .line(&["r1", "a"])
//!     .column_mapping(&[("Id", "ID"), ("Col1", "C1")])
//!     .row_mapping(&[("r1", "R1")])
//!     .write()?;
//! let table = fx.translator_inline(4)?.parse(fx.input())?;
//! assert_rows_equal(table.rows(), &[["R1", "a"]]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
