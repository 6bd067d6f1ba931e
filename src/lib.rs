//! Table-driven functional tests for HTTP request handlers.
//!
//! A fixture table lists one request per row together with the status code and JSON
//! body the handler is expected to answer with. [`TestCases::load`] reads the table,
//! [`run_case`] and [`run_check_status_code`] dispatch a row to a [`Handler`] and
//! report mismatches to a [`Reporter`].
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use http_fixture_runner::{run_suite, Mode, Report, TestCases};
//!
//! let table = "Name,HttpVerb,Uri,WantStatusCode,WantResponseBody\n\
//!              Ping,GET,/ping,200 OK,\"{\"\"pong\"\":true}\"\n";
//! let cases = TestCases::from_reader(table.as_bytes(), b',', true).unwrap();
//!
//! let handler = |_: Request<Bytes>| Response::new(Bytes::from_static(br#"{"pong":true}"#));
//!
//! let mut report = Report::new();
//! let summary = run_suite(&cases, &handler, &(), Mode::Full, &mut report);
//! assert_eq!(summary.passed, 1);
//! assert!(report.passed());
//! ```

mod error;
mod remote;
mod report;
mod runner;
mod test_case;

pub use error::{LoadError, RemoteError};
pub use remote::RemoteHandler;
pub use report::{Report, Reporter};
pub use runner::{json_matches, run_case, run_check_status_code, run_suite, Handler, Mode, Recorded, Summary};
pub use test_case::{ColumnMap, Field, TestCase, TestCases};
