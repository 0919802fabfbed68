//! Runs the requests described in a `.http` file.
//!
//! A request file is a list of `###`-delimited sections, each holding a
//! method line, header lines and, after a blank line, a body:
//!
//! ```text
//! ### create user
//! POST http://localhost:8080/users
//! Content-Type: application/json
//!
//! {"name": "ada"}
//! ```
//!
//! [`RequestSpec::parse_http_file`] turns the file into specs,
//! [`Dispatcher`] sends them through a [`Transport`] and [`normalize`]
//! turns each response into a [`ResponseView`] ready for [`render`].

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod normalize;
pub mod render;
pub mod request_file;
pub mod transport;

pub use dispatch::{Dispatcher, RequestOutcome};
pub use error::{Error, Result};
pub use normalize::{normalize, normalize_within, ParsedBody, ResponseView};
pub use render::{render, render_json};
pub use request_file::{Matching, RequestSpec};
pub use transport::{HyperTransport, RawResponse, Transport};
