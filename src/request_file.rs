use bytes::Bytes;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

const DELIMITER: &str = "###";
const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

/// How method prefixes and content types are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Matching {
    /// Byte-exact, case-sensitive comparison.
    #[default]
    Exact,
    /// ASCII case-insensitive comparison.
    CaseInsensitive,
}

impl Matching {
    fn strip_prefix<'a>(self, line: &'a str, prefix: &str) -> Option<&'a str> {
        match self {
            Matching::Exact => line.strip_prefix(prefix),
            Matching::CaseInsensitive => {
                let head = line.get(..prefix.len())?;
                head.eq_ignore_ascii_case(prefix)
                    .then(|| &line[prefix.len()..])
            }
        }
    }

    pub(crate) fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            Matching::Exact => haystack.contains(needle),
            Matching::CaseInsensitive => haystack
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase()),
        }
    }
}

/// One `###` section of a request file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSpec {
    pub title: String,
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl RequestSpec {
    /// Parses request file content. Unrecognised lines are ignored, so this
    /// never fails; sections without a title are dropped.
    pub fn parse_http(content: &str, matching: Matching) -> Vec<Self> {
        let mut parser = Parser::new(matching);
        for line in content.lines() {
            parser.push_line(line.as_bytes());
        }
        parser.finish()
    }

    /// Parses raw lines from `reader`. Bytes that are not UTF-8 are kept
    /// as-is in bodies; only I/O errors fail the parse.
    pub fn parse_reader<R: BufRead>(reader: R, matching: Matching) -> Result<Vec<Self>> {
        let mut parser = Parser::new(matching);
        for line in reader.split(b'\n') {
            let line = line?;
            parser.push_line(line.strip_suffix(b"\r").unwrap_or(&line[..]));
        }
        Ok(parser.finish())
    }

    pub fn parse_http_file(path: impl AsRef<Path>, matching: Matching) -> Result<Vec<Self>> {
        let file = File::open(path)?;
        Self::parse_reader(BufReader::new(file), matching)
    }
}

#[derive(Debug, Default)]
struct Section {
    spec: RequestSpec,
    in_body: bool,
    body_lines: Vec<Vec<u8>>,
}

impl Section {
    fn titled(title: &str) -> Self {
        Self {
            spec: RequestSpec {
                title: title.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn seal(self, requests: &mut Vec<RequestSpec>) {
        if self.spec.title.is_empty() {
            debug!("dropping request section without a title");
            return;
        }

        let mut spec = self.spec;
        spec.body = Bytes::from(self.body_lines.join(&b'\n'));
        debug!("parsed request `{}`: {} {}", spec.title, spec.method, spec.url);
        requests.push(spec);
    }
}

/// Single forward pass over the lines of a request file.
struct Parser {
    matching: Matching,
    requests: Vec<RequestSpec>,
    current: Section,
}

impl Parser {
    fn new(matching: Matching) -> Self {
        Self {
            matching,
            requests: Vec::new(),
            current: Section::default(),
        }
    }

    fn push_line(&mut self, raw: &[u8]) {
        let decoded = String::from_utf8_lossy(raw);
        let line: &str = &decoded;

        if let Some(title) = line.strip_prefix(DELIMITER) {
            let finished = std::mem::replace(&mut self.current, Section::titled(title.trim()));
            finished.seal(&mut self.requests);
            return;
        }

        let current = &mut self.current;

        if let Some(method) = method_prefix(line, self.matching) {
            if let Some(url) = parse_req(line) {
                current.spec.method = method.to_string();
                current.spec.url = url;
            }
        } else if !current.in_body {
            if let Some((key, value)) = parse_header(line) {
                current.spec.headers.insert(key, value);
            }
        }

        if raw.is_empty() {
            current.in_body = true;
        } else if current.in_body {
            current.body_lines.push(raw.to_vec());
        }
    }

    fn finish(mut self) -> Vec<RequestSpec> {
        self.current.seal(&mut self.requests);
        self.requests
    }
}

/// Returns the method a line starts with, when the method is followed by
/// whitespace or ends the line.
fn method_prefix(line: &str, matching: Matching) -> Option<&'static str> {
    METHODS.into_iter().find(|method| {
        matching
            .strip_prefix(line, method)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

fn parse_req(line: &str) -> Option<String> {
    line.split_whitespace().nth(1).map(str::to_string)
}

fn parse_header(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}
