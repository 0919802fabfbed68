use colored::Colorize;
use serde_json::Value;
use std::fmt::Write;

use crate::normalize::{JsonObject, ParsedBody, ResponseView};

/// Styled terminal text: status, headers, parsed body (when present and
/// `show_body` is set) and the raw body.
pub fn render(view: &ResponseView, show_body: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}{}", title("Status: "), value(&view.status_line));
    let _ = writeln!(out, "{}{}", title("Status Code: "), value(&view.status_code.to_string()));
    out.push('\n');

    let _ = writeln!(out, "{}", title("Headers:"));
    for (name, values) in &view.headers {
        let _ = writeln!(out, "{}{}", key(&format!("{name}: ")), value(&values.join(", ")));
    }
    out.push('\n');

    if let Some(body) = view.parsed_body.as_ref().filter(|_| show_body) {
        let _ = writeln!(out, "{}", title("Body:"));
        match body {
            ParsedBody::Object(object) => render_object(&mut out, object),
            ParsedBody::Objects(objects) => {
                for (i, object) in objects.iter().enumerate() {
                    let _ = writeln!(out, "Object {}:", i + 1);
                    render_object(&mut out, object);
                    out.push('\n');
                }
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", title("Raw Body:"));
    out.push_str(&value(&view.raw_body).to_string());

    out
}

/// The view as pretty-printed JSON.
pub fn render_json(view: &ResponseView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(view)
}

fn render_object(out: &mut String, object: &JsonObject) {
    for (name, field) in object {
        let text = match field {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let _ = writeln!(out, "{}{}", key(&format!("{name}: ")), value(&text));
    }
}

fn title(text: &str) -> colored::ColoredString {
    text.green().bold()
}

fn key(text: &str) -> colored::ColoredString {
    text.blue().bold()
}

fn value(text: &str) -> colored::ColoredString {
    text.bright_black()
}
