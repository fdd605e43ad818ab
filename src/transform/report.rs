//! Compatibility report of the OCP3 settings each unit looked at.
use std::fmt::Write;

use serde::{Serialize, Serializer};

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("unable to serialize report: `{0}`")]
    Serialize(String),
}

/// How confident the migration of a setting is. Serialized as `0`, `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Unsupported = 0,
    Partial = 1,
    FullConfidence = 2,
}

impl Confidence {
    fn colour(&self) -> &'static str {
        match self {
            Confidence::Unsupported => "#f2dede",
            Confidence::Partial => "#fcf8e3",
            Confidence::FullConfidence => "#dff0d8",
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub name: String,
    pub kind: String,
    pub supported: bool,
    pub confidence: Confidence,
    pub comment: String,
}

impl Report {
    pub fn supported<N: Into<String>, K: Into<String>>(name: N, kind: K) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            supported: true,
            confidence: Confidence::FullConfidence,
            comment: String::new(),
        }
    }

    pub fn unsupported<N: Into<String>, K: Into<String>>(name: N, kind: K) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            supported: false,
            confidence: Confidence::Unsupported,
            comment: String::new(),
        }
    }

    pub fn with_confidence(self, confidence: Confidence) -> Self {
        Self { confidence, ..self }
    }

    pub fn with_comment<C: Into<String>>(self, comment: C) -> Self {
        Self {
            comment: comment.into(),
            ..self
        }
    }
}

/// All report rows of one transform unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub component: String,
    pub reports: Vec<Report>,
}

impl ComponentReport {
    pub fn new<S: Into<String>>(component: S) -> Self {
        Self {
            component: component.into(),
            reports: Vec::new(),
        }
    }

    pub fn push(&mut self, report: Report) {
        self.reports.push(report);
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    components: &'a [ComponentReport],
}

/// Pretty printed `{"components": [...]}` document.
pub fn to_json(components: &[ComponentReport]) -> Result<Vec<u8>, ReportError> {
    serde_json::to_vec_pretty(&ReportDocument { components })
        .map_err(|e| ReportError::Serialize(e.to_string()))
}

/// Standalone HTML page with one table per component, rows coloured by confidence.
pub fn to_html(components: &[ComponentReport]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>CPMA report</title>\n\
         <style>table{border-collapse:collapse;margin-bottom:2em}td,th{border:1px solid #ccc;padding:4px 8px}</style>\n\
         </head>\n<body>\n<h1>CPMA report</h1>\n",
    );

    // writing into a String cannot fail
    for component in components {
        let _ = writeln!(html, "<h2>{}</h2>", escape(&component.component));
        html.push_str("<table>\n<tr><th>Name</th><th>Kind</th><th>Supported</th><th>Confidence</th><th>Comment</th></tr>\n");
        for report in &component.reports {
            let _ = writeln!(
                html,
                "<tr style=\"background-color:{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                report.confidence.colour(),
                escape(&report.name),
                escape(&report.kind),
                report.supported,
                report.confidence as u8,
                escape(&report.comment),
            );
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
