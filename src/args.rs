use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes an HTTP/1.x request to stdout, or sends it to a server and prints the raw response.
#[derive(Parser, Debug)]
#[command(version = VERSION, about)]
pub struct Args {
    /// Request target, such as /index.html or *.
    pub target: String,
    /// Request method.
    #[arg(short = 'X', long, default_value_t = String::from("GET"))]
    pub method: String,
    /// (Optional) Header as "Name: value". May be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// (Optional) Request body.
    #[arg(short, long, conflicts_with_all = ["data_file", "form"])]
    pub data: Option<String>,
    /// (Optional) File to stream as the request body, or - for stdin.
    #[arg(long, conflicts_with = "form")]
    pub data_file: Option<PathBuf>,
    /// (Optional) Form field as name=value, or name=@path to upload a file. May be repeated.
    #[arg(short = 'F', long, value_parser = parse_form_arg)]
    pub form: Vec<FormArg>,
    /// Encode form fields as multipart/form-data instead of url-encoding them.
    #[arg(long)]
    pub multipart: bool,
    /// (Optional) Multipart boundary. Generated when not given.
    #[arg(long, requires = "multipart")]
    pub boundary: Option<String>,
    /// (Optional) Character set for multipart field names and filenames.
    #[arg(long, requires = "multipart")]
    pub charset: Option<String>,
    /// Send the body with chunked transfer-encoding.
    #[arg(long)]
    pub chunked: bool,
    /// HTTP version written in the request line.
    #[arg(long, default_value_t = String::from("1.1"))]
    pub http_version: String,
    /// (Optional) Value of the Host header.
    #[arg(long)]
    pub host: Option<String>,
    /// (Optional) Server to send the request to, as host:port. Writes to stdout when not given.
    #[arg(short, long)]
    pub connect: Option<String>,
    /// Log more. Repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Gets the log level for the verbosity.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace
        }
    }
}

/// A form field given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormArg {
    /// A field with an inline value.
    Text { name: String, value: String },
    /// A file upload.
    File { name: String, path: PathBuf },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw.split_once(':').ok_or_else(|| format!("expected \"Name: value\", got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in {:?}", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_form_arg(raw: &str) -> Result<FormArg, String> {
    let (name, value) = raw.split_once('=').ok_or_else(|| format!("expected name=value, got {:?}", raw))?;
    Ok(match value.strip_prefix('@') {
        Some(path) => FormArg::File { name: name.to_string(), path: PathBuf::from(path) },
        None => FormArg::Text { name: name.to_string(), value: value.to_string() }
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use log::LevelFilter;

    use crate::args::{Args, FormArg, parse_form_arg, parse_header};

    #[test]
    fn header() {
        assert_eq!(parse_header("X-Id:  42 ").unwrap(), ("X-Id".to_string(), "42".to_string()));
        assert_eq!(parse_header("Accept: a:b").unwrap(), ("Accept".to_string(), "a:b".to_string()));
        assert!(parse_header("no colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn form_arg() {
        assert_eq!(
            parse_form_arg("q=a=b").unwrap(),
            FormArg::Text { name: "q".to_string(), value: "a=b".to_string() }
        );
        assert_eq!(
            parse_form_arg("doc=@/tmp/report.pdf").unwrap(),
            FormArg::File { name: "doc".to_string(), path: PathBuf::from("/tmp/report.pdf") }
        );
        assert!(parse_form_arg("novalue").is_err());
    }

    #[test]
    fn parse_args() {
        let args = Args::try_parse_from([
            "outbox", "/upload", "-X", "POST", "-H", "X-A: 1", "-F", "a=b", "--multipart", "--boundary", "B", "-vv",
        ]).unwrap();

        assert_eq!(args.target, "/upload");
        assert_eq!(args.method, "POST");
        assert_eq!(args.headers, vec![("X-A".to_string(), "1".to_string())]);
        assert_eq!(args.boundary.as_deref(), Some("B"));
        assert_eq!(args.http_version, "1.1");
        assert_eq!(args.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn data_conflicts_with_form() {
        assert!(Args::try_parse_from(["outbox", "/", "-d", "x", "-F", "a=b"]).is_err());
        assert!(Args::try_parse_from(["outbox", "/", "--boundary", "B"]).is_err());
    }
}
