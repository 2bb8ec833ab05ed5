use std::io::{copy, stdin, stdout};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use outbox::args::{Args, FormArg};
use outbox::common::body::{BodySource, FileSource, FormField, FormOptions, ReadSource};
use outbox::common::header::{CONNECTION, HeaderMap, TRANSFER_ENCODING};
use outbox::common::method::Method;
use outbox::common::request::{FORM_URLENCODED, MULTIPART_FORM_DATA, Request, RequestDefaults};
use outbox::util::content_type_for_path;
use outbox::write::Error;

fn main() -> ExitCode {
    let args = Args::parse();
    if TermLogger::init(args.log_level(), Config::default(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        eprintln!("logging is unavailable");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("outbox: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut request = build_request(args)?;
    let target = request.path().to_string();

    match &args.connect {
        Some(addr) => {
            let mut stream = TcpStream::connect(addr)?;
            info!("connected to {}", addr);
            request.execute(&mut stream, &args.http_version, &target)?;
            let received = copy(&mut stream, &mut stdout().lock())?;
            debug!("received {} bytes", received);
        }
        None => request.execute(&mut stdout().lock(), &args.http_version, &target)?
    }
    Ok(())
}

fn build_request(args: &Args) -> Result<Request, Error> {
    let method = Method::try_from_str(&args.method)?;

    let mut headers = HeaderMap::new();
    for (name, value) in &args.headers {
        headers.add_header(name.as_str().into(), value.clone());
    }
    if args.chunked {
        headers.set(TRANSFER_ENCODING, "chunked");
    }
    // the response is read until the server closes the connection
    if args.connect.is_some() && !headers.contains(&CONNECTION) {
        headers.set(CONNECTION, "close");
    }

    let defaults = RequestDefaults { host: args.host.clone(), ..RequestDefaults::default() };
    let mut request = Request::with_headers(method, args.target.clone(), headers, &defaults)?;

    if !args.form.is_empty() {
        let fields = args.form.iter().map(form_field).collect::<Result<Vec<FormField>, _>>()?;
        let enctype = if args.multipart { MULTIPART_FORM_DATA } else { FORM_URLENCODED };
        let options = FormOptions { boundary: args.boundary.clone(), charset: args.charset.clone() };
        request.set_form(fields, enctype, options)?;
    } else if let Some(data) = &args.data {
        request.set_body(data.as_bytes());
    } else if let Some(path) = &args.data_file {
        if path.as_os_str() == "-" {
            request.set_body_stream(ReadSource(stdin()));
        } else {
            let file = FileSource::open(path)?;
            if !args.chunked && request.headers.content_length().is_none() {
                request.headers.set_content_length(file.size().unwrap_or(0));
            }
            request.set_body_stream(file);
        }
    }
    Ok(request)
}

fn form_field(arg: &FormArg) -> std::io::Result<FormField> {
    Ok(match arg {
        FormArg::Text { name, value } => FormField::text(name.as_str(), value.as_bytes()),
        FormArg::File { name, path } => {
            let field = FormField::source(name.as_str(), FileSource::open(path)?);
            match content_type_for_path(path) {
                Some(content_type) => field.with_content_type(content_type),
                None => field
            }
        }
    })
}
