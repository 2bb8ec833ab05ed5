use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{JoinHandle, spawn};

use outbox::common::request::Request;
use outbox::write::Error;

/// Listens on a loopback port and records everything the first client sends until it hangs up.
pub fn capture() -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut received = vec![];
        stream.read_to_end(&mut received).unwrap();
        received
    });
    (addr, handle)
}

/// Executes the request over a real connection, returning the result and the bytes the peer got.
pub fn send(request: &mut Request, version: &str, target: &str) -> (Result<(), Error>, Vec<u8>) {
    let (addr, handle) = capture();
    let result = {
        let mut stream = TcpStream::connect(addr).unwrap();
        request.execute(&mut stream, version, target)
    };
    (result, handle.join().unwrap())
}

/// Answers one request with the given response. The request head and a Content-Length body are
/// read before answering; the recorded request bytes are returned.
pub fn respond_once(response: &'static [u8]) -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut received = vec![];
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            received.extend_from_slice(line.as_bytes());
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        received.extend(body);

        reader.get_mut().write_all(response).unwrap();
        received
    });
    (addr, handle)
}

/// Splits a request into its header block and its body.
pub fn split(received: &[u8]) -> (String, Vec<u8>) {
    let end = received.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    (String::from_utf8(received[..end].to_vec()).unwrap(), received[end..].to_vec())
}
