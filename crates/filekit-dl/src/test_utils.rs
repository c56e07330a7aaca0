//! Local HTTP server and archive builders for exercising downloads in tests.

use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Cursor, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// How the server answers a given path.
#[derive(Clone, Debug)]
pub enum Route {
    Ok(Vec<u8>),
    Redirect { status: u16, location: String },
    Status(u16),
    /// Accept the request and never answer.
    Hang,
    /// Send a 200 head promising more bytes than `partial`, then go silent.
    Stall { partial: Vec<u8>, declared_len: usize },
}

impl Route {
    pub fn ok(body: Vec<u8>) -> Self {
        Self::Ok(body)
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self::Redirect {
            status,
            location: location.to_string(),
        }
    }

    pub fn stall(partial: &[u8]) -> Self {
        Self::Stall {
            partial: partial.to_vec(),
            declared_len: 100_000,
        }
    }
}

type Routes = Arc<Mutex<HashMap<String, Route>>>;

pub struct TestServer {
    addr: SocketAddr,
    routes: Routes,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Routes = Arc::new(Mutex::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
        ));
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else {
                        continue;
                    };
                    let routes = Arc::clone(&routes);
                    let hits = Arc::clone(&hits);
                    thread::spawn(move || handle(stream, &routes, &hits));
                }
            });
        }

        Self {
            addr,
            routes,
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn add_route(&self, path: &str, route: Route) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: TcpStream, routes: &Routes, hits: &AtomicUsize) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    hits.fetch_add(1, Ordering::SeqCst);

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    let route = routes
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or(Route::Status(404));

    let response = match route {
        Route::Ok(body) => {
            let mut head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            head.extend_from_slice(&body);
            head
        }
        Route::Redirect { status, location } => {
            format!(
                "HTTP/1.1 {status} Redirect\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .into_bytes()
        }
        Route::Status(status) => {
            format!(
                "HTTP/1.1 {status} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .into_bytes()
        }
        Route::Hang => {
            thread::sleep(Duration::from_secs(10));
            return;
        }
        Route::Stall {
            partial,
            declared_len,
        } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {declared_len}\r\nConnection: close\r\n\r\n"
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&partial);
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(10));
            return;
        }
    };

    let _ = stream.write_all(&response);
    let _ = stream.flush();
}

/// Builds an in-memory zip archive. Entries with `None` content are directories.
pub fn zip_archive(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, content) in entries {
        match content {
            Some(bytes) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            None => writer.add_directory(*name, options).unwrap(),
        }
    }

    writer.finish().unwrap().into_inner()
}
