use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum CatalogBehavior {
    Volumes(serde_json::Value),
    ServerError,
}

pub struct CatalogStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CatalogStub {
    pub fn spawn(behavior: CatalogBehavior) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start catalog stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/books/v1/volumes");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let (path, query) = match url.split_once('?') {
                    Some((path, query)) => (path, query),
                    None => (url.as_str(), ""),
                };

                if request.method() != &tiny_http::Method::Get || path != "/books/v1/volumes" {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                if !query.contains("key=") || !query.contains("q=") {
                    let _ = request.respond(
                        tiny_http::Response::from_string("missing key or q parameter")
                            .with_status_code(400),
                    );
                    continue;
                }

                match &behavior {
                    CatalogBehavior::ServerError => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("backend unavailable")
                                .with_status_code(503),
                        );
                    }
                    CatalogBehavior::Volumes(body) => {
                        let mut response = tiny_http::Response::from_string(body.to_string())
                            .with_status_code(200);
                        let header = tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"application/json"[..],
                        )
                        .expect("build header");
                        response = response.with_header(header);
                        let _ = request.respond(response);
                    }
                }
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for CatalogStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
