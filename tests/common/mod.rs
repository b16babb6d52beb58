#![allow(dead_code)]

pub mod test_tracing {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static TRACING_INIT: Once = Once::new();

    /// Install a test-writer subscriber once per test binary.
    ///
    /// Output only shows for failing tests; `RUST_LOG` overrides the `debug` default.
    pub fn init() {
        TRACING_INIT.call_once(|| {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        });
    }
}

pub mod handlers {
    use brrtdispatch::dispatcher::RequestContext;
    use brrtdispatch::handler::{Handler, HandlerError};
    use brrtdispatch::registry::Endpoint;
    use brrtdispatch::server::{Request, Response};
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Handler answering 200 with a fixed body
    pub fn reply(body: &'static str) -> impl Handler {
        move |_req: Request, _ctx: RequestContext| async move {
            Ok::<_, HandlerError>(Response::ok(body))
        }
    }

    /// Handler that counts its invocations and answers 200 with a fixed body
    pub fn counted(body: &'static str, calls: Arc<AtomicUsize>) -> impl Handler {
        move |_req: Request, _ctx: RequestContext| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, HandlerError>(Response::ok(body)) }
        }
    }

    /// Endpoint with explicit media types and a fixed reply
    pub fn endpoint(
        method: Method,
        route: &str,
        consumes: &[&str],
        produces: &[&str],
        body: &'static str,
    ) -> Endpoint {
        let mut builder = Endpoint::builder(method, route).name(body);
        for c in consumes {
            builder = builder.consumes(c);
        }
        for p in produces {
            builder = builder.produces(p);
        }
        builder.handler(reply(body)).unwrap()
    }
}

pub mod responses {
    use brrtdispatch::server::{Response, ResponseBody};
    use bytes::Bytes;

    /// Collect a response body, whether sized or streamed
    pub async fn body_bytes(res: Response) -> Bytes {
        match res.body {
            None => Bytes::new(),
            Some(ResponseBody::Sized(bytes)) => bytes,
            Some(ResponseBody::Chunked(body)) => body.bytes().await.unwrap(),
        }
    }

    /// Collect a response body as UTF-8
    pub async fn body_text(res: Response) -> String {
        String::from_utf8(body_bytes(res).await.to_vec()).unwrap()
    }
}

pub mod sources {
    use std::io::{self, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Reader over fixed data that records when it is dropped.
    ///
    /// Optionally fails once `fail_after` bytes were read.
    pub struct TrackedReader {
        data: io::Cursor<Vec<u8>>,
        fail_after: Option<usize>,
        read: usize,
        closes: Arc<AtomicUsize>,
    }

    impl TrackedReader {
        pub fn new(data: impl Into<Vec<u8>>, closes: Arc<AtomicUsize>) -> Self {
            Self {
                data: io::Cursor::new(data.into()),
                fail_after: None,
                read: 0,
                closes,
            }
        }

        pub fn failing_after(mut self, bytes: usize) -> Self {
            self.fail_after = Some(bytes);
            self
        }
    }

    impl Read for TrackedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(limit) = self.fail_after {
                if self.read >= limit {
                    return Err(io::Error::new(io::ErrorKind::ConnectionReset, "source failed"));
                }
            }
            let n = self.data.read(buf)?;
            self.read += n;
            Ok(n)
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Reader that blocks each read until the test releases it
    pub struct GatedReader {
        gate: std::sync::mpsc::Receiver<()>,
        closes: Arc<AtomicUsize>,
    }

    impl GatedReader {
        pub fn new(closes: Arc<AtomicUsize>) -> (std::sync::mpsc::Sender<()>, Self) {
            let (tx, rx) = std::sync::mpsc::channel();
            (tx, Self { gate: rx, closes })
        }
    }

    impl Read for GatedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.gate.recv() {
                Ok(()) if !buf.is_empty() => {
                    buf[0] = b'x';
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    impl Drop for GatedReader {
        fn drop(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
