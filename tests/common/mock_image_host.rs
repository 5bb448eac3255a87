use actix_web::{App, HttpResponse, HttpServer, dev::ServerHandle, web};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::time::Duration;
use url::Url;

/// How long `/slow.png` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

/// Size of the `/large.bin` body.
pub const LARGE_BODY_BYTES: usize = 4096;

/// Local HTTP server standing in for a remote image host.
pub struct MockImageHost {
    base_url: String,
    handle: ServerHandle,
}

impl MockImageHost {
    /// Must be called from inside an actix system.
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(|| {
            App::new()
                .route("/bottle.png", web::get().to(png_handler))
                .route("/bottle.jpg", web::get().to(jpeg_handler))
                .route("/notes.txt", web::get().to(text_handler))
                .route("/slow.png", web::get().to(slow_handler))
                .route("/large.bin", web::get().to(large_handler))
                .route("/user-agent", web::get().to(user_agent_handler))
                .route("/negotiated", web::get().to(negotiated_handler))
        })
        .workers(1)
        .listen(listener)?
        .run();

        let handle = server.handle();
        actix_web::rt::spawn(server);

        // Wait for the server to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            handle,
        })
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("{}{}", self.base_url, path)).unwrap()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// A bottle-green test picture.
pub fn sample_image() -> RgbImage {
    RgbImage::from_fn(64, 48, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([20, 120, 40])
        } else {
            Rgb([200, 220, 210])
        }
    })
}

pub fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

async fn png_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("image/png")
        .body(encode(&sample_image(), ImageFormat::Png))
}

async fn jpeg_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("image/jpeg")
        .body(encode(&sample_image(), ImageFormat::Jpeg))
}

async fn text_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body("This is a shopping list, not a picture.\n- milk\n- eggs\n")
}

async fn slow_handler() -> HttpResponse {
    tokio::time::sleep(SLOW_DELAY).await;
    png_handler().await
}

async fn large_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/octet-stream")
        .body(vec![0u8; LARGE_BODY_BYTES])
}

/// Reject clients that do not look like a browser, as some real hosts do.
async fn user_agent_handler(req: actix_web::HttpRequest) -> HttpResponse {
    let agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if agent.starts_with("Mozilla/5.0") {
        png_handler().await
    } else {
        HttpResponse::Forbidden().body("bots not allowed")
    }
}

/// Content negotiation as some CDNs do it: a client that narrows `Accept`
/// to images gets a format the decoder has no support for.
async fn negotiated_handler(req: actix_web::HttpRequest) -> HttpResponse {
    let accept = req
        .headers()
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("*/*");
    if accept.contains("*/*") {
        png_handler().await
    } else {
        HttpResponse::Ok()
            .content_type("image/avif")
            .body(b"\0\0\0\x1cftypavif not really decodable".to_vec())
    }
}
