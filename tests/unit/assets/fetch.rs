use std::io::Cursor;

use super::*;

const URL: &str = "https://assets.example.test/pano.png";

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_fn(4, 2, |x, y| image::Rgb([x as u8 * 60, y as u8 * 100, 9]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn head(status: u16, etag: Option<&str>) -> ResponseHead {
    ResponseHead {
        status,
        etag: etag.map(str::to_owned),
        content_type: Some("image/png".to_owned()),
    }
}

#[tokio::test]
async fn fresh_fetch_decodes_and_reports_tag() {
    let transport = StaticTransport::new();
    transport.insert(URL, head(200, Some("\"abc\"")), png_bytes());

    let res = fetch_image(&transport, URL, None).await.unwrap();
    assert!(res.ok);
    assert!(res.is_newer_image);
    assert_eq!(res.http_status, 200);
    assert_eq!(res.etag.as_deref(), Some("\"abc\""));
    assert_eq!(res.content_type.as_deref(), Some("image/png"));

    let img = res.into_image().unwrap();
    assert_eq!((img.width(), img.height()), (4, 2));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn matching_tag_skips_decoding() {
    let transport = StaticTransport::new();
    // Garbage body: any decode attempt would surface as PanoError::Decode.
    transport.insert(URL, head(200, Some("\"abc\"")), b"not an image".to_vec());

    let res = fetch_image(&transport, URL, Some("\"abc\"")).await.unwrap();
    assert!(res.ok);
    assert!(!res.is_newer_image);
    assert!(res.image.is_none());
    assert_eq!(res.etag.as_deref(), Some("\"abc\""));
}

#[tokio::test]
async fn tag_comparison_is_case_sensitive() {
    let transport = StaticTransport::new();
    transport.insert(URL, head(200, Some("\"ABC\"")), png_bytes());

    let res = fetch_image(&transport, URL, Some("\"abc\"")).await.unwrap();
    assert!(res.is_newer_image);
    assert!(res.image.is_some());
}

#[tokio::test]
async fn missing_response_tag_counts_as_newer() {
    let transport = StaticTransport::new();
    transport.insert(URL, head(200, None), png_bytes());

    let res = fetch_image(&transport, URL, Some("\"abc\"")).await.unwrap();
    assert!(res.is_newer_image);
    assert!(res.etag.is_none());
    assert!(res.image.is_some());
}

#[tokio::test]
async fn not_found_yields_not_ok_without_image() {
    let transport = StaticTransport::new();

    let res = fetch_image(&transport, URL, None).await.unwrap();
    assert!(!res.ok);
    assert!(res.image.is_none());
    assert_eq!(res.http_status, 404);
    assert!(matches!(res.into_image(), Err(PanoError::FetchFailed(404))));
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let transport = StaticTransport::new();
    transport.insert(URL, head(200, Some("\"v1\"")), b"\x00\x01garbage".to_vec());

    let err = fetch_image(&transport, URL, None).await.unwrap_err();
    assert!(matches!(err, PanoError::Decode(_)));
}

#[tokio::test]
async fn unchanged_result_has_no_image_to_take() {
    let transport = StaticTransport::new();
    transport.insert(URL, head(200, Some("t")), png_bytes());

    let res = fetch_image(&transport, URL, Some("t")).await.unwrap();
    assert!(matches!(res.into_image(), Err(PanoError::Validation(_))));
}

#[test]
fn success_range_is_2xx() {
    assert!(head(200, None).is_success());
    assert!(head(204, None).is_success());
    assert!(!head(304, None).is_success());
    assert!(!head(500, None).is_success());
}

fn png_of_size(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Serve the same canned HTTP/1.1 response to every connection on an ephemeral local port.
async fn serve_canned(status_line: &'static str, etag: &'static str, body: Vec<u8>) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let header = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: image/png\r\nETag: {etag}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}/pano.png")
}

#[tokio::test]
async fn reqwest_transport_fetches_and_decodes_fresh_image() {
    let url = serve_canned("200 OK", "\"v1\"", png_of_size(8, 4)).await;
    let transport = ReqwestTransport::new().unwrap();

    let res = fetch_image(&transport, &url, None).await.unwrap();
    assert!(res.ok);
    assert!(res.is_newer_image);
    assert_eq!(res.http_status, 200);
    assert_eq!(res.etag.as_deref(), Some("\"v1\""));
    assert_eq!(res.content_type.as_deref(), Some("image/png"));
    let img = res.image.unwrap();
    assert_eq!((img.width(), img.height()), (8, 4));
}

#[tokio::test]
async fn reqwest_transport_skips_decode_on_matching_tag() {
    let url = serve_canned("200 OK", "\"v1\"", png_of_size(8, 4)).await;
    let transport = ReqwestTransport::new().unwrap();

    let res = fetch_image(&transport, &url, Some("\"v1\"")).await.unwrap();
    assert!(res.ok);
    assert!(!res.is_newer_image);
    assert!(res.image.is_none());
    assert_eq!(res.etag.as_deref(), Some("\"v1\""));
}

#[tokio::test]
async fn reqwest_transport_reports_not_found() {
    let url = serve_canned("404 Not Found", "\"gone\"", b"missing".to_vec()).await;
    let transport = ReqwestTransport::new().unwrap();

    let res = fetch_image(&transport, &url, None).await.unwrap();
    assert!(!res.ok);
    assert_eq!(res.http_status, 404);
    assert!(res.image.is_none());
}

#[tokio::test]
async fn reqwest_transport_maps_refused_connection_to_transport_error() {
    let transport = ReqwestTransport::with_timeout(std::time::Duration::from_secs(5)).unwrap();

    let err = fetch_image(&transport, "http://127.0.0.1:1/", None)
        .await
        .unwrap_err();
    assert!(matches!(err, PanoError::Transport(_)), "got {err:?}");
}
