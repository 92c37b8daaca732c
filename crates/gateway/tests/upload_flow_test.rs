use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use gateway::{
    server::create_app,
    state::AppState,
    upload::{UploadConfig, UploadHandler},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use inference::{DetectionBox, DetectionPipeline, DetectionService, PipelineConfig};
use std::io::Cursor;
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "X-UPLOAD-BOUNDARY";
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

fn bbox(class_id: u16) -> DetectionBox {
    DetectionBox {
        x1: 4.0,
        y1: 4.0,
        x2: 40.0,
        y2: 30.0,
        confidence: 0.88,
        class_id,
    }
}

/// Two cars and a person, whatever the image.
struct StubDetector {
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    fail: bool,
}

impl DetectionService for StubDetector {
    fn infer(&mut self, _frame: &RgbImage) -> anyhow::Result<Vec<DetectionBox>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            anyhow::bail!("onnx session crashed");
        }
        Ok(vec![bbox(2), bbox(2), bbox(0)])
    }
}

struct TestApp {
    dir: TempDir,
    router: Router,
    calls: Arc<AtomicUsize>,
}

impl TestApp {
    fn build(delay: Option<Duration>, fail: bool, timeout: Option<Duration>) -> Self {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let detector: Box<dyn DetectionService> = Box::new(StubDetector {
            calls: calls.clone(),
            delay,
            fail,
        });
        let pipeline = DetectionPipeline::new(
            detector,
            PipelineConfig {
                static_dir: dir.path().join("static"),
                ..PipelineConfig::default()
            },
        );
        let uploads = UploadHandler::new(UploadConfig {
            upload_dir: dir.path().join("uploads"),
            ..UploadConfig::default()
        });

        let router = create_app(AppState::new(pipeline, uploads, timeout), MAX_UPLOAD_BYTES);
        Self { dir, router, calls }
    }

    fn new() -> Self {
        Self::build(None, false, None)
    }

    fn path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    async fn upload(&self, disposition: &str, bytes: &[u8]) -> (StatusCode, String) {
        self.send(multipart_request(disposition, bytes)).await
    }
}

fn multipart_request(disposition: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Disposition: form-data; {disposition}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn encoded_image(format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(64, 48, Rgb([90, 120, 150]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path).map_or(true, |mut entries| entries.next().is_none())
}

#[tokio::test]
async fn test_index_renders_upload_form() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains("multipart/form-data"));
}

#[tokio::test]
async fn test_car_upload_counts_and_serves_annotated_image() {
    let app = TestApp::new();
    let jpeg = encoded_image(ImageFormat::Jpeg);

    let (status, body) = app
        .upload(r#"name="file"; filename="car.jpg""#, &jpeg)
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("Number of vehicles detected: 2"));
    assert!(body.contains("Detection time: 6 seconds"));
    assert!(body.contains("/static/car.jpg"));
    assert_eq!(app.calls.load(Ordering::SeqCst), 1);

    assert_eq!(std::fs::read(app.path("uploads/car.jpg")).unwrap(), jpeg);
    assert!(app.path("static/car.jpg").exists());

    let (status, _) = app
        .send(
            Request::builder()
                .uri("/static/car.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_filename_is_sanitised_before_storing() {
    let app = TestApp::new();
    let png = encoded_image(ImageFormat::Png);

    let (status, body) = app
        .upload(r#"name="file"; filename="../my lot.png""#, &png)
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(app.path("uploads/my_lot.png").exists());
    assert!(app.path("static/my_lot.png").exists());
    assert!(body.contains("/static/my_lot.png"));
}

#[tokio::test]
async fn test_markup_in_filename_never_reaches_the_page() {
    let app = TestApp::new();
    let png = encoded_image(ImageFormat::Png);

    let (status, body) = app
        .upload(r#"name="file"; filename="<b>car</b>.png""#, &png)
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(!body.contains("<b>car"));
    assert!(body.contains(r#"src="/static/bcar_b.png""#));
    assert!(app.path("uploads/bcar_b.png").exists());
}

#[tokio::test]
async fn test_missing_file_part() {
    let app = TestApp::new();

    let (status, body) = app.upload(r#"name="comment""#, b"hello").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No file part");
    assert_eq!(app.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_file_field_without_filename_is_not_a_file_part() {
    let app = TestApp::new();

    let (status, body) = app.upload(r#"name="file""#, b"plain text value").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No file part");
}

#[tokio::test]
async fn test_empty_filename() {
    let app = TestApp::new();

    let (status, body) = app.upload(r#"name="file"; filename="""#, b"").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No selected file");
    assert!(dir_is_empty(&app.path("uploads")));
}

#[tokio::test]
async fn test_disallowed_extension_is_rejected_without_side_effects() {
    let app = TestApp::new();

    let (status, body) = app
        .upload(r#"name="file"; filename="notes.txt""#, b"not an image")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "File type not allowed");
    assert!(dir_is_empty(&app.path("uploads")));
    assert!(dir_is_empty(&app.path("static")));
    assert_eq!(app.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_undecodable_image_is_unprocessable() {
    let app = TestApp::new();

    let (status, _) = app
        .upload(r#"name="file"; filename="broken.png""#, b"these bytes are no png")
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.path("uploads/broken.png").exists());
    assert!(!app.path("static/broken.png").exists());
    assert_eq!(app.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_detector_failure_is_server_error() {
    let app = TestApp::build(None, true, None);

    let (status, body) = app
        .upload(
            r#"name="file"; filename="car.png""#,
            &encoded_image(ImageFormat::Png),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("onnx"), "internal detail leaked: {body}");
    assert!(!app.path("static/car.png").exists());
}

#[tokio::test]
async fn test_slow_detection_times_out() {
    let app = TestApp::build(
        Some(Duration::from_millis(500)),
        false,
        Some(Duration::from_millis(20)),
    );

    let (status, _) = app
        .upload(
            r#"name="file"; filename="car.png""#,
            &encoded_image(ImageFormat::Png),
        )
        .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

    // The abandoned task keeps running; let it finish before the tempdir goes away.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(app.calls.load(Ordering::SeqCst), 1);
    assert!(app.path("static/car.png").exists());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = TestApp::new();
    let payload = vec![0u8; MAX_UPLOAD_BYTES + 4096];

    let (status, _) = app
        .upload(r#"name="file"; filename="huge.png""#, &payload)
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!app.path("uploads/huge.png").exists());
}

/// Uploads with the same sanitised name share one slot; the later one replaces the earlier.
#[tokio::test]
async fn test_same_name_uploads_last_writer_wins() {
    let app = TestApp::new();
    let first = encoded_image(ImageFormat::Png);
    let second = {
        let image = RgbImage::from_pixel(16, 16, Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    };

    let (status, _) = app.upload(r#"name="file"; filename="car.png""#, &first).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.upload(r#"name="file"; filename="car.png""#, &second).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(std::fs::read(app.path("uploads/car.png")).unwrap(), second);
    let annotated = image::open(app.path("static/car.png")).unwrap();
    assert_eq!((annotated.width(), annotated.height()), (16, 16));
}
