use axum::response::Html;

const STYLE: &str = r#"
    <style>
        body {
            margin: auto;
            font-family: -apple-system, BlinkMacSystemFont, sans-serif;
            text-align: center;
            background: linear-gradient(315deg, #65005e 3%, #3c84ce 38%, #30eee2 68%, #ff1919 98%);
            background-size: 400% 400%;
            background-attachment: fixed;
            animation: gradient 15s ease infinite;
        }
        @keyframes gradient {
            0% { background-position: 0% 0%; }
            50% { background-position: 100% 100%; }
            100% { background-position: 0% 0%; }
        }
        h1 {
            font-size: 40px;
            background: white;
            padding: 20px;
            margin: 40px 50px;
            border-radius: 10px;
        }
        form { display: flex; align-items: center; justify-content: center; }
        form input { font-size: 20px; border: none; outline: none; }
        .result-info, .image-container { margin: 20px; }
        .image-container img { width: 50%; border-radius: 10px; }
    </style>"#;

pub fn index() -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Vehicle Detection</title>{STYLE}
</head>
<body>
    <h1>Upload an Image for Vehicle Detection</h1>
    <form action="/" method="post" enctype="multipart/form-data">
        <input type="file" name="file" accept="image/*">
        <input type="submit" value="Upload">
    </form>
</body>
</html>
"#
    ))
}

/// What the result page shows for one processed upload.
#[derive(Debug, Clone)]
pub struct ResultView {
    pub count: usize,
    pub duration_secs: u64,
    /// File name under `/static`, already reduced by `secure_filename`
    pub image_name: String,
}

impl ResultView {
    pub fn render(&self) -> Html<String> {
        let ResultView {
            count,
            duration_secs,
            image_name,
        } = self;

        Html(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Detection Result</title>{STYLE}
</head>
<body>
    <h1>Detection Result</h1>
    <div class="result-info">
        <p>Number of vehicles detected: {count}</p>
        <p>Detection time: {duration_secs} seconds</p>
    </div>
    <div class="image-container">
        <img src="/static/{image_name}" alt="Annotated {image_name}">
    </div>
    <form action="/" method="get">
        <input type="submit" value="Upload Another Image">
    </form>
</body>
</html>
"#
        ))
    }
}
