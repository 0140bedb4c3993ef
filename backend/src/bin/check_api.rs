use std::env;
use std::path::Path;
use std::process::ExitCode;

use shared::PredictionResponse;

/// Posts a local image to a running service instance and prints the decoded
/// prediction record.
#[actix_web::main]
async fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(image_path) = args.next() else {
        eprintln!("usage: check-api <image-path> [url]");
        return ExitCode::FAILURE;
    };
    let url = args
        .next()
        .unwrap_or_else(|| "http://127.0.0.1:8000/predict".to_string());

    let path = Path::new(&image_path);
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: could not read {image_path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    println!("Sending request to {url}...");
    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = match reqwest::Client::new().post(&url).multipart(form).send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Exception: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Status Code: {}", response.status());
    match response.json::<PredictionResponse>().await {
        Ok(record) => {
            println!(
                "{} -> class {} ({}), confidence {:.4}",
                record.filename,
                record.prediction_class,
                record.prediction_label,
                record.confidence
            );
            if let Some(warning) = record.warning {
                println!("Warning: {warning}");
            }
            if let Some(error) = record.error {
                println!("Error: {error}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error Response: {e}");
            ExitCode::FAILURE
        }
    }
}
