use std::io::Cursor;

use anyhow::Context;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::{info, warn};

use crate::processing::segmentation::{self, SegmentationParams};

const SERVICE_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";
const MULTIPART_BOUNDARY: &str = "photosheet-multipart-boundary";
const UPLOAD_JPEG_QUALITY: u8 = 90;

/// Which path produced the processed image, surfaced to the caller for
/// status messaging. The compositor does not care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMethod {
    Service,
    Fallback,
}

impl RemovalMethod {
    pub fn label(self) -> &'static str {
        match self {
            RemovalMethod::Service => "remove.bg service",
            RemovalMethod::Fallback => "built-in removal",
        }
    }
}

/// Removes the background from `img`, preferring the external service when a
/// usable credential exists and falling back to the local algorithm on any
/// service failure: HTTP error, transport error, or an undecodable payload
/// all take the same deterministic branch. The request is never retried.
pub fn remove_background(
    img: &DynamicImage,
    api_key: Option<&str>,
    params: &SegmentationParams,
) -> anyhow::Result<(DynamicImage, RemovalMethod)> {
    if let Some(key) = usable_key(api_key) {
        match call_service(img, key) {
            Ok(processed) => {
                info!("background removed by the external service");
                return Ok((processed, RemovalMethod::Service));
            }
            Err(err) => {
                warn!("segmentation service unavailable, using built-in removal: {err:#}");
            }
        }
    }
    let out = segmentation::remove_background(img, params)?;
    Ok((DynamicImage::ImageRgba8(out), RemovalMethod::Fallback))
}

/// A key is usable when it is present, non-empty, and not the placeholder
/// left in a config template.
fn usable_key(api_key: Option<&str>) -> Option<&str> {
    let key = api_key?.trim();
    if key.is_empty() || key.eq_ignore_ascii_case("your_api_key") {
        return None;
    }
    Some(key)
}

fn call_service(img: &DynamicImage, api_key: &str) -> anyhow::Result<DynamicImage> {
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), UPLOAD_JPEG_QUALITY);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .context("encoding upload")?;

    let body = multipart_body(&jpeg);
    let mut response = ureq::post(SERVICE_ENDPOINT)
        .header("X-Api-Key", api_key)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}").as_str(),
        )
        .send(&body[..])
        .context("segmentation service request")?;

    let payload = response
        .body_mut()
        .read_to_vec()
        .context("reading service response")?;
    image::load_from_memory(&payload).context("decoding service response")
}

/// multipart/form-data with the fields the remove.bg API expects:
/// `image_file` (the JPEG payload) and `size=auto`.
fn multipart_body(jpeg: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(jpeg.len() + 512);
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"image_file\"; filename=\"photo.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(jpeg);
    body.extend_from_slice(
        format!(
            "\r\n--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"size\"\r\n\r\nauto\r\n\
             --{MULTIPART_BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    body
}
