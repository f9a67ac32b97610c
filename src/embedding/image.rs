//! Image embedding via a local ONNX vision encoder
//!
//! Runs a CLIP-style vision model with ONNX Runtime. The provider owns its
//! session exclusively: the model is loaded at construction and released
//! when the provider is dropped. There is no process-wide model registry.
//!
//! Output vectors are L2-normalized. A zero-norm raw feature vector is a
//! hard error; NaN/Inf is never passed downstream.

use anyhow::{anyhow, Context};
use image::imageops::FilterType;
use image::RgbImage;
use ort::{execution_providers::CPUExecutionProvider, session::Session, value::Tensor};
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info, warn};

use super::loader::ImageSource;
use super::traits::EmbeddingProvider;
use crate::config::ImageEmbeddingConfig;
use crate::error::{Error, Result};
use crate::types::{ContentRef, Embedding, Modality};

/// Channel statistics the CLIP preprocessor normalizes with
const CHANNEL_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const CHANNEL_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Image embedding provider backed by a local ONNX session
#[derive(Debug)]
pub struct ClipImageProvider {
    /// ONNX session (wrapped in a Mutex for interior mutability)
    session: Mutex<Session>,
    config: ImageEmbeddingConfig,
}

impl ClipImageProvider {
    /// Load the vision model and build the inference session
    pub fn new(config: &ImageEmbeddingConfig) -> Result<Self> {
        let model_path = config.model_path.as_ref().ok_or_else(|| {
            Error::ModelUnavailable("image model path not configured".to_string())
        })?;
        if !model_path.exists() {
            return Err(Error::ModelUnavailable(format!(
                "model weights not found at {}",
                model_path.display()
            )));
        }

        info!(
            model = %model_path.display(),
            dimensions = config.dimensions,
            "initializing image embedding provider"
        );

        let session = Self::build_session(config, model_path)?;

        Ok(Self {
            session: Mutex::new(session),
            config: config.clone(),
        })
    }

    /// Build the session with the configured execution provider
    fn build_session(config: &ImageEmbeddingConfig, model_path: &Path) -> Result<Session> {
        #[cfg(feature = "cuda")]
        if config.use_gpu {
            info!(
                device = config.gpu_device_id,
                "attempting CUDA GPU acceleration"
            );

            let cuda_provider = CUDAExecutionProvider::default()
                .with_device_id(config.gpu_device_id as i32)
                .build();

            // Try CUDA first, fall back to CPU
            let built = Session::builder()
                .and_then(|b| {
                    b.with_execution_providers([
                        cuda_provider,
                        CPUExecutionProvider::default().build(),
                    ])
                })
                .and_then(|b| b.with_intra_threads(config.num_threads))
                .and_then(|b| b.commit_from_file(model_path));

            match built {
                Ok(session) => {
                    info!("CUDA GPU acceleration enabled");
                    return Ok(session);
                }
                Err(e) => {
                    warn!("CUDA initialization failed, falling back to CPU: {e}");
                }
            }
        }

        #[cfg(not(feature = "cuda"))]
        if config.use_gpu {
            warn!("GPU acceleration requested but the 'cuda' feature is not enabled; using CPU");
        }

        Session::builder()
            .and_then(|b| b.with_execution_providers([CPUExecutionProvider::default().build()]))
            .and_then(|b| b.with_intra_threads(config.num_threads))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                Error::ModelUnavailable(format!(
                    "failed to load ONNX model {}: {e}",
                    model_path.display()
                ))
            })
    }

    fn embed_image(&self, source: &ImageSource) -> Result<Embedding> {
        let rgb = source.load()?;
        debug!(source = %source, "embedding image");

        let side = self.config.image_size as usize;
        let pixels = preprocess(&rgb, self.config.image_size);
        let shape = [1usize, 3, side, side];

        let features: Vec<f32> = {
            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![
                    "pixel_values" => Tensor::from_array((shape, pixels))
                        .context("failed to build input tensor")?
                ])
                .context("image embedding inference failed")?;

            if let Some(t) = outputs.get("image_embeds") {
                let arr = t
                    .try_extract_array::<f32>()
                    .context("failed to extract feature tensor")?;
                arr.iter().copied().collect()
            } else {
                let (_, v) = outputs
                    .iter()
                    .next()
                    .ok_or_else(|| anyhow!("no output tensor found"))?;
                let arr = v
                    .try_extract_array::<f32>()
                    .context("failed to extract feature tensor")?;
                arr.iter().copied().collect()
            }
        };

        if features.len() != self.config.dimensions {
            return Err(Error::Backend(anyhow!(
                "model produced {} dimensions, expected {}",
                features.len(),
                self.config.dimensions
            )));
        }

        let features: Vec<f64> = features.into_iter().map(f64::from).collect();
        l2_normalize(&features)
    }
}

impl EmbeddingProvider for ClipImageProvider {
    fn embed(&self, content: &ContentRef) -> Result<Embedding> {
        match content {
            ContentRef::Image(source) => self.embed_image(source),
            ContentRef::Text(_) => Err(Error::UnsupportedContentKind(
                "image provider cannot embed text content".to_string(),
            )),
        }
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn modality(&self) -> Modality {
        Modality::Image
    }

    fn name(&self) -> &str {
        "clip-onnx"
    }
}

/// Resize (shortest side), center-crop, and normalize into a CHW tensor
pub(crate) fn preprocess(image: &RgbImage, size: u32) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let scale = size as f32 / width.min(height) as f32;
    let new_width = ((width as f32 * scale).round() as u32).max(size);
    let new_height = ((height as f32 * scale).round() as u32).max(size);

    let resized = image::imageops::resize(image, new_width, new_height, FilterType::CatmullRom);
    let x0 = (new_width - size) / 2;
    let y0 = (new_height - size) / 2;
    let cropped = image::imageops::crop_imm(&resized, x0, y0, size, size).to_image();

    let side = size as usize;
    let mut data = vec![0.0f32; 3 * side * side];
    for y in 0..side {
        for x in 0..side {
            let pixel = cropped.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                let value = pixel.0[c] as f32 / 255.0;
                data[c * side * side + y * side + x] = (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
            }
        }
    }
    data
}

/// Normalize a feature vector to unit L2 length
///
/// There is deliberately no epsilon guard: a zero-norm (or non-finite)
/// vector fails instead of producing NaN/Inf.
pub(crate) fn l2_normalize(features: &[f64]) -> Result<Embedding> {
    let norm: f64 = features.iter().map(|x| x * x).sum::<f64>().sqrt();
    if !norm.is_normal() {
        return Err(Error::Backend(anyhow!(
            "cannot normalize feature vector with L2 norm {norm}"
        )));
    }
    Ok(features.iter().map(|x| x / norm).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_l2_normalize_unit_length() {
        let normalized = l2_normalize(&[3.0, 4.0]).unwrap();
        assert!((normalized[0] - 0.6).abs() < 1e-12);
        assert!((normalized[1] - 0.8).abs() < 1e-12);

        let norm: f64 = normalized.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_l2_normalize_rejects_zero_norm() {
        let err = l2_normalize(&[0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[test]
    fn test_l2_normalize_rejects_non_finite() {
        assert!(l2_normalize(&[f64::NAN, 1.0]).is_err());
        assert!(l2_normalize(&[f64::INFINITY, 1.0]).is_err());
    }

    #[test]
    fn test_preprocess_shape_and_layout() {
        let image = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
        let data = preprocess(&image, 16);
        assert_eq!(data.len(), 3 * 16 * 16);

        // A uniform image stays uniform per channel after resize + crop
        let side = 16 * 16;
        for c in 0..3 {
            let expected = (1.0 - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
            for i in 0..side {
                assert!(
                    (data[c * side + i] - expected).abs() < 1e-4,
                    "channel {c} offset {i}"
                );
            }
        }
    }

    #[test]
    fn test_preprocess_upscales_small_images() {
        let image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let data = preprocess(&image, 16);
        assert_eq!(data.len(), 3 * 16 * 16);
    }

    #[test]
    fn test_missing_model_is_model_unavailable() {
        let config = ImageEmbeddingConfig {
            model_path: Some("/no/such/model.onnx".into()),
            ..ImageEmbeddingConfig::default()
        };
        let err = ClipImageProvider::new(&config).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));

        let config = ImageEmbeddingConfig {
            model_path: None,
            ..ImageEmbeddingConfig::default()
        };
        let err = ClipImageProvider::new(&config).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }
}
