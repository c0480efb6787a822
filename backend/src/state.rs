use image::RgbImage;
use shared::ClassificationResult;
use std::sync::Arc;

use crate::cache::ClassificationCache;
use crate::catalog::Catalog;
use crate::classifier::{BrightnessClassifier, Classify, ClassifyError, QuizClassifier, SkinNetwork};
use crate::config::AppConfig;
use crate::recommender::ProductRecommender;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Everything the request handlers share. Only the cache is mutable.
pub struct AppState {
    pub brightness: BrightnessClassifier,
    pub quiz: QuizClassifier,
    pub network: Option<SkinNetwork>,
    pub recommender: ProductRecommender,
    pub cache: ClassificationCache,
}

impl AppState {
    pub fn new(config: &AppConfig, catalog: Arc<Catalog>, network: Option<SkinNetwork>) -> Self {
        Self {
            brightness: BrightnessClassifier::new(config.brightness.clone()),
            quiz: QuizClassifier::new(config.quiz.clone()),
            network,
            recommender: ProductRecommender::new(catalog, config.recommendations.limit),
            cache: ClassificationCache::new(config.cache.capacity),
        }
    }

    /// Runs every image strategy available, model first. The upload is only
    /// decoded when some strategy misses the cache.
    pub fn classify_image(
        &self,
        image_data: &[u8],
    ) -> Result<Vec<ClassificationResult>, ImageError> {
        let image_hash = ClassificationCache::calculate_image_hash(image_data);
        let mut decoded = None;
        let mut results = Vec::with_capacity(2);

        if let Some(network) = &self.network {
            let key = ClassificationCache::cache_key("model", &image_hash);
            results.push(self.cached(key, &mut decoded, image_data, |img| network.classify(img))?);
        }

        let key = ClassificationCache::cache_key("heuristic", &image_hash);
        results.push(self.cached(key, &mut decoded, image_data, |img| {
            self.brightness.classify(img)
        })?);

        Ok(results)
    }

    fn cached<F>(
        &self,
        key: String,
        decoded: &mut Option<RgbImage>,
        image_data: &[u8],
        run: F,
    ) -> Result<ClassificationResult, ImageError>
    where
        F: FnOnce(&RgbImage) -> Result<ClassificationResult, ClassifyError>,
    {
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("Cache hit for {}", key);
            return Ok(hit);
        }
        if decoded.is_none() {
            *decoded = Some(decode_image(image_data)?);
        }
        let Some(image) = decoded.as_ref() else {
            return Err(ImageError::Decode("image unavailable".to_string()));
        };
        let result = run(image)?;
        self.cache.insert(key, result);
        Ok(result)
    }
}

pub fn decode_image(image_data: &[u8]) -> Result<RgbImage, ImageError> {
    let image =
        image::load_from_memory(image_data).map_err(|e| ImageError::Decode(e.to_string()))?;
    Ok(image.to_rgb8())
}
