// SPDX-License-Identifier: MPL-2.0

//! Capture result handling
//!
//! Runs once per capture completion: validates the result, decodes the
//! delivered bytes, optionally runs the crystallize filter and hands the
//! final image to the photo library.

use super::processing::{CrystallizeFilter, ImageFilter, RenderContext};
use crate::backends::camera::types::PhotoCaptureResult;
use crate::constants::crystallize;
use crate::errors::PhotoError;
use crate::storage::PhotoLibrary;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Observer notified when a library write issued by the handler completes
pub type SaveObserver = Arc<dyn Fn(Result<PathBuf, PhotoError>) + Send + Sync>;

/// Turns capture completions into photo library writes
#[derive(Clone)]
pub struct CaptureResultHandler {
    filter: Arc<dyn ImageFilter>,
    context: RenderContext,
    library: Arc<dyn PhotoLibrary>,
    save_observer: Option<SaveObserver>,
}

impl CaptureResultHandler {
    /// Create a handler writing to `library` with the crystallize filter
    pub fn new(library: Arc<dyn PhotoLibrary>) -> Self {
        Self {
            filter: Arc::new(CrystallizeFilter::new()),
            context: RenderContext::new(),
            library,
            save_observer: None,
        }
    }

    /// Replace the effect filter
    pub fn with_filter(mut self, filter: Arc<dyn ImageFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Observe completion of every library write
    pub fn with_save_observer(mut self, observer: SaveObserver) -> Self {
        self.save_observer = Some(observer);
        self
    }

    /// Handle one capture completion
    ///
    /// `effect_enabled` is the effect flag as read when the completion was
    /// received. On `Ok(())` exactly one library write has been issued; on
    /// any error none has.
    pub fn handle(
        &self,
        result: PhotoCaptureResult,
        effect_enabled: bool,
    ) -> Result<(), PhotoError> {
        let photo = match result {
            Ok(photo) => photo,
            Err(e) => {
                error!(error = %e, "Error capturing photo");
                return Err(PhotoError::CaptureFailed(e.to_string()));
            }
        };

        let Some(data) = photo.file_data_representation() else {
            error!(request = %photo.resolved.id, "Capture delivered no image data");
            return Err(PhotoError::MissingImageData);
        };

        let image = if effect_enabled {
            self.filtered_image(data)?
        } else {
            match decode(data) {
                Ok(image) => image,
                Err(e) => {
                    // Undecodable unfiltered capture: skip the save quietly
                    debug!(request = %photo.resolved.id, error = %e, "Skipping save");
                    return Err(e);
                }
            }
        };

        info!(
            request = %photo.resolved.id,
            effect = effect_enabled,
            width = image.width(),
            height = image.height(),
            "Saving captured photo"
        );

        let completion = self.save_observer.clone().map(|observer| {
            Box::new(move |result: Result<PathBuf, PhotoError>| observer(result))
                as crate::storage::WriteCompletion
        });
        self.library.write(image, completion);
        Ok(())
    }

    /// Decode, filter once, render
    fn filtered_image(&self, data: &[u8]) -> Result<RgbImage, PhotoError> {
        let input = image::load_from_memory(data).map_err(|e| {
            error!(error = %e, "Failed to decode capture for filtering");
            PhotoError::DecodeFailed(e.to_string())
        })?;

        let output = self
            .filter
            .apply(&input, crystallize::RADIUS)
            .ok_or_else(|| {
                error!(filter = self.filter.name(), "Filter produced no output");
                PhotoError::FilterFailed(self.filter.name().to_string())
            })?;

        self.context.render(&output).inspect_err(|e| {
            error!(error = %e, "Failed to render filtered photo");
        })
    }
}

/// Decode encoded bytes straight into a displayable image
fn decode(data: &[u8]) -> Result<RgbImage, PhotoError> {
    image::load_from_memory(data)
        .map(|image| image.to_rgb8())
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{BackendError, CapturedPhoto, ResolvedPhotoSettings};
    use crate::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
    use crate::storage::WriteCompletion;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLibrary {
        writes: Mutex<Vec<(u32, u32)>>,
    }

    impl PhotoLibrary for RecordingLibrary {
        fn write(&self, image: RgbImage, on_complete: Option<WriteCompletion>) {
            self.writes.lock().unwrap().push(image.dimensions());
            if let Some(on_complete) = on_complete {
                on_complete(Ok(PathBuf::from("/library/IMG.jpg")));
            }
        }
    }

    fn photo(data: Option<Vec<u8>>) -> PhotoCaptureResult {
        Ok(CapturedPhoto {
            data,
            resolved: ResolvedPhotoSettings {
                id: uuid::Uuid::new_v4(),
                width: 24,
                height: 16,
                flash_fired: false,
                stabilized: true,
            },
        })
    }

    fn jpeg() -> Vec<u8> {
        encode_jpeg(
            &RgbImage::from_pixel(24, 16, image::Rgb([90, 60, 30])),
            EncodingQuality::High,
        )
        .unwrap()
    }

    #[test]
    fn test_unfiltered_capture_is_saved() {
        let library = Arc::new(RecordingLibrary::default());
        let handler = CaptureResultHandler::new(library.clone());

        handler.handle(photo(Some(jpeg())), false).unwrap();
        assert_eq!(*library.writes.lock().unwrap(), vec![(24, 16)]);
    }

    #[test]
    fn test_filtered_capture_is_saved() {
        let library = Arc::new(RecordingLibrary::default());
        let handler = CaptureResultHandler::new(library.clone());

        handler.handle(photo(Some(jpeg())), true).unwrap();
        assert_eq!(*library.writes.lock().unwrap(), vec![(24, 16)]);
    }

    #[test]
    fn test_error_and_missing_data_skip_save() {
        let library = Arc::new(RecordingLibrary::default());
        let handler = CaptureResultHandler::new(library.clone());

        let err = handler
            .handle(Err(BackendError::CaptureFailed("sensor".into())), false)
            .unwrap_err();
        assert!(matches!(err, PhotoError::CaptureFailed(_)));
        assert_eq!(
            handler.handle(photo(None), true).unwrap_err(),
            PhotoError::MissingImageData
        );
        assert!(library.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_undecodable_bytes_skip_save() {
        let library = Arc::new(RecordingLibrary::default());
        let handler = CaptureResultHandler::new(library.clone());

        for effect in [false, true] {
            let err = handler.handle(photo(Some(vec![1, 2, 3])), effect).unwrap_err();
            assert!(matches!(err, PhotoError::DecodeFailed(_)));
        }
        assert!(library.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_save_observer_sees_write_result() {
        let library = Arc::new(RecordingLibrary::default());
        let saved = Arc::new(Mutex::new(Vec::new()));
        let saved_clone = Arc::clone(&saved);
        let handler = CaptureResultHandler::new(library).with_save_observer(Arc::new(
            move |result: Result<PathBuf, PhotoError>| saved_clone.lock().unwrap().push(result),
        ));

        handler.handle(photo(Some(jpeg())), false).unwrap();
        assert_eq!(
            *saved.lock().unwrap(),
            vec![Ok(PathBuf::from("/library/IMG.jpg"))]
        );
    }
}
