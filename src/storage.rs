// SPDX-License-Identifier: MPL-2.0

//! Photo library storage
//!
//! The photo library accepts displayable images and writes them in the
//! background. Callers never wait on the write; an optional completion
//! callback reports where the photo ended up.

use crate::errors::PhotoError;
use crate::pipelines::photo::PhotoEncoder;
use image::RgbImage;
use std::path::PathBuf;
use tokio::runtime::Handle;
use tracing::{error, info};

/// Completion callback for a library write
pub type WriteCompletion = Box<dyn FnOnce(Result<PathBuf, PhotoError>) + Send + 'static>;

/// Photo library collaborator
pub trait PhotoLibrary: Send + Sync {
    /// Hand an image to the library, fire-and-forget
    ///
    /// `on_complete`, when given, is invoked once the write finished or failed.
    fn write(&self, image: RgbImage, on_complete: Option<WriteCompletion>);
}

/// Photo library backed by a directory (by default `~/Pictures/<folder>`)
pub struct PicturesLibrary {
    directory: PathBuf,
    encoder: PhotoEncoder,
    runtime: Handle,
}

impl PicturesLibrary {
    pub fn new(directory: PathBuf, encoder: PhotoEncoder, runtime: Handle) -> Self {
        Self {
            directory,
            encoder,
            runtime,
        }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }
}

impl PhotoLibrary for PicturesLibrary {
    fn write(&self, image: RgbImage, on_complete: Option<WriteCompletion>) {
        let encoder = self.encoder;
        let directory = self.directory.clone();

        info!(
            width = image.width(),
            height = image.height(),
            dir = %directory.display(),
            "Writing photo to library"
        );

        self.runtime.spawn(async move {
            let result = encoder.encode_and_save(image, directory).await;
            if let Err(e) = &result {
                error!(error = %e, "Failed to write photo to library");
            }
            if let Some(on_complete) = on_complete {
                on_complete(result);
            }
        });
    }
}

/// Get the directory photos are saved to
///
/// Falls back to the home directory, then the working directory, when the
/// platform has no Pictures directory.
pub fn get_photo_directory(folder: &str) -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(folder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_directory_ends_with_folder() {
        assert!(get_photo_directory("ShutterCam").ends_with("ShutterCam"));
    }

    #[tokio::test]
    async fn test_library_write_reports_saved_path() {
        let dir = std::env::temp_dir().join(format!("shuttercam-lib-{}", uuid::Uuid::new_v4()));
        let library = PicturesLibrary::new(dir.clone(), PhotoEncoder::new(), Handle::current());

        let (tx, rx) = tokio::sync::oneshot::channel();
        library.write(
            RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3])),
            Some(Box::new(move |result| {
                let _ = tx.send(result);
            })),
        );

        let path = rx.await.unwrap().unwrap();
        assert!(path.starts_with(&dir));
        assert_eq!(path.extension().unwrap(), "jpg");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
