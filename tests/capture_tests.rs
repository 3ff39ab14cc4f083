// SPDX-License-Identifier: MPL-2.0

//! Integration tests for capture result handling

use image::{DynamicImage, RgbImage};
use shuttercam::PhotoError;
use shuttercam::backends::camera::{
    BackendError, CapturedPhoto, PhotoCaptureResult, ResolvedPhotoSettings,
};
use shuttercam::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
use shuttercam::pipelines::photo::{CaptureResultHandler, ImageFilter};
use shuttercam::storage::{PhotoLibrary, WriteCompletion};
use std::sync::{Arc, Mutex};

/// Library that records the images it is asked to write
#[derive(Default)]
struct RecordingLibrary {
    writes: Mutex<Vec<RgbImage>>,
}

impl PhotoLibrary for RecordingLibrary {
    fn write(&self, image: RgbImage, _on_complete: Option<WriteCompletion>) {
        self.writes.lock().unwrap().push(image);
    }
}

/// Filter that records every call and inverts the image
///
/// `fail` makes it produce nothing, `empty` makes it produce a 0x0 image.
#[derive(Default)]
struct RecordingFilter {
    radii: Mutex<Vec<f32>>,
    fail: bool,
    empty: bool,
}

impl ImageFilter for RecordingFilter {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn apply(&self, input: &DynamicImage, radius: f32) -> Option<DynamicImage> {
        self.radii.lock().unwrap().push(radius);
        if self.fail {
            return None;
        }
        if self.empty {
            return Some(DynamicImage::new_rgb8(0, 0));
        }
        let mut output = input.clone();
        output.invert();
        Some(output)
    }
}

fn setup(fail: bool) -> (CaptureResultHandler, Arc<RecordingLibrary>, Arc<RecordingFilter>) {
    setup_with(RecordingFilter {
        fail,
        ..Default::default()
    })
}

fn setup_with(
    filter: RecordingFilter,
) -> (CaptureResultHandler, Arc<RecordingLibrary>, Arc<RecordingFilter>) {
    let library = Arc::new(RecordingLibrary::default());
    let filter = Arc::new(filter);
    let handler = CaptureResultHandler::new(library.clone()).with_filter(filter.clone());
    (handler, library, filter)
}

fn captured(data: Option<Vec<u8>>) -> PhotoCaptureResult {
    Ok(CapturedPhoto {
        data,
        resolved: ResolvedPhotoSettings {
            id: uuid::Uuid::new_v4(),
            width: 32,
            height: 20,
            flash_fired: false,
            stabilized: true,
        },
    })
}

fn dark_jpeg() -> Vec<u8> {
    encode_jpeg(
        &RgbImage::from_pixel(32, 20, image::Rgb([20, 20, 20])),
        EncodingQuality::Maximum,
    )
    .unwrap()
}

#[test]
fn test_effect_off_writes_decoded_image_once() {
    let (handler, library, filter) = setup(false);

    handler.handle(captured(Some(dark_jpeg())), false).unwrap();

    let writes = library.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].dimensions(), (32, 20));
    assert!(writes[0].pixels().all(|p| p.0[0] < 60));
    assert!(filter.radii.lock().unwrap().is_empty());
}

#[test]
fn test_effect_on_filters_once_with_radius_30() {
    let (handler, library, filter) = setup(false);

    handler.handle(captured(Some(dark_jpeg())), true).unwrap();

    assert_eq!(*filter.radii.lock().unwrap(), vec![30.0]);
    let writes = library.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    // The written image is the filter output, not the capture
    assert!(writes[0].pixels().all(|p| p.0[0] > 190));
}

#[test]
fn test_filter_without_output_skips_save() {
    let (handler, library, filter) = setup(true);

    let err = handler.handle(captured(Some(dark_jpeg())), true).unwrap_err();

    assert_eq!(err, PhotoError::FilterFailed("recording".to_string()));
    assert_eq!(filter.radii.lock().unwrap().len(), 1);
    assert!(library.writes.lock().unwrap().is_empty());
}

#[test]
fn test_unrenderable_filter_output_skips_save() {
    let (handler, library, filter) = setup_with(RecordingFilter {
        empty: true,
        ..Default::default()
    });

    let err = handler.handle(captured(Some(dark_jpeg())), true).unwrap_err();

    assert!(matches!(err, PhotoError::RenderFailed(_)));
    assert_eq!(*filter.radii.lock().unwrap(), vec![30.0]);
    assert!(library.writes.lock().unwrap().is_empty());
}

#[test]
fn test_capture_error_writes_nothing() {
    let (handler, library, filter) = setup(false);

    for effect in [false, true] {
        let err = handler
            .handle(Err(BackendError::DeviceBusy), effect)
            .unwrap_err();
        assert!(matches!(err, PhotoError::CaptureFailed(_)));
    }

    assert!(library.writes.lock().unwrap().is_empty());
    assert!(filter.radii.lock().unwrap().is_empty());
}

#[test]
fn test_missing_bytes_write_nothing() {
    let (handler, library, filter) = setup(false);

    for effect in [false, true] {
        assert_eq!(
            handler.handle(captured(None), effect).unwrap_err(),
            PhotoError::MissingImageData
        );
    }

    assert!(library.writes.lock().unwrap().is_empty());
    assert!(filter.radii.lock().unwrap().is_empty());
}

#[test]
fn test_builtin_crystallize_output_is_saved() {
    let library = Arc::new(RecordingLibrary::default());
    let handler = CaptureResultHandler::new(library.clone());

    handler.handle(captured(Some(dark_jpeg())), true).unwrap();
    assert_eq!(library.writes.lock().unwrap()[0].dimensions(), (32, 20));
}
