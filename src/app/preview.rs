// SPDX-License-Identifier: MPL-2.0

//! Preview layer
//!
//! Renders the live feed at the full screen bounds with aspect-fill gravity
//! and keeps the preview connection's orientation in step with the
//! interface orientation.

use crate::backends::camera::types::CameraFrame;
use tracing::debug;

/// Screen bounds in display units (terminal cells, pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Current interface orientation as reported by the UI surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceOrientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl InterfaceOrientation {
    /// Preview orientation for this interface orientation
    ///
    /// `None` for orientations without a counterpart; callers keep the
    /// current preview orientation in that case.
    pub fn video_orientation(self) -> Option<VideoOrientation> {
        match self {
            InterfaceOrientation::Portrait => Some(VideoOrientation::Portrait),
            InterfaceOrientation::PortraitUpsideDown => Some(VideoOrientation::PortraitUpsideDown),
            InterfaceOrientation::LandscapeLeft => Some(VideoOrientation::LandscapeLeft),
            InterfaceOrientation::LandscapeRight => Some(VideoOrientation::LandscapeRight),
            InterfaceOrientation::Unknown => None,
        }
    }

    /// Orientation implied by the screen's aspect ratio
    pub fn from_bounds(bounds: Bounds) -> Self {
        if bounds.width == 0 || bounds.height == 0 {
            InterfaceOrientation::Unknown
        } else if bounds.width >= bounds.height {
            InterfaceOrientation::LandscapeLeft
        } else {
            InterfaceOrientation::Portrait
        }
    }
}

/// Orientation applied to the preview stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl std::fmt::Display for VideoOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoOrientation::Portrait => write!(f, "portrait"),
            VideoOrientation::PortraitUpsideDown => write!(f, "portrait (upside down)"),
            VideoOrientation::LandscapeLeft => write!(f, "landscape left"),
            VideoOrientation::LandscapeRight => write!(f, "landscape right"),
        }
    }
}

/// How the feed is scaled into the layer bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoGravity {
    /// Preserve aspect ratio and fill the bounds, cropping the overflow
    #[default]
    ResizeAspectFill,
}

/// Connection between the preview layer and the session's feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConnection {
    pub supports_video_orientation: bool,
    pub video_orientation: VideoOrientation,
}

impl PreviewConnection {
    pub fn new(supports_video_orientation: bool) -> Self {
        Self {
            supports_video_orientation,
            video_orientation: VideoOrientation::default(),
        }
    }
}

/// Region of a frame shown by the layer, in frame pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Visual surface displaying the live feed
#[derive(Debug, Default)]
pub struct PreviewLayer {
    bounds: Bounds,
    gravity: VideoGravity,
    connection: Option<PreviewConnection>,
    frame: Option<CameraFrame>,
}

impl PreviewLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the layer to a session's feed at the given bounds
    pub fn attach(&mut self, connection: PreviewConnection, bounds: Bounds) {
        debug!(
            width = bounds.width,
            height = bounds.height,
            supports_orientation = connection.supports_video_orientation,
            "Preview layer attached"
        );
        self.connection = Some(connection);
        self.bounds = bounds;
        self.gravity = VideoGravity::ResizeAspectFill;
    }

    /// Layout pass: resize to `bounds` and follow the interface orientation
    ///
    /// Orientation is only touched when the layer has a connection that
    /// supports it, and only for recognised orientations.
    pub fn layout(&mut self, bounds: Bounds, orientation: InterfaceOrientation) {
        self.bounds = bounds;

        if let Some(connection) = self.connection.as_mut()
            && connection.supports_video_orientation
            && let Some(video_orientation) = orientation.video_orientation()
            && connection.video_orientation != video_orientation
        {
            debug!(
                from = %connection.video_orientation,
                to = %video_orientation,
                "Preview orientation changed"
            );
            connection.video_orientation = video_orientation;
        }
    }

    /// Replace the displayed frame with the newest one from the feed
    pub fn push_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }

    pub fn latest_frame(&self) -> Option<&CameraFrame> {
        self.frame.as_ref()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn gravity(&self) -> VideoGravity {
        self.gravity
    }

    pub fn connection(&self) -> Option<&PreviewConnection> {
        self.connection.as_ref()
    }

    /// Part of a `frame_width`×`frame_height` frame visible in a viewport of
    /// the given aspect ratio (width / height) under aspect-fill gravity
    pub fn source_rect(
        &self,
        frame_width: u32,
        frame_height: u32,
        viewport_aspect: f64,
    ) -> SourceRect {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        if fw == 0.0 || fh == 0.0 || !viewport_aspect.is_finite() || viewport_aspect <= 0.0 {
            return SourceRect {
                x: 0.0,
                y: 0.0,
                width: fw,
                height: fh,
            };
        }

        match self.gravity {
            VideoGravity::ResizeAspectFill => {
                if fw / fh > viewport_aspect {
                    // Frame is wider: crop left and right
                    let width = fh * viewport_aspect;
                    SourceRect {
                        x: (fw - width) / 2.0,
                        y: 0.0,
                        width,
                        height: fh,
                    }
                } else {
                    let height = fw / viewport_aspect;
                    SourceRect {
                        x: 0.0,
                        y: (fh - height) / 2.0,
                        width: fw,
                        height,
                    }
                }
            }
        }
    }
}
