//! The pixel-work seam of the image tools.
//!
//! `optimize` and `combine-spread` only ever talk to [`ImageBackend`]; the
//! shipped implementation is [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{CombineParams, CoverParams, ResizeParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// `Sync` so one backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Read the size without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Scale to exact dimensions, optionally sharpen, encode.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Cut a fixed-size cover out of the source.
    fn cover(&self, params: &CoverParams) -> Result<(), BackendError>;

    /// Put two pages side by side on a white canvas.
    fn combine(&self, params: &CombineParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{Anchor, CropRegion, Quality, Sharpening};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every call instead of touching pixels.
    ///
    /// `identify` answers from `dimensions` by file name and fails for unknown
    /// files. Operations on a source listed in `failing` error out unrecorded.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: HashMap<String, Dimensions>,
        pub failing: Vec<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
            sharpening: Option<(f32, i32)>,
        },
        Cover {
            source: String,
            output: String,
            width: u32,
            height: u32,
            region: CropRegion,
            quality: u32,
        },
        Combine {
            left: String,
            right: String,
            output: String,
            left_width: u32,
            right_width: u32,
            height: u32,
            quality: u32,
        },
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(entries: &[(&str, u32, u32)]) -> Self {
            Self {
                dimensions: entries
                    .iter()
                    .map(|(name, width, height)| {
                        (
                            name.to_string(),
                            Dimensions {
                                width: *width,
                                height: *height,
                            },
                        )
                    })
                    .collect(),
                ..Self::default()
            }
        }

        pub fn failing_on(mut self, name: &str) -> Self {
            self.failing.push(name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn check(&self, source: &Path) -> Result<(), BackendError> {
            if self.failing.contains(&file_name(source)) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure for {}",
                    source.display()
                )));
            }
            Ok(())
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.dimensions
                .get(&file_name(path))
                .copied()
                .ok_or_else(|| BackendError::ProcessingFailed(format!("no size for {}", path.display())))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.check(&params.source)?;
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                sharpening: params.sharpening.map(|s| (s.sigma, s.threshold)),
            });
            Ok(())
        }

        fn cover(&self, params: &CoverParams) -> Result<(), BackendError> {
            self.check(&params.source)?;
            self.operations.lock().unwrap().push(RecordedOp::Cover {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                region: params.region,
                quality: params.quality.value(),
            });
            Ok(())
        }

        fn combine(&self, params: &CombineParams) -> Result<(), BackendError> {
            self.check(&params.left)?;
            self.check(&params.right)?;
            self.operations.lock().unwrap().push(RecordedOp::Combine {
                left: params.left.to_string_lossy().to_string(),
                right: params.right.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                left_width: params.left_width,
                right_width: params.right_width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(())
        }
    }

    #[test]
    fn mock_identify_matches_by_file_name() {
        let backend = MockBackend::with_dimensions(&[("cover.jpg", 800, 600)]);

        let dims = backend.identify(Path::new("/press/images/src/cover.jpg")).unwrap();
        assert_eq!(dims.as_tuple(), (800, 600));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify("/press/images/src/cover.jpg".to_string())]
        );
    }

    #[test]
    fn mock_identify_unknown_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/x.jpg")).is_err());
    }

    #[test]
    fn mock_records_resize_with_sharpening() {
        let backend = MockBackend::new();

        backend
            .resize(&ResizeParams {
                source: "/source.jpg".into(),
                output: "/output.avif".into(),
                width: 2400,
                height: 1600,
                quality: Quality::new(90),
                sharpening: Some(Sharpening::light()),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 2400,
                height: 1600,
                quality: 90,
                sharpening: Some((0.5, 0)),
                ..
            }
        ));
    }

    #[test]
    fn mock_records_cover() {
        let backend = MockBackend::new();
        backend
            .cover(&CoverParams {
                source: "/source.jpg".into(),
                output: "/cover.avif".into(),
                width: 1200,
                height: 675,
                region: CropRegion::Fill(Anchor::Top),
                quality: Quality::new(85),
            })
            .unwrap();
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Cover {
                region: CropRegion::Fill(Anchor::Top),
                quality: 85,
                ..
            }
        ));
    }

    #[test]
    fn mock_failing_source_errors_without_recording() {
        let backend = MockBackend::new().failing_on("bad.jpg");
        let result = backend.resize(&ResizeParams {
            source: "/src/bad.jpg".into(),
            output: "/out.avif".into(),
            width: 1,
            height: 1,
            quality: Quality::default(),
            sharpening: None,
        });
        assert!(result.is_err());
        assert!(backend.get_operations().is_empty());
    }
}
