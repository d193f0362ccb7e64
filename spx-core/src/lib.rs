pub mod calibration;
pub mod error;
pub mod image;
pub mod range;
pub mod sensor;

pub use calibration::{DistortionMap, RectifiedImage, Rectifier, RectifyStats};
pub use error::{CalibrationError, InputError, Result, SpxError};
pub use image::{FrameStats, RawImage};
pub use range::{Distance, RangeEstimator, RangePolicy};
pub use sensor::{Frame, FrameProcessor, FrameSource, ProcessingContext, VecFrameSource};
