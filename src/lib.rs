//! Client side of an image classification service.
//!
//! An image goes through two steps:
//!
//! 1. [`ImageIntake`] takes a user supplied file, ignores anything that is not an
//!    image and encodes the rest as a base64 data URL ([`EncodedImage`]).
//! 2. [`ClassificationClient`] posts that data URL to the remote service and
//!    returns the [`Prediction`]s it answers with.
//!
//! [`Session`] ties both together the way an interactive front end does, and
//! [`render`] turns predictions into text.

mod client;
mod image;
mod intake;
pub mod render;
mod session;

pub use client::{
    CLASSIFY_PATH, ClassificationClient, ClassificationRequest, ClassificationResponse,
    ClassifyError, ClientConfig, ConfigError, GENERIC_FAILURE, Prediction, SERVICE_KEY_ENV,
    SERVICE_URL_ENV,
};
pub use image::{
    DATA_URL_IMAGE_PREFIX, EncodedImage, FileSource, ImageFile, IntakeError,
    is_image_media_type, media_type_from_path,
};
pub use intake::ImageIntake;
pub use session::{Notification, NotificationKind, Notifier, Session};
