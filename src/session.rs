use crate::{
    client::{ClassificationClient, Prediction},
    image::EncodedImage,
    intake::ImageIntake,
};

/// Whether a notification reports success or failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A message meant for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Marks a session busy and disables its intake until dropped.
struct BusyGuard<'a> {
    intake: &'a mut ImageIntake,
    analyzing: &'a mut bool,
}

impl<'a> BusyGuard<'a> {
    fn enter(intake: &'a mut ImageIntake, analyzing: &'a mut bool) -> Self {
        *analyzing = true;
        intake.set_disabled(true);
        Self { intake, analyzing }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.intake.set_disabled(false);
        *self.analyzing = false;
    }
}

/// Surfaces notifications to the user.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

impl<F: Fn(Notification)> Notifier for F {
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Presentation state of one user session: the selected image, the last
/// predictions and whether a classification is running.
///
/// Failures never leave the session; they are reported through the
/// [`Notifier`] and the selected image is kept so the user can try again.
pub struct Session<N: Notifier> {
    client: ClassificationClient,
    notifier: N,
    intake: ImageIntake,
    image: Option<EncodedImage>,
    predictions: Vec<Prediction>,
    analyzing: bool,
}

impl<N: Notifier> Session<N> {
    /// Creates a session with no image, reporting through `notifier`.
    pub fn new(client: ClassificationClient, notifier: N) -> Self {
        Self {
            client,
            notifier,
            intake: ImageIntake::new(),
            image: None,
            predictions: Vec::new(),
            analyzing: false,
        }
    }

    /// The intake feeding this session.
    pub fn intake(&self) -> &ImageIntake {
        &self.intake
    }

    /// Mutable access to the intake. Drop and picker input go through here.
    pub fn intake_mut(&mut self) -> &mut ImageIntake {
        &mut self.intake
    }

    /// The image the next [`analyze`](Self::analyze) classifies.
    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    /// Predictions of the last successful classification.
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Whether a classification is in flight.
    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    /// Makes `image` the selected image and drops any earlier predictions.
    pub fn select_image(&mut self, image: EncodedImage) {
        self.image = Some(image);
        self.predictions.clear();
    }

    /// Clears the preview held by the intake.
    ///
    /// The session keeps its own copy of the last selection, so a following
    /// [`analyze`](Self::analyze) still classifies it.
    pub fn clear_preview(&mut self) {
        self.intake.clear();
    }

    /// Forwards images finished by the intake without blocking.
    ///
    /// Returns whether a new image got selected.
    pub fn poll_intake(&mut self) -> bool {
        match self.intake.poll() {
            Some(image) => {
                self.select_image(image);
                true
            }
            None => false,
        }
    }

    /// Waits for pending intake reads and forwards the result.
    ///
    /// Returns whether a new image got selected.
    pub fn wait_intake(&mut self) -> bool {
        match self.intake.wait() {
            Some(image) => {
                self.select_image(image);
                true
            }
            None => false,
        }
    }

    /// Classifies the selected image.
    ///
    /// Does nothing without a selected image. The intake is disabled for the
    /// duration of the request, and re-enabled even when the future is dropped
    /// before completing (e.g. by an external timeout). Returns whether the
    /// classification succeeded.
    pub async fn analyze(&mut self) -> bool {
        let Some(image) = self.image.clone() else {
            return false;
        };

        let _busy = BusyGuard::enter(&mut self.intake, &mut self.analyzing);

        match self.client.classify(&image).await {
            Ok(predictions) => {
                log::info!("Image classified with {} predictions", predictions.len());
                self.predictions = predictions;
                self.notifier.notify(Notification::success(
                    "Analysis Complete",
                    "Your image has been successfully classified!",
                ));
                true
            }
            Err(e) => {
                log::error!("Classification error: {}", e);
                self.notifier
                    .notify(Notification::error("Analysis Failed", e.to_string()));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::ClientConfig, image::ImageFile};
    use std::{cell::RefCell, rc::Rc};

    fn session() -> (Session<impl Notifier>, Rc<RefCell<Vec<Notification>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let client = ClassificationClient::new(ClientConfig::new("http://127.0.0.1:9", "key"));
        let session = Session::new(client, move |n: Notification| sink.borrow_mut().push(n));
        (session, seen)
    }

    #[test]
    fn selecting_an_image_clears_predictions() {
        let (mut session, _) = session();
        session.predictions.push(Prediction {
            label: "Cat".to_string(),
            confidence: 0.5,
            description: None,
        });

        let image = EncodedImage::encode("image/png", b"x").unwrap();
        session.select_image(image.clone());

        assert_eq!(session.image(), Some(&image));
        assert!(session.predictions().is_empty());
    }

    #[test]
    fn intake_results_are_forwarded() {
        let (mut session, _) = session();
        session
            .intake_mut()
            .select_file(Some(ImageFile::from_bytes("a.png", "image/png", b"a".to_vec())));

        assert!(session.wait_intake());
        assert_eq!(
            session.image(),
            Some(&EncodedImage::encode("image/png", b"a").unwrap())
        );
        assert!(!session.poll_intake());
    }

    #[tokio::test]
    async fn analyze_without_image_is_a_no_op() {
        let (mut session, seen) = session();
        assert!(!session.analyze().await);
        assert!(!session.is_analyzing());
        assert!(seen.borrow().is_empty());
    }
}
