use crate::image::{EncodedImage, ImageFile, IntakeError};
use std::{
    sync::mpsc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

/// A file accepted by [`ImageIntake::submit`], waiting to be read.
struct ReadRequest {
    id: u64,
    file: ImageFile,
}

/// Outcome of reading one accepted file. Sent exactly once per request.
struct ReadResponse {
    id: u64,
    name: String,
    duration: Duration,
    result: Result<EncodedImage, IntakeError>,
}

/// Turns user supplied files into [`EncodedImage`]s.
///
/// Files are read and encoded on a background thread so `submit` returns right
/// away. Completed reads are picked up with [`ImageIntake::poll`] or
/// [`ImageIntake::wait`] and applied in submission order, so when reads overlap
/// the most recently submitted file ends up selected. Earlier reads are never
/// cancelled.
pub struct ImageIntake {
    current: Option<EncodedImage>,
    disabled: bool,
    dragging: bool,
    pending: usize,
    id_counter: u64,
    req_tx: Option<mpsc::Sender<ReadRequest>>,
    rep_rx: mpsc::Receiver<ReadResponse>,
    read_handle: Option<JoinHandle<()>>,
}

impl ImageIntake {
    /// Creates an intake with no image and spawns its reader thread.
    pub fn new() -> Self {
        let (req_tx, req_rx) = mpsc::channel::<ReadRequest>();
        let (rep_tx, rep_rx) = mpsc::channel::<ReadResponse>();

        let read_handle = std::thread::spawn(move || {
            while let Ok(req) = req_rx.recv() {
                log::debug!("Reading file {} ({})", req.file.name, req.file.media_type);

                let start_time = Instant::now();
                let result = req.file.encode();

                let _ = rep_tx.send(ReadResponse {
                    id: req.id,
                    name: req.file.name,
                    duration: start_time.elapsed(),
                    result,
                });
            }
        });

        Self {
            current: None,
            disabled: false,
            dragging: false,
            pending: 0,
            id_counter: 0,
            req_tx: Some(req_tx),
            rep_rx,
            read_handle: Some(read_handle),
        }
    }

    /// The currently selected image, if any.
    pub fn current(&self) -> Option<&EncodedImage> {
        self.current.as_ref()
    }

    /// Number of accepted files whose read has not been applied yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// While disabled, [`drop_files`](Self::drop_files) and
    /// [`select_file`](Self::select_file) ignore their input.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn drag_enter(&mut self) {
        self.dragging = true;
    }

    pub fn drag_leave(&mut self) {
        self.dragging = false;
    }

    /// Drop entry point. Only the first file is considered.
    ///
    /// Returns whether a file was accepted.
    pub fn drop_files(&mut self, files: Vec<ImageFile>) -> bool {
        self.dragging = false;
        if self.disabled {
            return false;
        }
        match files.into_iter().next() {
            Some(file) => self.submit(file),
            None => false,
        }
    }

    /// File picker entry point.
    ///
    /// Returns whether a file was accepted.
    pub fn select_file(&mut self, file: Option<ImageFile>) -> bool {
        if self.disabled {
            return false;
        }
        match file {
            Some(file) => self.submit(file),
            None => false,
        }
    }

    /// Queues an image file for reading.
    ///
    /// Files whose media type does not start with `image/` are ignored and the
    /// current image stays as it is. Returns whether the file was accepted.
    pub fn submit(&mut self, file: ImageFile) -> bool {
        if !file.is_image() {
            log::debug!("Ignoring {} with media type {}", file.name, file.media_type);
            return false;
        }

        let Some(tx) = &self.req_tx else {
            return false;
        };

        let id = self.id_counter;
        self.id_counter += 1;

        if tx.send(ReadRequest { id, file }).is_err() {
            log::error!("Reader channel disconnected");
            return false;
        }

        self.pending += 1;
        true
    }

    /// Discards the current image.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Applies every read that has completed so far without blocking.
    ///
    /// Returns the newly selected image when at least one read succeeded.
    pub fn poll(&mut self) -> Option<EncodedImage> {
        let mut selected = None;
        loop {
            match self.rep_rx.try_recv() {
                Ok(response) => {
                    if let Some(image) = self.apply(response) {
                        selected = Some(image);
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::error!("Reader channel disconnected");
                    self.pending = 0;
                    break;
                }
            }
        }
        selected
    }

    /// Blocks until every pending read has completed and applies them.
    ///
    /// Returns the newly selected image when at least one read succeeded.
    pub fn wait(&mut self) -> Option<EncodedImage> {
        let mut selected = None;
        while self.pending > 0 {
            match self.rep_rx.recv() {
                Ok(response) => {
                    if let Some(image) = self.apply(response) {
                        selected = Some(image);
                    }
                }
                Err(_) => {
                    log::error!("Reader channel disconnected");
                    self.pending = 0;
                }
            }
        }
        selected
    }

    fn apply(&mut self, response: ReadResponse) -> Option<EncodedImage> {
        self.pending = self.pending.saturating_sub(1);
        match response.result {
            Ok(image) => {
                log::debug!(
                    "Read #{} ({}) completed in {:?}",
                    response.id,
                    response.name,
                    response.duration
                );
                self.current = Some(image.clone());
                Some(image)
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", response.name, e);
                None
            }
        }
    }

    /// Stops the reader thread after it has finished the queued files.
    pub fn stop(&mut self) {
        self.req_tx.take();
        if let Some(handle) = self.read_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Default for ImageIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ImageIntake {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DATA_URL_IMAGE_PREFIX;

    fn png(name: &str, bytes: &[u8]) -> ImageFile {
        ImageFile::from_bytes(name, "image/png", bytes.to_vec())
    }

    #[test]
    fn accepted_file_becomes_current() {
        let mut intake = ImageIntake::new();
        assert!(intake.submit(png("a.png", b"hello")));

        let image = intake.wait().unwrap();
        assert!(image.as_str().starts_with(DATA_URL_IMAGE_PREFIX));
        assert_eq!(intake.current(), Some(&image));
        assert_eq!(intake.pending(), 0);
    }

    #[test]
    fn non_image_is_ignored() {
        let mut intake = ImageIntake::new();
        intake.submit(png("a.png", b"first"));
        let before = intake.wait();

        assert!(!intake.submit(ImageFile::from_bytes("notes.txt", "text/plain", b"hi".to_vec())));
        assert!(!intake.submit(ImageFile::from_bytes("blob", "", Vec::new())));
        assert_eq!(intake.pending(), 0);
        assert_eq!(intake.wait(), None);
        assert_eq!(intake.current().cloned(), before);
    }

    #[test]
    fn last_submission_wins() {
        let mut intake = ImageIntake::new();
        intake.submit(png("first.png", b"first"));
        intake.submit(png("second.png", b"second"));
        intake.submit(png("third.png", b"third"));

        let expected = EncodedImage::encode("image/png", b"third").unwrap();
        assert_eq!(intake.wait(), Some(expected.clone()));
        assert_eq!(intake.current(), Some(&expected));
    }

    #[test]
    fn clear_always_empties() {
        let mut intake = ImageIntake::new();
        intake.clear();
        assert!(intake.current().is_none());

        intake.submit(png("a.png", b"x"));
        intake.wait();
        intake.clear();
        assert!(intake.current().is_none());
    }

    #[test]
    fn disabled_entry_points_ignore_files() {
        let mut intake = ImageIntake::new();
        intake.set_disabled(true);
        intake.drag_enter();

        assert!(!intake.drop_files(vec![png("a.png", b"x")]));
        assert!(!intake.select_file(Some(png("b.png", b"y"))));
        assert!(!intake.is_dragging());
        assert_eq!(intake.pending(), 0);

        intake.set_disabled(false);
        assert!(intake.select_file(Some(png("b.png", b"y"))));
        assert!(intake.wait().is_some());
    }

    #[test]
    fn entry_points_reject_non_images_alike() {
        let mut intake = ImageIntake::new();
        let text = ImageFile::from_bytes("a.txt", "text/plain", b"x".to_vec());

        assert!(!intake.drop_files(vec![text.clone()]));
        assert!(!intake.select_file(Some(text)));
        assert!(!intake.drop_files(Vec::new()));
        assert!(!intake.select_file(None));
        assert!(intake.current().is_none());
    }

    #[test]
    fn drop_takes_first_file() {
        let mut intake = ImageIntake::new();
        assert!(intake.drop_files(vec![png("a.png", b"a"), png("b.png", b"b")]));
        assert_eq!(
            intake.wait(),
            Some(EncodedImage::encode("image/png", b"a").unwrap())
        );
    }

    #[test]
    fn failed_read_keeps_previous_image() {
        let mut intake = ImageIntake::new();
        intake.submit(png("a.png", b"a"));
        let previous = intake.wait();

        assert!(intake.submit(ImageFile::from_path("/definitely/not/here.png")));
        assert_eq!(intake.wait(), None);
        assert_eq!(intake.current().cloned(), previous);
    }
}
