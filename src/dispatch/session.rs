use log::debug;

use crate::acquisition::ImageSource;
use crate::error::ClassifyError;
use crate::dispatch::prediction::PredictionResult;

/// Identity of one dispatch. Tokens increase monotonically per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// The two prediction paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionPath {
    Local,
    Remote,
}

/// What `Session::complete` did with an outcome.
#[derive(Debug)]
pub enum Completion {
    /// The prediction became the current result.
    Applied,
    /// The attempt failed; the error is handed back for the user notice.
    Failed(ClassifyError),
    /// A newer dispatch or a newer image superseded this one; dropped.
    Stale,
}

/// Current image, current result and the in-flight request, if any.
///
/// Acquiring an image and starting a dispatch both advance the token, so an
/// outcome is applied only when nothing happened since it was dispatched.
#[derive(Debug, Default)]
pub struct Session {
    image: Option<ImageSource>,
    result: Option<PredictionResult>,
    pending: Option<(RequestToken, PredictionPath)>,
    latest: u64,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn image(&self) -> Option<&ImageSource> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    /// Path of the request the loading indicator belongs to.
    pub fn pending(&self) -> Option<PredictionPath> {
        self.pending.map(|(_, path)| path)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Makes `image` current, discarding the previous result and orphaning
    /// any in-flight request.
    pub fn acquire(&mut self, image: ImageSource) {
        self.next_token();
        self.image = Some(image);
        self.result = None;
        self.pending = None;
    }

    /// Registers a new dispatch and returns its token together with the
    /// image it should classify.
    pub fn begin(&mut self, path: PredictionPath) -> (RequestToken, Option<ImageSource>) {
        let token = self.next_token();
        self.pending = Some((token, path));
        (token, self.image.clone())
    }

    /// Applies an outcome if `token` is still the latest; otherwise drops it.
    pub fn complete(
        &mut self,
        token: RequestToken,
        outcome: Result<PredictionResult, ClassifyError>,
    ) -> Completion {
        if token.0 != self.latest {
            debug!("discarding stale outcome for request {} (latest {})", token.0, self.latest);
            return Completion::Stale;
        }
        self.pending = None;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                Completion::Applied
            }
            Err(e) => Completion::Failed(e),
        }
    }

    fn next_token(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }
}
