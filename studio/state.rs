use std::sync::{Arc, Mutex, MutexGuard};

use acne_severity::{CaptureSession, Dispatcher, ModelSlot, ModelStatus, Session};

// ---------------------------------------------------------------------------
// Flash messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FlashKind { Success, Error }

#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        FlashMessage { kind: FlashKind::Success, text: text.into() }
    }
    pub fn error(text: impl Into<String>) -> Self {
        FlashMessage { kind: FlashKind::Error, text: text.into() }
    }
}

// ---------------------------------------------------------------------------
// Main state struct
// ---------------------------------------------------------------------------

pub struct StudioState {
    /// Current image, current result and the in-flight request.
    pub session: Session,
    /// Camera stream lifecycle.
    pub capture: CaptureSession,
    /// One-shot flash message for the next page render.
    pub flash:   Option<FlashMessage>,
}

impl StudioState {
    pub fn new(capture: CaptureSession) -> Self {
        StudioState {
            session: Session::new(),
            capture,
            flash:   None,
        }
    }

    /// Returns a bitmask encoding which controls should be enabled.
    ///
    /// Bit layout:
    /// - bit 0 (Start camera)   : always set
    /// - bit 1 (Capture / Stop) : a stream is active
    /// - bit 2 (Predict locally): model ready and an image is present
    /// - bit 3 (Predict remote) : an image is present
    pub fn controls_mask(&self, model: &ModelStatus) -> u8 {
        let mut mask: u8 = 0b0001;
        let has_image = self.session.image().is_some();

        if self.capture.active_stream().is_some() {
            mask |= 0b0010;
        }
        if has_image && matches!(model, ModelStatus::Ready(_)) {
            mask |= 0b0100;
        }
        if has_image {
            mask |= 0b1000;
        }
        mask
    }

    /// Takes and returns the current flash message, clearing it.
    pub fn take_flash(&mut self) -> Option<FlashMessage> {
        self.flash.take()
    }
}

/// Shared state type, an `Arc<Mutex<StudioState>>` passed to every handler.
pub type SharedState = Arc<Mutex<StudioState>>;

/// Everything a handler thread needs.
///
/// Handlers run on plain threads; async work is driven through `runtime`.
/// The state lock is never held across `block_on`.
pub struct AppContext {
    pub state:      SharedState,
    pub dispatcher: Dispatcher,
    pub slot:       Arc<ModelSlot>,
    pub runtime:    tokio::runtime::Handle,
}

impl AppContext {
    /// Locks the studio state, recovering it if a handler thread panicked.
    pub fn lock_state(&self) -> MutexGuard<'_, StudioState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub type SharedContext = Arc<AppContext>;
