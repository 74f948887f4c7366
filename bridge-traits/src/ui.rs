//! User Interface Collaborators
//!
//! The login flow needs two things from the host UI: a way to send the user
//! to the identity service's consent page, and a modal prompt where the user
//! pastes back the authorization code. Both are owned by the host; the core
//! only calls them.

use async_trait::async_trait;

/// Opens URLs in the user's web browser.
///
/// Fire-and-forget: the core never inspects whether the browser actually
/// opened. Implementations should log failures instead of returning them.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::ui::BrowserLauncher;
///
/// fn show_consent_page(launcher: &dyn BrowserLauncher, url: &str) {
///     launcher.open(url);
/// }
/// ```
pub trait BrowserLauncher: Send + Sync {
    /// Open the given URL
    fn open(&self, url: &str);
}

/// Result of a modal text prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptResponse {
    /// Text entered by the user (may be empty)
    pub text: String,
    /// `false` when the user dismissed the prompt
    pub confirmed: bool,
}

impl PromptResponse {
    /// A confirmed response carrying `text`
    pub fn confirmed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confirmed: true,
        }
    }

    /// A dismissed prompt
    pub fn cancelled() -> Self {
        Self::default()
    }

    /// The entered text, or `None` if the prompt was dismissed
    pub fn into_text(self) -> Option<String> {
        self.confirmed.then_some(self.text)
    }
}

/// Modal, cancelable text input owned by the host UI.
///
/// The request waits for the user without a timeout. It only blocks the
/// caller awaiting it, never any network operation.
#[async_trait]
pub trait TextPrompt: Send + Sync {
    /// Ask the user for a line of text
    ///
    /// # Arguments
    ///
    /// * `title` - Dialog title
    /// * `label` - Label shown next to the input field
    async fn get_text(&self, title: &str, label: &str) -> PromptResponse;
}
