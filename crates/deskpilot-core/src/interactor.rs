//! Interactive input from the user driving a session

use crate::error::Result;

pub const WELCOME_TEXT: &str = "Welcome to Deskpilot. Describe what you want done on the desktop.";

pub const NEW_REQUEST_TEXT: &str =
    "Please enter your new request. Enter 'N' to exit.";

/// Request text that ends the session
pub const STOP_REQUEST: &str = "N";

/// Whether a request asks the session to stop
pub fn is_stop_request(request: &str) -> bool {
    request.trim().eq_ignore_ascii_case(STOP_REQUEST)
}

/// Importance of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Cost,
    Warning,
}

/// Blocking prompts to the user; one call per invocation
pub trait Interactor: Send {
    fn first_request(&mut self) -> Result<String>;

    fn new_request(&mut self) -> Result<String>;

    /// Ask whether the finished session should be saved as experience
    fn confirm_experience_save(&mut self) -> Result<bool> {
        Ok(false)
    }

    /// Show a message to the user
    fn notify(&mut self, _message: &str, _notice: Notice) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_request_any_case() {
        assert!(is_stop_request("N"));
        assert!(is_stop_request("n"));
        assert!(is_stop_request(" n \n"));
        assert!(!is_stop_request("no"));
        assert!(!is_stop_request("Open notepad"));
    }
}
