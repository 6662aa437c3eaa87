use std::io::Write;

use super::{Notifier, Permission};
use crate::error::NotifierError;

/// Writes alerts to stderr, optionally ringing the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier {
    bell: bool,
}

impl TerminalNotifier {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }

    fn render(&self, title: &str, body: &str) -> String {
        let bell = if self.bell { "\x07" } else { "" };
        format!("{bell}>> {title} {body}\n")
    }
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifierError> {
        let mut err = std::io::stderr().lock();
        err.write_all(self.render(title, body).as_bytes())?;
        err.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_is_optional() {
        assert_eq!(
            TerminalNotifier::new(false).render("Done", "Rest"),
            ">> Done Rest\n"
        );
        assert!(TerminalNotifier::new(true)
            .render("Done", "Rest")
            .starts_with('\x07'));
    }
}
