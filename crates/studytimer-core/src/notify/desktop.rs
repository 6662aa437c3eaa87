//! Desktop notifications through the platform notification service.
//!
//! Permission is granted on request only if the service answers. On
//! freedesktop systems that means a notification daemon is on the session
//! bus; elsewhere the service is assumed present.

use std::sync::Mutex;

use notify_rust::Notification;
use tracing::debug;

use super::{Notifier, Permission};
use crate::error::NotifierError;

#[derive(Debug)]
pub struct DesktopNotifier {
    app_name: String,
    permission: Mutex<Permission>,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            permission: Mutex::new(Permission::Undetermined),
        }
    }

    fn set_permission(&self, permission: Permission) {
        match self.permission.lock() {
            Ok(mut p) => *p = permission,
            Err(poisoned) => *poisoned.into_inner() = permission,
        }
    }

    fn build(&self, title: &str, body: &str) -> Notification {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(body);
        notification
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn service_available() -> bool {
        match notify_rust::get_server_information() {
            Ok(info) => {
                debug!(server = %info.name, "notification daemon found");
                true
            }
            Err(e) => {
                debug!(error = %e, "no notification daemon");
                false
            }
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn service_available() -> bool {
        true
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or_else(|e| *e.into_inner())
    }

    fn request_permission(&self) -> Permission {
        let permission = if Self::service_available() {
            Permission::Granted
        } else {
            Permission::Denied
        };
        debug!(?permission, "desktop notification permission");
        self.set_permission(permission);
        permission
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifierError> {
        if self.permission() != Permission::Granted {
            return Err(NotifierError::PermissionDenied);
        }
        self.build(title, body)
            .show()
            .map(|_| ())
            .map_err(|e| NotifierError::Delivery(e.to_string()))
    }
}
