use crate::panel::RequestKind;

/// Which panel is active and whether the credential-entry surface is open.
/// Pure selection state: never persisted, reset to defaults on every launch.
#[derive(Debug, Clone)]
pub struct ViewRouter {
    active: RequestKind,
    settings_open: bool,
}

impl ViewRouter {
    /// The settings surface opens automatically when no key is configured yet.
    pub fn new(credential_present: bool) -> Self {
        Self {
            active: RequestKind::PsychAnalysis,
            settings_open: !credential_present,
        }
    }

    pub fn active(&self) -> RequestKind {
        self.active
    }

    pub fn select(&mut self, kind: RequestKind) {
        self.active = kind;
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn open_settings(&mut self) {
        self.settings_open = true;
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_profiling_with_settings_closed_when_key_exists() {
        let router = ViewRouter::new(true);
        assert_eq!(router.active(), RequestKind::PsychAnalysis);
        assert!(!router.settings_open());
    }

    #[test]
    fn settings_open_automatically_without_a_key() {
        let router = ViewRouter::new(false);
        assert!(router.settings_open());
    }

    #[test]
    fn saving_a_key_flips_the_startup_state_on_the_next_launch() {
        use crate::keystore::{self, KeyStore};
        use std::time::{SystemTime, UNIX_EPOCH};

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        let path = std::env::temp_dir()
            .join(format!("casedesk_router_{}", std::process::id()))
            .join(format!("api_key_{nanos}"));
        let store = KeyStore::at_path(path);

        // First launch: nothing stored, so the settings surface opens.
        let key = store.load();
        let mut router = ViewRouter::new(keystore::is_present(&key));
        assert!(router.settings_open());

        // The user enters a key and closes the surface.
        store.save("sk-demo").expect("key should save");
        router.close_settings();
        assert!(!router.settings_open());
        assert!(keystore::is_present(&store.load()));

        // Next launch starts with the surface closed.
        let router = ViewRouter::new(keystore::is_present(&store.load()));
        assert!(!router.settings_open());
    }

    #[test]
    fn selection_and_settings_toggle_independently() {
        let mut router = ViewRouter::new(true);
        router.select(RequestKind::SeoStrategy);
        router.open_settings();
        assert_eq!(router.active(), RequestKind::SeoStrategy);
        assert!(router.settings_open());

        router.close_settings();
        assert_eq!(router.active(), RequestKind::SeoStrategy);
        assert!(!router.settings_open());
    }
}
