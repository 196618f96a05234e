#![allow(dead_code)]

/// Liveness/responsiveness snapshot for a page, driven by CDP lifecycle
/// events rather than a network tap. `alive` flips false once the adapter
/// observes the underlying target close or detach.
#[derive(Clone, Debug)]
pub struct PageHealth {
    pub alive: bool,
    pub dom_ready: bool,
    pub last_navigation_ms: u64,
    pub consecutive_errors: u32,
}

impl Default for PageHealth {
    fn default() -> Self {
        Self {
            alive: true,
            dom_ready: false,
            last_navigation_ms: 0,
            consecutive_errors: 0,
        }
    }
}

impl PageHealth {
    pub fn mark_navigated(&mut self, ts_ms: u64) {
        self.last_navigation_ms = ts_ms;
        self.dom_ready = false;
        self.consecutive_errors = 0;
    }

    pub fn mark_dom_ready(&mut self) {
        self.dom_ready = true;
    }

    pub fn mark_error(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
    }

    pub fn mark_closed(&mut self) {
        self.alive = false;
    }
}
