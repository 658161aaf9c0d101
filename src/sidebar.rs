/// Responsive sidebar: an overlay with a backdrop on narrow viewports,
/// always shown on wide ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sidebar {
    breakpoint: f64,
    overlay: bool,
    open: bool,
}

impl Sidebar {
    pub fn new(width: f64, breakpoint: f64) -> Self {
        Self {
            breakpoint,
            overlay: width < breakpoint,
            open: false,
        }
    }

    /// Crossing the breakpoint in either direction closes the overlay.
    pub fn resize(&mut self, width: f64) {
        let overlay = width < self.breakpoint;
        if overlay != self.overlay {
            self.open = false;
        }
        self.overlay = overlay;
    }

    pub fn toggle(&mut self) {
        if self.overlay {
            self.open = !self.open;
        }
    }

    pub fn dismiss(&mut self) {
        self.open = false;
    }

    pub fn overlay(&self) -> bool {
        self.overlay
    }

    pub fn visible(&self) -> bool {
        !self.overlay || self.open
    }

    pub fn backdrop(&self) -> bool {
        self.overlay && self.open
    }

    /// Value for the toggle's `aria-expanded`.
    pub fn expanded(&self) -> bool {
        self.backdrop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_starts_hidden() {
        let mut sidebar = Sidebar::new(400.0, 768.0);
        assert!(sidebar.overlay());
        assert!(!sidebar.visible());
        sidebar.toggle();
        assert!(sidebar.visible());
        assert!(sidebar.backdrop());
        assert!(sidebar.expanded());
        sidebar.dismiss();
        assert!(!sidebar.visible());
        assert!(!sidebar.backdrop());
    }

    #[test]
    fn wide_is_always_visible() {
        let mut sidebar = Sidebar::new(1280.0, 768.0);
        sidebar.toggle();
        assert!(sidebar.visible());
        assert!(!sidebar.backdrop());
        assert!(!sidebar.expanded());
    }

    #[test]
    fn widening_clears_backdrop() {
        let mut sidebar = Sidebar::new(500.0, 768.0);
        sidebar.toggle();
        assert!(sidebar.backdrop());
        sidebar.resize(1024.0);
        assert!(sidebar.visible());
        assert!(!sidebar.backdrop());
        assert!(!sidebar.expanded());
        sidebar.resize(600.0);
        assert!(sidebar.overlay());
        assert!(!sidebar.visible());
        assert!(!sidebar.backdrop());
    }

    #[test]
    fn resize_within_band_keeps_state() {
        let mut sidebar = Sidebar::new(500.0, 768.0);
        sidebar.toggle();
        sidebar.resize(520.0);
        assert!(sidebar.backdrop());
        sidebar.resize(768.0);
        assert!(!sidebar.overlay());
        assert!(!sidebar.backdrop());
    }
}
