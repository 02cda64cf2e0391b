/// Position readout that follows playback unless the user is dragging it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubBar {
    tracking_enabled: bool,
    position: f64,
}

impl Default for ScrubBar {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            position: 0.0,
        }
    }
}

impl ScrubBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// User grabbed the bar: stop following playback.
    pub fn begin_drag(&mut self) {
        self.tracking_enabled = false;
    }

    /// User released the bar: follow playback again.
    pub fn end_drag(&mut self) {
        self.tracking_enabled = true;
    }

    /// Moves the bar to where the user dragged it.
    pub fn drag_to(&mut self, seconds: f64) {
        self.position = seconds.max(0.0);
    }

    /// Follows the playback position. Ignored while dragging.
    pub fn follow(&mut self, seconds: f64) {
        if self.tracking_enabled {
            self.position = seconds;
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_enabled
    }

    /// Position as `MM:SS`.
    pub fn formatted(&self) -> String {
        format_time(self.position)
    }
}

/// Formats whole seconds as `MM:SS`; minutes do not wrap into hours.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
