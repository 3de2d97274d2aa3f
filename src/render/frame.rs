//! LED frames and the shadow diff against what the surface last received

use std::collections::HashMap;

/// One pad LED command: note-on status (mode), pad note, palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedCell {
    pub mode: u8,
    pub pad: u8,
    pub color: u8,
}

impl LedCell {
    pub fn new(mode: u8, pad: u8, color: u8) -> Self {
        Self { mode, pad, color }
    }

    /// Raw `(status, pad, color)` triple
    pub fn bytes(&self) -> [u8; 3] {
        [self.mode, self.pad & 0x7F, self.color & 0x7F]
    }
}

/// Ordered LED cells, at most one per pad
pub type Frame = Vec<LedCell>;

/// Concatenate cells into a single MIDI buffer
pub fn encode_batch(cells: &[LedCell]) -> Vec<u8> {
    cells.iter().flat_map(|c| c.bytes()).collect()
}

/// Remembers the last transmitted frame and yields only changed cells
#[derive(Debug, Default)]
pub struct FrameDiffer {
    shadow: HashMap<u8, (u8, u8)>,
}

impl FrameDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells of `frame` not already shown; `frame` becomes the new baseline
    pub fn diff(&mut self, frame: &[LedCell]) -> Vec<LedCell> {
        let changed: Vec<LedCell> = frame
            .iter()
            .filter(|cell| self.shadow.get(&cell.pad) != Some(&(cell.mode, cell.color)))
            .copied()
            .collect();

        self.shadow = frame
            .iter()
            .map(|cell| (cell.pad, (cell.mode, cell.color)))
            .collect();

        changed
    }

    /// Forget the baseline so the next frame is sent whole
    pub fn reset(&mut self) {
        self.shadow.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(color: u8) -> Frame {
        (0..40).map(|pad| LedCell::new(0x96, pad, color)).collect()
    }

    #[test]
    fn test_first_frame_is_sent_whole() {
        let mut differ = FrameDiffer::new();

        assert_eq!(differ.diff(&full(0)).len(), 40);
    }

    #[test]
    fn test_identical_frame_is_empty() {
        let mut differ = FrameDiffer::new();
        differ.diff(&full(21));

        assert!(differ.diff(&full(21)).is_empty());
    }

    #[test]
    fn test_only_changed_row_is_emitted() {
        let mut differ = FrameDiffer::new();
        differ.diff(&full(21));

        let mut next = full(21);
        for cell in next.iter_mut().filter(|c| (24..32).contains(&c.pad)) {
            cell.color = 5;
        }
        let changed = differ.diff(&next);

        assert_eq!(changed.len(), 8);
        assert!(changed.iter().all(|c| (24..32).contains(&c.pad) && c.color == 5));
    }

    #[test]
    fn test_mode_change_counts() {
        let mut differ = FrameDiffer::new();
        differ.diff(&[LedCell::new(0x96, 3, 21)]);

        assert_eq!(differ.diff(&[LedCell::new(0x9F, 3, 21)]).len(), 1);
    }

    #[test]
    fn test_reset_resends_everything() {
        let mut differ = FrameDiffer::new();
        differ.diff(&full(3));
        differ.reset();

        assert_eq!(differ.diff(&full(3)).len(), 40);
    }

    #[test]
    fn test_batch_encoding() {
        let cells = [LedCell::new(0x96, 32, 21), LedCell::new(0x90, 0, 0)];

        assert_eq!(encode_batch(&cells), vec![0x96, 32, 21, 0x90, 0, 0]);
        assert_eq!(cells[0].bytes(), [0x96, 32, 21]);
    }
}
