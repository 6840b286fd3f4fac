use std::collections::BTreeMap;

use crate::builder::Label;

/// Stores labels and the jumps that refer to them, patching each jump once both ends are known
#[derive(Debug, Default)]
pub struct JumpContainer {
    jumps: BTreeMap<Label, Vec<usize>>,
    labels: BTreeMap<Label, usize>,
}

impl JumpContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label at the end of `buf`, resolving all pending jumps to it.
    ///
    /// Returns false if one of the jumps is out of range.
    pub fn add_label(&mut self, label: Label, buf: &mut [u8]) -> bool {
        let ip = buf.len();
        let mut in_range = true;

        if let Some(assoc_jumps) = self.jumps.remove(&label) {
            for jump in assoc_jumps {
                in_range &= patch_jump(buf, jump, ip);
            }
        }

        self.labels.insert(label, ip);
        in_range
    }

    /// Registers a jump to `label`, whose two operand bytes are the last two bytes of `buf`.
    ///
    /// Returns false if the label is already known and out of range.
    pub fn add_jump(&mut self, label: Label, buf: &mut [u8]) -> bool {
        let jump = buf.len() - 2;

        match self.labels.get(&label) {
            Some(&ip) => patch_jump(buf, jump, ip),
            None => {
                self.jumps.entry(label).or_default().push(jump);
                true
            }
        }
    }
}

/// Writes the offset from the end of the operand at `jump` to `target`
fn patch_jump(buf: &mut [u8], jump: usize, target: usize) -> bool {
    let offset = target as isize - (jump as isize + 2);

    match i16::try_from(offset) {
        Ok(offset) => {
            buf[jump..jump + 2].copy_from_slice(&offset.to_le_bytes());
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forward_and_backward_jumps() {
        let mut jc = JumpContainer::new();
        let mut buf = vec![0xAA, 0, 0];
        assert!(jc.add_jump(Label::IfEnd, &mut buf));
        buf.push(0xBB);
        assert!(jc.add_label(Label::IfEnd, &mut buf));
        assert_eq!(i16::from_le_bytes([buf[1], buf[2]]), 1);

        buf.extend_from_slice(&[0xCC, 0, 0]);
        assert!(jc.add_jump(Label::IfEnd, &mut buf));
        assert_eq!(i16::from_le_bytes([buf[5], buf[6]]), -3);
    }

    #[test]
    fn out_of_range_jump_is_reported() {
        let mut jc = JumpContainer::new();
        let mut buf = vec![0, 0];
        assert!(jc.add_jump(Label::IfEnd, &mut buf));
        buf.resize(40_000, 0);
        assert!(!jc.add_label(Label::IfEnd, &mut buf));
    }
}
