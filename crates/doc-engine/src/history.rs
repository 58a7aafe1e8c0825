//! Undo/redo history for [`TextBuffer`](crate::TextBuffer).
//!
//! Every mutating buffer call records one [`TextEdit`]. Edits recorded while a group is open
//! land in the same [`EditGroup`] and are undone/redone together. The undo limit counts groups,
//! so a group is never split by trimming.

/// A single recorded replacement, in character offsets of the text *before* the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextEdit {
    pub(crate) start: usize,
    pub(crate) deleted: String,
    pub(crate) inserted: String,
}

impl TextEdit {
    pub(crate) fn deleted_len(&self) -> usize {
        self.deleted.chars().count()
    }

    pub(crate) fn inserted_len(&self) -> usize {
        self.inserted.chars().count()
    }
}

/// One undo step. `edits` are stored oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EditGroup {
    id: usize,
    pub(crate) edits: Vec<TextEdit>,
}

#[derive(Debug)]
pub(crate) struct EditHistory {
    undo_stack: Vec<EditGroup>,
    redo_stack: Vec<EditGroup>,
    max_undo: usize,
    /// Clean point tracking. Uses `undo_stack.len()` as the saved position in the linear history.
    /// When `redo_stack` is non-empty, `clean_index` may be greater than `undo_stack.len()`.
    clean_index: Option<usize>,
    next_group_id: usize,
    open_group_id: Option<usize>,
    group_depth: usize,
}

impl EditHistory {
    pub(crate) fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo: max_undo.max(1),
            clean_index: Some(0),
            next_group_id: 0,
            open_group_id: None,
            group_depth: 0,
        }
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub(crate) fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub(crate) fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    pub(crate) fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
    }

    /// Open a group. Nested calls join the outermost group.
    pub(crate) fn begin_group(&mut self) {
        if self.group_depth == 0 {
            self.open_group_id = Some(self.allocate_group_id());
        }
        self.group_depth += 1;
    }

    pub(crate) fn end_group(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
        if self.group_depth == 0 {
            self.open_group_id = None;
        }
    }

    fn allocate_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id = self.next_group_id.wrapping_add(1);
        id
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }

        // If clean point is in redo area, it becomes unreachable after clearing redo.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }

        self.redo_stack.clear();
    }

    pub(crate) fn record(&mut self, edit: TextEdit) {
        self.clear_redo_and_adjust_clean();

        if let Some(open) = self.open_group_id
            && let Some(last) = self.undo_stack.last_mut()
            && last.id == open
        {
            last.edits.push(edit);
            return;
        }

        // Starting a new group: drop whole groups from the bottom to stay within the limit.
        while self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
            self.clean_index = self.clean_index.and_then(|index| index.checked_sub(1));
        }

        let id = match self.open_group_id {
            Some(id) => id,
            None => self.allocate_group_id(),
        };
        self.undo_stack.push(EditGroup {
            id,
            edits: vec![edit],
        });
    }

    /// Pop the newest undo group. Its edits must be reverted newest first.
    pub(crate) fn pop_undo_group(&mut self) -> Option<EditGroup> {
        self.undo_stack.pop()
    }

    pub(crate) fn push_redo_group(&mut self, group: EditGroup) {
        self.redo_stack.push(group);
    }

    /// Pop the next redo group. Its edits must be re-applied oldest first.
    pub(crate) fn pop_redo_group(&mut self) -> Option<EditGroup> {
        self.redo_stack.pop()
    }

    pub(crate) fn push_undo_group(&mut self, group: EditGroup) {
        self.undo_stack.push(group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(start: usize, text: &str) -> TextEdit {
        TextEdit {
            start,
            deleted: String::new(),
            inserted: text.to_string(),
        }
    }

    #[test]
    fn test_ungrouped_edits_are_separate_steps() {
        let mut history = EditHistory::new(100);
        history.record(insert(0, "a"));
        history.record(insert(1, "b"));

        let group = history.pop_undo_group().unwrap();
        assert_eq!(group.edits, vec![insert(1, "b")]);
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_group_pops_together_oldest_first() {
        let mut history = EditHistory::new(100);
        history.begin_group();
        history.record(insert(0, "a"));
        history.begin_group();
        history.record(insert(1, "b"));
        history.end_group();
        history.end_group();
        history.record(insert(2, "c"));

        let group = history.pop_undo_group().unwrap();
        assert_eq!(group.edits.len(), 1);
        let group = history.pop_undo_group().unwrap();
        assert_eq!(group.edits, vec![insert(0, "a"), insert(1, "b")]);

        history.push_redo_group(group);
        let redo = history.pop_redo_group().unwrap();
        assert_eq!(redo.edits, vec![insert(0, "a"), insert(1, "b")]);
    }

    #[test]
    fn test_clean_point_tracking() {
        let mut history = EditHistory::new(100);
        assert!(history.is_clean());

        history.record(insert(0, "a"));
        assert!(!history.is_clean());
        history.mark_clean();
        assert!(history.is_clean());

        let group = history.pop_undo_group().unwrap();
        assert!(!history.is_clean());
        history.push_redo_group(group);

        // A new edit drops the redo branch, which contained the clean point.
        history.record(insert(0, "z"));
        assert!(!history.is_clean());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_undo_drops_oldest() {
        let mut history = EditHistory::new(2);
        history.record(insert(0, "a"));
        history.record(insert(1, "b"));
        history.record(insert(2, "c"));
        assert_eq!(history.undo_depth(), 2);
        assert!(!history.is_clean());
    }

    #[test]
    fn test_max_undo_never_splits_a_group() {
        let mut history = EditHistory::new(2);
        history.record(insert(0, "x"));
        history.begin_group();
        for i in 0..5 {
            history.record(insert(i, "y"));
        }
        history.end_group();
        assert_eq!(history.undo_depth(), 2);

        // The next group pushes out the oldest one, not part of the big group.
        history.record(insert(0, "z"));
        assert_eq!(history.undo_depth(), 2);
        history.pop_undo_group().unwrap();
        assert_eq!(history.pop_undo_group().unwrap().edits.len(), 5);
        assert!(!history.can_undo());
    }
}
