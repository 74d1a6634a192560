use super::{Code, Position};
use once_cell::unsync::OnceCell;

impl<'c> From<&'c str> for Code<'c> {
    fn from(value: &'c str) -> Self {
        Code::new(value)
    }
}

impl<'c> Code<'c> {
    pub fn new(value: &'c str) -> Self {
        Self {
            value,
            line_breaks: OnceCell::new(),
        }
    }

    pub fn obtain_line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.value
                .char_indices()
                .filter_map(|(index, c)| if c == '\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Translate a byte offset into the source into a 1-based line/column.
    pub fn obtain_position(&self, pointer: usize) -> Position {
        let line_breaks = self.obtain_line_breaks();
        let index = match line_breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };

        if index == 0 {
            let s = &self.value[..pointer.min(self.value.len())];
            Position::new(1, s.chars().count() + 1)
        } else {
            let break_point = line_breaks[index - 1] + 1;
            let end = pointer.max(break_point).min(self.value.len());
            let s = &self.value[break_point..end];
            Position::new(index + 1, s.chars().count() + 1)
        }
    }

    /// A caret-underlined rendering of the source with the pointer marked,
    /// matching the reference implementation's error formatting.
    pub fn underline_at(&self, pointer: usize) -> String {
        let caret_offset = self.value[..pointer.min(self.value.len())].chars().count();
        format!("{}\n{}^", self.value, " ".repeat(caret_offset))
    }
}
