use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct InputSource {
    pub(crate) input: Vec<u8>,
    line: u32,
    column: u32,
    offset: usize,
}

impl InputSource {
    pub fn new<S: AsRef<[u8]>>(input: S) -> Self {
        Self { input: input.as_ref().to_vec(), line: 1, column: 1, offset: 0 }
    }

    pub fn pos(&self) -> InputPosition {
        InputPosition { line: self.line, column: self.column, offset: self.offset as u32 }
    }

    pub fn is_eof(&self) -> bool {
        self.next().is_none()
    }

    pub fn next(&self) -> Option<u8> {
        self.input.get(self.offset).copied()
    }

    pub fn lookahead(&self, pos: usize) -> Option<u8> {
        self.input.get(self.offset + pos).copied()
    }

    pub fn has(&self, to_compare: &[u8]) -> bool {
        self.input[self.offset..].starts_with(to_compare)
    }

    pub fn consume(&mut self) {
        match self.next() {
            Some(x) if x == b'\r' && self.lookahead(1) != Some(b'\n') || x == b'\n' => {
                self.line += 1;
                self.offset += 1;
                self.column = 1;
            },
            Some(_) => {
                self.offset += 1;
                self.column += 1;
            },
            None => {},
        }
    }

    pub fn section(&self, start: InputPosition) -> &[u8] {
        &self.input[start.offset as usize..self.offset]
    }

    /// The full source line containing `position`, without line terminator.
    pub fn line_at(&self, position: InputPosition) -> String {
        let line_start = position.offset as usize - (position.column as usize - 1);
        let mut line_end = position.offset as usize;
        while line_end < self.input.len() && self.input[line_end] != b'\n' {
            line_end += 1;
        }
        if line_end > line_start && self.input[line_end - 1] == b'\r' {
            line_end -= 1;
        }
        String::from_utf8_lossy(&self.input[line_start..line_end]).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPosition {
    line: u32,
    column: u32,
    pub(crate) offset: u32,
}

impl InputPosition {
    pub fn line(&self) -> usize {
        self.line as usize
    }

    pub fn column(&self) -> usize {
        self.column as usize
    }
}

impl Default for InputPosition {
    fn default() -> Self {
        Self { line: 1, column: 1, offset: 0 }
    }
}

impl fmt::Display for InputPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
