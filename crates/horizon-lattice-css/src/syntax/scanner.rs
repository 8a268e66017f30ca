//! Character scanners.
//!
//! A scanner hands the tokenizer one normalized character at a time and can
//! undo its most recent advances. Normalization follows CSS Syntax Level 3
//! preprocessing: `\r\n`, `\r` and `\f` become `\n`, and NUL becomes U+FFFD.

use std::collections::VecDeque;
use std::io::{self, Read};

/// Replacement character used for NUL and undecodable input.
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Characters a [`ReaderScanner`] remembers for pushback. The tokenizer
/// never looks further back than three.
const LOOKBEHIND: usize = 8;

/// Source of normalized characters with pushback.
///
/// `None` stands for end of input.
pub trait CharScanner {
    /// Advance and return the next normalized character.
    fn next_char(&mut self) -> Option<char>;

    /// The character returned by the most recent [`next_char`](Self::next_char).
    fn current_char(&self) -> Option<char>;

    /// Undo the most recent advance.
    ///
    /// `ch` must be the character that advance returned. Pushing back end of
    /// input is a no-op. Successive calls undo successive advances.
    fn push_back(&mut self, ch: Option<char>);

    /// 0-based offset of the next character to be read.
    fn position(&self) -> usize;

    /// 1-based line of the next character to be read.
    fn line_number(&self) -> usize;
}

/// Folds raw characters into normalized ones.
#[derive(Debug, Default, Clone)]
struct Normalizer {
    skip_lf: bool,
}

impl Normalizer {
    /// Returns `None` when the raw character is swallowed.
    fn feed(&mut self, raw: char) -> Option<char> {
        let skip = std::mem::take(&mut self.skip_lf);
        match raw {
            '\n' if skip => None,
            '\r' => {
                self.skip_lf = true;
                Some('\n')
            }
            '\u{000C}' => Some('\n'),
            '\0' => Some(REPLACEMENT_CHARACTER),
            c => Some(c),
        }
    }
}

/// Scanner over an in-memory string.
///
/// The input is normalized once up front, so pushback just moves an index.
#[derive(Debug, Clone)]
pub struct StrScanner {
    chars: Vec<char>,
    index: usize,
    line: usize,
    current: Option<char>,
}

impl StrScanner {
    /// Create a scanner over `input`.
    pub fn new(input: &str) -> Self {
        let mut normalizer = Normalizer::default();
        let chars = input.chars().filter_map(|c| normalizer.feed(c)).collect();
        Self {
            chars,
            index: 0,
            line: 1,
            current: None,
        }
    }

    /// Number of normalized characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns true if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl CharScanner for StrScanner {
    fn next_char(&mut self) -> Option<char> {
        let ch = self.chars.get(self.index).copied();
        if let Some(c) = ch {
            self.index += 1;
            if c == '\n' {
                self.line += 1;
            }
        }
        self.current = ch;
        ch
    }

    fn current_char(&self) -> Option<char> {
        self.current
    }

    fn push_back(&mut self, ch: Option<char>) {
        if let Some(c) = ch {
            self.index = self.index.saturating_sub(1);
            if c == '\n' {
                self.line = self.line.saturating_sub(1).max(1);
            }
            self.current = self.index.checked_sub(1).and_then(|i| self.chars.get(i).copied());
        }
    }

    fn position(&self) -> usize {
        self.index
    }

    fn line_number(&self) -> usize {
        self.line
    }
}

/// Scanner over a streaming reader.
///
/// Bytes are decoded as UTF-8 one character at a time; invalid sequences
/// decode to U+FFFD. Pushed-back characters are kept on a stack, and the last
/// few returned ones so that pushback can restore the current character. An
/// I/O error ends the stream and is kept for [`take_error`](Self::take_error).
pub struct ReaderScanner<R> {
    reader: R,
    normalizer: Normalizer,
    pushed: Vec<char>,
    returned: VecDeque<char>,
    position: usize,
    line: usize,
    current: Option<char>,
    eof: bool,
    error: Option<io::Error>,
}

impl<R: Read> ReaderScanner<R> {
    /// Create a scanner over `reader`.
    ///
    /// Wrap unbuffered readers in a `BufReader`; the scanner reads byte by byte.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            normalizer: Normalizer::default(),
            pushed: Vec::new(),
            returned: VecDeque::with_capacity(LOOKBEHIND),
            position: 0,
            line: 1,
            current: None,
            eof: false,
            error: None,
        }
    }

    /// Take the I/O error that ended the stream, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return None,
                Ok(_) => return Some(buf[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
        }
    }

    fn read_raw(&mut self) -> Option<char> {
        if self.eof {
            return None;
        }
        let Some(first) = self.read_byte() else {
            self.eof = true;
            return None;
        };
        let width = match first {
            0x00..=0x7F => return Some(first as char),
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Some(REPLACEMENT_CHARACTER),
        };
        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            match self.read_byte() {
                Some(b) => *slot = b,
                None => {
                    self.eof = true;
                    return Some(REPLACEMENT_CHARACTER);
                }
            }
        }
        Some(
            std::str::from_utf8(&bytes[..width])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(REPLACEMENT_CHARACTER),
        )
    }

    fn read_normalized(&mut self) -> Option<char> {
        loop {
            let raw = self.read_raw()?;
            if let Some(c) = self.normalizer.feed(raw) {
                return Some(c);
            }
        }
    }
}

impl<R: Read> CharScanner for ReaderScanner<R> {
    fn next_char(&mut self) -> Option<char> {
        let ch = match self.pushed.pop() {
            Some(c) => Some(c),
            None => self.read_normalized(),
        };
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
            }
            if self.returned.len() == LOOKBEHIND {
                self.returned.pop_front();
            }
            self.returned.push_back(c);
        }
        self.current = ch;
        ch
    }

    fn current_char(&self) -> Option<char> {
        self.current
    }

    fn push_back(&mut self, ch: Option<char>) {
        if let Some(c) = ch {
            self.pushed.push(c);
            self.position = self.position.saturating_sub(1);
            if c == '\n' {
                self.line = self.line.saturating_sub(1).max(1);
            }
            self.returned.pop_back();
            self.current = self.returned.back().copied();
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn line_number(&self) -> usize {
        self.line
    }
}
