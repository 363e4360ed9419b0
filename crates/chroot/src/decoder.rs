use std::{mem, str};

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder which splits a byte stream into lines.
///
/// Multi-byte sequences that are split across reads are held back until the rest of
/// the sequence arrives, and malformed bytes are replaced with U+FFFD. Both `\n` and
/// `\r` terminate a line, so progress bars which redraw with a carriage return are
/// rendered as a series of lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
    line:    String,
}

impl LineDecoder {
    pub fn new() -> Self { Self::default() }

    /// Feeds a chunk of raw output, calling `emit` for each completed non-empty line.
    pub fn push<F: FnMut(&str)>(&mut self, bytes: &[u8], mut emit: F) {
        self.pending.extend_from_slice(bytes);

        let mut consumed = 0;
        loop {
            match str::from_utf8(&self.pending[consumed..]) {
                Ok(text) => {
                    Self::split_into(&mut self.line, text, &mut emit);
                    consumed = self.pending.len();
                    break;
                }
                Err(why) => {
                    let valid = consumed + why.valid_up_to();
                    // Everything before `valid_up_to` has already been validated.
                    let text = unsafe { str::from_utf8_unchecked(&self.pending[consumed..valid]) };
                    Self::split_into(&mut self.line, text, &mut emit);

                    match why.error_len() {
                        Some(invalid) => {
                            self.line.push(REPLACEMENT);
                            consumed = valid + invalid;
                        }
                        // An incomplete sequence at the end of the buffer.
                        None => {
                            consumed = valid;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
    }

    /// Flushes any held-back bytes and the unterminated final line.
    pub fn finish<F: FnMut(&str)>(&mut self, mut emit: F) {
        if !self.pending.is_empty() {
            let pending = mem::replace(&mut self.pending, Vec::new());
            let text = String::from_utf8_lossy(&pending);
            Self::split_into(&mut self.line, &text, &mut emit);
        }

        let line = mem::replace(&mut self.line, String::new());
        Self::emit_line(&line, &mut emit);
    }

    fn split_into<F: FnMut(&str)>(line: &mut String, text: &str, emit: &mut F) {
        let mut segments = text.split(|c| c == '\n' || c == '\r');
        if let Some(first) = segments.next() {
            line.push_str(first);
        }

        for segment in segments {
            Self::emit_line(line, emit);
            line.clear();
            line.push_str(segment);
        }
    }

    fn emit_line<F: FnMut(&str)>(line: &str, emit: &mut F) {
        let line = line.trim_end();
        if !line.is_empty() {
            emit(line);
        }
    }
}
