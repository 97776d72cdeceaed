use std::io::BufRead;

use super::error::{MolfileError, Result};

/// Numbered line reader over a buffered input.
#[derive(Debug)]
pub(crate) struct LineSource<R> {
    reader: R,
    number: usize,
}

impl<R: BufRead> LineSource<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self { reader, number: 0 }
    }

    /// 1-based number of the last line returned.
    pub(crate) fn number(&self) -> usize {
        self.number
    }

    /// Next line without its `\n` or `\r\n` terminator; `None` at end of
    /// input.
    pub(crate) fn next_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        self.number += 1;
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }

    /// Next line of a record that has already started; end of input is an
    /// error.
    pub(crate) fn expect_line(&mut self) -> Result<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(MolfileError::UnexpectedEof {
                line: self.number + 1,
            }),
        }
    }
}
