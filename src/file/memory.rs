use super::Backend;
use crate::{Error::OutOfBounds, Result};

/// Stream bytes held in memory, typically a DBI stream some MSF reader already reassembled
/// from its pages.
///
/// The buffer is frozen on construction; decoding only ever borrows from it.
#[derive(Debug)]
pub struct Memory {
    stream: Box<[u8]>,
}

impl From<Vec<u8>> for Memory {
    fn from(stream: Vec<u8>) -> Self {
        Memory {
            stream: stream.into_boxed_slice(),
        }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.stream.get(offset..end))
            .ok_or(OutOfBounds)
    }

    fn data(&self) -> &[u8] {
        &self.stream
    }

    fn len(&self) -> usize {
        self.stream.len()
    }
}
