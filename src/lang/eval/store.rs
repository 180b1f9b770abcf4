use crate::common::*;

/// The byte stack of a running program. The first `frame_size` bytes hold the
/// named values of the program, everything above is the evaluation stack.
#[derive(Debug, Clone)]
pub(crate) struct Store {
    pub(crate) stack: Vec<u8>,
    pub(crate) frame_size: usize,
}

impl Store {
    pub(crate) fn new(frame_size: u32) -> Self {
        let frame_size = frame_size as usize;
        let mut stack = Vec::with_capacity(frame_size + 64);
        stack.resize(frame_size, 0);
        Self { stack, frame_size }
    }

    /// Number of bytes on the evaluation stack, frame excluded.
    pub(crate) fn height(&self) -> usize {
        self.stack.len() - self.frame_size
    }

    /// Returns the region a result of `size` bytes is written to.
    ///
    /// A non-negative `placement` leaves a gap of that many bytes above the
    /// current top and writes after it, growing the stack. A negative
    /// `placement` writes into existing bytes that far below the top: the
    /// region must lie completely inside the evaluation stack and nothing
    /// grows.
    pub(crate) fn reserve(&mut self, placement: i32, size: u32) -> Result<&mut [u8], Error> {
        let size = size as usize;
        let len = self.stack.len();
        let pos = if placement >= 0 {
            let pos = len + placement as usize;
            self.stack.resize(pos + size, 0);
            pos
        } else {
            let below = (-(placement as i64)) as usize;
            if below > len - self.frame_size || size > below {
                return Err(Error::internal(format!(
                    "placement {} for {} bytes outside of the evaluation stack ({} bytes)",
                    placement, size, len - self.frame_size
                )));
            }
            len - below
        };
        Ok(&mut self.stack[pos..pos + size])
    }

    pub(crate) fn push(&mut self, placement: i32, bytes: &[u8]) -> Result<(), Error> {
        self.reserve(placement, bytes.len() as u32)?.copy_from_slice(bytes);
        Ok(())
    }

    /// Removes the topmost `size` bytes.
    pub(crate) fn pop(&mut self, size: u32) -> Result<Vec<u8>, Error> {
        let size = size as usize;
        if size > self.height() {
            return Err(Error::internal(format!(
                "stack underflow: popping {} bytes with {} on the stack", size, self.height()
            )));
        }
        Ok(self.stack.split_off(self.stack.len() - size))
    }

    pub(crate) fn read_frame(&self, offset: u32, size: u32) -> Result<&[u8], Error> {
        let start = offset as usize;
        let end = start + size as usize;
        if end > self.frame_size {
            return Err(Error::internal(format!("frame read {}..{} beyond frame of {} bytes", start, end, self.frame_size)));
        }
        Ok(&self.stack[start..end])
    }

    pub(crate) fn write_frame(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Error> {
        let start = offset as usize;
        let end = start + bytes.len();
        if end > self.frame_size {
            return Err(Error::internal(format!("frame write {}..{} beyond frame of {} bytes", start, end, self.frame_size)));
        }
        self.stack[start..end].copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_placements() {
        let mut store = Store::new(4);
        store.push(0, &[1, 2]).unwrap();
        assert_eq!(store.stack, vec![0, 0, 0, 0, 1, 2]);

        // Leave a gap, then fill it from above
        store.push(3, &[9]).unwrap();
        assert_eq!(store.height(), 6);
        store.push(-4, &[7, 8, 6]).unwrap();
        assert_eq!(store.stack, vec![0, 0, 0, 0, 1, 2, 7, 8, 6, 9]);

        assert_eq!(store.pop(4).unwrap(), vec![7, 8, 6, 9]);
        assert_eq!(store.height(), 2);
    }

    #[test]
    fn test_reserve_never_touches_frame() {
        let mut store = Store::new(4);
        store.push(0, &[1, 2]).unwrap();
        assert!(store.push(-3, &[0]).unwrap_err().is_internal());
        assert!(store.push(-1, &[0, 0]).unwrap_err().is_internal());
        assert!(store.pop(3).unwrap_err().is_internal());
    }

    #[test]
    fn test_frame_access() {
        let mut store = Store::new(8);
        store.write_frame(4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.read_frame(4, 4).unwrap(), &[1, 2, 3, 4]);
        assert!(store.read_frame(6, 4).unwrap_err().is_internal());
        assert!(store.write_frame(8, &[1]).unwrap_err().is_internal());
    }
}
