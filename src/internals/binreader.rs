use crate::doc::FormatError;

macro_rules! read_le {
    ($fn:ident, $Ty:ty) => {
        #[inline]
        pub(crate) fn $fn(&mut self) -> Result<$Ty, FormatError> {
            self.read_array().map(<$Ty>::from_le_bytes)
        }
    };
}

/// Bounds-checked read head over a borrowed byte buffer.
///
/// Every read reports the offset it failed at, so a decode error can be
/// traced back to the exact byte in the input. The reader never copies
/// the buffer; slices handed out by [`take`] borrow from it.
///
/// [`take`]: BinReader::take
pub(crate) struct BinReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BinReader<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The unread tail of the buffer.
    #[inline]
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Moves the read head to an absolute offset, clamped to the buffer end.
    #[inline]
    pub(crate) fn seek(&mut self, offset: usize) {
        self.pos = offset.min(self.buf.len());
    }

    #[inline]
    pub(crate) fn skip(&mut self, amt: usize) -> Result<(), FormatError> {
        self.take(amt).map(|_| ())
    }

    pub(crate) fn take(&mut self, amt: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < amt {
            return Err(FormatError::ShortRead {
                at: self.pos,
                need: amt,
            });
        }

        let bytes = &self.buf[self.pos..self.pos + amt];
        self.pos += amt;

        Ok(bytes)
    }

    #[inline]
    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N)?);

        Ok(array)
    }

    read_le! {  read_u8,  u8 }
    read_le! { read_u32, u32 }
    read_le! { read_f32, f32 }

    /// Consumes `magic`, failing on the first byte that differs.
    pub(crate) fn expect_magic(&mut self, magic: &[u8]) -> Result<(), FormatError> {
        for &expected in magic {
            let at = self.pos;
            let got = self.read_u8()?;

            if got != expected {
                return Err(FormatError::BadMagic { at, expected, got });
            }
        }

        Ok(())
    }
}
