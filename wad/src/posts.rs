//! A column of a patch is a list of "posts", each one a vertical run of
//! opaque pixels:
//!
//! | Field Size | Data Type | Content                               |
//! |------------|-----------|---------------------------------------|
//! |    0x00    |    u8     | Top delta, `0xFF` ends the column     |
//! |    0x01    |    u8     | Length in pixels                      |
//! |    0x02    |    u8     | Unused padding                        |
//! |  0x03-...  | u8 * len  | Palette indexes                       |
//! |  len+0x03  |    u8     | Unused padding                        |
//!
//! so the next post starts `len + 4` bytes after the current one.

/// Marks the end of a column
pub const POST_END: u8 = 0xFF;
/// Header bytes before the first pixel of a post
pub const POST_HEADER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Post<'a> {
    /// Offset of the post header in the slice being walked
    pub offset: usize,
    pub top_delta: u8,
    pub pixels: &'a [u8],
}

/// Walks the posts of one column. Stops at the terminator, or quietly at the
/// first post that would read outside of the data.
pub struct PostIter<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> PostIter<'a> {
    /// `start` is the offset of the first post header within `data`
    pub fn new(data: &'a [u8], start: usize) -> Self {
        Self {
            data,
            pos: start,
            done: false,
        }
    }

    /// Offset of the next post header
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for PostIter<'a> {
    type Item = Post<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let top_delta = match self.data.get(self.pos) {
            Some(&POST_END) | None => {
                self.done = true;
                return None;
            }
            Some(&b) => b,
        };
        let Some(&len) = self.data.get(self.pos + 1) else {
            self.done = true;
            return None;
        };
        let start = self.pos + POST_HEADER;
        let Some(pixels) = self.data.get(start..start + len as usize) else {
            self.done = true;
            return None;
        };
        let post = Post {
            offset: self.pos,
            top_delta,
            pixels,
        };
        self.pos += len as usize + 4;
        Some(post)
    }
}

/// Writes posts into a fixed region of a buffer. Only the header bytes and
/// pixels are written, padding bytes are left alone.
pub struct PostWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    end: usize,
}

impl<'a> PostWriter<'a> {
    /// The region is `buf[start..end]`, `end` is clamped to the buffer
    pub fn new(buf: &'a mut [u8], start: usize, end: usize) -> Self {
        let end = end.min(buf.len());
        Self { buf, pos: start, end }
    }

    /// Append a post. Returns `false` without writing when the post plus a
    /// terminator would not fit in the region.
    pub fn push(&mut self, top_delta: u8, pixels: &[u8]) -> bool {
        let len = pixels.len();
        if len > u8::MAX as usize || self.pos + len + 4 + 1 > self.end {
            return false;
        }
        self.buf[self.pos] = top_delta;
        self.buf[self.pos + 1] = len as u8;
        let start = self.pos + POST_HEADER;
        self.buf[start..start + len].copy_from_slice(pixels);
        self.pos += len + 4;
        true
    }

    /// Write the terminator if there is room, returns the final offset
    pub fn finish(self) -> usize {
        if self.pos < self.end {
            self.buf[self.pos] = POST_END;
        }
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_posts() {
        let data = [2, 2, 0, 7, 8, 0, 10, 1, 0, 5, 0, POST_END];
        let posts: Vec<Post> = PostIter::new(&data, 0).collect();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].top_delta, 2);
        assert_eq!(posts[0].pixels, &[7, 8]);
        assert_eq!(posts[1].offset, 6);
        assert_eq!(posts[1].pixels, &[5]);
    }

    #[test]
    fn truncated_column_stops() {
        let data = [0, 10, 0, 1, 2];
        assert_eq!(PostIter::new(&data, 0).count(), 0);
        assert_eq!(PostIter::new(&data, 100).count(), 0);
        // Missing terminator after a whole post
        let data = [0, 1, 0, 9, 0];
        let mut iter = PostIter::new(&data, 0);
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert_eq!(iter.position(), 5);
    }

    #[test]
    fn writer_respects_region() {
        let mut buf = [0u8; 12];
        let mut writer = PostWriter::new(&mut buf, 0, 12);
        assert!(writer.push(0, &[1, 2, 3]));
        // 7 + 3 + 4 + 1 > 12
        assert!(!writer.push(5, &[4, 5, 6]));
        assert_eq!(writer.finish(), 7);
        assert_eq!(buf[..8], [0, 3, 0, 1, 2, 3, 0, POST_END]);

        let posts: Vec<Post> = PostIter::new(&buf, 0).collect();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].pixels, &[1, 2, 3]);
    }
}
