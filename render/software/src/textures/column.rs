use wad::posts::{POST_END, POST_HEADER, PostIter};

/// A column with nothing in it, for masked draws of columns no patch covers
static EMPTY_COLUMN: [u8; 4] = [POST_END, 0, 0, 0];

/// A texture column as handed out by [`super::TextureData::get_column`].
///
/// `offset` points at the first pixel the way `R_GetColumn` returns a
/// pointer, so the same column can be read either as a flat run of pixels
/// (opaque walls) or as posts starting at `offset - 3` (masked walls).
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    data: &'a [u8],
    offset: usize,
    height: usize,
}

impl<'a> Column<'a> {
    pub(crate) fn new(data: &'a [u8], offset: usize, height: usize) -> Self {
        Self {
            data,
            offset,
            height,
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(&EMPTY_COLUMN, POST_HEADER, 0)
    }

    /// Up to `height` bytes from the column start
    pub fn pixels(&self) -> &'a [u8] {
        let end = (self.offset + self.height).min(self.data.len());
        self.data.get(self.offset..end).unwrap_or(&[])
    }

    /// The column read as run-length posts
    pub fn posts(&self) -> PostIter<'a> {
        match self.offset.checked_sub(POST_HEADER) {
            Some(start) => PostIter::new(self.data, start),
            None => PostIter::new(&EMPTY_COLUMN, 0),
        }
    }

    /// The whole buffer this column lives in, a patch lump or a composite
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_and_post_views() {
        let data = [0, 2, 0, 5, 6, 0, POST_END, 0];
        let col = Column::new(&data, 3, 4);
        assert_eq!(col.pixels(), &[5, 6, 0, POST_END]);
        let posts: Vec<_> = col.posts().collect();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].pixels, &[5, 6]);
    }

    #[test]
    fn empty_column_has_no_posts() {
        let col = Column::empty();
        assert!(col.pixels().is_empty());
        assert_eq!(col.posts().count(), 0);
    }

    #[test]
    fn short_buffer_clamps() {
        let data = [1, 2, 3];
        let col = Column::new(&data, 1, 10);
        assert_eq!(col.pixels(), &[2, 3]);
        assert_eq!(col.posts().count(), 0);
    }
}
