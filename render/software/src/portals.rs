//! Vertical clipping for windows/portals, used by the wall renderer and the
//! masked pass.

pub struct PortalClip {
    /// Clip values are the solid pixel bounding the range.
    ///  floorclip starts out SCREENHEIGHT
    ///  ceilingclip starts out -1
    pub floorclip: Vec<i32>,
    pub ceilingclip: Vec<i32>,
    screen_width: usize,
    screen_height: usize,
}

impl PortalClip {
    pub fn new(screen_width: usize, screen_height: usize) -> Self {
        let mut clip = PortalClip {
            floorclip: vec![0; screen_width],
            ceilingclip: vec![0; screen_width],
            screen_width,
            screen_height,
        };
        clip.clear();
        clip
    }

    /// Once per frame, before any wall
    pub fn clear(&mut self) {
        self.floorclip.fill(self.screen_height as i32);
        self.ceilingclip.fill(-1);
    }

    pub fn screen_width(&self) -> usize {
        self.screen_width
    }

    pub fn screen_height(&self) -> usize {
        self.screen_height
    }
}

#[cfg(test)]
mod tests {
    use super::PortalClip;

    #[test]
    fn default_portal_clip() {
        let mut rd = PortalClip::new(640, 400);
        assert!(rd.floorclip.iter().all(|&c| c == 400));
        rd.floorclip[3] = 10;
        rd.ceilingclip[3] = 9;
        rd.clear();
        assert_eq!(rd.floorclip[3], 400);
        assert!(rd.ceilingclip.iter().all(|&c| c == -1));
        assert_eq!(rd.screen_width(), 640);
    }
}
