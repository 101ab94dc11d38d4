use log::debug;
use math::FixedPoint;
use render_trait::PlaneSpans;

use super::defs::{PLANE_UNMARKED, Visplane};

/// The vanilla visplane limit, the list grows past it
pub const MAXVISPLANES: usize = 128;

pub struct VisPlaneRender {
    // Here comes the obnoxious "visplane".
    pub visplanes: Vec<Visplane>,
    /// Planes in use this frame
    pub lastvisplane: usize,
    screen_width: usize,
}

impl VisPlaneRender {
    pub fn new(screen_width: usize) -> Self {
        VisPlaneRender {
            visplanes: vec![Visplane::new(screen_width); MAXVISPLANES],
            lastvisplane: 0,
            screen_width,
        }
    }

    /// Doom function name `R_ClearPlanes`, at the beginning of a frame
    pub fn clear_planes(&mut self) {
        for p in self.visplanes[..self.lastvisplane].iter_mut() {
            p.clear();
        }
        self.lastvisplane = 0;
    }

    pub fn planes(&self) -> &[Visplane] {
        &self.visplanes[..self.lastvisplane]
    }

    /// Take the next free plane, growing the list if needed
    fn new_plane(&mut self, height: FixedPoint, picnum: usize, lightlevel: i32) -> usize {
        if self.lastvisplane == self.visplanes.len() {
            if self.lastvisplane == MAXVISPLANES {
                debug!("R_FindPlane: Hit MAXVISPLANES ({MAXVISPLANES}) Vanilla limit");
            }
            let grow = self.visplanes.len().max(1);
            self.visplanes
                .extend(std::iter::repeat_n(Visplane::new(self.screen_width), grow));
        }
        let index = self.lastvisplane;
        self.lastvisplane += 1;

        let check = &mut self.visplanes[index];
        check.height = height;
        check.picnum = picnum;
        check.lightlevel = lightlevel;
        check.minx = self.screen_width as i32;
        check.maxx = -1;
        check.top.fill(PLANE_UNMARKED);
        index
    }

    /// Doom function name `R_FindPlane`. Find a plane matching height, picnum,
    /// light level. Otherwise return a new plane. Sky planes all match.
    pub fn find_plane(
        &mut self,
        mut height: FixedPoint,
        picnum: usize,
        mut light_level: i32,
        sky: bool,
    ) -> usize {
        if sky {
            height = FixedPoint::zero();
            light_level = 0;
        }

        for (index, plane) in self.visplanes[..self.lastvisplane].iter().enumerate() {
            if height == plane.height && picnum == plane.picnum && light_level == plane.lightlevel
            {
                return index;
            }
        }

        self.new_plane(height, picnum, light_level)
    }
}

impl PlaneSpans for VisPlaneRender {
    /// Check if this plane should be used, otherwise use a new plane.
    fn check_plane(&mut self, plane_idx: usize, start: i32, stop: i32) -> usize {
        let plane = &mut self.visplanes[plane_idx];

        let (intrl, unionl) = if start < plane.minx {
            (plane.minx, start)
        } else {
            (start, plane.minx)
        };

        let (intrh, unionh) = if stop > plane.maxx {
            (plane.maxx, stop)
        } else {
            (stop, plane.maxx)
        };

        let collides = (intrl.max(0)..=intrh)
            .any(|x| plane.top.get(x as usize).is_some_and(|&t| t != PLANE_UNMARKED));
        if !collides {
            plane.minx = unionl;
            plane.maxx = unionh;
            // Use the same plane
            return plane_idx;
        }

        // Otherwise make a new plane
        let (height, picnum, lightlevel) = (plane.height, plane.picnum, plane.lightlevel);
        let index = self.new_plane(height, picnum, lightlevel);
        let plane = &mut self.visplanes[index];
        plane.minx = start;
        plane.maxx = stop;
        index
    }

    fn mark(&mut self, plane: usize, x: i32, top: i32, bottom: i32) {
        if let Some(p) = self.visplanes.get_mut(plane) {
            if x >= 0 && (x as usize) < p.top.len() {
                p.top[x as usize] = top;
                p.bottom[x as usize] = bottom;
            }
        }
    }
}
