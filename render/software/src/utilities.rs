use math::{
    ANG90, ANGLETOFINESHIFT, Angle, FINEANGLES, FRACBITS, FRACUNIT, FixedPoint, finesine,
    finetangent, fixed_div, fixed_mul,
};

/// Fine angles covered by the view, 90 degrees
pub const FIELDOFVIEW: usize = 2048;

/// The screen to angle tables and projection for one view size
#[derive(Debug, Clone)]
pub struct ViewProjection {
    pub view_width: i32,
    pub view_height: i32,
    pub centerx: i32,
    pub centery: i32,
    pub centerxfrac: FixedPoint,
    pub centeryfrac: FixedPoint,
    pub projection: FixedPoint,
    /// Screen column for each fine angle of the half turn in front of the view
    pub viewangletox: Vec<i32>,
    /// The angle from the centre of view to each screen column, `view_width + 1`
    /// entries
    pub xtoviewangle: Vec<Angle>,
    /// Half the view angle, `xtoviewangle[0]`
    pub clipangle: Angle,
}

impl ViewProjection {
    /// Doom function names `R_ExecuteSetViewSize` and `R_InitTextureMapping`
    pub fn new(view_width: usize, view_height: usize) -> Self {
        let view_width = view_width as i32;
        let view_height = view_height as i32;
        let centerx = view_width / 2;
        let centery = view_height / 2;
        let centerxfrac = centerx << FRACBITS;
        let centeryfrac = centery << FRACBITS;

        // Use tangent table to generate viewangletox: viewangletox will give
        // the next greatest x after the view angle.
        let focallength = fixed_div(centerxfrac, finetangent(FINEANGLES / 4 + FIELDOFVIEW / 2));
        let mut viewangletox: Vec<i32> = (0..FINEANGLES / 2)
            .map(|i| {
                let tan = finetangent(i);
                if tan > FRACUNIT * 2 {
                    -1
                } else if tan < -FRACUNIT * 2 {
                    view_width + 1
                } else {
                    let t = fixed_mul(tan, focallength);
                    let t = (centerxfrac - t + FRACUNIT - 1) >> FRACBITS;
                    t.clamp(-1, view_width + 1)
                }
            })
            .collect();

        // Scan viewangletox to generate the inverse, the angle to the left edge
        // of each column
        let xtoviewangle = (0..=view_width)
            .map(|x| {
                let i = viewangletox
                    .iter()
                    .position(|&t| t <= x)
                    .unwrap_or(viewangletox.len());
                Angle::new(((i as u32) << ANGLETOFINESHIFT).wrapping_sub(ANG90))
            })
            .collect::<Vec<Angle>>();

        // Take out the fencepost cases
        for t in viewangletox.iter_mut() {
            if *t == -1 {
                *t = 0;
            } else if *t == view_width + 1 {
                *t = view_width;
            }
        }

        let clipangle = xtoviewangle[0];
        Self {
            view_width,
            view_height,
            centerx,
            centery,
            centerxfrac: FixedPoint::new(centerxfrac),
            centeryfrac: FixedPoint::new(centeryfrac),
            projection: FixedPoint::new(centerxfrac),
            viewangletox,
            xtoviewangle,
            clipangle,
        }
    }

    /// Angle of column `x` relative to the view direction
    #[inline]
    pub fn x_to_view_angle(&self, x: i32) -> Angle {
        self.xtoviewangle
            .get(x.max(0) as usize)
            .copied()
            .unwrap_or(self.clipangle)
    }
}

/// Doom function name `R_ScaleFromGlobalAngle`
///
/// The scale of a wall at `visangle`. An ill-conditioned division, which is
/// a wall seen edge on, gives `max_scale`.
pub fn scale_from_global_angle(
    visangle: Angle,
    view_angle: Angle,
    normal_angle: Angle,
    distance: FixedPoint,
    projection: FixedPoint,
    max_scale: FixedPoint,
) -> FixedPoint {
    let anglea = Angle::new(ANG90) + (visangle - view_angle);
    let angleb = Angle::new(ANG90) + (visangle - normal_angle);
    let den = fixed_mul(distance.raw(), finesine(anglea.fine()));
    let num = fixed_mul(projection.raw(), finesine(angleb.fine()));

    if den > num >> 16 {
        let scale = fixed_div(num, den);
        if scale > max_scale.raw() {
            max_scale
        } else if scale < 256 {
            FixedPoint::new(256)
        } else {
            FixedPoint::new(scale)
        }
    } else {
        max_scale
    }
}

/// Whole unit length of a line, as fixed point
pub fn line_length(x1: FixedPoint, y1: FixedPoint, x2: FixedPoint, y2: FixedPoint) -> FixedPoint {
    let dx = ((x1.raw() >> FRACBITS) - (x2.raw() >> FRACBITS)) as i64;
    let dy = ((y1.raw() >> FRACBITS) - (y2.raw() >> FRACBITS)) as i64;
    let len = ((dx * dx + dy * dy) as u64).isqrt() as i32;
    FixedPoint::new(len << FRACBITS)
}
