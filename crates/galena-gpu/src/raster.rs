//! Triangle setup, coverage, and depth-plane interpolation.
//!
//! All setup math runs in `f64` over screen-space coordinates. That
//! keeps plane evaluation deterministic enough that two primitives
//! sharing a plane quantize to the same 24-bit depth at every pixel,
//! which the depth-freeze behavior depends on.

use galena_protocol::regs::{CullMode, DepthCompare};
use galena_protocol::xf::Viewport;
use galena_protocol::{Rgba8, Vertex};

use crate::efb::DEPTH_MAX;

/// A vertex after the viewport transform: pixel coordinates plus
/// inverted window depth.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScreenVertex {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
    pub color: Rgba8,
}

/// Applies the viewport transform. Clip-space y grows upward while
/// screen y grows downward, and depth is inverted so that larger stored
/// values are nearer.
pub(crate) fn to_screen(v: Vertex, vp: &Viewport) -> ScreenVertex {
    let near = f64::from(vp.depth_near);
    let far = f64::from(vp.depth_far);
    ScreenVertex {
        x: f64::from(vp.x) + (f64::from(v.x) + 1.0) * 0.5 * f64::from(vp.width),
        y: f64::from(vp.y) + (1.0 - f64::from(v.y)) * 0.5 * f64::from(vp.height),
        depth: far - f64::from(v.depth) * (far - near),
        color: v.color,
    }
}

/// Trivial rejection: a triangle whose vertices all sit beyond the same
/// face of the clip volume produces no fragments and, importantly, does
/// not touch the recorded depth plane. Partially clipped triangles are
/// rasterized as-is; coverage outside the framebuffer is discarded per
/// pixel.
pub(crate) fn outside_clip_volume(vertices: &[Vertex; 3]) -> bool {
    vertices.iter().all(|v| v.x < -1.0)
        || vertices.iter().all(|v| v.x > 1.0)
        || vertices.iter().all(|v| v.y < -1.0)
        || vertices.iter().all(|v| v.y > 1.0)
        || vertices.iter().all(|v| v.depth < 0.0)
        || vertices.iter().all(|v| v.depth > 1.0)
}

/// Screen-space depth as an affine function of pixel coordinates.
///
/// `PartialEq` compares raw coefficients; two planes are interchangeable
/// exactly when they are equal, since evaluation is deterministic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DepthPlane {
    ddx: f64,
    ddy: f64,
    d0: f64,
}

impl DepthPlane {
    /// A constant plane, as left behind by a screen-aligned primitive.
    pub fn flat(depth: f64) -> Self {
        Self { ddx: 0.0, ddy: 0.0, d0: depth }
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.d0 + self.ddx * x + self.ddy * y
    }
}

/// Per-triangle rasterization state: edge setup, color gradients, and
/// the depth plane.
pub(crate) struct TriangleSetup {
    v: [ScreenVertex; 3],
    area2: f64,
    plane: DepthPlane,
}

impl TriangleSetup {
    /// `None` for zero-area triangles, which produce no fragments and
    /// leave the recorded depth plane alone.
    pub fn new(v: [ScreenVertex; 3]) -> Option<Self> {
        let area2 = (v[1].x - v[0].x) * (v[2].y - v[0].y) - (v[2].x - v[0].x) * (v[1].y - v[0].y);
        if area2 == 0.0 {
            return None;
        }

        let d10 = v[1].depth - v[0].depth;
        let d20 = v[2].depth - v[0].depth;
        let ddx = (d10 * (v[2].y - v[0].y) - d20 * (v[1].y - v[0].y)) / area2;
        let ddy = (d20 * (v[1].x - v[0].x) - d10 * (v[2].x - v[0].x)) / area2;
        let d0 = v[0].depth - ddx * v[0].x - ddy * v[0].y;

        Some(Self { v, area2, plane: DepthPlane { ddx, ddy, d0 } })
    }

    pub fn plane(&self) -> DepthPlane {
        self.plane
    }

    /// Front-facing means clockwise in screen coordinates.
    pub fn culled(&self, mode: CullMode) -> bool {
        match mode {
            CullMode::None => false,
            CullMode::Front => self.area2 > 0.0,
            CullMode::Back => self.area2 < 0.0,
            CullMode::All => true,
        }
    }

    /// Pixel-space bounding box (min x, min y, max x, max y),
    /// unclamped.
    pub fn bounds(&self) -> (i64, i64, i64, i64) {
        let min_x = self.v[0].x.min(self.v[1].x).min(self.v[2].x);
        let min_y = self.v[0].y.min(self.v[1].y).min(self.v[2].y);
        let max_x = self.v[0].x.max(self.v[1].x).max(self.v[2].x);
        let max_y = self.v[0].y.max(self.v[1].y).max(self.v[2].y);
        (min_x.floor() as i64, min_y.floor() as i64, max_x.ceil() as i64, max_y.ceil() as i64)
    }

    /// Barycentric coordinates of `(px, py)` if the point is covered.
    ///
    /// Edges count as covered from both sides, so pixels on a shared
    /// edge are visited by both triangles and the depth test
    /// arbitrates.
    pub fn barycentric_at(&self, px: f64, py: f64) -> Option<[f64; 3]> {
        let l0 = edge(self.v[1], self.v[2], px, py) / self.area2;
        let l1 = edge(self.v[2], self.v[0], px, py) / self.area2;
        let l2 = edge(self.v[0], self.v[1], px, py) / self.area2;
        if l0 >= 0.0 && l1 >= 0.0 && l2 >= 0.0 {
            Some([l0, l1, l2])
        } else {
            None
        }
    }

    pub fn color_at(&self, bary: [f64; 3]) -> Rgba8 {
        Rgba8 {
            r: lerp_channel(bary, self.v[0].color.r, self.v[1].color.r, self.v[2].color.r),
            g: lerp_channel(bary, self.v[0].color.g, self.v[1].color.g, self.v[2].color.g),
            b: lerp_channel(bary, self.v[0].color.b, self.v[1].color.b, self.v[2].color.b),
            a: lerp_channel(bary, self.v[0].color.a, self.v[1].color.a, self.v[2].color.a),
        }
    }
}

fn edge(a: ScreenVertex, b: ScreenVertex, px: f64, py: f64) -> f64 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn lerp_channel(bary: [f64; 3], c0: u8, c1: u8, c2: u8) -> u8 {
    let value = bary[0] * f64::from(c0) + bary[1] * f64::from(c1) + bary[2] * f64::from(c2);
    value.round().clamp(0.0, 255.0) as u8
}

/// Window depth to the stored 24-bit value. Out-of-range planes (a
/// frozen plane can extend past the depth range) clamp instead of
/// wrapping.
pub(crate) fn quantize_depth(depth: f64) -> u32 {
    (depth.clamp(0.0, 1.0) * f64::from(DEPTH_MAX)).round() as u32
}

pub(crate) fn depth_test_passes(compare: DepthCompare, incoming: u32, stored: u32) -> bool {
    match compare {
        DepthCompare::Never => false,
        DepthCompare::Less => incoming < stored,
        DepthCompare::Equal => incoming == stored,
        DepthCompare::LessOrEqual => incoming <= stored,
        DepthCompare::Greater => incoming > stored,
        DepthCompare::NotEqual => incoming != stored,
        DepthCompare::GreaterOrEqual => incoming >= stored,
        DepthCompare::Always => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VIEWPORT: Viewport = Viewport {
        x: 20.0,
        y: 20.0,
        width: 50.0,
        height: 50.0,
        depth_near: 0.0,
        depth_far: 1.0,
    };

    fn vertex(x: f32, y: f32, depth: f32) -> Vertex {
        Vertex { x, y, depth, color: Rgba8::new(0xff, 0xff, 0xff, 0xff) }
    }

    fn screen(x: f64, y: f64, depth: f64) -> ScreenVertex {
        ScreenVertex { x, y, depth, color: Rgba8::new(0, 0, 0, 0xff) }
    }

    #[test]
    fn viewport_transform_maps_corners_and_inverts_depth() {
        let tl = to_screen(vertex(-1.0, 1.0, 0.0), &VIEWPORT);
        assert_eq!((tl.x, tl.y, tl.depth), (20.0, 20.0, 1.0));

        let br = to_screen(vertex(1.0, -1.0, 1.0), &VIEWPORT);
        assert_eq!((br.x, br.y, br.depth), (70.0, 70.0, 0.0));

        let mid = to_screen(vertex(0.0, 0.0, 0.5), &VIEWPORT);
        assert_eq!((mid.x, mid.y, mid.depth), (45.0, 45.0, 0.5));
    }

    #[test]
    fn plane_reproduces_vertex_depths() {
        let setup = TriangleSetup::new([
            screen(20.0, 20.0, 0.25),
            screen(70.0, 20.0, 0.5),
            screen(20.0, 70.0, 0.75),
        ])
        .unwrap();
        let plane = setup.plane();
        assert_eq!(plane.eval(20.0, 20.0), 0.25);
        assert_eq!(plane.eval(70.0, 20.0), 0.5);
        assert_eq!(plane.eval(20.0, 70.0), 0.75);
    }

    #[test]
    fn coplanar_triangles_derive_identical_planes() {
        // Both halves of an exactly planar quad. The coefficients must
        // match bit for bit, not just approximately.
        let quad = [
            screen(20.0, 20.0, 0.25),
            screen(70.0, 20.0, 0.5),
            screen(70.0, 70.0, 0.75),
            screen(20.0, 70.0, 0.5),
        ];
        let a = TriangleSetup::new([quad[0], quad[1], quad[2]]).unwrap();
        let b = TriangleSetup::new([quad[0], quad[2], quad[3]]).unwrap();
        assert_eq!(a.plane(), b.plane());
    }

    #[test]
    fn degenerate_triangles_have_no_setup() {
        assert!(TriangleSetup::new([
            screen(10.0, 10.0, 0.5),
            screen(20.0, 20.0, 0.5),
            screen(30.0, 30.0, 0.5),
        ])
        .is_none());
        assert!(TriangleSetup::new([
            screen(10.0, 10.0, 0.5),
            screen(10.0, 10.0, 0.5),
            screen(40.0, 20.0, 0.5),
        ])
        .is_none());
    }

    #[test]
    fn coverage_includes_shared_edges_from_both_sides() {
        let quad = [
            screen(0.0, 0.0, 0.5),
            screen(10.0, 0.0, 0.5),
            screen(10.0, 10.0, 0.5),
            screen(0.0, 10.0, 0.5),
        ];
        let a = TriangleSetup::new([quad[0], quad[1], quad[2]]).unwrap();
        let b = TriangleSetup::new([quad[0], quad[2], quad[3]]).unwrap();

        // On the diagonal.
        assert!(a.barycentric_at(5.0, 5.0).is_some());
        assert!(b.barycentric_at(5.0, 5.0).is_some());
        // Strictly inside one half only.
        assert!(a.barycentric_at(8.0, 2.0).is_some());
        assert!(b.barycentric_at(8.0, 2.0).is_none());
        assert!(b.barycentric_at(2.0, 8.0).is_some());
        assert!(a.barycentric_at(2.0, 8.0).is_none());
        // Outside the quad entirely.
        assert!(a.barycentric_at(11.0, 5.0).is_none());
        assert!(b.barycentric_at(-1.0, 5.0).is_none());
    }

    #[test]
    fn barycentric_weights_interpolate_color() {
        let mut tri = [
            screen(0.0, 0.0, 0.5),
            screen(10.0, 0.0, 0.5),
            screen(0.0, 10.0, 0.5),
        ];
        tri[0].color = Rgba8::new(200, 0, 0, 0xff);
        tri[1].color = Rgba8::new(0, 100, 0, 0xff);
        tri[2].color = Rgba8::new(0, 0, 60, 0xff);
        let setup = TriangleSetup::new(tri).unwrap();

        let at_v0 = setup.barycentric_at(0.0, 0.0).unwrap();
        assert_eq!(setup.color_at(at_v0), Rgba8::new(200, 0, 0, 0xff));

        // Midpoint of the v1..v2 edge: half of each endpoint.
        let mid = setup.barycentric_at(5.0, 5.0).unwrap();
        assert_eq!(setup.color_at(mid), Rgba8::new(0, 50, 30, 0xff));
    }

    #[test]
    fn winding_determines_the_culled_face() {
        let clockwise = TriangleSetup::new([
            screen(0.0, 0.0, 0.5),
            screen(10.0, 0.0, 0.5),
            screen(10.0, 10.0, 0.5),
        ])
        .unwrap();
        assert!(!clockwise.culled(CullMode::None));
        assert!(clockwise.culled(CullMode::Front));
        assert!(!clockwise.culled(CullMode::Back));
        assert!(clockwise.culled(CullMode::All));

        let counter = TriangleSetup::new([
            screen(0.0, 0.0, 0.5),
            screen(10.0, 10.0, 0.5),
            screen(10.0, 0.0, 0.5),
        ])
        .unwrap();
        assert!(!counter.culled(CullMode::Front));
        assert!(counter.culled(CullMode::Back));
    }

    #[test]
    fn trivial_rejection_needs_the_whole_triangle_beyond_one_face() {
        let past_far = [vertex(-1.0, 1.0, 1.1), vertex(1.0, 1.0, 1.1), vertex(1.0, -1.0, 1.1)];
        assert!(outside_clip_volume(&past_far));

        let past_right = [vertex(1.1, 1.0, 0.5), vertex(1.3, 1.0, 0.5), vertex(1.3, -1.0, 0.5)];
        assert!(outside_clip_volume(&past_right));

        // One vertex inside keeps the triangle alive.
        let straddling = [vertex(0.5, 0.0, 0.5), vertex(1.3, 1.0, 0.5), vertex(1.3, -1.0, 0.5)];
        assert!(!outside_clip_volume(&straddling));

        // Spanning two faces without being fully past either.
        let diagonal = [vertex(-1.5, 0.0, 0.5), vertex(1.5, 0.0, 0.5), vertex(0.0, 0.0, 0.5)];
        assert!(!outside_clip_volume(&diagonal));
    }

    #[test]
    fn quantization_clamps_and_rounds() {
        assert_eq!(quantize_depth(0.0), 0);
        assert_eq!(quantize_depth(1.0), DEPTH_MAX);
        assert_eq!(quantize_depth(-0.25), 0);
        assert_eq!(quantize_depth(1.75), DEPTH_MAX);
        assert_eq!(quantize_depth(0.5), 0x80_0000);
    }

    #[test]
    fn depth_compare_table() {
        use DepthCompare::*;
        let cases = [
            (Never, false, false, false),
            (Less, true, false, false),
            (Equal, false, true, false),
            (LessOrEqual, true, true, false),
            (Greater, false, false, true),
            (NotEqual, true, false, true),
            (GreaterOrEqual, false, true, true),
            (Always, true, true, true),
        ];
        for (compare, below, equal, above) in cases {
            assert_eq!(depth_test_passes(compare, 10, 20), below, "{compare:?} below");
            assert_eq!(depth_test_passes(compare, 20, 20), equal, "{compare:?} equal");
            assert_eq!(depth_test_passes(compare, 30, 20), above, "{compare:?} above");
        }
    }
}
