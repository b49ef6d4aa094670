//! Quad construction helpers.

use galena_protocol::{CommandSink, Rgba8, Vertex};

/// A screen-aligned quad with per-corner position, depth, and color.
///
/// Defaults to the full viewport square at depth 1.0 (the far plane)
/// in opaque white. Setters mutate in place and chain, so a quad can
/// be built once and then nudged between draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    // Top-left, top-right, bottom-right, bottom-left: the order the
    // draw command expects.
    vertices: [Vertex; 4],
}

impl Quad {
    pub fn new() -> Self {
        let white = Rgba8::new(0xff, 0xff, 0xff, 0xff);
        Self {
            vertices: [
                Vertex { x: -1.0, y: 1.0, depth: 1.0, color: white },
                Vertex { x: 1.0, y: 1.0, depth: 1.0, color: white },
                Vertex { x: 1.0, y: -1.0, depth: 1.0, color: white },
                Vertex { x: -1.0, y: -1.0, depth: 1.0, color: white },
            ],
        }
    }

    pub fn top_left(&mut self, x: f32, y: f32, depth: f32) -> &mut Self {
        self.vertices[0].x = x;
        self.vertices[0].y = y;
        self.vertices[0].depth = depth;
        self
    }

    pub fn top_right(&mut self, x: f32, y: f32, depth: f32) -> &mut Self {
        self.vertices[1].x = x;
        self.vertices[1].y = y;
        self.vertices[1].depth = depth;
        self
    }

    pub fn bottom_right(&mut self, x: f32, y: f32, depth: f32) -> &mut Self {
        self.vertices[2].x = x;
        self.vertices[2].y = y;
        self.vertices[2].depth = depth;
        self
    }

    pub fn bottom_left(&mut self, x: f32, y: f32, depth: f32) -> &mut Self {
        self.vertices[3].x = x;
        self.vertices[3].y = y;
        self.vertices[3].depth = depth;
        self
    }

    /// Sets every corner to `depth`, keeping positions.
    pub fn at_depth(&mut self, depth: f32) -> &mut Self {
        for vertex in &mut self.vertices {
            vertex.depth = depth;
        }
        self
    }

    /// Sets every corner to the same color.
    pub fn color_rgba(&mut self, r: u8, g: u8, b: u8, a: u8) -> &mut Self {
        for vertex in &mut self.vertices {
            vertex.color = Rgba8::new(r, g, b, a);
        }
        self
    }

    pub fn vertices(&self) -> [Vertex; 4] {
        self.vertices
    }

    pub fn draw<S: CommandSink>(&self, sink: &mut S) {
        sink.draw_quad(self.vertices);
    }
}

impl Default for Quad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena_protocol::{Command, RecordingSink};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_to_a_far_white_unit_square() {
        let quad = Quad::new();
        for vertex in quad.vertices() {
            assert_eq!(vertex.depth, 1.0);
            assert_eq!(vertex.color, Rgba8::new(0xff, 0xff, 0xff, 0xff));
        }
        let [tl, tr, br, bl] = quad.vertices();
        assert_eq!((tl.x, tl.y), (-1.0, 1.0));
        assert_eq!((tr.x, tr.y), (1.0, 1.0));
        assert_eq!((br.x, br.y), (1.0, -1.0));
        assert_eq!((bl.x, bl.y), (-1.0, -1.0));
    }

    #[test]
    fn setters_chain_and_mutate_in_place() {
        let mut quad = Quad::new();
        quad.color_rgba(0, 0, 0xff, 0xff)
            .top_left(-1.0, 1.0, 0.2)
            .bottom_left(-1.0, -1.0, 0.5)
            .top_right(1.0, 1.0, 0.5)
            .bottom_right(1.0, -1.0, 0.8);

        let [tl, tr, br, bl] = quad.vertices();
        assert_eq!(tl.depth, 0.2);
        assert_eq!(tr.depth, 0.5);
        assert_eq!(br.depth, 0.8);
        assert_eq!(bl.depth, 0.5);
        assert_eq!(tl.color, Rgba8::new(0, 0, 0xff, 0xff));

        // A later nudge only touches what it names.
        quad.at_depth(0.5);
        assert_eq!(quad.vertices()[2].depth, 0.5);
        assert_eq!(quad.vertices()[2].color, Rgba8::new(0, 0, 0xff, 0xff));
    }

    #[test]
    fn draw_submits_the_corners_in_wire_order() {
        let mut sink = RecordingSink::default();
        let mut quad = Quad::new();
        quad.at_depth(0.5).color_rgba(0xff, 0, 0, 0xff);
        quad.draw(&mut sink);

        assert_eq!(sink.commands, vec![Command::DrawQuad { vertices: quad.vertices() }]);
    }
}
