mod error;
mod geometry;
mod verify;

pub use error::*;
pub use geometry::*;
pub use verify::*;

use serde::Serialize;
use crate::circuit::ShrString;

/// Labelled conductor that marks where a port can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutPin {
    pub name: ShrString,
    pub layer: ShrString,
    pub rect: Rect,
}

/// Drawn conductor without a label. `net` is set when it belongs to a known net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub layer: ShrString,
    pub rect: Rect,
    pub net: Option<ShrString>,
}

/// Via stack centred on a point, e.g. `[m2, via2, m3]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Via {
    pub layers: Vec<ShrString>,
    pub center: Point,
    pub net: ShrString,
}

impl Via {
    pub fn top_layer(&self) -> Option<&ShrString> {
        self.layers.last()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub boundary: Rect,
    pub pins: Vec<LayoutPin>,
    pub shapes: Vec<Shape>,
    pub vias: Vec<Via>,
}

impl Layout {
    pub fn new(width: Coord, height: Coord) -> Self {
        Self {
            boundary: Rect::new(0, 0, width, height),
            ..Default::default()
        }
    }

    pub fn width(&self) -> Coord {
        self.boundary.width()
    }

    pub fn height(&self) -> Coord {
        self.boundary.height()
    }

    pub fn add_pin<S: Into<ShrString>, L: Into<ShrString>>(&mut self, name: S, layer: L, rect: Rect) {
        self.pins.push(LayoutPin { name: name.into(), layer: layer.into(), rect });
    }

    pub fn add_rect<L: Into<ShrString>>(&mut self, layer: L, rect: Rect, net: Option<ShrString>) {
        self.shapes.push(Shape { layer: layer.into(), rect, net });
    }

    pub fn add_via<S: Into<ShrString>>(&mut self, layers: &[ShrString], center: Point, net: S) {
        self.vias.push(Via { layers: layers.to_vec(), center, net: net.into() });
    }

    pub fn pins_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LayoutPin> + 'a {
        self.pins.iter().filter(move |pin| pin.name == name)
    }

    pub fn get_pin(&self, name: &str) -> Option<&LayoutPin> {
        self.pins.iter().find(|pin| pin.name == name)
    }

    pub fn has_pin(&self, name: &str) -> bool {
        self.get_pin(name).is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pin_lookup_by_borrowed_name() {
        let mut layout = Layout::new(100, 100);
        layout.add_pin("vdd_0", "m3", Rect::new(0, 10, 100, 20));
        layout.add_pin("vdd_0", "m3", Rect::new(0, 80, 100, 90));

        let name = String::from("vdd_0");
        let pin = layout.get_pin(&name);
        drop(name);
        assert_eq!(pin.map(|pin| pin.rect), Some(Rect::new(0, 10, 100, 20)));
        assert_eq!(layout.pins_named("vdd_0").count(), 2);
        assert!(!layout.has_pin("vdd_1"));
    }
}
