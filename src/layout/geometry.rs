use serde::Serialize;

/// Database units, one unit per nanometre in the bundled PDKs.
pub type Coord = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: Coord, dy: Coord) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle given by its lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub ll: Point,
    pub ur: Point,
}

impl Rect {
    /// Corners are normalized, so `(x0, y0)` need not be the lower-left one.
    pub fn new(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> Self {
        Self {
            ll: Point::new(x0.min(x1), y0.min(y1)),
            ur: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    pub fn from_size(origin: Point, width: Coord, height: Coord) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    pub fn width(&self) -> Coord {
        self.ur.x - self.ll.x
    }

    pub fn height(&self) -> Coord {
        self.ur.y - self.ll.y
    }

    pub fn center(&self) -> Point {
        Point::new((self.ll.x + self.ur.x) / 2, (self.ll.y + self.ur.y) / 2)
    }

    pub fn translate(&self, dx: Coord, dy: Coord) -> Self {
        Self { ll: self.ll.offset(dx, dy), ur: self.ur.offset(dx, dy) }
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.ll.x <= p.x && p.x <= self.ur.x && self.ll.y <= p.y && p.y <= self.ur.y
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.ll.x <= other.ll.x && other.ur.x <= self.ur.x
            && self.ll.y <= other.ll.y && other.ur.y <= self.ur.y
    }

    /// Interiors intersect; shared edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.ll.x < other.ur.x && other.ll.x < self.ur.x
            && self.ll.y < other.ur.y && other.ll.y < self.ur.y
    }

    /// Closed rectangles intersect, so abutting edges count.
    pub fn touches(&self, other: &Rect) -> bool {
        self.ll.x <= other.ur.x && other.ll.x <= self.ur.x
            && self.ll.y <= other.ur.y && other.ll.y <= self.ur.y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            ll: Point::new(self.ll.x.min(other.ll.x), self.ll.y.min(other.ll.y)),
            ur: Point::new(self.ur.x.max(other.ur.x), self.ur.y.max(other.ur.y)),
        }
    }

    /// Keeps this rect's vertical extent and stretches it over `[x0, x1]`.
    pub fn span_x(&self, x0: Coord, x1: Coord) -> Rect {
        Rect::new(x0, self.ll.y, x1, self.ur.y)
    }

    /// Keeps this rect's horizontal extent and stretches it over `[y0, y1]`.
    pub fn span_y(&self, y0: Coord, y1: Coord) -> Rect {
        Rect::new(self.ll.x, y0, self.ur.x, y1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Orientation {
    #[default]
    R0,
    /// Mirrored about the x axis (upside down).
    MX,
    /// Mirrored about the y axis.
    MY,
    /// Both mirrors, i.e. rotated by 180 degrees.
    XY,
}

impl Orientation {
    pub fn from_mirror(mirror_x: bool, mirror_y: bool) -> Self {
        match (mirror_x, mirror_y) {
            (false, false) => Self::R0,
            (true, false) => Self::MX,
            (false, true) => Self::MY,
            (true, true) => Self::XY,
        }
    }

    pub fn mirror_x(&self) -> bool {
        matches!(self, Self::MX | Self::XY)
    }

    pub fn mirror_y(&self) -> bool {
        matches!(self, Self::MY | Self::XY)
    }
}

/// Where an instance sits in its parent. The origin is the lower-left corner of the
/// placed bounding box, so a mirrored instance occupies the same area as an unmirrored one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub origin: Point,
    pub orientation: Orientation,
}

impl Placement {
    pub fn new(origin: Point, orientation: Orientation) -> Self {
        Self { origin, orientation }
    }

    /// Maps a point of a template with the given boundary into parent coordinates.
    pub fn transform_point(&self, p: Point, boundary: &Rect) -> Point {
        let x = if self.orientation.mirror_y() {
            boundary.ur.x - (p.x - boundary.ll.x)
        } else {
            p.x
        };
        let y = if self.orientation.mirror_x() {
            boundary.ur.y - (p.y - boundary.ll.y)
        } else {
            p.y
        };
        Point::new(x - boundary.ll.x + self.origin.x, y - boundary.ll.y + self.origin.y)
    }

    pub fn transform_rect(&self, r: &Rect, boundary: &Rect) -> Rect {
        let a = self.transform_point(r.ll, boundary);
        let b = self.transform_point(r.ur, boundary);
        Rect::new(a.x, a.y, b.x, b.y)
    }

    /// Area the template occupies once placed.
    pub fn footprint(&self, boundary: &Rect) -> Rect {
        Rect::from_size(self.origin, boundary.width(), boundary.height())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mirror_x_is_anchored_at_origin() {
        let boundary = Rect::new(0, 0, 1200, 1580);
        let vdd = Rect::new(0, 1440, 1200, 1540);

        let placement = Placement::new(Point::new(0, 1580), Orientation::MX);
        let placed = placement.transform_rect(&vdd, &boundary);
        assert_eq!(placed, Rect::new(0, 1620, 1200, 1720));
        assert_eq!(placement.footprint(&boundary), Rect::new(0, 1580, 1200, 3160));
    }

    #[test]
    fn test_mirror_y() {
        let boundary = Rect::new(0, 0, 1200, 1580);
        let bl = Rect::new(160, 0, 300, 1580);
        let placement = Placement::new(Point::new(1200, 0), Orientation::MY);
        assert_eq!(placement.transform_rect(&bl, &boundary), Rect::new(2100, 0, 2240, 1580));

        let placement = Placement::new(Point::new(0, 0), Orientation::XY);
        assert_eq!(placement.transform_point(Point::new(0, 0), &boundary), Point::new(1200, 1580));
    }

    #[test]
    fn test_overlap_and_touch() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        assert!(!a.overlaps(&b));
        assert!(a.touches(&b));
        assert!(a.overlaps(&Rect::new(5, 5, 6, 6)));
        assert!(!a.touches(&Rect::new(11, 0, 20, 10)));
        assert_eq!(a.union(&b), Rect::new(0, 0, 20, 10));
    }
}
