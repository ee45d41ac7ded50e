//! Display cutouts (notches, punch holes) described by SVG path data.
//!
//! Only the bounding box of a cutout is computed. Curves are bounded by
//! their control points, elliptical arcs by their exact extremes.

use crate::LoadError;
use std::f64::consts::PI;

/// An axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, clamped to `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    /// Exclusive bottom edge, clamped to `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    /// Returns true if the point lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// A region of the panel that can't display content.
#[derive(Debug, Clone, PartialEq)]
pub struct Cutout {
    name: Option<String>,
    path: String,
    bounds: Rect,
}

impl Cutout {
    /// Creates a cutout, computing its bounds from the SVG path.
    pub fn new(name: Option<String>, path: &str) -> std::result::Result<Self, LoadError> {
        let bounds = path_bounds(path)?;
        Ok(Self {
            name,
            path: path.to_string(),
            bounds,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The SVG path data as given in the database.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The bounding box of the path.
    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }
}

/// Computes the integer bounding box of an SVG path.
///
/// Supports the full command set of SVG 1.1 path data (`M L H V C S Q T A Z`
/// in absolute and relative form).
pub fn path_bounds(path: &str) -> std::result::Result<Rect, LoadError> {
    let mut parser = PathParser::new(path);
    let mut bounds = Bounds::default();

    let mut cur = (0.0, 0.0);
    let mut start = cur;
    // Control point of the previous curve segment, for S/T reflection.
    let mut last_cubic: Option<(f64, f64)> = None;
    let mut last_quad: Option<(f64, f64)> = None;
    let mut first = true;

    parser.skip_separators();
    if parser.at_end() {
        return Err(parser.error("empty path"));
    }

    while !parser.at_end() {
        let mut cmd = parser.command()?;
        if first && !matches!(cmd, 'M' | 'm') {
            return Err(parser.error("path must start with a moveto"));
        }
        first = false;

        if matches!(cmd, 'Z' | 'z') {
            cur = start;
            last_cubic = None;
            last_quad = None;
            parser.skip_separators();
            continue;
        }

        loop {
            let rel = cmd.is_ascii_lowercase();
            let origin = if rel { cur } else { (0.0, 0.0) };
            let mut cubic_ctrl = None;
            let mut quad_ctrl = None;

            match cmd.to_ascii_uppercase() {
                'M' => {
                    let p = parser.point(origin)?;
                    cur = p;
                    start = p;
                    bounds.add(p);
                }
                'L' => {
                    cur = parser.point(origin)?;
                    bounds.add(cur);
                }
                'H' => {
                    cur.0 = origin.0 + parser.number()?;
                    bounds.add(cur);
                }
                'V' => {
                    cur.1 = origin.1 + parser.number()?;
                    bounds.add(cur);
                }
                'C' => {
                    let c1 = parser.point(origin)?;
                    let c2 = parser.point(origin)?;
                    let end = parser.point(origin)?;
                    bounds.add(c1);
                    bounds.add(c2);
                    bounds.add(end);
                    cubic_ctrl = Some(c2);
                    cur = end;
                }
                'S' => {
                    let c1 = reflect(last_cubic, cur);
                    let c2 = parser.point(origin)?;
                    let end = parser.point(origin)?;
                    bounds.add(c1);
                    bounds.add(c2);
                    bounds.add(end);
                    cubic_ctrl = Some(c2);
                    cur = end;
                }
                'Q' => {
                    let c = parser.point(origin)?;
                    let end = parser.point(origin)?;
                    bounds.add(c);
                    bounds.add(end);
                    quad_ctrl = Some(c);
                    cur = end;
                }
                'T' => {
                    let c = reflect(last_quad, cur);
                    let end = parser.point(origin)?;
                    bounds.add(c);
                    bounds.add(end);
                    quad_ctrl = Some(c);
                    cur = end;
                }
                'A' => {
                    let rx = parser.number()?;
                    let ry = parser.number()?;
                    let rotation = parser.number()?;
                    let large_arc = parser.flag()?;
                    let sweep = parser.flag()?;
                    let end = parser.point(origin)?;
                    let arc = EllipticalArc {
                        from: cur,
                        to: end,
                        rx,
                        ry,
                        rotation,
                        large_arc,
                        sweep,
                    };
                    arc.add_to(&mut bounds);
                    cur = end;
                }
                _ => return Err(parser.error("unknown command")),
            }

            last_cubic = cubic_ctrl;
            last_quad = quad_ctrl;

            parser.skip_separators();
            if parser.at_end() || parser.peek_command() {
                break;
            }
            // Extra coordinate pairs after a moveto are implicit linetos.
            cmd = match cmd {
                'M' => 'L',
                'm' => 'l',
                other => other,
            };
        }
    }

    Ok(bounds.to_rect())
}

fn reflect(ctrl: Option<(f64, f64)>, cur: (f64, f64)) -> (f64, f64) {
    match ctrl {
        Some((x, y)) => (2.0 * cur.0 - x, 2.0 * cur.1 - y),
        None => cur,
    }
}

#[derive(Debug)]
struct Bounds {
    min: (f64, f64),
    max: (f64, f64),
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: (f64::INFINITY, f64::INFINITY),
            max: (f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
}

impl Bounds {
    fn add(&mut self, (x, y): (f64, f64)) {
        self.min.0 = self.min.0.min(x);
        self.min.1 = self.min.1.min(y);
        self.max.0 = self.max.0.max(x);
        self.max.1 = self.max.1.max(y);
    }

    fn to_rect(&self) -> Rect {
        let x0 = self.min.0.floor();
        let y0 = self.min.1.floor();
        let x1 = self.max.0.ceil();
        let y1 = self.max.1.ceil();
        Rect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32)
    }
}

/// An elliptical arc in endpoint parameterization.
struct EllipticalArc {
    from: (f64, f64),
    to: (f64, f64),
    rx: f64,
    ry: f64,
    rotation: f64,
    large_arc: bool,
    sweep: bool,
}

impl EllipticalArc {
    fn add_to(&self, bounds: &mut Bounds) {
        bounds.add(self.from);
        bounds.add(self.to);

        let mut rx = self.rx.abs();
        let mut ry = self.ry.abs();
        if self.from == self.to || rx == 0.0 || ry == 0.0 {
            return;
        }

        // Endpoint to center conversion, SVG 1.1 appendix F.6.5.
        let phi = self.rotation.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let dx = (self.from.0 - self.to.0) / 2.0;
        let dy = (self.from.1 - self.to.1) / 2.0;
        let x1 = cos_phi * dx + sin_phi * dy;
        let y1 = -sin_phi * dx + cos_phi * dy;

        let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
        if lambda > 1.0 {
            rx *= lambda.sqrt();
            ry *= lambda.sqrt();
        }

        let num = rx * rx * ry * ry - rx * rx * y1 * y1 - ry * ry * x1 * x1;
        let den = rx * rx * y1 * y1 + ry * ry * x1 * x1;
        let mut coef = (num / den).max(0.0).sqrt();
        if self.large_arc == self.sweep {
            coef = -coef;
        }
        let cx1 = coef * rx * y1 / ry;
        let cy1 = -coef * ry * x1 / rx;
        let cx = cos_phi * cx1 - sin_phi * cy1 + (self.from.0 + self.to.0) / 2.0;
        let cy = sin_phi * cx1 + cos_phi * cy1 + (self.from.1 + self.to.1) / 2.0;

        let theta1 = angle((1.0, 0.0), ((x1 - cx1) / rx, (y1 - cy1) / ry));
        let mut delta = angle(
            ((x1 - cx1) / rx, (y1 - cy1) / ry),
            ((-x1 - cx1) / rx, (-y1 - cy1) / ry),
        );
        if !self.sweep && delta > 0.0 {
            delta -= 2.0 * PI;
        } else if self.sweep && delta < 0.0 {
            delta += 2.0 * PI;
        }

        let point = |theta: f64| {
            let (sin_t, cos_t) = theta.sin_cos();
            (
                cx + rx * cos_phi * cos_t - ry * sin_phi * sin_t,
                cy + rx * sin_phi * cos_t + ry * cos_phi * sin_t,
            )
        };

        // Angles where dx/dtheta or dy/dtheta vanish.
        let tx = (-ry * sin_phi).atan2(rx * cos_phi);
        let ty = (ry * cos_phi).atan2(rx * sin_phi);
        for theta in [tx, tx + PI, ty, ty + PI] {
            if in_sweep(theta, theta1, delta) {
                bounds.add(point(theta));
            }
        }
    }
}

fn angle(u: (f64, f64), v: (f64, f64)) -> f64 {
    (u.0 * v.1 - u.1 * v.0).atan2(u.0 * v.0 + u.1 * v.1)
}

fn in_sweep(theta: f64, start: f64, delta: f64) -> bool {
    if delta >= 0.0 {
        (theta - start).rem_euclid(2.0 * PI) <= delta
    } else {
        (start - theta).rem_euclid(2.0 * PI) <= -delta
    }
}

struct PathParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn error(&self, reason: &str) -> LoadError {
        LoadError::CutoutPath {
            path: self.src.to_string(),
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek_command(&self) -> bool {
        self.bytes
            .get(self.pos)
            .is_some_and(|&b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E'))
    }

    fn command(&mut self) -> std::result::Result<char, LoadError> {
        self.skip_separators();
        if !self.peek_command() {
            return Err(self.error("expected command"));
        }
        let c = self.bytes[self.pos] as char;
        if !"MmLlHhVvCcSsQqTtAaZz".contains(c) {
            return Err(self.error("unknown command"));
        }
        self.pos += 1;
        Ok(c)
    }

    fn number(&mut self) -> std::result::Result<f64, LoadError> {
        self.skip_separators();
        let start = self.pos;

        if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let int_digits = self.digits();
        let mut frac_digits = 0;
        if self.bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            frac_digits = self.digits();
        }
        if int_digits == 0 && frac_digits == 0 {
            self.pos = start;
            return Err(self.error("expected number"));
        }
        if matches!(self.bytes.get(self.pos), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                self.pos = mark;
            }
        }

        self.src[start..self.pos].parse::<f64>().map_err(|_| {
            self.pos = start;
            self.error("invalid number")
        })
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn flag(&mut self) -> std::result::Result<bool, LoadError> {
        self.skip_separators();
        match self.bytes.get(self.pos) {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(self.error("expected arc flag")),
        }
    }

    fn point(&mut self, origin: (f64, f64)) -> std::result::Result<(f64, f64), LoadError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok((origin.0 + x, origin.1 + y))
    }
}
