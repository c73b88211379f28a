//! Key points and curve shapes.
//!
//! A [`CurveShape`] owns a fixed number of key points (two for a line, three
//! for a quadratic, four for a cubic; the array types enforce it). Sample
//! points and arclength are cached and dropped by every mutator. Key points
//! are only reachable read-only through their shape, so a position edit
//! cannot bypass cache invalidation.

use std::cell::{Cell, Ref, RefCell};

use glam::{Mat2, Mat3, Vec2};
use tracing::trace;

use crate::config::SamplingConfig;
use crate::error::{PanelError, Result};
use crate::geometry::bezier::{CubicBezier, QuadraticBezier};
use crate::geometry::fit::{fit_polyline, FittedSegment};
use crate::geometry::tolerance::{sanitize_step, EPS_DENOM, LENGTH_TOLERANCE};
use crate::markup::Element;
use crate::model::{Bound, ObjectType};
use crate::object::{read_children, ObjectRef, ObjectState, PanelObject};

#[derive(Clone, Debug)]
pub struct KeyPoint {
    state: ObjectState,
    position: Vec2,
}

impl KeyPoint {
    pub fn new(position: Vec2) -> Self {
        KeyPoint {
            state: ObjectState::new(ObjectType::KeyPoint),
            position,
        }
    }

    pub fn with_id(id: u32, position: Vec2) -> Self {
        KeyPoint {
            state: ObjectState::with_id(id, ObjectType::KeyPoint),
            position,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, p: Vec2) {
        self.position = p;
    }
}

impl PanelObject for KeyPoint {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::KeyPoint
    }

    fn to_element(&self) -> Element {
        let mut e = self.state.element();
        e.set_attr_f32("x", self.position.x)
            .set_attr_f32("y", self.position.y);
        e
    }

    fn from_element(e: &Element) -> Result<Self> {
        let state = ObjectState::from_element(e, ObjectType::KeyPoint)?;
        let position = Vec2::new(e.require_f32("x")?, e.require_f32("y")?);
        Ok(KeyPoint { state, position })
    }

    fn collect_objects(&self) -> Vec<ObjectRef<'_>> {
        vec![ObjectRef::KeyPoint(self)]
    }

    fn collect_states_mut<'a>(&'a mut self, out: &mut Vec<&'a mut ObjectState>) {
        out.push(&mut self.state);
    }
}

/// Curve variants over their owned key points.
#[derive(Clone, Debug)]
pub enum Curve {
    Line([KeyPoint; 2]),
    Quadratic([KeyPoint; 3]),
    Cubic([KeyPoint; 4]),
}

impl Curve {
    pub fn kind(&self) -> ObjectType {
        match self {
            Curve::Line(_) => ObjectType::Line,
            Curve::Quadratic(_) => ObjectType::Quadratic,
            Curve::Cubic(_) => ObjectType::Cubic,
        }
    }

    pub fn points(&self) -> &[KeyPoint] {
        match self {
            Curve::Line(k) => k,
            Curve::Quadratic(k) => k,
            Curve::Cubic(k) => k,
        }
    }

    fn points_mut(&mut self) -> &mut [KeyPoint] {
        match self {
            Curve::Line(k) => k,
            Curve::Quadratic(k) => k,
            Curve::Cubic(k) => k,
        }
    }

    /// Build the `kind` variant from exactly its arity of key points.
    fn from_key_points(kind: ObjectType, points: Vec<KeyPoint>) -> Result<Curve> {
        let found = points.len();
        let count = |expected: usize| PanelError::KeyPointCount {
            element: kind.type_name().to_string(),
            expected,
            found,
        };
        match kind {
            ObjectType::Line => points.try_into().map(Curve::Line).map_err(|_| count(2)),
            ObjectType::Quadratic => points.try_into().map(Curve::Quadratic).map_err(|_| count(3)),
            ObjectType::Cubic => points.try_into().map(Curve::Cubic).map_err(|_| count(4)),
            other => Err(PanelError::UnexpectedElement {
                expected: "Line, Quadratic or Cubic".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, Default)]
enum SampleCache {
    #[default]
    Stale,
    Valid { step: f32, points: Vec<Vec2> },
}

#[derive(Clone, Debug)]
pub struct CurveShape {
    state: ObjectState,
    curve: Curve,
    samples: RefCell<SampleCache>,
    length: Cell<Option<(f32, f32)>>, // (tolerance, length)
}

impl CurveShape {
    pub fn from_curve(curve: Curve) -> Self {
        let state = ObjectState::new(curve.kind());
        Self::assemble(state, curve)
    }

    pub fn with_id(id: u32, curve: Curve) -> Self {
        let state = ObjectState::with_id(id, curve.kind());
        Self::assemble(state, curve)
    }

    fn assemble(state: ObjectState, curve: Curve) -> Self {
        CurveShape {
            state,
            curve,
            samples: RefCell::new(SampleCache::Stale),
            length: Cell::new(None),
        }
    }

    pub fn line(a: Vec2, b: Vec2) -> Self {
        Self::from_curve(Curve::Line([KeyPoint::new(a), KeyPoint::new(b)]))
    }

    pub fn quadratic(p0: Vec2, p1: Vec2, p2: Vec2) -> Self {
        Self::from_curve(Curve::Quadratic([KeyPoint::new(p0), KeyPoint::new(p1), KeyPoint::new(p2)]))
    }

    pub fn cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self::from_curve(Curve::Cubic([
            KeyPoint::new(p0),
            KeyPoint::new(p1),
            KeyPoint::new(p2),
            KeyPoint::new(p3),
        ]))
    }

    /// Line, quadratic or cubic by point count; `None` for any other count.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        match *points {
            [a, b] => Some(Self::line(a, b)),
            [a, b, c] => Some(Self::quadratic(a, b, c)),
            [a, b, c, d] => Some(Self::cubic(a, b, c, d)),
            _ => None,
        }
    }

    /// Auto-fit `points` into lines and cubics with the default angle threshold.
    pub fn fit(points: &[Vec2], distance_threshold: f32) -> Vec<CurveShape> {
        Self::fit_with(points, &SamplingConfig::default().with_distance_threshold(distance_threshold))
    }

    pub fn fit_with(points: &[Vec2], config: &SamplingConfig) -> Vec<CurveShape> {
        fit_polyline(points, config.distance_threshold, config.angle_threshold_rad())
            .into_iter()
            .map(|seg| match seg {
                FittedSegment::Line(a, b) => Self::line(a, b),
                FittedSegment::Cubic(c) => Self::cubic(c.p0, c.p1, c.p2, c.p3),
            })
            .collect()
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn key_points(&self) -> &[KeyPoint] {
        self.curve.points()
    }

    pub fn key_point(&self, i: usize) -> Option<&KeyPoint> {
        self.key_points().get(i)
    }

    pub fn num_key_points(&self) -> usize {
        self.key_points().len()
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.key_points().iter().map(KeyPoint::position).collect()
    }

    pub fn start_point(&self) -> Vec2 {
        self.key_points()[0].position
    }

    pub fn end_point(&self) -> Vec2 {
        let k = self.key_points();
        k[k.len() - 1].position
    }

    /// Move key point `i`. Returns false when `i` is out of range.
    pub fn set_key_point(&mut self, i: usize, p: Vec2) -> bool {
        let Some(kp) = self.curve.points_mut().get_mut(i) else {
            return false;
        };
        kp.position = p;
        self.invalidate();
        true
    }

    /// Point at parameter `t`, expected in `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Vec2 {
        match &self.curve {
            Curve::Line([a, b]) => a.position.lerp(b.position, t),
            Curve::Quadratic(k) => quadratic_of(k).eval(t),
            Curve::Cubic(k) => cubic_of(k).eval(t),
        }
    }

    /// Derivative with respect to `t`.
    pub fn tangent_at(&self, t: f32) -> Vec2 {
        match &self.curve {
            Curve::Line([a, b]) => b.position - a.position,
            Curve::Quadratic(k) => quadratic_of(k).tangent(t),
            Curve::Cubic(k) => cubic_of(k).tangent(t),
        }
    }

    /// Points along the curve at a uniform parametric `step`. Lines yield
    /// their two end points. Cached until the geometry or the step changes.
    pub fn sample_points(&self, step: f32) -> Ref<'_, [Vec2]> {
        let step = sanitize_step(step);
        let fresh = matches!(
            &*self.samples.borrow(),
            SampleCache::Valid { step: s, .. } if s.to_bits() == step.to_bits()
        );
        if !fresh {
            let points = self.compute_samples(step);
            trace!(id = self.state.id(), step, count = points.len(), "resampled curve");
            *self.samples.borrow_mut() = SampleCache::Valid { step, points };
        }
        Ref::map(self.samples.borrow(), |c| match c {
            SampleCache::Valid { points, .. } => points.as_slice(),
            SampleCache::Stale => &[],
        })
    }

    fn compute_samples(&self, step: f32) -> Vec<Vec2> {
        if let Curve::Line([a, b]) = &self.curve {
            return vec![a.position, b.position];
        }
        let n = ((1.0 / step).ceil() as usize).max(1);
        (0..=n).map(|i| self.point_at(i as f32 / n as f32)).collect()
    }

    /// Arclength; exact for lines, adaptive subdivision otherwise. Cached.
    pub fn length(&self) -> f32 {
        self.cached_length(LENGTH_TOLERANCE)
    }

    /// Arclength at the configured flatness tolerance. Shares the cache with
    /// [`length`](Self::length), keyed on the tolerance.
    pub fn length_with(&self, config: &SamplingConfig) -> f32 {
        let tol = config.length_tolerance;
        if tol.is_finite() && tol > 0.0 {
            self.cached_length(tol)
        } else {
            self.length()
        }
    }

    fn cached_length(&self, tolerance: f32) -> f32 {
        match self.length.get() {
            Some((tol, len)) if tol.to_bits() == tolerance.to_bits() => len,
            _ => {
                let len = self.measure(tolerance);
                self.length.set(Some((tolerance, len)));
                len
            }
        }
    }

    /// Uncached arclength with an explicit flatness tolerance.
    pub fn measure(&self, tolerance: f32) -> f32 {
        match &self.curve {
            Curve::Line([a, b]) => a.position.distance(b.position),
            Curve::Quadratic(k) => quadratic_of(k).to_cubic().arc_length(tolerance),
            Curve::Cubic(k) => cubic_of(k).arc_length(tolerance),
        }
    }

    fn invalidate(&mut self) {
        *self.samples.get_mut() = SampleCache::Stale;
        *self.length.get_mut() = None;
    }

    fn map_points(&mut self, f: impl Fn(Vec2) -> Vec2) {
        for kp in self.curve.points_mut() {
            kp.position = f(kp.position);
        }
        self.invalidate();
    }

    pub fn translate(&mut self, d: Vec2) {
        self.map_points(|p| p + d);
    }

    pub fn rotate(&mut self, r: &Mat2) {
        self.map_points(|p| r.mul_vec2(p));
    }

    pub fn rotate_about(&mut self, r: &Mat2, center: Vec2) {
        self.map_points(|p| r.mul_vec2(p - center) + center);
    }

    pub fn scale(&mut self, s: Vec2) {
        self.map_points(|p| p * s);
    }

    pub fn scale_about(&mut self, s: Vec2, center: Vec2) {
        self.map_points(|p| (p - center) * s + center);
    }

    /// Homogeneous transform followed by the perspective divide.
    pub fn transform(&mut self, m: &Mat3) {
        self.map_points(|p| {
            let h = m.mul_vec3(p.extend(1.0));
            if h.z.abs() > EPS_DENOM {
                h.truncate() / h.z
            } else {
                h.truncate()
            }
        });
    }

    /// Flip the key point order, so the curve runs end to start.
    pub fn reverse(&mut self) -> &mut Self {
        self.curve.points_mut().reverse();
        self.invalidate();
        self
    }

    /// Grow `b` by the control points (not the tight curve bound).
    pub fn union_bound(&self, b: &mut Bound) {
        for kp in self.key_points() {
            b.union_point(kp.position);
        }
    }
}

fn quadratic_of(k: &[KeyPoint; 3]) -> QuadraticBezier {
    QuadraticBezier::new(k[0].position, k[1].position, k[2].position)
}

fn cubic_of(k: &[KeyPoint; 4]) -> CubicBezier {
    CubicBezier::new(k[0].position, k[1].position, k[2].position, k[3].position)
}

impl PanelObject for CurveShape {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn object_type(&self) -> ObjectType {
        self.curve.kind()
    }

    fn to_element(&self) -> Element {
        let mut e = self.state.element();
        for kp in self.key_points() {
            kp.serialize(&mut e);
        }
        e
    }

    /// Accepts any of the three curve tags and builds the matching variant.
    fn from_element(e: &Element) -> Result<Self> {
        let kind = ObjectType::from_type_name(&e.tag)
            .filter(|k| k.is_curve())
            .ok_or_else(|| PanelError::UnexpectedElement {
                expected: "Line, Quadratic or Cubic".to_string(),
                found: e.tag.clone(),
            })?;
        let state = ObjectState::from_element(e, kind)?;
        let points: Vec<KeyPoint> = read_children(e, |k| k == ObjectType::KeyPoint)?;
        let curve = Curve::from_key_points(kind, points)?;
        Ok(Self::assemble(state, curve))
    }

    fn collect_objects(&self) -> Vec<ObjectRef<'_>> {
        let mut out = vec![ObjectRef::Curve(self)];
        out.extend(self.key_points().iter().map(ObjectRef::KeyPoint));
        out
    }

    fn collect_states_mut<'a>(&'a mut self, out: &mut Vec<&'a mut ObjectState>) {
        out.push(&mut self.state);
        for kp in self.curve.points_mut() {
            out.push(&mut kp.state);
        }
    }
}
