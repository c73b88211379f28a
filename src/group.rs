use std::collections::HashMap;

use glam::{Mat3, Vec2};

use crate::config::SamplingConfig;
use crate::error::Result;
use crate::markup::Element;
use crate::model::{Bound, ObjectType};
use crate::object::{read_children, ObjectRef, ObjectState, PanelObject};
use crate::registry::Handle;
use crate::shape::CurveShape;

/// Ordered run of curve shapes forming one boundary (outline, dart or inner
/// line). Member order is the traversal direction.
#[derive(Clone, Debug)]
pub struct ShapeGroup {
    state: ObjectState,
    shapes: Vec<CurveShape>,
    bbox: Bound,
}

impl Default for ShapeGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeGroup {
    pub fn new() -> Self {
        Self::assemble(ObjectState::new(ObjectType::Group), Vec::new())
    }

    pub fn with_id(id: u32) -> Self {
        Self::assemble(ObjectState::with_id(id, ObjectType::Group), Vec::new())
    }

    pub fn from_shapes(shapes: Vec<CurveShape>) -> Self {
        Self::assemble(ObjectState::new(ObjectType::Group), shapes)
    }

    /// Auto-fit a dense outline into a group of lines and cubics.
    pub fn fit(points: &[Vec2], distance_threshold: f32) -> Self {
        Self::from_shapes(CurveShape::fit(points, distance_threshold))
    }

    fn assemble(state: ObjectState, shapes: Vec<CurveShape>) -> Self {
        let mut g = ShapeGroup {
            state,
            shapes,
            bbox: Bound::EMPTY,
        };
        g.update_bound();
        g
    }

    pub fn append(&mut self, shape: CurveShape) {
        self.shapes.push(shape);
    }

    pub fn insert(&mut self, index: usize, shape: CurveShape) {
        let index = index.min(self.shapes.len());
        self.shapes.insert(index, shape);
    }

    pub fn remove(&mut self, index: usize) -> Option<CurveShape> {
        (index < self.shapes.len()).then(|| self.shapes.remove(index))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes(&self) -> &[CurveShape] {
        &self.shapes
    }

    pub fn get(&self, index: usize) -> Option<&CurveShape> {
        self.shapes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CurveShape> {
        self.shapes.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CurveShape> {
        self.shapes.iter()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.bbox = Bound::EMPTY;
    }

    /// Flip the traversal direction: member order and every member.
    pub fn reverse(&mut self) -> &mut Self {
        for s in &mut self.shapes {
            s.reverse();
        }
        self.shapes.reverse();
        self
    }

    /// Recompute the cached box from member control points. Empty groups get
    /// the inverted empty box.
    pub fn update_bound(&mut self) -> Bound {
        let mut b = Bound::EMPTY;
        for s in &self.shapes {
            s.union_bound(&mut b);
        }
        self.bbox = b;
        b
    }

    /// Box as of the last [`ShapeGroup::update_bound`].
    pub fn bound(&self) -> Bound {
        self.bbox
    }

    /// Key points of every member in order, skipping any point closer than
    /// `distance_threshold` to the one emitted just before it.
    pub fn collect_key_points(&self, distance_threshold: f32) -> Vec<Vec2> {
        let mut out = Vec::new();
        for s in &self.shapes {
            for kp in s.key_points() {
                push_unless_near(&mut out, kp.position(), distance_threshold);
            }
        }
        out
    }

    /// As [`ShapeGroup::collect_key_points`], over each member's samples.
    pub fn collect_sample_points(&self, step: f32, distance_threshold: f32) -> Vec<Vec2> {
        let mut out = Vec::new();
        for s in &self.shapes {
            for &p in s.sample_points(step).iter() {
                push_unless_near(&mut out, p, distance_threshold);
            }
        }
        out
    }

    pub fn length(&self) -> f32 {
        self.shapes.iter().map(CurveShape::length).sum()
    }

    pub fn length_with(&self, config: &SamplingConfig) -> f32 {
        self.shapes.iter().map(|s| s.length_with(config)).sum()
    }

    /// Map the id each curve of `source` was written with to the shape it was
    /// rebuilt as. `source` must be the element this group was read from.
    pub(crate) fn map_source_ids(&self, source: &Element, map: &mut HashMap<u32, Handle>) {
        let curves = source
            .children
            .iter()
            .filter(|c| ObjectType::from_type_name(&c.tag).is_some_and(ObjectType::is_curve));
        for (c, shape) in curves.zip(&self.shapes) {
            if let Some(id) = c.attr_u32("id") {
                map.insert(id, shape.handle());
            }
        }
    }

    pub fn translate(&mut self, d: Vec2) {
        for s in &mut self.shapes {
            s.translate(d);
        }
        self.update_bound();
    }

    pub fn transform(&mut self, m: &Mat3) {
        for s in &mut self.shapes {
            s.transform(m);
        }
        self.update_bound();
    }

    pub fn find_shape(&self, id: u32) -> Option<&CurveShape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn find_shape_mut(&mut self, id: u32) -> Option<&mut CurveShape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    /// Whether the last member ends where the first one starts.
    pub fn is_closed(&self, tolerance: f32) -> bool {
        match (self.shapes.first(), self.shapes.last()) {
            (Some(first), Some(last)) => last.end_point().distance(first.start_point()) <= tolerance,
            _ => false,
        }
    }
}

fn push_unless_near(out: &mut Vec<Vec2>, p: Vec2, distance_threshold: f32) {
    if let Some(prev) = out.last() {
        if prev.distance(p) < distance_threshold {
            return;
        }
    }
    out.push(p);
}

impl PanelObject for ShapeGroup {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Group
    }

    fn to_element(&self) -> Element {
        let mut e = self.state.element();
        for s in &self.shapes {
            s.serialize(&mut e);
        }
        e
    }

    fn from_element(e: &Element) -> Result<Self> {
        let state = ObjectState::from_element(e, ObjectType::Group)?;
        let shapes = read_children(e, ObjectType::is_curve)?;
        Ok(Self::assemble(state, shapes))
    }

    fn collect_objects(&self) -> Vec<ObjectRef<'_>> {
        let mut out = vec![ObjectRef::Group(self)];
        for s in &self.shapes {
            out.extend(s.collect_objects());
        }
        out
    }

    fn collect_states_mut<'a>(&'a mut self, out: &mut Vec<&'a mut ObjectState>) {
        out.push(&mut self.state);
        for s in &mut self.shapes {
            s.collect_states_mut(out);
        }
    }
}
