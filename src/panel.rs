use std::collections::HashMap;

use glam::{Mat3, Vec2};
use tracing::debug;

use crate::config::SamplingConfig;
use crate::error::Result;
use crate::group::ShapeGroup;
use crate::markup::Element;
use crate::model::{Bound, ObjectType, SelectOp};
use crate::object::{apply_highlight, apply_select, ObjectRef, ObjectState, PanelObject};
use crate::registry::Handle;
use crate::shape::CurveShape;

const OUTER_TAG: &str = "Outer";
const DARTS_TAG: &str = "Darts";
const INNER_LINES_TAG: &str = "InnerLines";

/// One garment piece: an outer boundary plus the darts and inner lines drawn
/// inside it. Darts and inner lines are auxiliary curves, not holes.
#[derive(Clone, Debug)]
pub struct PanelPolygon {
    state: ObjectState,
    outer: Option<ShapeGroup>,
    darts: Vec<ShapeGroup>,
    inner_lines: Vec<ShapeGroup>,
    bbox: Bound,
}

impl Default for PanelPolygon {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelPolygon {
    pub fn new() -> Self {
        Self::assemble(ObjectState::new(ObjectType::PanelPolygon))
    }

    pub fn with_id(id: u32) -> Self {
        Self::assemble(ObjectState::with_id(id, ObjectType::PanelPolygon))
    }

    fn assemble(state: ObjectState) -> Self {
        PanelPolygon {
            state,
            outer: None,
            darts: Vec::new(),
            inner_lines: Vec::new(),
            bbox: Bound::EMPTY,
        }
    }

    /// Replace the outer boundary. Returns the previous one.
    pub fn set_outer(&mut self, outer: ShapeGroup) -> Option<ShapeGroup> {
        let old = self.outer.replace(outer);
        self.update_bound();
        old
    }

    pub fn add_dart(&mut self, dart: ShapeGroup) {
        self.darts.push(dart);
        self.update_bound();
    }

    pub fn add_inner_line(&mut self, line: ShapeGroup) {
        self.inner_lines.push(line);
        self.update_bound();
    }

    pub fn outer(&self) -> Option<&ShapeGroup> {
        self.outer.as_ref()
    }

    pub fn outer_mut(&mut self) -> Option<&mut ShapeGroup> {
        self.outer.as_mut()
    }

    pub fn darts(&self) -> &[ShapeGroup] {
        &self.darts
    }

    pub fn darts_mut(&mut self) -> &mut Vec<ShapeGroup> {
        &mut self.darts
    }

    pub fn inner_lines(&self) -> &[ShapeGroup] {
        &self.inner_lines
    }

    pub fn inner_lines_mut(&mut self) -> &mut Vec<ShapeGroup> {
        &mut self.inner_lines
    }

    /// Outer, then darts, then inner lines.
    pub fn groups(&self) -> impl Iterator<Item = &ShapeGroup> {
        self.outer.iter().chain(&self.darts).chain(&self.inner_lines)
    }

    fn groups_mut(&mut self) -> impl Iterator<Item = &mut ShapeGroup> {
        self.outer.iter_mut().chain(&mut self.darts).chain(&mut self.inner_lines)
    }

    pub fn clear(&mut self) {
        self.outer = None;
        self.darts.clear();
        self.inner_lines.clear();
        self.bbox = Bound::EMPTY;
    }

    /// Recompute every group's box and their union.
    pub fn update_bound(&mut self) -> Bound {
        let mut b = Bound::EMPTY;
        for g in self.groups_mut() {
            b.union(&g.update_bound());
        }
        self.bbox = b;
        b
    }

    pub fn bound(&self) -> Bound {
        self.bbox
    }

    /// Apply `op` with the `index`-th object of [`PanelObject::collect_objects`]
    /// as target. Returns whether any flag changed.
    pub fn select(&mut self, index: usize, op: SelectOp) -> bool {
        self.select_set(&[index], op)
    }

    pub fn select_set(&mut self, indices: &[usize], op: SelectOp) -> bool {
        let mut states = Vec::new();
        self.collect_states_mut(&mut states);
        apply_select(&mut states, indices, op)
    }

    /// Move the single highlight from `previous` to `index`.
    pub fn highlight(&mut self, index: Option<usize>, previous: Option<usize>) {
        let mut states = Vec::new();
        self.collect_states_mut(&mut states);
        apply_highlight(&mut states, index, previous);
    }

    pub fn find_shape(&self, id: u32) -> Option<&CurveShape> {
        self.groups().find_map(|g| g.find_shape(id))
    }

    pub fn find_shape_mut(&mut self, id: u32) -> Option<&mut CurveShape> {
        self.groups_mut().find_map(|g| g.find_shape_mut(id))
    }

    /// Outer boundary samples for mesh construction. Empty without an outer.
    pub fn collect_sample_points(&self, step: f32, distance_threshold: f32) -> Vec<Vec2> {
        self.outer
            .as_ref()
            .map(|g| g.collect_sample_points(step, distance_threshold))
            .unwrap_or_default()
    }

    /// [`PanelPolygon::collect_sample_points`] with the step and dedup
    /// distance taken from `config`.
    pub fn outline(&self, config: &SamplingConfig) -> Vec<Vec2> {
        self.collect_sample_points(config.sample_step, config.distance_threshold)
    }

    pub fn translate(&mut self, d: Vec2) {
        for g in self.groups_mut() {
            g.translate(d);
        }
        self.update_bound();
    }

    pub fn transform(&mut self, m: &Mat3) {
        for g in self.groups_mut() {
            g.transform(m);
        }
        self.update_bound();
    }
}

impl PanelPolygon {
    /// Rebuild from `e`, recording in `ids` which shape each curve id of the
    /// document now refers to. Only the first outer group is kept.
    pub(crate) fn read(e: &Element, ids: &mut HashMap<u32, Handle>) -> Result<Self> {
        let mut p = Self::assemble(ObjectState::from_element(e, ObjectType::PanelPolygon)?);
        for child in &e.children {
            match child.tag.as_str() {
                OUTER_TAG => {
                    for g in read_groups(child, ids)? {
                        if p.outer.is_none() {
                            p.outer = Some(g);
                        } else {
                            debug!(panel = p.id(), group = g.id(), "dropping extra outer group");
                        }
                    }
                }
                DARTS_TAG => p.darts.extend(read_groups(child, ids)?),
                INNER_LINES_TAG => p.inner_lines.extend(read_groups(child, ids)?),
                other => debug!(parent = %e.tag, tag = other, "skipping unknown element"),
            }
        }
        p.update_bound();
        Ok(p)
    }
}

fn read_groups(wrapper: &Element, ids: &mut HashMap<u32, Handle>) -> Result<Vec<ShapeGroup>> {
    let mut out = Vec::new();
    for child in &wrapper.children {
        if child.tag == ObjectType::Group.type_name() {
            let g = ShapeGroup::from_element(child)?;
            g.map_source_ids(child, ids);
            out.push(g);
        } else {
            debug!(parent = %wrapper.tag, tag = %child.tag, "skipping unknown element");
        }
    }
    Ok(out)
}

impl PanelObject for PanelPolygon {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::PanelPolygon
    }

    fn to_element(&self) -> Element {
        let mut e = self.state.element();
        if let Some(outer) = &self.outer {
            outer.serialize(e.push_child(Element::new(OUTER_TAG)));
        }
        let darts = e.push_child(Element::new(DARTS_TAG));
        for d in &self.darts {
            d.serialize(darts);
        }
        let lines = e.push_child(Element::new(INNER_LINES_TAG));
        for l in &self.inner_lines {
            l.serialize(lines);
        }
        e
    }

    fn from_element(e: &Element) -> Result<Self> {
        Self::read(e, &mut HashMap::new())
    }

    fn collect_objects(&self) -> Vec<ObjectRef<'_>> {
        let mut out = vec![ObjectRef::Panel(self)];
        for g in self.groups() {
            out.extend(g.collect_objects());
        }
        out
    }

    fn collect_states_mut<'a>(&'a mut self, out: &mut Vec<&'a mut ObjectState>) {
        out.push(&mut self.state);
        let groups = self
            .outer
            .iter_mut()
            .chain(&mut self.darts)
            .chain(&mut self.inner_lines);
        for g in groups {
            g.collect_states_mut(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn triangle() -> ShapeGroup {
        let mut g = ShapeGroup::new();
        g.append(CurveShape::line(v(0.0, 0.0), v(4.0, 0.0)));
        g.append(CurveShape::line(v(4.0, 0.0), v(2.0, 3.0)));
        g.append(CurveShape::line(v(2.0, 3.0), v(0.0, 0.0)));
        g
    }

    fn dart() -> ShapeGroup {
        let mut g = ShapeGroup::new();
        g.append(CurveShape::quadratic(v(1.0, 0.0), v(2.0, 1.0), v(3.0, 0.0)));
        g
    }

    /// Panel with exactly five flattened objects: panel, group, line, 2 key points.
    fn five_objects() -> PanelPolygon {
        let mut g = ShapeGroup::new();
        g.append(CurveShape::line(v(0.0, 0.0), v(1.0, 0.0)));
        let mut p = PanelPolygon::new();
        p.set_outer(g);
        p
    }

    fn selection(p: &PanelPolygon) -> Vec<bool> {
        p.collect_objects().iter().map(|o| o.is_selected()).collect()
    }

    #[test]
    fn union_inverse_toggles_one_descendant() {
        let mut p = five_objects();
        assert_eq!(p.collect_objects().len(), 5);
        assert!(p.select(2, SelectOp::SelectUnionInverse));
        assert_eq!(selection(&p), vec![false, false, true, false, false]);
        assert!(p.select(2, SelectOp::SelectUnionInverse));
        assert_eq!(selection(&p), vec![false; 5]);
    }

    #[test]
    fn select_this_and_inverse() {
        let mut p = five_objects();
        p.select_set(&[1, 3], SelectOp::SelectUnion);
        p.select(4, SelectOp::SelectThis);
        assert_eq!(selection(&p), vec![false, false, false, false, true]);
        p.select(0, SelectOp::SelectInverse);
        assert_eq!(selection(&p), vec![true, true, true, true, false]);
        assert!(p.select(0, SelectOp::SelectNone));
        assert!(!p.select(0, SelectOp::SelectNone));
        assert!(p.outer().map(|g| !g.is_selected()).unwrap_or(false));
    }

    #[test]
    fn highlight_is_exclusive() {
        let mut p = five_objects();
        p.highlight(Some(2), None);
        p.highlight(Some(3), Some(2));
        let lit: Vec<bool> = p.collect_objects().iter().map(|o| o.is_highlighted()).collect();
        assert_eq!(lit, vec![false, false, false, true, false]);
        p.highlight(None, Some(3));
        assert!(p.collect_objects().iter().all(|o| !o.is_highlighted()));
    }

    #[test]
    fn bound_unions_all_groups() {
        let mut p = PanelPolygon::new();
        assert!(p.update_bound().is_empty());
        p.set_outer(triangle());
        p.add_dart(dart());
        let mut line = ShapeGroup::new();
        line.append(CurveShape::line(v(-1.0, 1.0), v(1.0, 1.0)));
        p.add_inner_line(line);
        assert_eq!(p.bound().min, v(-1.0, 0.0));
        assert_eq!(p.bound().max, v(4.0, 3.0));
        p.translate(v(1.0, 0.0));
        assert_eq!(p.bound().min, v(0.0, 0.0));
        p.clear();
        assert!(p.bound().is_empty() && p.outer().is_none());
    }

    #[test]
    fn clone_is_deep_with_fresh_ids() {
        let mut p = PanelPolygon::new();
        p.set_outer(triangle());
        p.add_dart(dart());
        let c = p.clone();
        let ids: Vec<u32> = p.collect_objects().iter().map(|o| o.id()).collect();
        let cids: Vec<u32> = c.collect_objects().iter().map(|o| o.id()).collect();
        assert_eq!(ids.len(), cids.len());
        assert!(cids.iter().all(|id| !ids.contains(id)));
        let types: Vec<ObjectType> = c.collect_objects().iter().map(|o| o.object_type()).collect();
        let orig: Vec<ObjectType> = p.collect_objects().iter().map(|o| o.object_type()).collect();
        assert_eq!(types, orig);
        assert_eq!(c.darts()[0].get(0).map(|s| s.positions()), p.darts()[0].get(0).map(|s| s.positions()));
    }

    #[test]
    fn find_shape_searches_all_groups() {
        let mut p = PanelPolygon::new();
        p.set_outer(triangle());
        p.add_dart(dart());
        let dart_id = p.darts()[0].get(0).map(|s| s.id()).unwrap();
        assert_eq!(p.find_shape(dart_id).map(|s| s.object_type()), Some(ObjectType::Quadratic));
        assert!(p.find_shape(p.id()).is_none());
    }

    #[test]
    fn element_layout() {
        let mut p = PanelPolygon::new();
        p.set_outer(triangle());
        p.add_dart(dart());
        let e = p.to_element();
        let tags: Vec<&str> = e.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["Outer", "Darts", "InnerLines"]);
        assert_eq!(e.child("Darts").map(|d| d.children.len()), Some(1));
        let back = PanelPolygon::from_element(&e).unwrap();
        assert_eq!(back.collect_objects().len(), p.collect_objects().len());
        assert_eq!(back.bound(), p.bound());
        assert_eq!(back.collect_sample_points(0.1, 0.0), p.collect_sample_points(0.1, 0.0));
    }

    #[test]
    fn only_the_first_outer_group_is_kept() {
        let mut e = Element::new("PanelPolygon");
        e.set_attr_u32("id", 0);
        let (first, extra) = (triangle(), dart());
        let outer = e.push_child(Element::new("Outer"));
        first.serialize(outer);
        extra.serialize(outer);
        let mut ids = HashMap::new();
        let p = PanelPolygon::read(&e, &mut ids).unwrap();
        assert_eq!(p.outer().map(ShapeGroup::len), Some(3));
        assert!(p.darts().is_empty());
        // every curve is mapped, the dropped group's shape no longer resolves
        assert_eq!(ids.len(), 4);
        let live = ids.values().filter(|h| crate::registry::resolve(**h).is_some()).count();
        assert_eq!(live, 3);
    }

    #[test]
    fn outline_follows_config() {
        let mut p = PanelPolygon::new();
        assert!(p.outline(&SamplingConfig::default()).is_empty());
        p.set_outer(triangle());
        // three lines, shared corners dropped
        assert_eq!(p.outline(&SamplingConfig::default()).len(), 4);
        let keep_all = SamplingConfig::default().with_distance_threshold(0.0);
        assert_eq!(p.outline(&keep_all).len(), 6);
    }
}
