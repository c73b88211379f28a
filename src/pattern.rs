//! A pattern document: the panels of a garment and the sewings between them.
//!
//! Sewing units are resolved here, against the shapes the document owns.
//! Units whose shape is gone (or whose id now belongs to another object) are
//! skipped wherever a seam is built.

use std::collections::HashMap;

use glam::Vec2;
use tracing::debug;

use crate::error::Result;
use crate::geometry::tolerance::approx_eq;
use crate::markup::Element;
use crate::model::{Bound, ObjectType};
use crate::object::{ObjectRef, PanelObject};
use crate::panel::PanelPolygon;
use crate::registry::{self, Handle};
use crate::sewing::{Sewing, Unit};
use crate::shape::CurveShape;

pub const PATTERN_TAG: &str = "Pattern";

#[derive(Debug, Default)]
pub struct Pattern {
    panels: Vec<PanelPolygon>,
    sewings: Vec<Sewing>,
}

/// One resolved, oriented seam segment.
#[derive(Clone, Copy, Debug)]
pub struct SeamSegment<'a> {
    pub shape: &'a CurveShape,
    pub reversed: bool,
}

impl SeamSegment<'_> {
    /// Samples in sewing direction.
    pub fn points(&self, step: f32) -> Vec<Vec2> {
        let mut pts = self.shape.sample_points(step).to_vec();
        if self.reversed {
            pts.reverse();
        }
        pts
    }

    pub fn length(&self) -> f32 {
        self.shape.length()
    }
}

/// Both sides of a sewing with dangling units left out.
#[derive(Clone, Debug, Default)]
pub struct Seam<'a> {
    pub firsts: Vec<SeamSegment<'a>>,
    pub seconds: Vec<SeamSegment<'a>>,
}

impl Seam<'_> {
    pub fn is_empty(&self) -> bool {
        self.firsts.is_empty() || self.seconds.is_empty()
    }

    pub fn first_length(&self) -> f32 {
        self.firsts.iter().map(SeamSegment::length).sum()
    }

    pub fn second_length(&self) -> f32 {
        self.seconds.iter().map(SeamSegment::length).sum()
    }

    /// Both sides present and their lengths within `tolerance` of each other.
    pub fn is_balanced(&self, tolerance: f32) -> bool {
        !self.is_empty() && approx_eq(self.first_length(), self.second_length(), tolerance)
    }
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_panel(&mut self, panel: PanelPolygon) {
        self.panels.push(panel);
    }

    pub fn add_sewing(&mut self, sewing: Sewing) {
        self.sewings.push(sewing);
    }

    pub fn panels(&self) -> &[PanelPolygon] {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut Vec<PanelPolygon> {
        &mut self.panels
    }

    pub fn sewings(&self) -> &[Sewing] {
        &self.sewings
    }

    pub fn sewings_mut(&mut self) -> &mut Vec<Sewing> {
        &mut self.sewings
    }

    pub fn find_shape(&self, id: u32) -> Option<&CurveShape> {
        self.panels.iter().find_map(|p| p.find_shape(id))
    }

    /// Shape referenced by `unit`, if it is still the object the unit was
    /// bound to.
    pub fn resolve(&self, unit: &Unit) -> Option<&CurveShape> {
        let kind = registry::resolve(unit.handle())?;
        if !kind.is_curve() {
            return None;
        }
        self.find_shape(unit.id()).filter(|s| s.handle() == unit.handle())
    }

    pub fn seam(&self, sewing: &Sewing) -> Seam<'_> {
        Seam {
            firsts: self.resolve_side(sewing, sewing.firsts()),
            seconds: self.resolve_side(sewing, sewing.seconds()),
        }
    }

    fn resolve_side(&self, sewing: &Sewing, units: &[Unit]) -> Vec<SeamSegment<'_>> {
        units
            .iter()
            .filter_map(|u| match self.resolve(u) {
                Some(shape) => Some(SeamSegment {
                    shape,
                    reversed: u.reversed,
                }),
                None => {
                    debug!(sewing = sewing.id(), unit = u.id(), "skipping dangling sewing unit");
                    None
                }
            })
            .collect()
    }

    /// Drop units that no longer resolve, then sewings left empty. Returns
    /// how many sewings were dropped.
    pub fn prune_sewings(&mut self) -> usize {
        let dangling: Vec<Vec<Handle>> = self
            .sewings
            .iter()
            .map(|s| {
                s.units()
                    .filter(|u| self.resolve(u).is_none())
                    .map(Unit::handle)
                    .collect()
            })
            .collect();
        for (s, gone) in self.sewings.iter_mut().zip(&dangling) {
            s.retain_units(|u| !gone.contains(&u.handle()));
        }
        let before = self.sewings.len();
        self.sewings.retain(|s| !s.is_empty());
        before - self.sewings.len()
    }

    pub fn update_bound(&mut self) -> Bound {
        let mut b = Bound::EMPTY;
        for p in &mut self.panels {
            b.union(&p.update_bound());
        }
        b
    }

    /// Every panel's objects in pre-order, then the sewings.
    pub fn collect_objects(&self) -> Vec<ObjectRef<'_>> {
        let mut out = Vec::new();
        for p in &self.panels {
            out.extend(p.collect_objects());
        }
        for s in &self.sewings {
            out.extend(s.collect_objects());
        }
        out
    }

    pub fn to_element(&self) -> Element {
        let mut e = Element::new(PATTERN_TAG);
        for p in &self.panels {
            p.serialize(&mut e);
        }
        for s in &self.sewings {
            s.serialize(&mut e);
        }
        e
    }

    /// Panels are rebuilt before sewings, whatever the child order. Units bind
    /// to the shapes rebuilt from their id, even when the registry had to hand
    /// those shapes fresh ids; ids the document doesn't define never resolve.
    pub fn from_element(e: &Element) -> Result<Self> {
        e.expect_tag(PATTERN_TAG)?;
        let mut pattern = Pattern::new();
        let mut rebuilt: HashMap<u32, Handle> = HashMap::new();
        for child in &e.children {
            match ObjectType::from_type_name(&child.tag) {
                Some(ObjectType::PanelPolygon) => {
                    pattern.panels.push(PanelPolygon::read(child, &mut rebuilt)?)
                }
                Some(ObjectType::Sewing) => {}
                _ => debug!(tag = %child.tag, "skipping unknown element"),
            }
        }
        let bind = |id: u32| rebuilt.get(&id).copied().unwrap_or_else(|| Handle::detached(id));
        for child in e.children_with_tag(ObjectType::Sewing.type_name()) {
            pattern.sewings.push(Sewing::read(child, &bind)?);
        }
        Ok(pattern)
    }

    pub fn to_json_string(&self) -> String {
        self.to_element().to_json_string()
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_element(&Element::from_json_str(s)?)
    }
}

impl Clone for Pattern {
    /// Deep copy with fresh ids; the copy's sewings point at the copied shapes.
    fn clone(&self) -> Self {
        let panels = self.panels.clone();
        let mut map: HashMap<Handle, Handle> = HashMap::new();
        for (old, new) in self.panels.iter().zip(&panels) {
            for (a, b) in old.collect_objects().iter().zip(new.collect_objects()) {
                map.insert(a.state().handle(), b.state().handle());
            }
        }
        let sewings = self
            .sewings
            .iter()
            .map(|s| {
                let mut c = s.clone();
                c.rebind(&map);
                c
            })
            .collect();
        Pattern { panels, sewings }
    }
}
