use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::markup::Element;
use crate::model::{ObjectType, SelectOp};
use crate::object::{apply_highlight, apply_select, ObjectRef, ObjectState, PanelObject, Selectable};
use crate::registry::{self, Handle};
use crate::shape::CurveShape;

const FIRSTS_TAG: &str = "Firsts";
const SECONDS_TAG: &str = "Seconds";
const UNIT_TAG: &str = "Unit";

/// Oriented, non-owning reference to a curve shape.
///
/// The handle is generation checked, so a unit whose shape was dropped stays
/// dangling even after the id is handed to a new object.
#[derive(Clone, Copy, Debug)]
pub struct Unit {
    handle: Handle,
    pub reversed: bool,
    selected: bool,
    highlighted: bool,
}

impl Unit {
    pub fn new(handle: Handle, reversed: bool) -> Self {
        Unit {
            handle,
            reversed,
            selected: false,
            highlighted: false,
        }
    }

    pub fn of(shape: &CurveShape, reversed: bool) -> Self {
        Self::new(shape.handle(), reversed)
    }

    /// Bind to whatever is live under `id` right now. Nothing live gives a
    /// unit that never resolves.
    pub fn from_id(id: u32, reversed: bool) -> Self {
        Self::new(live_handle(id), reversed)
    }

    pub fn id(&self) -> u32 {
        self.handle.id()
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Whether the referenced object is still alive.
    pub fn is_live(&self) -> bool {
        registry::resolve(self.handle).is_some()
    }

    fn to_element(self) -> Element {
        let mut e = Element::new(UNIT_TAG);
        e.set_attr_u32("id", self.id()).set_attr_bool("reverse", self.reversed);
        e
    }

    fn from_element(e: &Element, bind: &dyn Fn(u32) -> Handle) -> Result<Self> {
        let id = e.require_u32("id")?;
        Ok(Self::new(bind(id), e.require_bool("reverse")?))
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.reversed == other.reversed
    }
}

impl Eq for Unit {}

impl Selectable for Unit {
    fn is_selected(&self) -> bool {
        self.selected
    }
    fn set_selected(&mut self, s: bool) {
        self.selected = s;
    }
    fn is_highlighted(&self) -> bool {
        self.highlighted
    }
    fn set_highlighted(&mut self, h: bool) {
        self.highlighted = h;
    }
}

/// A stitched seam: the curves listed in `firsts` are sewn to the ones in
/// `seconds`. Sewings reference geometry, they never own it.
#[derive(Clone, Debug)]
pub struct Sewing {
    state: ObjectState,
    firsts: Vec<Unit>,
    seconds: Vec<Unit>,
}

impl Default for Sewing {
    fn default() -> Self {
        Self::new()
    }
}

impl Sewing {
    pub fn new() -> Self {
        Self::assemble(ObjectState::new(ObjectType::Sewing))
    }

    pub fn with_id(id: u32) -> Self {
        Self::assemble(ObjectState::with_id(id, ObjectType::Sewing))
    }

    fn assemble(state: ObjectState) -> Self {
        Sewing {
            state,
            firsts: Vec::new(),
            seconds: Vec::new(),
        }
    }

    pub fn add_first(&mut self, unit: Unit) {
        self.firsts.push(unit);
    }

    pub fn add_second(&mut self, unit: Unit) {
        self.seconds.push(unit);
    }

    pub fn add_firsts(&mut self, units: impl IntoIterator<Item = Unit>) {
        self.firsts.extend(units);
    }

    pub fn add_seconds(&mut self, units: impl IntoIterator<Item = Unit>) {
        self.seconds.extend(units);
    }

    pub fn firsts(&self) -> &[Unit] {
        &self.firsts
    }

    pub fn seconds(&self) -> &[Unit] {
        &self.seconds
    }

    /// Firsts then seconds; the index space of `select` and `highlight`.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.firsts.iter().chain(&self.seconds)
    }

    fn units_mut(&mut self) -> Vec<&mut Unit> {
        self.firsts.iter_mut().chain(&mut self.seconds).collect()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.units().any(|u| u.id() == id)
    }

    /// Drop every unit referencing `id`, on both sides.
    pub fn remove(&mut self, id: u32) {
        self.retain_units(|u| u.id() != id);
    }

    pub fn remove_all(&mut self, ids: &BTreeSet<u32>) {
        self.retain_units(|u| !ids.contains(&u.id()));
    }

    pub fn retain_units(&mut self, mut keep: impl FnMut(&Unit) -> bool) {
        self.firsts.retain(|u| keep(u));
        self.seconds.retain(|u| keep(u));
    }

    pub fn clear(&mut self) {
        self.firsts.clear();
        self.seconds.clear();
    }

    /// True when either side has nothing to sew.
    pub fn is_empty(&self) -> bool {
        self.firsts.is_empty() || self.seconds.is_empty()
    }

    /// Same pair of side memberships, in either side assignment. Order and
    /// orientation are ignored.
    pub fn is_same_ignore_order(&self, other: &Sewing) -> bool {
        fn ids(units: &[Unit]) -> BTreeSet<u32> {
            units.iter().map(Unit::id).collect()
        }
        let (a1, a2) = (ids(&self.firsts), ids(&self.seconds));
        let (b1, b2) = (ids(&other.firsts), ids(&other.seconds));
        (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1)
    }

    pub fn select(&mut self, index: usize, op: SelectOp) -> bool {
        self.select_set(&[index], op)
    }

    pub fn select_set(&mut self, indices: &[usize], op: SelectOp) -> bool {
        apply_select(&mut self.units_mut(), indices, op)
    }

    pub fn highlight(&mut self, index: Option<usize>, previous: Option<usize>) {
        apply_highlight(&mut self.units_mut(), index, previous);
    }

    /// Point units at new handles, e.g. after the referenced shapes were cloned.
    pub fn rebind(&mut self, map: &HashMap<Handle, Handle>) {
        for u in self.firsts.iter_mut().chain(&mut self.seconds) {
            if let Some(&h) = map.get(&u.handle) {
                u.handle = h;
            }
        }
    }
}

impl Sewing {
    /// Rebuild from `e`, resolving each unit id through `bind`.
    pub(crate) fn read(e: &Element, bind: &dyn Fn(u32) -> Handle) -> Result<Self> {
        let mut s = Self::assemble(ObjectState::from_element(e, ObjectType::Sewing)?);
        s.firsts = read_units(e.child(FIRSTS_TAG), bind)?;
        s.seconds = read_units(e.child(SECONDS_TAG), bind)?;
        Ok(s)
    }
}

fn write_units(parent: &mut Element, tag: &str, units: &[Unit]) {
    let side = parent.push_child(Element::new(tag));
    for u in units {
        side.push_child(u.to_element());
    }
}

fn live_handle(id: u32) -> Handle {
    registry::lookup(id).unwrap_or_else(|| Handle::detached(id))
}

fn read_units(side: Option<&Element>, bind: &dyn Fn(u32) -> Handle) -> Result<Vec<Unit>> {
    side.map(|s| s.children_with_tag(UNIT_TAG).map(|u| Unit::from_element(u, bind)).collect())
        .unwrap_or_else(|| Ok(Vec::new()))
}

impl PanelObject for Sewing {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Sewing
    }

    fn to_element(&self) -> Element {
        let mut e = self.state.element();
        write_units(&mut e, FIRSTS_TAG, &self.firsts);
        write_units(&mut e, SECONDS_TAG, &self.seconds);
        e
    }

    /// Units bind to whatever is live under their id.
    fn from_element(e: &Element) -> Result<Self> {
        Self::read(e, &live_handle)
    }

    fn collect_objects(&self) -> Vec<ObjectRef<'_>> {
        vec![ObjectRef::Sewing(self)]
    }

    fn collect_states_mut<'a>(&'a mut self, out: &mut Vec<&'a mut ObjectState>) {
        out.push(&mut self.state);
    }
}
