//! In-memory modeling document.
//!
//! Stands in for the host application's document: geometry objects with
//! user text, Grasshopper number sliders, and document units. It is the
//! single shared resource the dispatch lock guards.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

pub type Point3 = [f64; 3];

/// Geometry of a document object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Geometry {
    Line { start: Point3, end: Point3 },
}

impl Geometry {
    pub fn length(&self) -> f64 {
        match self {
            Self::Line { start, end } => distance(start, end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DocObject {
    pub geometry: Geometry,
    pub user_text: BTreeMap<String, String>,
}

/// A Grasshopper number slider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slider {
    pub name: String,
    pub current_value: f64,
    pub min: f64,
    pub max: f64,
}

impl Slider {
    pub fn new(name: impl Into<String>, current_value: f64, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            current_value,
            min,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    objects: BTreeMap<Uuid, DocObject>,
    sliders: Vec<Slider>,
    units: String,
    grasshopper_available: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            sliders: vec![
                Slider::new("Width", 10.0, 0.0, 100.0),
                Slider::new("Height", 20.0, 0.0, 50.0),
                Slider::new("Count", 5.0, 1.0, 20.0),
            ],
            units: "Millimeters".to_string(),
            grasshopper_available: true,
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with no Grasshopper definition loaded.
    pub fn without_grasshopper() -> Self {
        Self {
            sliders: Vec::new(),
            grasshopper_available: false,
            ..Self::default()
        }
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn grasshopper_available(&self) -> bool {
        self.grasshopper_available
    }

    pub fn add_line(&mut self, start: Point3, end: Point3) -> Uuid {
        let id = Uuid::new_v4();
        self.objects.insert(
            id,
            DocObject {
                geometry: Geometry::Line { start, end },
                user_text: BTreeMap::new(),
            },
        );
        id
    }

    pub fn curve_length(&self, id: &Uuid) -> Option<f64> {
        self.objects.get(id).map(|o| o.geometry.length())
    }

    /// Returns `false` if the object does not exist.
    pub fn set_user_text(&mut self, id: &Uuid, key: &str, value: &str) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.user_text.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Ids of every object whose user text `key` equals `value`.
    pub fn find_by_user_text(&self, key: &str, value: &str) -> Vec<Uuid> {
        self.objects
            .iter()
            .filter(|(_, o)| o.user_text.get(key).is_some_and(|v| v == value))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn delete_objects(&mut self, ids: &[Uuid]) -> usize {
        ids.iter()
            .filter(|id| self.objects.remove(id).is_some())
            .count()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    /// Slider lookup by name, ignoring case.
    pub fn slider_mut(&mut self, name: &str) -> Option<&mut Slider> {
        self.sliders
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

pub fn distance(a: &Point3, b: &Point3) -> f64 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (q - p).powi(2))
        .sum::<f64>()
        .sqrt()
}
