use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LocationError;

/// A saved place to fetch forecasts for.
///
/// Coordinates are kept as decimal text so the config file stays stable
/// across load/save cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: String,
    pub lng: String,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: impl Into<String>, lng: impl Into<String>) -> Self {
        Self { name: name.into(), lat: lat.into(), lng: lng.into() }
    }

    /// Build a location from floating coordinates, fixed to 4 fractional digits.
    pub fn from_coords(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self::new(name, format!("{lat:.4}"), format!("{lng:.4}"))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},\"{}\"", self.lat, self.lng, self.name)
    }
}

/// Ordered saved locations; the head entry is the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationList(Vec<Location>);

impl LocationList {
    pub fn new(locations: Vec<Location>) -> Self {
        Self(locations)
    }

    pub fn active(&self) -> Result<&Location, LocationError> {
        self.0.first().ok_or(LocationError::Empty)
    }

    pub fn push_front(&mut self, location: Location) {
        self.0.insert(0, location);
    }

    pub fn push_back(&mut self, location: Location) {
        self.0.push(location);
    }

    pub fn remove_last(&mut self) -> Option<Location> {
        self.0.pop()
    }

    /// Move the active location to the tail.
    pub fn rotate(&mut self) {
        if self.0.len() > 1 {
            self.0.rotate_left(1);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a LocationList {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One `lat,lng,"name"` line per location.
impl fmt::Display for LocationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for location in &self.0 {
            writeln!(f, "{location}")?;
        }
        Ok(())
    }
}
