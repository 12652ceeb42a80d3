//! The coordinates fact: at most one coordinate per ecosystem, one of them main

use super::facts::Fact;
use crate::coordinate::{Coordinate, CoordinateType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCoordinates {
    coordinates: BTreeMap<CoordinateType, Coordinate>,
    main_type: Option<CoordinateType>,
}

impl ArtifactCoordinates {
    /// Build from a list; the first coordinate becomes the main one
    pub fn new(coordinates: impl IntoIterator<Item = Coordinate>) -> Self {
        let mut set = Self::default();
        for coordinate in coordinates {
            set.insert(coordinate);
        }
        set
    }

    /// Insert or replace the coordinate of this type
    pub fn insert(&mut self, coordinate: Coordinate) {
        let ty = coordinate.coordinate_type;
        self.promote_main(ty);
        self.coordinates.insert(ty, coordinate);
    }

    /// Main type is sticky: only a missing or generic main is replaced
    fn promote_main(&mut self, candidate: CoordinateType) {
        match self.main_type {
            None => self.main_type = Some(candidate),
            Some(CoordinateType::Generic) if candidate != CoordinateType::Generic => {
                self.main_type = Some(candidate)
            }
            Some(_) => {}
        }
    }

    pub fn get(&self, ty: CoordinateType) -> Option<&Coordinate> {
        self.coordinates.get(&ty)
    }

    pub fn main(&self) -> Option<&Coordinate> {
        self.main_type.and_then(|ty| self.coordinates.get(&ty))
    }

    pub fn main_type(&self) -> Option<CoordinateType> {
        self.main_type
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.coordinates.values()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    /// Existential match with `self` as the pattern: some type present on
    /// both sides has a coordinate that matches field-wise.
    pub fn matches(&self, candidate: &ArtifactCoordinates) -> bool {
        self.coordinates.iter().any(|(ty, pattern)| {
            candidate
                .coordinates
                .get(ty)
                .is_some_and(|c| pattern.matches(c))
        })
    }
}

impl From<Coordinate> for ArtifactCoordinates {
    fn from(coordinate: Coordinate) -> Self {
        Self::new([coordinate])
    }
}

impl Fact for ArtifactCoordinates {
    fn is_empty(&self) -> bool {
        self.coordinates.values().all(Coordinate::is_empty)
    }

    /// Union keyed by type; on a shared type the incoming coordinate's set
    /// fields win
    fn merge(mut self, incoming: Self) -> Self {
        if let Some(ty) = incoming.main_type {
            self.promote_main(ty);
        }
        for (ty, coordinate) in incoming.coordinates {
            let merged = match self.coordinates.remove(&ty) {
                Some(stored) => stored.merged_with(coordinate),
                None => coordinate,
            };
            self.promote_main(ty);
            self.coordinates.insert(ty, merged);
        }
        self
    }
}

impl fmt::Display for ArtifactCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let purls: Vec<String> = self.coordinates.values().map(Coordinate::canonicalize).collect();
        write!(f, "[ \"{}\" ]", purls.join("\", \""))
    }
}
