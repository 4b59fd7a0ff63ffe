//! Route grouping for a depot's parcels
//!
//! A depot's parcels are stable-sorted by ETA and then grouped by route code.
//! Routes appear in the order they are first seen in the sorted sequence, and
//! each route keeps the sorted order of its parcels. Parcels with equal ETAs
//! keep their input order.

use crate::app::models::EnrichedParcel;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Parcels grouped by route code, in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGroups {
    groups: Vec<(String, Vec<EnrichedParcel>)>,
}

impl RouteGroups {
    /// Route codes in emission order
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(route, _)| route.as_str())
    }

    /// Parcels for one route, ascending by ETA
    pub fn get(&self, route: &str) -> Option<&[EnrichedParcel]> {
        self.groups
            .iter()
            .find(|(r, _)| r == route)
            .map(|(_, parcels)| parcels.as_slice())
    }

    /// Number of distinct routes
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total parcels across every route
    pub fn parcel_count(&self) -> usize {
        self.groups.iter().map(|(_, parcels)| parcels.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EnrichedParcel])> {
        self.groups
            .iter()
            .map(|(route, parcels)| (route.as_str(), parcels.as_slice()))
    }
}

impl Serialize for RouteGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (route, parcels) in &self.groups {
            map.serialize_entry(route, parcels)?;
        }
        map.end()
    }
}

/// Sort a depot's parcels by ETA and group them by route
pub fn group_and_sort(mut parcels: Vec<EnrichedParcel>) -> RouteGroups {
    // sort_by is stable, so equal ETAs keep input order
    parcels.sort_by(|a, b| a.eta().cmp(b.eta()));

    let mut groups: Vec<(String, Vec<EnrichedParcel>)> = Vec::new();
    for parcel in parcels {
        match groups.iter_mut().find(|(route, _)| route == parcel.route()) {
            Some((_, members)) => members.push(parcel),
            None => groups.push((parcel.route().to_string(), vec![parcel])),
        }
    }

    RouteGroups { groups }
}
