//! Per-depot buckets of enriched parcels

use crate::app::models::{DepotId, EnrichedParcel};

/// Enriched parcels partitioned by depot
///
/// Every depot in [`DepotId::ALL`] has a bucket, even when empty, and buckets
/// iterate in that fixed order. Members keep the order they were pushed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotBuckets {
    buckets: Vec<(DepotId, Vec<EnrichedParcel>)>,
}

impl DepotBuckets {
    pub fn new() -> Self {
        Self {
            buckets: DepotId::ALL.iter().map(|d| (*d, Vec::new())).collect(),
        }
    }

    /// Append a parcel to its depot's bucket
    pub fn push(&mut self, depot: DepotId, parcel: EnrichedParcel) {
        if let Some((_, members)) = self.buckets.iter_mut().find(|(d, _)| *d == depot) {
            members.push(parcel);
        }
    }

    /// Members of one depot in insertion order
    pub fn get(&self, depot: DepotId) -> &[EnrichedParcel] {
        self.buckets
            .iter()
            .find(|(d, _)| *d == depot)
            .map(|(_, members)| members.as_slice())
            .unwrap_or(&[])
    }

    /// Total parcels across every depot
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, members)| members.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DepotId, &[EnrichedParcel])> {
        self.buckets
            .iter()
            .map(|(depot, members)| (*depot, members.as_slice()))
    }
}

impl Default for DepotBuckets {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for DepotBuckets {
    type Item = (DepotId, Vec<EnrichedParcel>);
    type IntoIter = std::vec::IntoIter<(DepotId, Vec<EnrichedParcel>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_iter()
    }
}
