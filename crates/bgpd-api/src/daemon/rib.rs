//! Routing information base owned by the daemon.
//!
//! Best-path selection here is deliberately simple: the most recently
//! announced path wins. The interesting part is the bookkeeping contract:
//! announcements upsert by (prefix, source), withdrawals remove by the same
//! pair and fail on prefixes that were never announced.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::model::{Destination, Family, Path};

#[derive(Debug, Default)]
pub struct Rib {
    destinations: BTreeMap<(Family, String), Destination>,
}

impl Rib {
    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// All destinations, optionally restricted to one family.
    pub fn destinations(&self, family: Option<Family>) -> Vec<Destination> {
        self.destinations
            .values()
            .filter(|dest| family.is_none_or(|f| dest.family == f))
            .cloned()
            .collect()
    }

    /// The post-selection view: each destination reduced to its best path.
    pub fn best_only(&self, family: Option<Family>) -> Vec<Destination> {
        self.destinations(family)
            .into_iter()
            .map(|mut dest| {
                dest.paths.truncate(1);
                dest
            })
            .collect()
    }

    /// Destinations carrying at least one path learned from `peer`, each
    /// reduced to those paths (the inbound adjacency view).
    pub fn learned_from(&self, peer: &str, family: Option<Family>) -> Vec<Destination> {
        self.filtered(family, |path| path.source.as_deref() == Some(peer))
    }

    /// Destinations carrying at least one path not learned from `peer` (the
    /// outbound adjacency view: what we would advertise to it).
    pub fn advertised_to(&self, peer: &str, family: Option<Family>) -> Vec<Destination> {
        self.filtered(family, |path| path.source.as_deref() != Some(peer))
    }

    fn filtered(
        &self,
        family: Option<Family>,
        keep: impl Fn(&Path) -> bool,
    ) -> Vec<Destination> {
        self.destinations(family)
            .into_iter()
            .filter_map(|mut dest| {
                dest.paths.retain(&keep);
                if dest.paths.is_empty() {
                    None
                } else {
                    Some(dest)
                }
            })
            .collect()
    }

    /// Applies one announcement or withdrawal and returns the resulting
    /// destination state (possibly with no paths left, for a full
    /// withdrawal).
    pub fn apply(&mut self, path: Path) -> Result<Destination, ApiError> {
        if path.prefix.is_empty() {
            return Err(ApiError::InvalidPath("empty prefix".to_string()));
        }
        let slot = (path.family, path.prefix.clone());

        if path.withdraw {
            let Some(dest) = self.destinations.get_mut(&slot) else {
                return Err(ApiError::InvalidPath(format!(
                    "withdraw for unknown prefix {:?}",
                    path.prefix
                )));
            };
            dest.paths.retain(|known| known.source != path.source);
            let snapshot = dest.clone();
            if dest.paths.is_empty() {
                self.destinations.remove(&slot);
            }
            return Ok(snapshot);
        }

        let dest = self.destinations.entry(slot).or_insert_with(|| Destination {
            family: path.family,
            prefix: path.prefix.clone(),
            paths: Vec::new(),
        });
        dest.paths.retain(|known| known.source != path.source);
        // Most recent announcement wins best-path selection.
        dest.paths.insert(0, path);
        Ok(dest.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announced(prefix: &str, source: Option<&str>) -> Path {
        let mut path = Path::announce(Family::Ipv4Unicast, prefix, "192.0.2.254");
        path.source = source.map(str::to_string);
        path
    }

    #[test]
    fn announce_then_withdraw_empties_the_table() {
        let mut rib = Rib::default();
        rib.apply(announced("10.0.0.0/8", None)).unwrap();
        assert_eq!(rib.len(), 1);

        let left = rib
            .apply(Path::withdraw(Family::Ipv4Unicast, "10.0.0.0/8"))
            .unwrap();
        assert!(left.paths.is_empty());
        assert!(rib.is_empty());
    }

    #[test]
    fn withdraw_of_unknown_prefix_is_rejected() {
        let mut rib = Rib::default();
        let err = rib
            .apply(Path::withdraw(Family::Ipv4Unicast, "10.0.0.0/8"))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidPath(_)));
    }

    #[test]
    fn reannouncement_replaces_the_same_source() {
        let mut rib = Rib::default();
        rib.apply(announced("10.0.0.0/8", Some("198.51.100.1"))).unwrap();
        rib.apply(announced("10.0.0.0/8", Some("198.51.100.2"))).unwrap();
        let dest = rib.apply(announced("10.0.0.0/8", Some("198.51.100.1"))).unwrap();

        // Two sources, and the refreshed path is now best.
        assert_eq!(dest.paths.len(), 2);
        assert_eq!(dest.best().and_then(|p| p.source.as_deref()), Some("198.51.100.1"));
    }

    #[test]
    fn adjacency_views_split_by_source() {
        let mut rib = Rib::default();
        rib.apply(announced("10.0.0.0/8", Some("198.51.100.1"))).unwrap();
        rib.apply(announced("10.1.0.0/16", None)).unwrap();

        let from_peer = rib.learned_from("198.51.100.1", None);
        assert_eq!(from_peer.len(), 1);
        assert_eq!(from_peer[0].prefix, "10.0.0.0/8");

        let toward_peer = rib.advertised_to("198.51.100.1", None);
        assert_eq!(toward_peer.len(), 1);
        assert_eq!(toward_peer[0].prefix, "10.1.0.0/16");
    }
}
