use std::cell::RefCell;

use crate::core::bounds::Extent;
use crate::core::config::ClusterConfig;
use crate::core::geo::Coordinate;
use crate::engine::feature::{Feature, FeatureRef, Geometry};
use crate::engine::vector::VectorSource;
use crate::engine::Handle;

struct ClusterCache {
    revision: u64,
    resolution: f64,
    clusters: Vec<FeatureRef>,
}

/// Groups the point features of a wrapped source that lie within
/// `distance` pixels of each other into aggregate features.
pub struct ClusterSource {
    source: Handle<VectorSource>,
    distance: f64,
    cache: RefCell<Option<ClusterCache>>,
}

impl ClusterSource {
    pub fn new(source: Handle<VectorSource>, config: &ClusterConfig) -> Self {
        Self {
            source,
            distance: config.distance,
            cache: RefCell::new(None),
        }
    }

    pub fn source(&self) -> &Handle<VectorSource> {
        &self.source
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Aggregates at `resolution`. Repeated calls without an intervening
    /// source change return the same aggregate instances.
    pub fn features(&self, resolution: f64) -> Vec<FeatureRef> {
        let revision = self.source.borrow().revision();
        if let Some(cache) = self.cache.borrow().as_ref() {
            if cache.revision == revision && cache.resolution == resolution {
                return cache.clusters.clone();
            }
        }
        let clusters = self.cluster(resolution);
        *self.cache.borrow_mut() = Some(ClusterCache {
            revision,
            resolution,
            clusters: clusters.clone(),
        });
        clusters
    }

    fn cluster(&self, resolution: f64) -> Vec<FeatureRef> {
        let source = self.source.borrow();
        let points: Vec<(Coordinate, &FeatureRef)> = source
            .features()
            .iter()
            .filter_map(|f| match f.geometry() {
                Some(Geometry::Point(c)) => Some((*c, f)),
                _ => None,
            })
            .collect();

        let radius = self.distance * resolution;
        let mut clustered = vec![false; points.len()];
        let mut clusters = Vec::new();

        for i in 0..points.len() {
            if clustered[i] {
                continue;
            }
            let window = Extent::new(points[i].0, points[i].0).buffered(radius);
            let mut members = Vec::new();
            let (mut sum_x, mut sum_y) = (0.0, 0.0);
            for j in i..points.len() {
                if !clustered[j] && window.contains(&points[j].0) {
                    clustered[j] = true;
                    sum_x += points[j].0.x;
                    sum_y += points[j].0.y;
                    members.push(points[j].1.clone());
                }
            }
            let n = members.len() as f64;
            let centre = Coordinate::new(sum_x / n, sum_y / n);
            clusters.push(Feature::aggregate(Geometry::Point(centre), members).into_ref());
        }
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn source_with(points: &[(f64, f64)]) -> Handle<VectorSource> {
        let source = Handle::new(VectorSource::new());
        source.add_features(
            points
                .iter()
                .map(|(x, y)| Feature::new(Geometry::Point(Coordinate::new(*x, *y))).into_ref())
                .collect(),
        );
        source
    }

    #[test]
    fn test_nearby_points_are_grouped() {
        let source = source_with(&[(0.0, 0.0), (5.0, 5.0), (500.0, 500.0)]);
        let cluster = ClusterSource::new(source, &ClusterConfig { distance: 20.0 });

        let clusters = cluster.features(1.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].features().len(), 2);
        assert_eq!(clusters[1].features().len(), 1);
        assert_eq!(clusters[0].geometry(), Some(&Geometry::Point(Coordinate::new(2.5, 2.5))));
    }

    #[test]
    fn test_cache_is_reused_until_source_changes() {
        let source = source_with(&[(0.0, 0.0)]);
        let cluster = ClusterSource::new(source.clone(), &ClusterConfig::default());

        let first = cluster.features(1.0);
        let again = cluster.features(1.0);
        assert!(Rc::ptr_eq(&first[0], &again[0]));

        source.add_feature(Feature::new(Geometry::Point(Coordinate::new(1.0, 1.0))).into_ref());
        let after = cluster.features(1.0);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].features().len(), 2);
    }

    #[test]
    fn test_coarser_resolution_merges_more() {
        let source = source_with(&[(0.0, 0.0), (100.0, 0.0)]);
        let cluster = ClusterSource::new(source, &ClusterConfig { distance: 20.0 });
        assert_eq!(cluster.features(1.0).len(), 2);
        assert_eq!(cluster.features(10.0).len(), 1);
    }
}
