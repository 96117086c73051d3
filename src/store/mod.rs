//! The feature store: the single owner of feature geometry and properties.
//!
//! Every mutation keeps the feature table and the spatial index in lockstep
//! and emits exactly one [`StoreChange`] per call. All preconditions of a
//! call are checked before anything is mutated, so a failed call leaves the
//! store as it was. Getters hand out owned copies.

mod change;

pub use change::{ChangeContext, ChangeKind, GeometryUpdate, LoadResult, PropertyUpdate, StoreChange};

use crate::error::{StoreError, StoreResult};
use crate::geometry::validation::ValidationResult;
use crate::geometry::{properties, Feature, FeatureId, Geometry, NewFeature, Properties};
use crate::id_generator::{IdStrategy, UuidIdStrategy};
use crate::spatial_index::{BBox, SpatialIndex};
use crate::util::time::now_millis;
use log::{trace, warn};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Store handle shared between the session, modes and behaviors
pub type SharedStore = Rc<RefCell<FeatureStore>>;

/// Receives every change notification along with the store after the change
pub type ChangeHandler = Box<dyn FnMut(&StoreChange, &FeatureStore)>;

pub const REASON_INVALID_TIMESTAMP: &str = "Feature has an invalid createdAt or updatedAt property";

pub struct StoreOptions {
    /// Stamp `createdAt`/`updatedAt` on features
    pub tracked: bool,
    pub id_strategy: Box<dyn IdStrategy>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            tracked: true,
            id_strategy: Box::new(UuidIdStrategy),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredFeature {
    geometry: Geometry,
    properties: Properties,
}

pub struct FeatureStore {
    tracked: bool,
    id_strategy: Box<dyn IdStrategy>,
    features: HashMap<FeatureId, StoredFeature>,
    index: SpatialIndex,
    on_change: Option<ChangeHandler>,
}

impl std::fmt::Debug for FeatureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureStore")
            .field("tracked", &self.tracked)
            .field("features", &self.features.len())
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl FeatureStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            tracked: options.tracked,
            id_strategy: options.id_strategy,
            features: HashMap::new(),
            index: SpatialIndex::new(),
            on_change: None,
        }
    }

    /// Wraps a new store in the shared handle used by modes
    pub fn shared(options: StoreOptions) -> SharedStore {
        Rc::new(RefCell::new(Self::new(options)))
    }

    pub fn tracked(&self) -> bool {
        self.tracked
    }

    pub fn id_strategy(&self) -> &dyn IdStrategy {
        self.id_strategy.as_ref()
    }

    /// Replaces the change handler. Only one handler exists at a time.
    pub fn register_on_change(&mut self, handler: impl FnMut(&StoreChange, &FeatureStore) + 'static) {
        self.on_change = Some(Box::new(handler));
    }

    pub fn has(&self, id: &FeatureId) -> bool {
        self.features.contains_key(id)
    }

    pub fn size(&self) -> usize {
        self.features.len()
    }

    /// A fresh id from the strategy that no stored feature uses
    pub fn next_id(&self) -> FeatureId {
        loop {
            let id = self.id_strategy.get_id();
            if !self.has(&id) {
                return id;
            }
        }
    }

    pub fn create(&mut self, features: Vec<NewFeature>, context: Option<ChangeContext>) -> StoreResult<Vec<FeatureId>> {
        for feature in &features {
            ensure_indexable(&feature.geometry)?;
        }

        let now = now_millis();
        let mut ids = Vec::with_capacity(features.len());
        for feature in features {
            let id = self.next_id();
            let mut properties = feature.properties;
            if self.tracked {
                stamp_if_missing(&mut properties, properties::CREATED_AT, now);
                stamp_if_missing(&mut properties, properties::UPDATED_AT, now);
            }

            self.index.insert(&id, &feature.geometry)?;
            self.features.insert(
                id.clone(),
                StoredFeature {
                    geometry: feature.geometry,
                    properties,
                },
            );
            ids.push(id);
        }

        trace!("Created {} feature(s)", ids.len());
        self.emit(ids.clone(), ChangeKind::Create, context);
        Ok(ids)
    }

    /// Adds externally sourced features.
    ///
    /// Features without an id are given one. Features that fail `validate`,
    /// or carry unusable timestamps in a tracked store, are reported and
    /// skipped. A duplicate id or unsupported geometry among the accepted
    /// features fails the whole call before anything is added.
    pub fn load(
        &mut self,
        features: Vec<Feature>,
        validate: Option<&dyn Fn(&Feature) -> ValidationResult>,
        after_add: Option<&mut dyn FnMut(&Feature)>,
        context: Option<ChangeContext>,
    ) -> StoreResult<Vec<LoadResult>> {
        let now = now_millis();
        let mut results = Vec::with_capacity(features.len());
        let mut accepted = Vec::new();

        for mut feature in features {
            let id = match feature.id.clone() {
                Some(id) => id,
                None => {
                    let id = self.next_id();
                    feature.id = Some(id.clone());
                    id
                }
            };

            if let Some(validate) = validate {
                let result = validate(&feature);
                if !result.valid {
                    warn!("Rejected feature {}: {}", id, result.reason.as_deref().unwrap_or("invalid"));
                    results.push(LoadResult {
                        id,
                        valid: false,
                        reason: result.reason,
                    });
                    continue;
                }
            }

            if self.tracked {
                if !timestamps_are_valid(&feature.properties) {
                    warn!("Rejected feature {}: {}", id, REASON_INVALID_TIMESTAMP);
                    results.push(LoadResult {
                        id,
                        valid: false,
                        reason: Some(REASON_INVALID_TIMESTAMP.to_string()),
                    });
                    continue;
                }
                stamp_if_missing(&mut feature.properties, properties::CREATED_AT, now);
                stamp_if_missing(&mut feature.properties, properties::UPDATED_AT, now);
            }

            results.push(LoadResult {
                id: id.clone(),
                valid: true,
                reason: None,
            });
            accepted.push((id, feature));
        }

        let mut seen = HashSet::new();
        for (id, _) in &accepted {
            if self.has(id) || !seen.insert(id) {
                return Err(StoreError::DuplicateId(id.clone()));
            }
        }

        self.index
            .load(accepted.iter().map(|(id, feature)| (id, &feature.geometry)))?;

        let ids: Vec<FeatureId> = accepted.iter().map(|(id, _)| id.clone()).collect();
        for (id, feature) in &accepted {
            self.features.insert(
                id.clone(),
                StoredFeature {
                    geometry: feature.geometry.clone(),
                    properties: feature.properties.clone(),
                },
            );
        }

        trace!("Loaded {} of {} feature(s)", ids.len(), results.len());
        self.emit(ids, ChangeKind::Create, context);

        if let Some(after_add) = after_add {
            for (_, feature) in &accepted {
                after_add(feature);
            }
        }

        Ok(results)
    }

    pub fn update_geometry(&mut self, updates: Vec<GeometryUpdate>, context: Option<ChangeContext>) -> StoreResult<()> {
        for update in &updates {
            self.ensure_exists(&update.id)?;
            ensure_indexable(&update.geometry)?;
        }

        let now = now_millis();
        let mut ids = Vec::with_capacity(updates.len());
        for update in updates {
            self.index.update(&update.id, &update.geometry)?;
            if let Some(stored) = self.features.get_mut(&update.id) {
                stored.geometry = update.geometry;
                if self.tracked {
                    stored
                        .properties
                        .insert(properties::UPDATED_AT.to_string(), now.into());
                }
            }
            ids.push(update.id);
        }

        trace!("Updated geometry of {} feature(s)", ids.len());
        self.emit(ids, ChangeKind::Update, context);
        Ok(())
    }

    pub fn update_property(&mut self, updates: Vec<PropertyUpdate>, context: Option<ChangeContext>) -> StoreResult<()> {
        for update in &updates {
            self.ensure_exists(&update.id)?;
        }

        let now = now_millis();
        let mut ids = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(stored) = self.features.get_mut(&update.id) {
                match update.value {
                    Some(value) => {
                        stored.properties.insert(update.property.clone(), value);
                    }
                    None => {
                        stored.properties.remove(&update.property);
                    }
                }
                if self.tracked && update.property != properties::UPDATED_AT {
                    stored
                        .properties
                        .insert(properties::UPDATED_AT.to_string(), now.into());
                }
            }
            ids.push(update.id);
        }

        trace!("Updated properties of {} feature(s)", ids.len());
        self.emit(ids, ChangeKind::Update, context);
        Ok(())
    }

    /// Deletes every listed feature. An id listed more than once is deleted
    /// once and reported once.
    pub fn delete(&mut self, ids: &[FeatureId], context: Option<ChangeContext>) -> StoreResult<()> {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            self.ensure_exists(id)?;
            if seen.insert(id) {
                unique.push(id.clone());
            }
        }

        for id in &unique {
            self.index.remove(id)?;
            self.features.remove(id);
        }

        trace!("Deleted {} feature(s)", unique.len());
        self.emit(unique, ChangeKind::Delete, context);
        Ok(())
    }

    /// Removes every feature, emitting one delete notification
    pub fn clear(&mut self) {
        let ids: Vec<FeatureId> = self.features.keys().cloned().collect();
        self.features.clear();
        self.index.clear();
        trace!("Cleared {} feature(s)", ids.len());
        self.emit(ids, ChangeKind::Delete, None);
    }

    /// Asks the listener to re-render features without changing them
    pub fn restyle(&mut self, ids: &[FeatureId], context: Option<ChangeContext>) -> StoreResult<()> {
        for id in ids {
            self.ensure_exists(id)?;
        }
        self.emit(ids.to_vec(), ChangeKind::Styling, context);
        Ok(())
    }

    pub fn get_geometry_copy(&self, id: &FeatureId) -> StoreResult<Geometry> {
        self.stored(id).map(|stored| stored.geometry.clone())
    }

    pub fn get_properties_copy(&self, id: &FeatureId) -> StoreResult<Properties> {
        self.stored(id).map(|stored| stored.properties.clone())
    }

    pub fn copy(&self, id: &FeatureId) -> StoreResult<Feature> {
        self.stored(id).map(|stored| to_feature(id, stored))
    }

    pub fn copy_all(&self) -> Vec<Feature> {
        self.features
            .iter()
            .map(|(id, stored)| to_feature(id, stored))
            .collect()
    }

    pub fn copy_all_where(&self, predicate: impl Fn(&Properties) -> bool) -> Vec<Feature> {
        self.features
            .iter()
            .filter(|(_, stored)| predicate(&stored.properties))
            .map(|(id, stored)| to_feature(id, stored))
            .collect()
    }

    /// Features whose bounding boxes intersect the box of `area`
    pub fn search(&self, area: &Geometry, filter: Option<&dyn Fn(&Feature) -> bool>) -> StoreResult<Vec<Feature>> {
        let ids = self.index.search(area)?;
        let features = ids
            .iter()
            .filter_map(|id| self.features.get(id).map(|stored| to_feature(id, stored)))
            .filter(|feature| filter.is_none_or(|filter| filter(feature)))
            .collect();
        Ok(features)
    }

    fn stored(&self, id: &FeatureId) -> StoreResult<&StoredFeature> {
        self.features
            .get(id)
            .ok_or_else(|| StoreError::FeatureNotFound(id.clone()))
    }

    fn ensure_exists(&self, id: &FeatureId) -> StoreResult<()> {
        self.stored(id).map(|_| ())
    }

    fn emit(&mut self, ids: Vec<FeatureId>, kind: ChangeKind, context: Option<ChangeContext>) {
        if ids.is_empty() {
            return;
        }
        let change = StoreChange { ids, kind, context };
        if let Some(mut handler) = self.on_change.take() {
            handler(&change, self);
            if self.on_change.is_none() {
                self.on_change = Some(handler);
            }
        }
    }
}

/// Rejects geometry the index cannot box, such as a polygon with no rings
fn ensure_indexable(geometry: &Geometry) -> StoreResult<()> {
    BBox::from_geometry(geometry)?;
    Ok(())
}

fn to_feature(id: &FeatureId, stored: &StoredFeature) -> Feature {
    Feature::new(Some(id.clone()), stored.geometry.clone(), stored.properties.clone())
}

fn stamp_if_missing(properties: &mut Properties, key: &str, now: i64) {
    if !properties.contains_key(key) {
        properties.insert(key.to_string(), now.into());
    }
}

fn timestamps_are_valid(properties: &Properties) -> bool {
    [properties::CREATED_AT, properties::UPDATED_AT]
        .iter()
        .all(|key| match properties.get(*key) {
            None => true,
            Some(value) => value.as_f64().is_some_and(|n| n >= 0.0),
        })
}
