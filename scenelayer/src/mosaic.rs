//! Mosaic rules: which scenes the service renders and how they combine.
//!
//! A single scene is rendered with a lock-raster rule. Two or more scenes
//! with an aggregation method produce a composite, where the service applies
//! the method pixel-wise over exactly the selected rasters.
//!
//! # Example
//!
//! ```
//! use scenelayer::mosaic::{build_mosaic_rule, CompositeMethod, MosaicRule, SceneSelection};
//!
//! let selection = SceneSelection::from_ids([101u64, 102, 103]);
//! let rule = build_mosaic_rule(&selection, Some(CompositeMethod::Min)).unwrap();
//! assert_eq!(rule.method(), Some(CompositeMethod::Min));
//!
//! let single = SceneSelection::from_ids([101u64]);
//! let rule = build_mosaic_rule(&single, Some(CompositeMethod::Min)).unwrap();
//! assert!(matches!(rule, MosaicRule::LockSingle { .. }));
//! ```

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Mosaic method that selects rasters by object id.
const LOCK_RASTER_METHOD: &str = "esriMosaicLockRaster";

/// Identifier of one time-stamped scene in the service catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u64);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SceneId {
    fn from(id: u64) -> Self {
        SceneId(id)
    }
}

/// Ordered set of unique scene identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneSelection {
    ids: Vec<SceneId>,
}

impl SceneSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection, keeping the first occurrence of duplicated ids.
    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SceneId>,
    {
        let mut selection = Self::new();
        for id in ids {
            selection.insert(id.into());
        }
        selection
    }

    /// Appends an id; returns false if it was already selected.
    pub fn insert(&mut self, id: SceneId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: SceneId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| *existing != id);
        self.ids.len() != before
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[SceneId] {
        &self.ids
    }

    pub fn first(&self) -> Option<SceneId> {
        self.ids.first().copied()
    }
}

/// Pixel-wise aggregation applied over the rasters of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeMethod {
    First,
    Last,
    Min,
    Max,
    Mean,
    Blend,
    Sum,
}

impl CompositeMethod {
    pub const ALL: [CompositeMethod; 7] = [
        CompositeMethod::First,
        CompositeMethod::Last,
        CompositeMethod::Min,
        CompositeMethod::Max,
        CompositeMethod::Mean,
        CompositeMethod::Blend,
        CompositeMethod::Sum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CompositeMethod::First => "first",
            CompositeMethod::Last => "last",
            CompositeMethod::Min => "min",
            CompositeMethod::Max => "max",
            CompositeMethod::Mean => "mean",
            CompositeMethod::Blend => "blend",
            CompositeMethod::Sum => "sum",
        }
    }

    /// Value of the service's `mosaicOperation` field.
    pub fn mosaic_operation(self) -> &'static str {
        match self {
            CompositeMethod::First => "MT_FIRST",
            CompositeMethod::Last => "MT_LAST",
            CompositeMethod::Min => "MT_MIN",
            CompositeMethod::Max => "MT_MAX",
            CompositeMethod::Mean => "MT_MEAN",
            CompositeMethod::Blend => "MT_BLEND",
            CompositeMethod::Sum => "MT_SUM",
        }
    }
}

impl fmt::Display for CompositeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown composite method '{0}' (expected first, last, min, max, mean, blend or sum)")]
pub struct UnknownCompositeMethod(pub String);

impl FromStr for CompositeMethod {
    type Err = UnknownCompositeMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        CompositeMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| UnknownCompositeMethod(s.to_string()))
    }
}

/// How the service selects and combines scenes before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MosaicRule {
    /// Render exactly one raster.
    LockSingle { scene_id: SceneId },
    /// Aggregate two or more rasters with `method`.
    Composite {
        scene_ids: SceneSelection,
        method: CompositeMethod,
    },
}

/// JSON shape of the `mosaicRule` request parameter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MosaicRuleWire {
    mosaic_method: &'static str,
    ascending: bool,
    lock_raster_ids: Vec<u64>,
    #[serde(rename = "where")]
    where_clause: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mosaic_operation: Option<&'static str>,
}

impl MosaicRule {
    pub fn scene_ids(&self) -> Vec<SceneId> {
        match self {
            MosaicRule::LockSingle { scene_id } => vec![*scene_id],
            MosaicRule::Composite { scene_ids, .. } => scene_ids.ids().to_vec(),
        }
    }

    pub fn method(&self) -> Option<CompositeMethod> {
        match self {
            MosaicRule::LockSingle { .. } => None,
            MosaicRule::Composite { method, .. } => Some(*method),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, MosaicRule::Composite { .. })
    }

    fn to_wire(&self) -> MosaicRuleWire {
        let ids: Vec<u64> = self.scene_ids().iter().map(|id| id.0).collect();
        let id_list = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");

        MosaicRuleWire {
            mosaic_method: LOCK_RASTER_METHOD,
            ascending: false,
            lock_raster_ids: ids,
            where_clause: format!("objectid in ({})", id_list),
            mosaic_operation: self.method().map(CompositeMethod::mosaic_operation),
        }
    }

    /// Encodes the rule for the `mosaicRule` parameter.
    ///
    /// Unlike rendering rules this parameter is not order sensitive, so the
    /// standard encoder is used.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_wire())
    }
}

/// Builds the mosaic rule for a selection.
///
/// Returns `None` for an empty selection. A composite is produced only when a
/// method is given and at least two scenes are selected; otherwise the rule
/// locks to the first selected scene.
pub fn build_mosaic_rule(
    selection: &SceneSelection,
    method: Option<CompositeMethod>,
) -> Option<MosaicRule> {
    let first = selection.first()?;

    match method {
        Some(method) if selection.len() >= 2 => Some(MosaicRule::Composite {
            scene_ids: selection.clone(),
            method,
        }),
        _ => Some(MosaicRule::LockSingle { scene_id: first }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(rule: &MosaicRule) -> Value {
        serde_json::from_str(&rule.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_single_scene_locks_raster() {
        let rule = build_mosaic_rule(&SceneSelection::from_ids([2969545u64]), None).unwrap();

        assert_eq!(
            rule,
            MosaicRule::LockSingle {
                scene_id: SceneId(2969545)
            }
        );
        assert_eq!(
            parse(&rule),
            json!({
                "mosaicMethod": "esriMosaicLockRaster",
                "ascending": false,
                "lockRasterIds": [2969545],
                "where": "objectid in (2969545)"
            })
        );
    }

    #[test]
    fn test_composite_over_three_scenes() {
        let selection = SceneSelection::from_ids([101u64, 102, 103]);
        let rule = build_mosaic_rule(&selection, Some(CompositeMethod::Min)).unwrap();

        assert!(rule.is_composite());
        assert_eq!(rule.scene_ids(), vec![SceneId(101), SceneId(102), SceneId(103)]);
        assert_eq!(rule.method(), Some(CompositeMethod::Min));
        assert_eq!(
            parse(&rule),
            json!({
                "mosaicMethod": "esriMosaicLockRaster",
                "ascending": false,
                "lockRasterIds": [101, 102, 103],
                "where": "objectid in (101,102,103)",
                "mosaicOperation": "MT_MIN"
            })
        );
    }

    #[test]
    fn test_composite_with_one_scene_is_normalized() {
        let rule =
            build_mosaic_rule(&SceneSelection::from_ids([101u64]), Some(CompositeMethod::Min))
                .unwrap();
        assert_eq!(
            rule,
            MosaicRule::LockSingle {
                scene_id: SceneId(101)
            }
        );
        assert!(!parse(&rule).as_object().unwrap().contains_key("mosaicOperation"));
    }

    #[test]
    fn test_many_scenes_without_method_lock_first() {
        let rule = build_mosaic_rule(&SceneSelection::from_ids([7u64, 8]), None).unwrap();
        assert_eq!(rule, MosaicRule::LockSingle { scene_id: SceneId(7) });
    }

    #[test]
    fn test_empty_selection_has_no_rule() {
        assert!(build_mosaic_rule(&SceneSelection::new(), Some(CompositeMethod::Max)).is_none());
    }

    #[test]
    fn test_build_is_idempotent() {
        let selection = SceneSelection::from_ids([5u64, 6, 7]);
        for method in CompositeMethod::ALL {
            let a = build_mosaic_rule(&selection, Some(method));
            let b = build_mosaic_rule(&selection, Some(method));
            assert_eq!(a, b);
            assert_eq!(a.unwrap().to_json().unwrap(), b.unwrap().to_json().unwrap());
        }
    }

    #[test]
    fn test_selection_deduplicates_and_keeps_order() {
        let mut selection = SceneSelection::from_ids([3u64, 1, 3, 2, 1]);
        assert_eq!(selection.ids(), &[SceneId(3), SceneId(1), SceneId(2)]);
        assert!(!selection.insert(SceneId(2)));
        assert!(selection.remove(SceneId(1)));
        assert!(!selection.remove(SceneId(1)));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_method_parse_and_operation() {
        assert_eq!("MEAN".parse::<CompositeMethod>().unwrap(), CompositeMethod::Mean);
        assert_eq!(CompositeMethod::Blend.mosaic_operation(), "MT_BLEND");
        assert!("median".parse::<CompositeMethod>().is_err());
        for method in CompositeMethod::ALL {
            assert_eq!(method.to_string().parse::<CompositeMethod>().unwrap(), method);
        }
    }
}
