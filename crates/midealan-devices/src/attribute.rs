/*!
 * Attribute names and ordered attribute maps.
 */
use std::fmt::Debug;

use serde::ser::{Serialize, SerializeMap, Serializer};

use midealan_core::types::Value;

/// A family's fixed set of attribute names
pub trait Attribute: Copy + Eq + Debug + 'static {
    /// Every attribute, in reporting order
    const ALL: &'static [Self];

    /// Wire-facing attribute name
    fn as_str(self) -> &'static str;

    /// Look up an attribute by name
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == name)
    }
}

/// Ordered mapping from attribute name to value
///
/// Used both for full snapshots and for the delta one decoded frame produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(&'static str, Value)>,
}

/// Attributes whose value changed as a result of decoding one frame
pub type AttributeDelta = AttributeMap;

impl AttributeMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, keeping first-insertion order
    pub fn insert(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Check if a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }
}

impl IntoIterator for AttributeMap {
    type Item = (&'static str, Value);
    type IntoIter = std::vec::IntoIter<(&'static str, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Collects the attributes one decoded frame produced
///
/// Until a state has merged its first frame every decoded field is reported,
/// including values that equal the construction defaults. Afterwards only
/// values that differ from the stored ones are.
pub(crate) struct Tracker {
    delta: AttributeDelta,
    first_frame: bool,
}

impl Tracker {
    /// Start a merge; `observed` says whether the state has merged a frame before
    pub(crate) fn new(observed: bool) -> Self {
        Self {
            delta: AttributeDelta::new(),
            first_frame: !observed,
        }
    }

    /// Store `new` into `slot` and record it when it differs or is first observed
    pub(crate) fn track<T>(&mut self, name: &'static str, slot: &mut T, new: T)
    where
        T: PartialEq + Clone + Into<Value>,
    {
        if self.first_frame || *slot != new {
            *slot = new.clone();
            self.delta.insert(name, new);
        }
    }

    /// The collected delta
    pub(crate) fn finish(self) -> AttributeDelta {
        self.delta
    }
}

/// The requested value, or `None` when it equals the current one
pub(crate) fn changed<T: PartialEq>(current: T, requested: T) -> Option<T> {
    (current != requested).then_some(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Probe {
        Power,
        Speed,
    }

    impl Attribute for Probe {
        const ALL: &'static [Self] = &[Probe::Power, Probe::Speed];

        fn as_str(self) -> &'static str {
            match self {
                Probe::Power => "power",
                Probe::Speed => "speed",
            }
        }
    }

    #[test]
    fn test_attribute_lookup() {
        assert_eq!(Probe::from_name("speed"), Some(Probe::Speed));
        assert_eq!(Probe::from_name("volume"), None);
    }

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut map = AttributeMap::new();
        map.insert("power", true);
        map.insert("speed", 3u8);
        map.insert("power", false);
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["power", "speed"]);
        assert_eq!(map.get("power"), Some(&Value::Bool(false)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_track_only_records_changes() {
        let mut tracker = Tracker::new(true);
        let mut power = false;
        tracker.track("power", &mut power, false);
        tracker.track("power", &mut power, true);
        assert!(power);

        let mut indoor: Option<f64> = None;
        tracker.track("indoor", &mut indoor, Some(21.5));

        let delta = tracker.finish();
        assert_eq!(delta.names().collect::<Vec<_>>(), vec!["power", "indoor"]);
        assert_eq!(delta.get("power"), Some(&Value::Bool(true)));
        assert_eq!(delta.get("indoor"), Some(&Value::Float(21.5)));
    }

    #[test]
    fn test_first_frame_reports_default_values() {
        let mut tracker = Tracker::new(false);
        let mut power = false;
        let mut speed = 0u8;
        tracker.track("power", &mut power, false);
        tracker.track("speed", &mut speed, 0);

        let delta = tracker.finish();
        assert_eq!(delta.get("power"), Some(&Value::Bool(false)));
        assert_eq!(delta.get("speed"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_changed() {
        assert_eq!(changed(3, 3), None);
        assert_eq!(changed(3, 4), Some(4));
    }

    #[test]
    fn test_serialize_as_ordered_object() {
        let mut map = AttributeMap::new();
        map.insert("power", true);
        map.insert("mode", "Sleep");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"power":true,"mode":"Sleep"}"#);
    }
}
