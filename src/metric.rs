use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::error::{Error, Result};

/// One of the performance counters reported by the browser.
///
/// The set is closed and its declaration order is the canonical order used
/// everywhere a list of metrics is rendered, so diagnostics come out the same
/// on every run regardless of how the caller built its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricName {
    /// The timestamp when the sample was taken.
    Timestamp,
    /// Number of documents in the page.
    Documents,
    /// Number of frames in the page.
    Frames,
    /// Number of event listeners in the page.
    #[serde(rename = "JSEventListeners")]
    JsEventListeners,
    /// Number of DOM nodes in the page.
    Nodes,
    /// Total number of full or partial page layouts.
    LayoutCount,
    /// Total number of page style recalculations.
    RecalcStyleCount,
    /// Combined durations of all page layouts.
    LayoutDuration,
    /// Combined duration of all page style recalculations.
    RecalcStyleDuration,
    /// Combined duration of JavaScript execution.
    ScriptDuration,
    /// Combined duration of all tasks performed by the browser.
    TaskDuration,
    /// Used JavaScript heap size.
    #[serde(rename = "JSHeapUsedSize")]
    JsHeapUsedSize,
    /// Total JavaScript heap size.
    #[serde(rename = "JSHeapTotalSize")]
    JsHeapTotalSize,
}

impl MetricName {
    pub const COUNT: usize = 13;

    /// Every metric, in canonical order.
    pub const ALL: [MetricName; Self::COUNT] = [
        MetricName::Timestamp,
        MetricName::Documents,
        MetricName::Frames,
        MetricName::JsEventListeners,
        MetricName::Nodes,
        MetricName::LayoutCount,
        MetricName::RecalcStyleCount,
        MetricName::LayoutDuration,
        MetricName::RecalcStyleDuration,
        MetricName::ScriptDuration,
        MetricName::TaskDuration,
        MetricName::JsHeapUsedSize,
        MetricName::JsHeapTotalSize,
    ];

    /// The name the browser reports this counter under.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::Timestamp => "Timestamp",
            MetricName::Documents => "Documents",
            MetricName::Frames => "Frames",
            MetricName::JsEventListeners => "JSEventListeners",
            MetricName::Nodes => "Nodes",
            MetricName::LayoutCount => "LayoutCount",
            MetricName::RecalcStyleCount => "RecalcStyleCount",
            MetricName::LayoutDuration => "LayoutDuration",
            MetricName::RecalcStyleDuration => "RecalcStyleDuration",
            MetricName::ScriptDuration => "ScriptDuration",
            MetricName::TaskDuration => "TaskDuration",
            MetricName::JsHeapUsedSize => "JSHeapUsedSize",
            MetricName::JsHeapTotalSize => "JSHeapTotalSize",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MetricName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::UnknownMetric(s.to_string()))
    }
}

/// A fixed-size map holding one `T` per [`MetricName`].
///
/// Backed by an array indexed by the enum discriminant, so there is never a
/// missing key and iteration always follows the canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMap<T>([T; MetricName::COUNT]);

impl<T> MetricMap<T> {
    pub fn from_fn(mut f: impl FnMut(MetricName) -> T) -> Self {
        Self(std::array::from_fn(|i| f(MetricName::ALL[i])))
    }

    pub fn get(&self, name: MetricName) -> &T {
        &self.0[name.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, &T)> {
        MetricName::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(MetricName, &T) -> U) -> MetricMap<U> {
        MetricMap::from_fn(|name| f(name, self.get(name)))
    }
}

impl<T: Default> Default for MetricMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<MetricName> for MetricMap<T> {
    type Output = T;

    fn index(&self, name: MetricName) -> &T {
        self.get(name)
    }
}

impl<T> IndexMut<MetricName> for MetricMap<T> {
    fn index_mut(&mut self, name: MetricName) -> &mut T {
        &mut self.0[name.index()]
    }
}

impl<T: Serialize> Serialize for MetricMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MetricName::COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

/// One atomic reading of every tracked counter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    pub timestamp: f64,
    pub documents: f64,
    pub frames: f64,
    #[serde(rename = "JSEventListeners")]
    pub js_event_listeners: f64,
    pub nodes: f64,
    pub layout_count: f64,
    pub recalc_style_count: f64,
    pub layout_duration: f64,
    pub recalc_style_duration: f64,
    pub script_duration: f64,
    pub task_duration: f64,
    #[serde(rename = "JSHeapUsedSize")]
    pub js_heap_used_size: f64,
    #[serde(rename = "JSHeapTotalSize")]
    pub js_heap_total_size: f64,
}

impl Snapshot {
    pub fn get(&self, name: MetricName) -> f64 {
        match name {
            MetricName::Timestamp => self.timestamp,
            MetricName::Documents => self.documents,
            MetricName::Frames => self.frames,
            MetricName::JsEventListeners => self.js_event_listeners,
            MetricName::Nodes => self.nodes,
            MetricName::LayoutCount => self.layout_count,
            MetricName::RecalcStyleCount => self.recalc_style_count,
            MetricName::LayoutDuration => self.layout_duration,
            MetricName::RecalcStyleDuration => self.recalc_style_duration,
            MetricName::ScriptDuration => self.script_duration,
            MetricName::TaskDuration => self.task_duration,
            MetricName::JsHeapUsedSize => self.js_heap_used_size,
            MetricName::JsHeapTotalSize => self.js_heap_total_size,
        }
    }

    pub fn set(&mut self, name: MetricName, value: f64) {
        let slot = match name {
            MetricName::Timestamp => &mut self.timestamp,
            MetricName::Documents => &mut self.documents,
            MetricName::Frames => &mut self.frames,
            MetricName::JsEventListeners => &mut self.js_event_listeners,
            MetricName::Nodes => &mut self.nodes,
            MetricName::LayoutCount => &mut self.layout_count,
            MetricName::RecalcStyleCount => &mut self.recalc_style_count,
            MetricName::LayoutDuration => &mut self.layout_duration,
            MetricName::RecalcStyleDuration => &mut self.recalc_style_duration,
            MetricName::ScriptDuration => &mut self.script_duration,
            MetricName::TaskDuration => &mut self.task_duration,
            MetricName::JsHeapUsedSize => &mut self.js_heap_used_size,
            MetricName::JsHeapTotalSize => &mut self.js_heap_total_size,
        };
        *slot = value;
    }

    /// Builds a snapshot from `(name, value)` pairs as the browser's
    /// performance domain reports them.
    ///
    /// Names outside the tracked set are skipped; every tracked name has to be
    /// present.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut seen = MetricMap::<bool>::default();
        let mut snapshot = Snapshot::default();
        for (raw, value) in pairs {
            let Ok(name) = raw.parse::<MetricName>() else {
                tracing::trace!("Skipping untracked metric {raw}");
                continue;
            };
            snapshot.set(name, value);
            seen[name] = true;
        }
        match seen.iter().find(|(_, present)| !**present) {
            Some((missing, _)) => Err(Error::IncompleteSnapshot(missing)),
            None => Ok(snapshot),
        }
    }

    /// Per-metric `end - self`.
    pub fn delta(&self, end: &Snapshot) -> MetricMap<f64> {
        MetricMap::from_fn(|name| end.get(name) - self.get(name))
    }
}
