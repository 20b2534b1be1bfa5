//! # Schema Model
//!
//! In-memory representation of an accepted configuration shape: typed
//! leaves, nested objects, homogeneous arrays, required-field sets and
//! pattern groups of user-named instances.
//!
//! ## Invariants
//!
//! - Within one [`ObjectNode`], `required ⊆ keys(children)`. The only
//!   constructor that takes a required set checks this.
//! - A [`TypeSet`] is never empty.
//! - A [`SchemaModel`] has no mutation API. The canonical model is built
//!   once per session and shared read-only; extension produces a new model.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Leaf types
// ---------------------------------------------------------------------------

/// Runtime type of a scalar configuration value.
///
/// `Missing` is the sentinel for "not set": an explicit null in the
/// document. It never matches an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Text value.
    String,
    /// Any numeric value, integral or fractional.
    Number,
    /// Integral numeric value.
    Integer,
    /// `true` / `false`.
    Boolean,
    /// Explicit "not set" marker.
    Missing,
}

impl ValueType {
    /// Schema-definition name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Missing => "missing",
        }
    }

    /// Resolve a schema-definition type name. `null` is read as `missing`.
    ///
    /// Returns `None` for container names (`object`, `array`) and unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "missing" | "null" => Some(Self::Missing),
            _ => None,
        }
    }

    /// Runtime type of a scalar document value; `None` for objects and arrays.
    ///
    /// Integral JSON numbers deduce to `Integer`, all others to `Number`.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Missing),
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self::Integer),
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::String),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Whether a document value satisfies this type.
    ///
    /// `Number` accepts integral values too. `Integer` accepts integral
    /// representations only, so `3.0` is a `number`, as [`ValueType::of`]
    /// deduces it.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Missing => value.is_null(),
            Self::Number => value.is_number(),
            Self::Integer => matches!(value, Value::Number(n) if n.is_i64() || n.is_u64()),
        }
    }

    /// Type-level compatibility: whether every value of `observed` is
    /// accepted by `self`.
    pub fn admits(self, observed: ValueType) -> bool {
        self == observed || (self == Self::Number && observed == Self::Integer)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describe the runtime type of any document value, containers included.
pub fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        scalar => ValueType::of(scalar).map_or("missing", |t| t.as_str()),
    }
}

/// Non-empty, ordered set of leaf types. A set with several members is a
/// type union (e.g. `base_level: [number, string]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeSet(BTreeSet<ValueType>);

impl TypeSet {
    /// Build a set from the given types. Returns `None` when empty.
    pub fn new(types: impl IntoIterator<Item = ValueType>) -> Option<Self> {
        let set: BTreeSet<ValueType> = types.into_iter().collect();
        if set.is_empty() {
            None
        } else {
            Some(Self(set))
        }
    }

    /// Singleton set.
    pub fn single(ty: ValueType) -> Self {
        Self(BTreeSet::from([ty]))
    }

    /// Iterate the member types in order.
    pub fn iter(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.0.iter().copied()
    }

    /// Number of member types.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `ty` is a member.
    pub fn contains(&self, ty: ValueType) -> bool {
        self.0.contains(&ty)
    }

    /// Whether any member type accepts the document value.
    pub fn accepts(&self, value: &Value) -> bool {
        self.iter().any(|t| t.accepts(value))
    }

    /// Whether the two sets overlap at type level (`number` covers `integer`).
    pub fn admits(&self, observed: &TypeSet) -> bool {
        observed
            .iter()
            .any(|o| self.iter().any(|c| c.admits(o)))
    }

    /// True for the `{missing}` set inferred from nulls and empty arrays.
    pub fn is_placeholder(&self) -> bool {
        self.0.len() == 1 && self.contains(ValueType::Missing)
    }

    fn to_definition(&self) -> Value {
        if self.0.len() == 1 {
            self.iter()
                .next()
                .map_or(Value::Null, |t| Value::String(t.as_str().to_string()))
        } else {
            Value::Array(
                self.iter()
                    .map(|t| Value::String(t.as_str().to_string()))
                    .collect(),
            )
        }
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(ty.as_str())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// One step in a configuration path: a field name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object field name (or pattern-group instance name).
    Key(String),
    /// Array element position.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Ordered sequence of segments from the document root.
///
/// `Display` renders the slash form (`resources/ref/build`). The rendering
/// layer addresses widgets with [`ConfigPath::to_dotted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ConfigPath(Vec<PathSegment>);

impl ConfigPath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// New path extended by one segment.
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Remove the last segment.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Dotted widget key: `diffexp.models.treated_vs_untreated`, with array
    /// positions as `units[0]`.
    pub fn to_dotted(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                PathSegment::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                PathSegment::Index(i) => {
                    out.push_str(&format!("[{i}]"));
                }
            }
        }
        out
    }

    /// User-facing breadcrumb: `resources => ref => build`.
    pub fn to_breadcrumb(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" => ")
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for ConfigPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl AsRef<[PathSegment]> for ConfigPath {
    fn as_ref(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Compiled key matcher of a pattern group.
///
/// Matching is unanchored search, so `^`/`$` in the source pattern are
/// significant. Two patterns are equal when their sources are equal.
#[derive(Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compile a key pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    /// The pattern as written in the schema definition.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether an instance name matches.
    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

impl fmt::Debug for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPattern").field(&self.source).finish()
    }
}

impl PartialEq for KeyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for KeyPattern {}

impl Serialize for KeyPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Map of user-chosen instance names to values sharing one sub-schema,
/// e.g. the named models under `diffexp.models`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternGroup {
    pattern: KeyPattern,
    item: Box<SchemaNode>,
}

impl PatternGroup {
    /// Group whose instances match `pattern` and conform to `item`.
    pub fn new(pattern: KeyPattern, item: SchemaNode) -> Self {
        Self {
            pattern,
            item: Box::new(item),
        }
    }

    /// Key matcher.
    pub fn pattern(&self) -> &KeyPattern {
        &self.pattern
    }

    /// Schema every instance must satisfy.
    pub fn item(&self) -> &SchemaNode {
        &self.item
    }

    pub(crate) fn item_mut(&mut self) -> &mut SchemaNode {
        &mut self.item
    }

    /// Whether `key` names an instance of this group.
    pub fn matches(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}

/// Object with fixed field names, an optional required subset, and
/// optionally pattern groups for keys that are not declared fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectNode {
    children: BTreeMap<String, SchemaNode>,
    required: BTreeSet<String>,
    patterns: Vec<PatternGroup>,
}

impl ObjectNode {
    /// Object with no required fields and no pattern groups. Inferred
    /// objects are always of this form.
    pub fn open(children: BTreeMap<String, SchemaNode>) -> Self {
        Self {
            children,
            required: BTreeSet::new(),
            patterns: Vec::new(),
        }
    }

    /// Object with a required set.
    ///
    /// # Errors
    ///
    /// Returns the first required field that is not a declared child.
    pub fn with_required(
        children: BTreeMap<String, SchemaNode>,
        required: BTreeSet<String>,
        patterns: Vec<PatternGroup>,
    ) -> Result<Self, String> {
        if let Some(undeclared) = required.iter().find(|f| !children.contains_key(*f)) {
            return Err(undeclared.clone());
        }
        Ok(Self {
            children,
            required,
            patterns,
        })
    }

    pub(crate) fn with_patterns(patterns: Vec<PatternGroup>) -> Self {
        Self {
            children: BTreeMap::new(),
            required: BTreeSet::new(),
            patterns,
        }
    }

    /// Declared fields.
    pub fn children(&self) -> &BTreeMap<String, SchemaNode> {
        &self.children
    }

    /// Required field names.
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Pattern groups for undeclared keys.
    pub fn patterns(&self) -> &[PatternGroup] {
        &self.patterns
    }

    /// Declared child by exact name.
    pub fn child(&self, key: &str) -> Option<&SchemaNode> {
        self.children.get(key)
    }

    /// Whether `key` is a required field.
    pub fn is_required(&self, key: &str) -> bool {
        self.required.contains(key)
    }

    /// Schema for a document key: the declared child, else the item schema
    /// of the first pattern group matching the key.
    pub fn resolve(&self, key: &str) -> Option<&SchemaNode> {
        self.children.get(key).or_else(|| {
            self.patterns
                .iter()
                .find(|g| g.matches(key))
                .map(PatternGroup::item)
        })
    }

    pub(crate) fn resolve_mut(&mut self, key: &str) -> Option<&mut SchemaNode> {
        if self.children.contains_key(key) {
            return self.children.get_mut(key);
        }
        self.patterns
            .iter_mut()
            .find(|g| g.matches(key))
            .map(PatternGroup::item_mut)
    }

    pub(crate) fn insert_child(&mut self, key: String, node: SchemaNode) {
        self.children.insert(key, node);
    }
}

/// Kind tag of a [`SchemaNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Leaf,
    Object,
    Array,
    PatternGroup,
}

/// A node of the accepted configuration shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// Scalar value of one of the allowed types.
    Leaf(TypeSet),
    /// Object with fixed field names.
    Object(ObjectNode),
    /// Homogeneous array.
    Array(Box<SchemaNode>),
    /// Object whose keys are user-chosen instance names.
    PatternGroup(PatternGroup),
}

impl SchemaNode {
    /// Leaf accepting exactly one type.
    pub fn leaf(ty: ValueType) -> Self {
        Self::Leaf(TypeSet::single(ty))
    }

    /// Kind tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
            Self::PatternGroup(_) => NodeKind::PatternGroup,
        }
    }

    /// Short type description used in violations and diffs:
    /// `string`, `number|string`, `object`, `array<string>`.
    pub fn describe(&self) -> String {
        match self {
            Self::Leaf(types) => types.to_string(),
            Self::Object(_) | Self::PatternGroup(_) => "object".to_string(),
            Self::Array(item) => format!("array<{}>", item.describe()),
        }
    }

    /// Whether a field of this schema may be absent from the document:
    /// true for leaves that allow the `missing` type.
    pub fn admits_absence(&self) -> bool {
        matches!(self, Self::Leaf(types) if types.contains(ValueType::Missing))
    }

    /// One lookup step: object field or pattern instance by key, array
    /// element by index.
    pub fn step(&self, segment: &PathSegment) -> Option<&SchemaNode> {
        match (self, segment) {
            (Self::Object(obj), PathSegment::Key(key)) => obj.resolve(key),
            (Self::PatternGroup(group), PathSegment::Key(key)) if group.matches(key) => {
                Some(group.item())
            }
            (Self::Array(item), PathSegment::Index(_)) => Some(item),
            _ => None,
        }
    }

    /// Recursive shape comparison: node kinds, leaf type sets, child keys,
    /// required sets and pattern groups. Field order carries no weight, but
    /// pattern group order does, since a key resolves to the first matching
    /// group.
    pub fn same_shape(&self, other: &SchemaNode) -> bool {
        match (self, other) {
            (Self::Leaf(a), Self::Leaf(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a.same_shape(b),
            (Self::PatternGroup(a), Self::PatternGroup(b)) => {
                a.pattern == b.pattern && a.item.same_shape(&b.item)
            }
            (Self::Object(a), Self::Object(b)) => {
                a.required == b.required
                    && a.children.len() == b.children.len()
                    && a.children.iter().all(|(key, child)| {
                        b.children
                            .get(key)
                            .is_some_and(|other| child.same_shape(other))
                    })
                    && a.patterns.len() == b.patterns.len()
                    && a.patterns.iter().zip(&b.patterns).all(|(x, y)| {
                        x.pattern == y.pattern && x.item.same_shape(&y.item)
                    })
            }
            _ => false,
        }
    }

    /// Render back into definition form (`type`, `properties`, `required`,
    /// `items`, `patternProperties`).
    pub fn to_definition(&self) -> Value {
        let mut def = Map::new();
        match self {
            Self::Leaf(types) => {
                def.insert("type".into(), types.to_definition());
            }
            Self::Array(item) => {
                def.insert("type".into(), Value::from("array"));
                def.insert("items".into(), item.to_definition());
            }
            Self::PatternGroup(group) => {
                def.insert("type".into(), Value::from("object"));
                def.insert(
                    "patternProperties".into(),
                    pattern_definitions(std::slice::from_ref(group)),
                );
            }
            Self::Object(obj) => {
                def.insert("type".into(), Value::from("object"));
                let properties: Map<String, Value> = obj
                    .children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_definition()))
                    .collect();
                def.insert("properties".into(), Value::Object(properties));
                if !obj.patterns.is_empty() {
                    def.insert("patternProperties".into(), pattern_definitions(&obj.patterns));
                }
                if !obj.required.is_empty() {
                    def.insert(
                        "required".into(),
                        obj.required.iter().cloned().map(Value::String).collect(),
                    );
                }
            }
        }
        Value::Object(def)
    }
}

fn pattern_definitions(groups: &[PatternGroup]) -> Value {
    Value::Object(
        groups
            .iter()
            .map(|g| (g.pattern.as_str().to_string(), g.item.to_definition()))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A complete configuration shape, canonical or inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaModel {
    root: SchemaNode,
}

impl SchemaModel {
    /// Wrap a root node.
    pub fn new(root: SchemaNode) -> Self {
        Self { root }
    }

    /// The top-level node.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub(crate) fn into_root(self) -> SchemaNode {
        self.root
    }

    /// Read-only lookup of the node governing `path`.
    ///
    /// Keys resolve through declared fields first, then pattern groups;
    /// indices step into array items. Returns `None` when no node governs
    /// the path.
    pub fn node(&self, path: &[PathSegment]) -> Option<&SchemaNode> {
        path.iter().try_fold(&self.root, |node, segment| node.step(segment))
    }

    /// Whether two models have the same shape. See [`SchemaNode::same_shape`].
    pub fn same_shape(&self, other: &SchemaModel) -> bool {
        self.root.same_shape(&other.root)
    }

    /// Render the model in definition form.
    pub fn to_definition(&self) -> Value {
        self.root.to_definition()
    }
}
