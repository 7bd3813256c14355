//! Typed parameters, parameter maps, and parameter holders.
//!
//! A [`Param`] is identified by the uid of the instance that declared it together with
//! its name, so two estimators of the same kind never share parameters. A [`ParamMap`]
//! holds values keyed by that identity and is used both for an instance's own state and
//! for call-scoped overrides passed to `fit` or `transform`.

mod set;
pub mod validators;

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

pub use set::{ParamSet, Params};
pub use validators::Validator;

use crate::error::{MlError, MlResult};

/// The identity of a parameter: the declaring instance and the parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId {
    parent: String,
    name: &'static str,
}

impl ParamId {
    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.parent, self.name)
    }
}

/// Untyped description of a declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    id: ParamId,
    doc: &'static str,
}

impl ParamInfo {
    pub fn id(&self) -> &ParamId {
        &self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }
}

/// A stored parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Double(v) => write!(f, "{v:?}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::String(v) => write!(f, "{v}"),
        }
    }
}

/// Rust types that can be stored as parameter values.
pub trait ParamType: Clone + fmt::Debug + Send + Sync + 'static {
    fn into_value(self) -> ParamValue;
    fn from_value(value: &ParamValue) -> Option<Self>;
}

impl ParamType for i64 {
    fn into_value(self) -> ParamValue {
        ParamValue::Int(self)
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl ParamType for f64 {
    fn into_value(self) -> ParamValue {
        ParamValue::Double(self)
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Double(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl ParamType for bool {
    fn into_value(self) -> ParamValue {
        ParamValue::Bool(self)
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl ParamType for String {
    fn into_value(self) -> ParamValue {
        ParamValue::String(self)
    }

    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// A typed parameter handle.
#[derive(Clone)]
pub struct Param<T: ParamType> {
    info: ParamInfo,
    validator: Option<Validator<T>>,
    _type: PhantomData<fn() -> T>,
}

impl<T: ParamType> Param<T> {
    pub fn new(parent: impl Into<String>, name: &'static str, doc: &'static str) -> Self {
        Self {
            info: ParamInfo {
                id: ParamId {
                    parent: parent.into(),
                    name,
                },
                doc,
            },
            validator: None,
            _type: PhantomData,
        }
    }

    pub fn with_validator(mut self, validator: Validator<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn id(&self) -> &ParamId {
        &self.info.id
    }

    pub fn name(&self) -> &'static str {
        self.info.id.name
    }

    pub fn parent(&self) -> &str {
        &self.info.id.parent
    }

    pub fn doc(&self) -> &'static str {
        self.info.doc
    }

    pub fn info(&self) -> &ParamInfo {
        &self.info
    }

    pub fn validate(&self, value: &T) -> MlResult<()> {
        match &self.validator {
            Some(validator) if !validator.check(value) => Err(MlError::invalid(format!(
                "{} parameter {} given invalid value {}. The value must be {}.",
                self.parent(),
                self.name(),
                value.clone().into_value(),
                validator.description(),
            ))),
            _ => Ok(()),
        }
    }
}

impl<T: ParamType> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("parent", &self.parent())
            .field("name", &self.name())
            .field("doc", &self.doc())
            .finish()
    }
}

impl<T: ParamType> fmt::Display for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info.id)
    }
}

/// A map from parameter identity to value.
///
/// Putting a value for a parameter that is already present replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    values: HashMap<ParamId, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a value, replacing any earlier value for the same parameter.
    pub fn put<T: ParamType>(&mut self, param: &Param<T>, value: impl Into<T>) -> MlResult<&mut Self> {
        let value = value.into();
        param.validate(&value)?;
        self.values.insert(param.id().clone(), value.into_value());
        Ok(self)
    }

    pub fn get<T: ParamType>(&self, param: &Param<T>) -> Option<T> {
        self.values.get(param.id()).and_then(T::from_value)
    }

    pub fn get_value(&self, id: &ParamId) -> Option<&ParamValue> {
        self.values.get(id)
    }

    pub fn contains<T: ParamType>(&self, param: &Param<T>) -> bool {
        self.values.contains_key(param.id())
    }

    pub fn contains_id(&self, id: &ParamId) -> bool {
        self.values.contains_key(id)
    }

    pub fn remove<T: ParamType>(&mut self, param: &Param<T>) -> Option<T> {
        self.values
            .remove(param.id())
            .and_then(|v| T::from_value(&v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamId, &ParamValue)> {
        self.values.iter()
    }

    /// Copies every entry of `other` into this map. Entries of `other` win on collision.
    pub fn update(&mut self, other: &ParamMap) -> &mut Self {
        for (id, value) in other.values.iter() {
            self.values.insert(id.clone(), value.clone());
        }
        self
    }

    /// Returns a new map with the entries of this map followed by those of `other`.
    pub fn merge(&self, other: &ParamMap) -> ParamMap {
        let mut merged = self.clone();
        merged.update(other);
        merged
    }

    pub(crate) fn insert_value(&mut self, id: ParamId, value: ParamValue) {
        self.values.insert(id, value);
    }

    pub(crate) fn remove_id(&mut self, id: &ParamId) -> Option<ParamValue> {
        self.values.remove(id)
    }

    /// Keeps only the entries accepted by the predicate.
    pub(crate) fn filter(&self, predicate: impl Fn(&ParamId) -> bool) -> ParamMap {
        let values = self
            .values
            .iter()
            .filter(|(id, _)| predicate(id))
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        ParamMap { values }
    }
}

impl fmt::Display for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries = self.values.iter().collect::<Vec<_>>();
        entries.sort_by(|(a, _), (b, _)| (a.name, &a.parent).cmp(&(b.name, &b.parent)));
        let lines = entries
            .into_iter()
            .map(|(id, value)| format!("\t{id}: {value}"))
            .collect::<Vec<_>>();
        write!(f, "{{\n{}\n}}", lines.join(",\n"))
    }
}
