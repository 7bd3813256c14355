use crate::error::{MlError, MlResult};
use crate::param::{Param, ParamId, ParamInfo, ParamMap, ParamType, Validator};

/// The parameters declared by one instance, with their defaults and explicitly set values.
#[derive(Debug, Clone)]
pub struct ParamSet {
    uid: String,
    declared: Vec<ParamInfo>,
    defaults: ParamMap,
    values: ParamMap,
}

impl ParamSet {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            declared: vec![],
            defaults: ParamMap::new(),
            values: ParamMap::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Declares a parameter owned by this instance, optionally with a default value.
    pub fn declare<T: ParamType>(
        &mut self,
        name: &'static str,
        doc: &'static str,
        default: Option<T>,
        validator: Option<Validator<T>>,
    ) -> Param<T> {
        let mut param = Param::new(self.uid.clone(), name, doc);
        if let Some(validator) = validator {
            param = param.with_validator(validator);
        }
        if let Some(default) = default {
            self.defaults
                .insert_value(param.id().clone(), default.into_value());
        }
        let position = self
            .declared
            .partition_point(|info| info.name() < param.name());
        self.declared.insert(position, param.info().clone());
        param
    }

    /// The declared parameters sorted by name.
    pub fn params(&self) -> &[ParamInfo] {
        &self.declared
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.declared.iter().any(|info| info.name() == name)
    }

    pub fn owns(&self, id: &ParamId) -> bool {
        id.parent() == self.uid && self.has_param(id.name())
    }

    fn check_owned(&self, id: &ParamId) -> MlResult<()> {
        if self.owns(id) {
            Ok(())
        } else {
            Err(MlError::invalid(format!(
                "{} parameter {} does not belong to {}.",
                id.parent(),
                id.name(),
                self.uid
            )))
        }
    }

    pub fn set<T: ParamType>(&mut self, param: &Param<T>, value: impl Into<T>) -> MlResult<()> {
        self.check_owned(param.id())?;
        let value = value.into();
        param.validate(&value)?;
        self.values
            .insert_value(param.id().clone(), value.into_value());
        Ok(())
    }

    pub fn clear<T: ParamType>(&mut self, param: &Param<T>) {
        self.values.remove_id(param.id());
    }

    pub fn get<T: ParamType>(&self, param: &Param<T>) -> Option<T> {
        self.values.get(param)
    }

    pub fn get_default<T: ParamType>(&self, param: &Param<T>) -> Option<T> {
        self.defaults.get(param)
    }

    pub fn get_or_default<T: ParamType>(&self, param: &Param<T>) -> MlResult<T> {
        self.get(param)
            .or_else(|| self.get_default(param))
            .ok_or_else(|| {
                MlError::missing(format!(
                    "Failed to find a default value for {}",
                    param.name()
                ))
            })
    }

    pub fn is_set<T: ParamType>(&self, param: &Param<T>) -> bool {
        self.values.contains(param)
    }

    pub fn is_defined<T: ParamType>(&self, param: &Param<T>) -> bool {
        self.values.contains(param) || self.defaults.contains(param)
    }

    /// Explains a single parameter as `name: doc (default: d, current: c)`.
    pub fn explain_param(&self, info: &ParamInfo) -> String {
        let default = self.defaults.get_value(info.id());
        let current = self.values.get_value(info.id());
        let value = if default.is_none() && current.is_none() {
            "(undefined)".to_string()
        } else {
            let parts = [
                default.map(|v| format!("default: {v}")),
                current.map(|v| format!("current: {v}")),
            ];
            format!("({})", parts.into_iter().flatten().collect::<Vec<_>>().join(", "))
        };
        format!("{}: {} {}", info.name(), info.doc(), value)
    }

    pub fn explain_params(&self) -> String {
        self.declared
            .iter()
            .map(|info| self.explain_param(info))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns defaults, then set values, then `extra`, later entries winning.
    ///
    /// Entries in `extra` for parameters of other instances are ignored.
    pub fn extract_param_map(&self, extra: &ParamMap) -> ParamMap {
        let mut map = self.defaults.merge(&self.values);
        map.update(&extra.filter(|id| self.owns(id)));
        map
    }

    /// Copies this set, applying `extra` on top of the explicitly set values.
    pub fn copy_with(&self, extra: &ParamMap) -> Self {
        let mut copy = self.clone();
        copy.values.update(&extra.filter(|id| self.owns(id)));
        copy
    }
}

/// Components that carry parameters.
pub trait Params {
    fn param_set(&self) -> &ParamSet;

    /// The unique id of this instance. Parameters it declares carry this id as their parent.
    fn uid(&self) -> &str {
        self.param_set().uid()
    }

    fn params(&self) -> &[ParamInfo] {
        self.param_set().params()
    }

    fn has_param(&self, name: &str) -> bool {
        self.param_set().has_param(name)
    }

    fn explain_param(&self, info: &ParamInfo) -> String {
        self.param_set().explain_param(info)
    }

    fn explain_params(&self) -> String {
        self.param_set().explain_params()
    }

    fn extract_param_map(&self) -> ParamMap {
        self.param_set().extract_param_map(&ParamMap::new())
    }

    fn extract_param_map_with(&self, extra: &ParamMap) -> ParamMap {
        self.param_set().extract_param_map(extra)
    }

    fn get<T: ParamType>(&self, param: &Param<T>) -> Option<T>
    where
        Self: Sized,
    {
        self.param_set().get(param)
    }

    fn get_or_default<T: ParamType>(&self, param: &Param<T>) -> MlResult<T>
    where
        Self: Sized,
    {
        self.param_set().get_or_default(param)
    }

    fn is_set<T: ParamType>(&self, param: &Param<T>) -> bool
    where
        Self: Sized,
    {
        self.param_set().is_set(param)
    }

    fn is_defined<T: ParamType>(&self, param: &Param<T>) -> bool
    where
        Self: Sized,
    {
        self.param_set().is_defined(param)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::param::validators;

    struct Example {
        set: ParamSet,
        max_iter: Param<i64>,
        label_col: Param<String>,
        weight_col: Param<String>,
    }

    impl Example {
        fn new(uid: &str) -> Self {
            let mut set = ParamSet::new(uid);
            let max_iter = set.declare(
                "maxIter",
                "max number of iterations (>= 0)",
                Some(100),
                Some(validators::gt_eq(0)),
            );
            let weight_col = set.declare("weightCol", "weight column name", None, None);
            let label_col = set.declare(
                "labelCol",
                "label column name",
                Some("label".to_string()),
                None,
            );
            Self {
                set,
                max_iter,
                label_col,
                weight_col,
            }
        }
    }

    impl Params for Example {
        fn param_set(&self) -> &ParamSet {
            &self.set
        }
    }

    #[test]
    fn test_declared_params_sorted() {
        let example = Example::new("ex");
        let names = example.params().iter().map(|p| p.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["labelCol", "maxIter", "weightCol"]);
        assert!(example.has_param("maxIter"));
        assert!(!example.has_param("regParam"));
    }

    #[test]
    fn test_explain_params() {
        let mut example = Example::new("ex");
        example.set.set(&example.max_iter.clone(), 10).unwrap();
        assert_eq!(
            example.explain_params(),
            "labelCol: label column name (default: label)\n\
             maxIter: max number of iterations (>= 0) (default: 100, current: 10)\n\
             weightCol: weight column name (undefined)"
        );
    }

    #[test]
    fn test_get_or_default() {
        let mut example = Example::new("ex");
        assert_eq!(example.get_or_default(&example.max_iter).unwrap(), 100);
        assert!(!example.is_set(&example.max_iter));
        example.set.set(&example.max_iter.clone(), 5).unwrap();
        assert_eq!(example.get_or_default(&example.max_iter).unwrap(), 5);
        assert!(example.is_set(&example.max_iter));
        assert!(!example.is_defined(&example.weight_col));
        assert!(matches!(
            example.get_or_default(&example.weight_col),
            Err(MlError::MissingParameter(_))
        ));
        assert_eq!(
            example.get_or_default(&example.label_col).unwrap(),
            "label".to_string()
        );
    }

    #[test]
    fn test_set_rejects_foreign_param() {
        let mut a = Example::new("a");
        let b = Example::new("b");
        match a.set.set(&b.max_iter, 1) {
            Err(MlError::InvalidArgument(message)) => {
                assert_eq!(message, "b parameter maxIter does not belong to a.")
            }
            other => panic!("unexpected result: {other:?}"),
        }
        match a.set.set(&a.max_iter.clone(), -1) {
            Err(MlError::InvalidArgument(message)) => {
                assert!(message.starts_with("a parameter maxIter given invalid value -1."))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_param_id_matches_param_map_rendering() {
        let a = Example::new("a");
        assert_eq!(a.max_iter.id().to_string(), "a-maxIter");
        let mut map = ParamMap::new();
        map.put(&a.max_iter, 7).unwrap();
        assert_eq!(map.to_string(), format!("{{\n\t{}: 7\n}}", a.max_iter.id()));
    }

    #[test]
    fn test_extract_param_map_ignores_foreign_entries() {
        let a = Example::new("a");
        let b = Example::new("b");
        let mut extra = ParamMap::new();
        extra.put(&a.max_iter, 7).unwrap();
        extra.put(&b.max_iter, 9).unwrap();

        let map = a.extract_param_map_with(&extra);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&a.max_iter), Some(7));
        assert!(!map.contains(&b.max_iter));
    }

    #[test]
    fn test_copy_with_leaves_original_untouched() {
        let a = Example::new("a");
        let mut extra = ParamMap::new();
        extra.put(&a.max_iter, 3).unwrap();
        let copy = a.set.copy_with(&extra);
        assert_eq!(copy.get(&a.max_iter), Some(3));
        assert_eq!(a.set.get(&a.max_iter), None);
    }
}
