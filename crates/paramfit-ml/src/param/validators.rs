use std::fmt;
use std::sync::Arc;

/// A predicate on parameter values along with a description of the accepted values.
pub struct Validator<T> {
    check: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    description: String,
}

impl<T> Validator<T> {
    pub fn new(
        description: impl Into<String>,
        check: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            check: Arc::new(check),
            description: description.into(),
        }
    }

    pub fn check(&self, value: &T) -> bool {
        (self.check)(value)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            check: Arc::clone(&self.check),
            description: self.description.clone(),
        }
    }
}

impl<T> fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("description", &self.description)
            .finish()
    }
}

/// Accepts values greater than or equal to `lower`.
pub fn gt_eq<T>(lower: T) -> Validator<T>
where
    T: PartialOrd + fmt::Debug + Send + Sync + 'static,
{
    Validator::new(format!(">= {lower:?}"), move |v: &T| *v >= lower)
}

/// Accepts values in the closed interval `[lower, upper]`.
pub fn in_range<T>(lower: T, upper: T) -> Validator<T>
where
    T: PartialOrd + fmt::Debug + Send + Sync + 'static,
{
    Validator::new(format!("in range [{lower:?}, {upper:?}]"), move |v: &T| {
        *v >= lower && *v <= upper
    })
}
