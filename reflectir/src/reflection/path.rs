use crate::value::{Any, AnyKey};

/// One step of an access path from a root value to a sub-value.
#[derive(Debug, Clone)]
pub enum AccessStep {
    ObjectField(String),
    ArrayIndex(usize),
    /// The array on this side has no element at the index.
    ArrayIndexMissing(usize),
    MapKey(Any),
    /// The map on this side has no entry under the key.
    MapKeyMissing(Any),
}

impl PartialEq for AccessStep {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AccessStep::ObjectField(a), AccessStep::ObjectField(b)) => a == b,
            (AccessStep::ArrayIndex(a), AccessStep::ArrayIndex(b)) => a == b,
            (AccessStep::ArrayIndexMissing(a), AccessStep::ArrayIndexMissing(b)) => a == b,
            (AccessStep::MapKey(a), AccessStep::MapKey(b)) => {
                AnyKey(a.clone()) == AnyKey(b.clone())
            }
            (AccessStep::MapKeyMissing(a), AccessStep::MapKeyMissing(b)) => {
                AnyKey(a.clone()) == AnyKey(b.clone())
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for AccessStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessStep::ObjectField(name) => write!(f, ".{}", name),
            AccessStep::ArrayIndex(i) => write!(f, "[{}]", i),
            AccessStep::ArrayIndexMissing(i) => write!(f, "[{}]<missing>", i),
            AccessStep::MapKey(key) => write!(f, "[{}]", key),
            AccessStep::MapKeyMissing(key) => write!(f, "[{}]<missing>", key),
        }
    }
}

/// Root-to-leaf access path.
///
/// Comparison builds paths deepest-step-first; [`AccessPath::from_reverse`]
/// flips them into the order the public API promises.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessPath {
    steps: Vec<AccessStep>,
}

impl AccessPath {
    pub fn new(steps: Vec<AccessStep>) -> Self {
        Self { steps }
    }

    pub fn from_reverse(mut reverse_steps: Vec<AccessStep>) -> Self {
        reverse_steps.reverse();
        Self {
            steps: reverse_steps,
        }
    }

    pub fn steps(&self) -> &[AccessStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Display for AccessPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<root>")?;
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}
