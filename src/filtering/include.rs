use crate::relations::relation_name;

/// Which relations a caller may ask to eager-load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedWith {
    /// Every requested relation is allowed.
    All,
    Only(Vec<String>),
}

impl Default for AllowedWith {
    fn default() -> Self {
        Self::Only(Vec::new())
    }
}

impl AllowedWith {
    #[must_use]
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(names.into_iter().map(|name| relation_name(name.as_ref())).collect())
    }

    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(&relation_name(name)),
        }
    }
}

/// `*` anywhere in the list allows everything.
impl<S: AsRef<str>> FromIterator<S> for AllowedWith {
    fn from_iter<I: IntoIterator<Item = S>>(names: I) -> Self {
        let names: Vec<String> = names.into_iter().map(|name| name.as_ref().to_string()).collect();
        if names.iter().any(|name| name == "*") {
            Self::All
        } else {
            Self::only(names)
        }
    }
}

/// Relations to eager-load: the permitted subset of `requested` followed by
/// `defaults`, without duplicates.
///
/// With an explicit allow-list the permitted names keep allow-list order.
#[must_use]
pub fn eager_relations(allowed: &AllowedWith, requested: &[String], defaults: &[String]) -> Vec<String> {
    let requested: Vec<String> = requested.iter().map(|name| relation_name(name)).collect();
    let permitted = match allowed {
        AllowedWith::All => requested,
        AllowedWith::Only(names) => names
            .iter()
            .map(|name| relation_name(name))
            .filter(|name| requested.contains(name))
            .collect(),
    };

    let mut effective: Vec<String> = Vec::new();
    for name in permitted
        .into_iter()
        .chain(defaults.iter().map(|name| relation_name(name)))
    {
        if !effective.contains(&name) {
            effective.push(name);
        }
    }
    effective
}
