//! Security label expressions naming a set of peer applications.
//!
//! Backends that match peers by label (AppArmor in particular) need a single
//! expression covering exactly the applications bound to the other end of a
//! connection. Three shapes are produced:
//!
//! - one bound app: the exact tag, `snap.pkg.app`
//! - every app of the package bound, or none: a glob, `snap.pkg.*`
//! - anything else: a sorted alternation, `snap.pkg.{a,b}`

use std::collections::BTreeSet;

/// A label expression over the applications of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Exact { package: String, app: String },
    Glob { package: String },
    Alternation { package: String, apps: Vec<String> },
}

impl Label {
    /// Chooses the narrowest expression for `bound` out of `all`.
    ///
    /// An empty `bound` names no app in particular and yields the glob, so an
    /// alternation always has at least two members.
    pub fn compose(package: &str, all: &BTreeSet<String>, bound: &BTreeSet<String>) -> Self {
        let package = package.to_string();
        if bound.len() == 1 {
            if let Some(app) = bound.first() {
                return Label::Exact {
                    package,
                    app: app.clone(),
                };
            }
        }
        if bound.is_empty() || bound == all {
            return Label::Glob { package };
        }
        Label::Alternation {
            package,
            apps: bound.iter().cloned().collect(),
        }
    }

    pub fn package(&self) -> &str {
        match self {
            Label::Exact { package, .. }
            | Label::Glob { package }
            | Label::Alternation { package, .. } => package,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Exact { package, app } => write!(f, "snap.{package}.{app}"),
            Label::Glob { package } => write!(f, "snap.{package}.*"),
            Label::Alternation { package, apps } => {
                write!(f, "snap.{package}.{{{}}}", apps.join(","))
            }
        }
    }
}
