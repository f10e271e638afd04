// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission requirements.
//!
//! A requirement is a permission string, a permission string with parameter
//! bindings, or an `and`/`or` node over further requirements. The serialized
//! forms are:
//!
//! ```text
//! "user:update:own"
//! ["user:update:own", {"id": "userId"}]
//! {"and": [...]}
//! {"or": [...]}
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Callback argument name to request parameter name.
pub type Bindings = IndexMap<String, String>;

/// A declared access requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRequirement", into = "RawRequirement")]
pub enum Requirement {
    /// A single permission, optionally bound to request parameters.
    Permission {
        /// Permission string.
        name: String,
        /// Callback argument bindings.
        bindings: Bindings,
    },
    /// Every child must allow.
    All(Vec<Requirement>),
    /// At least one child must allow.
    Any(Vec<Requirement>),
}

impl Requirement {
    /// A permission with no bindings.
    pub fn permission(name: impl Into<String>) -> Self {
        Requirement::Permission {
            name: name.into(),
            bindings: Bindings::new(),
        }
    }

    /// Binds callback argument `arg` to request parameter `param`.
    ///
    /// On an `All`/`Any` node the binding is added to every permission
    /// inside it.
    pub fn bind(mut self, arg: impl Into<String>, param: impl Into<String>) -> Self {
        self.bind_in_place(&arg.into(), &param.into());
        self
    }

    fn bind_in_place(&mut self, arg: &str, param: &str) {
        match self {
            Requirement::Permission { bindings, .. } => {
                bindings.insert(arg.to_string(), param.to_string());
            }
            Requirement::All(children) | Requirement::Any(children) => {
                children.iter_mut().for_each(|c| c.bind_in_place(arg, param))
            }
        }
    }

    /// An `and` node.
    pub fn all(children: impl IntoIterator<Item = Requirement>) -> Self {
        Requirement::All(children.into_iter().collect())
    }

    /// An `or` node.
    pub fn any(children: impl IntoIterator<Item = Requirement>) -> Self {
        Requirement::Any(children.into_iter().collect())
    }

    /// Every permission string named anywhere in this requirement.
    pub fn permission_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Requirement::Permission { name, .. } => out.push(name),
            Requirement::All(children) | Requirement::Any(children) => {
                children.iter().for_each(|c| c.collect_names(out))
            }
        }
    }
}

impl From<&str> for Requirement {
    fn from(name: &str) -> Self {
        Requirement::permission(name)
    }
}

// =============================================================================
// Wire form
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Name(String),
    Bound(String, Bindings),
    Conditional(Conditional),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Conditional {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    and: Option<Vec<Requirement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    or: Option<Vec<Requirement>>,
}

impl TryFrom<RawRequirement> for Requirement {
    type Error = String;

    fn try_from(raw: RawRequirement) -> Result<Self, Self::Error> {
        match raw {
            RawRequirement::Name(name) => Ok(Requirement::permission(name)),
            RawRequirement::Bound(name, bindings) => Ok(Requirement::Permission { name, bindings }),
            RawRequirement::Conditional(Conditional { and, or }) => match (and, or) {
                (Some(children), None) => Ok(Requirement::All(children)),
                (None, Some(children)) => Ok(Requirement::Any(children)),
                (Some(_), Some(_)) => {
                    Err("conditional requirement cannot have both 'and' and 'or'".to_string())
                }
                (None, None) => {
                    Err("conditional requirement needs exactly one of 'and' or 'or'".to_string())
                }
            },
        }
    }
}

impl From<Requirement> for RawRequirement {
    fn from(requirement: Requirement) -> Self {
        match requirement {
            Requirement::Permission { name, bindings } if bindings.is_empty() => {
                RawRequirement::Name(name)
            }
            Requirement::Permission { name, bindings } => RawRequirement::Bound(name, bindings),
            Requirement::All(children) => RawRequirement::Conditional(Conditional {
                and: Some(children),
                or: None,
            }),
            Requirement::Any(children) => RawRequirement::Conditional(Conditional {
                and: None,
                or: Some(children),
            }),
        }
    }
}
