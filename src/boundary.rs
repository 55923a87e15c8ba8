// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Area boundary input records
//!
//! A boundary is a loosely structured object: curves may sit under any of
//! several member names, and the remaining members are metadata. Members are
//! kept in a sorted map so serialization is stable.

use crate::geometry::CurveSegment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Kind reported for boundaries built in code
pub const AREA_BOUNDARY_KIND: &str = "Objects.BuiltElements.Area";

/// One named member of a boundary record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Member {
    Curve(CurveSegment),
    List(Vec<Member>),
    Value(Value),
}

impl Member {
    /// JSON view of the member
    pub fn to_value(&self) -> Value {
        match self {
            Member::Value(value) => value.clone(),
            Member::List(items) => Value::Array(items.iter().map(Member::to_value).collect()),
            Member::Curve(curve) => serde_json::to_value(curve).unwrap_or(Value::Null),
        }
    }

    /// Curves held by this member in order, descending into nested lists
    pub fn curves(&self) -> Vec<&CurveSegment> {
        let mut out = Vec::new();
        self.collect_curves(&mut out);
        out
    }

    fn collect_curves<'a>(&'a self, out: &mut Vec<&'a CurveSegment>) {
        match self {
            Member::Curve(curve) => out.push(curve),
            Member::List(items) => {
                for item in items {
                    item.collect_curves(out);
                }
            }
            Member::Value(_) => {}
        }
    }
}

impl From<CurveSegment> for Member {
    fn from(curve: CurveSegment) -> Self {
        Member::Curve(curve)
    }
}

impl From<Value> for Member {
    fn from(value: Value) -> Self {
        Member::Value(value)
    }
}

/// Area boundary record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Boundary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Declared object kind
    #[serde(default, rename = "speckle_type", alias = "kind")]
    pub kind: String,

    /// Curve members and metadata
    #[serde(flatten)]
    pub members: BTreeMap<String, Member>,
}

impl Boundary {
    pub fn new() -> Self {
        Self {
            id: None,
            kind: AREA_BOUNDARY_KIND.to_string(),
            members: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_member(mut self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.members.insert(name.into(), member.into());
        self
    }

    /// Store the curves as a list under `name`
    pub fn with_curves(self, name: impl Into<String>, curves: Vec<CurveSegment>) -> Self {
        let list = Member::List(curves.into_iter().map(Member::Curve).collect());
        self.with_member(name, list)
    }

    /// Store a metadata value under `name`
    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_member(name, Member::Value(value.into()))
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Metadata value of a member, if the member is present
    pub fn value(&self, name: &str) -> Option<Value> {
        self.member(name).map(Member::to_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use serde_json::json;

    #[test]
    fn test_deserialize_mixed_members() {
        let json = json!({
            "id": "area-7",
            "speckle_type": "Objects.BuiltElements.Area",
            "name": "Office",
            "area": 24.5,
            "curves": [
                {"type": "Line", "start": [0.0, 0.0, 0.0], "end": [1.0, 0.0, 0.0]},
                {"type": "Mesh", "vertices": []},
                [{"type": "Line", "start": [1.0, 0.0, 0.0], "end": [1.0, 1.0, 0.0]}]
            ]
        });

        let boundary: Boundary = serde_json::from_value(json).unwrap();
        assert_eq!(boundary.id.as_deref(), Some("area-7"));
        assert_eq!(boundary.kind, AREA_BOUNDARY_KIND);
        assert_eq!(boundary.value("name"), Some(json!("Office")));
        assert_eq!(boundary.member("curves").unwrap().curves().len(), 2);
    }

    #[test]
    fn test_kind_alias() {
        let boundary: Boundary = serde_json::from_value(json!({"kind": "Area"})).unwrap();
        assert_eq!(boundary.kind, "Area");
        assert!(boundary.members.is_empty());
    }

    #[test]
    fn test_builder_round_trip() {
        let boundary = Boundary::new()
            .with_id("b1")
            .with_value("number", "101")
            .with_curves(
                "outline",
                vec![CurveSegment::line(Point3::origin(), Point3::new(2.0, 0.0, 0.0))],
            );

        let text = serde_json::to_string(&boundary).unwrap();
        let back: Boundary = serde_json::from_str(&text).unwrap();
        assert_eq!(back, boundary);
    }
}
