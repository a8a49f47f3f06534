//! Event tags emitted by the reconciliation solver, plus the synthetic tags
//! the parser attaches to gene nodes.

use serde::Serialize;
use std::fmt;

/// Species id of the dead lineage in solver output.
pub const DEAD_ID: &str = "-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventTag {
    /// Speciation
    S,
    /// Speciation followed by loss in one child
    SL,
    /// Duplication
    D,
    /// Duplication inside the dead lineage
    DD,
    /// Transfer between living lineages
    T,
    /// Transfer followed by loss in the donor
    TL,
    /// Transfer into the dead lineage
    TTD,
    /// Transfer into the dead lineage followed by loss
    TLTD,
    /// Transfer out of the dead lineage
    TFD,
    /// Transfer out of the dead lineage followed by loss
    TLFD,
    /// Contemporary gene at a species leaf
    C,
    /// Received transfer
    T0,
    /// Loss placeholder
    #[serde(rename = "LOSS")]
    Loss,
    /// Entry into the dead lineage
    #[serde(rename = "DEAD0")]
    Dead0,
}

/// Number of gene children an event creates on its own line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Binary,
    Unary,
    Synthetic,
}

impl EventTag {
    pub const SOLVER_TAGS: [EventTag; 10] = [
        EventTag::S,
        EventTag::SL,
        EventTag::D,
        EventTag::DD,
        EventTag::T,
        EventTag::TL,
        EventTag::TTD,
        EventTag::TLTD,
        EventTag::TFD,
        EventTag::TLFD,
    ];

    /// Parses one of the ten solver tags. Synthetic tags are never accepted from text.
    pub fn from_solver(tag: &str) -> Option<Self> {
        Self::SOLVER_TAGS.into_iter().find(|t| t.as_str() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::S => "S",
            EventTag::SL => "SL",
            EventTag::D => "D",
            EventTag::DD => "DD",
            EventTag::T => "T",
            EventTag::TL => "TL",
            EventTag::TTD => "TTD",
            EventTag::TLTD => "TLTD",
            EventTag::TFD => "TFD",
            EventTag::TLFD => "TLFD",
            EventTag::C => "C",
            EventTag::T0 => "T0",
            EventTag::Loss => "LOSS",
            EventTag::Dead0 => "DEAD0",
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            EventTag::S
            | EventTag::D
            | EventTag::DD
            | EventTag::T
            | EventTag::TTD
            | EventTag::TFD => Shape::Binary,
            EventTag::SL | EventTag::TL | EventTag::TLTD | EventTag::TLFD => Shape::Unary,
            EventTag::C | EventTag::T0 | EventTag::Loss | EventTag::Dead0 => Shape::Synthetic,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.shape() == Shape::Binary
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `species,tag,aux,aux[@support]` record, ids still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub species: String,
    pub tag: EventTag,
    pub aux_left: String,
    pub aux_right: String,
    pub support: f64,
}

impl Event {
    /// Checks that the auxiliary ids agree with the tag.
    pub fn validate(&self) -> Result<(), String> {
        let s = self.species.as_str();
        let l = self.aux_left.as_str();
        let r = self.aux_right.as_str();
        let dead = |id: &str| id == DEAD_ID;

        let ok = match self.tag {
            EventTag::S => !dead(s) && !dead(l) && !dead(r),
            EventTag::T => !dead(s) && !dead(l) && !dead(r) && ((l == s) != (r == s)),
            EventTag::D => !dead(s) && l == s && r == s,
            EventTag::DD => dead(s) && dead(l) && dead(r),
            EventTag::TTD => !dead(s) && ((dead(l) && r == s) || (l == s && dead(r))),
            EventTag::TFD => dead(s) && (dead(l) != dead(r)),
            EventTag::SL => !dead(s) && !dead(l) && !dead(r) && s != l && s != r,
            EventTag::TL => !dead(s) && l == s && r != s && !dead(r),
            EventTag::TLTD => !dead(s) && l == s && dead(r),
            EventTag::TLFD => dead(s) && dead(l) && !dead(r),
            EventTag::C | EventTag::T0 | EventTag::Loss | EventTag::Dead0 => false,
        };

        if ok {
            Ok(())
        } else {
            Err(format!(
                "species {} with auxiliary ids {} and {} do not fit the tag",
                s, l, r
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(s: &str, tag: EventTag, l: &str, r: &str) -> Event {
        Event {
            species: s.to_string(),
            tag,
            aux_left: l.to_string(),
            aux_right: r.to_string(),
            support: 1.0,
        }
    }

    #[test]
    fn test_solver_tags() {
        assert_eq!(EventTag::from_solver("TLTD"), Some(EventTag::TLTD));
        assert_eq!(EventTag::from_solver("S"), Some(EventTag::S));
        // synthetic tags never come from text
        assert_eq!(EventTag::from_solver("C"), None);
        assert_eq!(EventTag::from_solver("T0"), None);
        assert_eq!(EventTag::from_solver("LOSS"), None);
        assert_eq!(EventTag::from_solver("s"), None);

        assert_eq!(EventTag::Dead0.to_string(), "DEAD0");
        assert_eq!(
            serde_json::to_string(&EventTag::Loss).unwrap(),
            "\"LOSS\""
        );
    }

    #[test]
    fn test_shapes() {
        let binary: Vec<_> = EventTag::SOLVER_TAGS
            .into_iter()
            .filter(|t| t.is_binary())
            .collect();
        assert_eq!(
            binary,
            vec![
                EventTag::S,
                EventTag::D,
                EventTag::DD,
                EventTag::T,
                EventTag::TTD,
                EventTag::TFD
            ]
        );
        assert_eq!(EventTag::T0.shape(), Shape::Synthetic);
    }

    #[test]
    fn test_validate_binary() {
        assert!(ev("4", EventTag::S, "1", "2").validate().is_ok());
        assert!(ev("4", EventTag::S, "1", "-1").validate().is_err());

        assert!(ev("4", EventTag::T, "4", "3").validate().is_ok());
        assert!(ev("4", EventTag::T, "3", "4").validate().is_ok());
        assert!(ev("4", EventTag::T, "4", "4").validate().is_err());
        assert!(ev("4", EventTag::T, "1", "3").validate().is_err());
        // the dead lineage is only reached through TTD and TFD
        assert!(ev("4", EventTag::T, "4", "-1").validate().is_err());
        assert!(ev("-1", EventTag::T, "-1", "3").validate().is_err());

        assert!(ev("4", EventTag::D, "4", "4").validate().is_ok());
        assert!(ev("4", EventTag::D, "4", "3").validate().is_err());
        assert!(ev("-1", EventTag::D, "-1", "-1").validate().is_err());

        assert!(ev("-1", EventTag::DD, "-1", "-1").validate().is_ok());
        assert!(ev("4", EventTag::DD, "4", "4").validate().is_err());

        assert!(ev("4", EventTag::TTD, "-1", "4").validate().is_ok());
        assert!(ev("4", EventTag::TTD, "4", "-1").validate().is_ok());
        assert!(ev("-1", EventTag::TTD, "-1", "-1").validate().is_err());
        assert!(ev("4", EventTag::TTD, "3", "-1").validate().is_err());

        assert!(ev("-1", EventTag::TFD, "-1", "3").validate().is_ok());
        assert!(ev("-1", EventTag::TFD, "3", "-1").validate().is_ok());
        assert!(ev("-1", EventTag::TFD, "-1", "-1").validate().is_err());
        assert!(ev("4", EventTag::TFD, "-1", "3").validate().is_err());
    }

    #[test]
    fn test_validate_unary() {
        assert!(ev("4", EventTag::SL, "1", "2").validate().is_ok());
        assert!(ev("4", EventTag::SL, "4", "2").validate().is_err());
        assert!(ev("4", EventTag::SL, "-1", "2").validate().is_err());
        assert!(ev("-1", EventTag::SL, "1", "2").validate().is_err());

        assert!(ev("4", EventTag::TL, "4", "3").validate().is_ok());
        assert!(ev("4", EventTag::TL, "4", "4").validate().is_err());
        assert!(ev("4", EventTag::TL, "3", "4").validate().is_err());
        assert!(ev("4", EventTag::TL, "4", "-1").validate().is_err());

        assert!(ev("4", EventTag::TLTD, "4", "-1").validate().is_ok());
        assert!(ev("4", EventTag::TLTD, "-1", "4").validate().is_err());

        assert!(ev("-1", EventTag::TLFD, "-1", "3").validate().is_ok());
        assert!(ev("-1", EventTag::TLFD, "-1", "-1").validate().is_err());
    }
}
