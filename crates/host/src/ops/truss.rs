//! Planar truss layout.
//!
//! Divides an upper chord into bays, hangs a bottom chord `depth` below it
//! (along -Z), and adds web members according to the truss style.

use std::fmt;

use crate::document::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrussStyle {
    /// Verticals plus alternating diagonals.
    Pratt,
    /// Alternating diagonals, no verticals.
    Warren,
    /// Verticals plus diagonals mirrored from Pratt.
    Howe,
    /// Verticals only.
    Vierendeel,
    /// Verticals plus both diagonals in every bay.
    Brown,
    /// Diagonals in one direction only.
    Onedir,
}

impl TrussStyle {
    /// Parse a style name, ignoring case. Unknown names fall back to Pratt.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "warren" => Self::Warren,
            "howe" => Self::Howe,
            "vierendeel" => Self::Vierendeel,
            "brown" => Self::Brown,
            "onedir" => Self::Onedir,
            _ => Self::Pratt,
        }
    }

    fn has_verticals(self) -> bool {
        matches!(self, Self::Pratt | Self::Howe | Self::Vierendeel | Self::Brown)
    }
}

impl fmt::Display for TrussStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pratt => "Pratt",
            Self::Warren => "Warren",
            Self::Howe => "Howe",
            Self::Vierendeel => "Vierendeel",
            Self::Brown => "Brown",
            Self::Onedir => "Onedir",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    TopChord,
    BottomChord,
    Vertical,
    Diagonal,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopChord => "top_chord",
            Self::BottomChord => "bottom_chord",
            Self::Vertical => "vertical",
            Self::Diagonal => "diagonal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member {
    pub kind: MemberKind,
    pub start: Point3,
    pub end: Point3,
}

/// Lay out every member of a truss. `divisions` must be at least 1.
pub fn layout(
    start: Point3,
    end: Point3,
    depth: f64,
    divisions: u32,
    style: TrussStyle,
) -> Vec<Member> {
    let n = divisions as usize;
    let top: Vec<Point3> = (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            [
                start[0] + t * (end[0] - start[0]),
                start[1] + t * (end[1] - start[1]),
                start[2] + t * (end[2] - start[2]),
            ]
        })
        .collect();
    let bottom: Vec<Point3> = top.iter().map(|p| [p[0], p[1], p[2] - depth]).collect();

    let member = |kind, start, end| Member { kind, start, end };
    let mut members = Vec::new();

    for i in 0..n {
        members.push(member(MemberKind::TopChord, top[i], top[i + 1]));
    }
    for i in 0..n {
        members.push(member(MemberKind::BottomChord, bottom[i], bottom[i + 1]));
    }
    if style.has_verticals() {
        for i in 0..=n {
            members.push(member(MemberKind::Vertical, top[i], bottom[i]));
        }
    }

    // Rising diagonal: bottom[i] -> top[i+1]. Falling: top[i] -> bottom[i+1].
    let rising = |i: usize| member(MemberKind::Diagonal, bottom[i], top[i + 1]);
    let falling = |i: usize| member(MemberKind::Diagonal, top[i], bottom[i + 1]);
    for i in 0..n {
        match style {
            TrussStyle::Vierendeel => {}
            TrussStyle::Pratt | TrussStyle::Warren => {
                members.push(if i % 2 == 0 { rising(i) } else { falling(i) });
            }
            TrussStyle::Howe => {
                members.push(if i % 2 == 0 { falling(i) } else { rising(i) });
            }
            TrussStyle::Brown => {
                members.push(rising(i));
                members.push(falling(i));
            }
            TrussStyle::Onedir => members.push(rising(i)),
        }
    }

    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(members: &[Member], kind: MemberKind) -> usize {
        members.iter().filter(|m| m.kind == kind).count()
    }

    #[test]
    fn pratt_member_counts() {
        let members = layout([0.0; 3], [10.0, 0.0, 0.0], 2.0, 4, TrussStyle::Pratt);
        assert_eq!(count(&members, MemberKind::TopChord), 4);
        assert_eq!(count(&members, MemberKind::BottomChord), 4);
        assert_eq!(count(&members, MemberKind::Vertical), 5);
        assert_eq!(count(&members, MemberKind::Diagonal), 4);
    }

    #[test]
    fn style_specific_webs() {
        let run = |style| layout([0.0; 3], [12.0, 0.0, 0.0], 3.0, 6, style);
        assert_eq!(count(&run(TrussStyle::Warren), MemberKind::Vertical), 0);
        assert_eq!(count(&run(TrussStyle::Vierendeel), MemberKind::Diagonal), 0);
        assert_eq!(count(&run(TrussStyle::Brown), MemberKind::Diagonal), 12);
        assert_eq!(count(&run(TrussStyle::Onedir), MemberKind::Diagonal), 6);
    }

    #[test]
    fn bottom_chord_hangs_below() {
        let members = layout([0.0, 0.0, 5.0], [10.0, 0.0, 5.0], 2.0, 2, TrussStyle::Howe);
        let bottom = members.iter().find(|m| m.kind == MemberKind::BottomChord).unwrap();
        assert_eq!(bottom.start, [0.0, 0.0, 3.0]);
        assert_eq!(bottom.end, [5.0, 0.0, 3.0]);
    }

    #[test]
    fn unknown_style_is_pratt() {
        assert_eq!(TrussStyle::parse("WARREN"), TrussStyle::Warren);
        assert_eq!(TrussStyle::parse("k-truss"), TrussStyle::Pratt);
    }
}
