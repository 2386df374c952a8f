//! Channel positions, layouts and layout constraints.

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Position of a single channel in a multichannel stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelPosition {
    /// No defined position (unpositioned audio).
    None,
    /// Mono channel.
    FrontMono,
    /// Front left.
    FrontLeft,
    /// Front right.
    FrontRight,
    /// Rear center.
    RearCenter,
    /// Rear left.
    RearLeft,
    /// Rear right.
    RearRight,
    /// Low frequency effects.
    Lfe,
    /// Front center.
    FrontCenter,
    /// Front left of center.
    FrontLeftOfCenter,
    /// Front right of center.
    FrontRightOfCenter,
    /// Side left.
    SideLeft,
    /// Side right.
    SideRight,
}

impl ChannelPosition {
    /// Short name used in caps strings.
    pub const fn nick(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FrontMono => "front-mono",
            Self::FrontLeft => "front-left",
            Self::FrontRight => "front-right",
            Self::RearCenter => "rear-center",
            Self::RearLeft => "rear-left",
            Self::RearRight => "rear-right",
            Self::Lfe => "lfe",
            Self::FrontCenter => "front-center",
            Self::FrontLeftOfCenter => "front-left-of-center",
            Self::FrontRightOfCenter => "front-right-of-center",
            Self::SideLeft => "side-left",
            Self::SideRight => "side-right",
        }
    }

    const ALL: [Self; 13] = [
        Self::None,
        Self::FrontMono,
        Self::FrontLeft,
        Self::FrontRight,
        Self::RearCenter,
        Self::RearLeft,
        Self::RearRight,
        Self::Lfe,
        Self::FrontCenter,
        Self::FrontLeftOfCenter,
        Self::FrontRightOfCenter,
        Self::SideLeft,
        Self::SideRight,
    ];
}

impl fmt::Display for ChannelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

impl FromStr for ChannelPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.nick() == s)
            .ok_or_else(|| format!("unknown channel position '{s}'"))
    }
}

use ChannelPosition::{
    FrontCenter, FrontLeft, FrontMono, FrontRight, Lfe, RearCenter, RearLeft, RearRight, SideLeft,
    SideRight,
};

/// Default layouts indexed by `channels - 1`.
///
/// Used when a peer gives no usable layout for 1 to 8 channels.
static DEFAULT_LAYOUTS: [&[ChannelPosition]; 8] = [
    &[FrontMono],
    &[FrontLeft, FrontRight],
    &[FrontLeft, FrontRight, Lfe],
    &[FrontLeft, FrontRight, RearLeft, RearRight],
    &[FrontLeft, FrontRight, RearLeft, RearRight, FrontCenter],
    &[FrontLeft, FrontRight, RearLeft, RearRight, FrontCenter, Lfe],
    &[
        FrontLeft,
        FrontRight,
        RearLeft,
        RearRight,
        FrontCenter,
        Lfe,
        RearCenter,
    ],
    &[
        FrontLeft,
        FrontRight,
        RearLeft,
        RearRight,
        FrontCenter,
        Lfe,
        SideLeft,
        SideRight,
    ],
];

/// Highest channel count with a default layout.
pub const MAX_DEFAULT_LAYOUT_CHANNELS: i32 = DEFAULT_LAYOUTS.len() as i32;

/// Ordered channel positions, one per channel.
///
/// A layout whose first position is [`ChannelPosition::None`] is
/// *unpositioned*: valid for any channel count but not mixable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelLayout(SmallVec<[ChannelPosition; 8]>);

impl ChannelLayout {
    /// Create a layout from positions.
    pub fn new(positions: impl IntoIterator<Item = ChannelPosition>) -> Self {
        Self(positions.into_iter().collect())
    }

    /// An unpositioned layout for `channels` channels.
    pub fn unpositioned(channels: usize) -> Self {
        Self(SmallVec::from_elem(ChannelPosition::None, channels))
    }

    /// The built-in layout for 1 to 8 channels.
    pub fn default_for(channels: i32) -> Option<Self> {
        if channels < 1 || channels > MAX_DEFAULT_LAYOUT_CHANNELS {
            return None;
        }
        Some(Self::new(
            DEFAULT_LAYOUTS[(channels - 1) as usize].iter().copied(),
        ))
    }

    /// Number of channels in this layout.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the layout has no channels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Channel positions in order.
    #[inline]
    pub fn positions(&self) -> &[ChannelPosition] {
        &self.0
    }

    /// Whether the layout carries no per-channel semantics.
    pub fn is_unpositioned(&self) -> bool {
        self.0.first() == Some(&ChannelPosition::None)
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("< ")?;
        for (i, pos) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{pos}")?;
        }
        f.write_str(" >")
    }
}

/// Constraint on the `channel-positions` field.
///
/// Either one concrete layout or an ordered choice between constraints,
/// which may nest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutConstraint {
    /// Exactly this layout.
    Concrete(ChannelLayout),
    /// Any of these (ordered by preference).
    OneOf(Vec<LayoutConstraint>),
}

impl LayoutConstraint {
    /// Whether this is a single concrete layout.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Concrete(_))
    }

    /// The concrete layout, if fixed.
    pub fn as_concrete(&self) -> Option<&ChannelLayout> {
        match self {
            Self::Concrete(layout) => Some(layout),
            Self::OneOf(_) => None,
        }
    }

    /// Depth-first search for the first concrete layout with `channels` entries.
    pub fn find_suitable(&self, channels: usize) -> Option<&ChannelLayout> {
        match self {
            Self::Concrete(layout) if layout.len() == channels => Some(layout),
            Self::Concrete(_) => None,
            Self::OneOf(choices) => choices.iter().find_map(|c| c.find_suitable(channels)),
        }
    }

    /// Whether `layout` is one of the layouts this constraint allows.
    pub fn contains(&self, layout: &ChannelLayout) -> bool {
        match self {
            Self::Concrete(l) => l == layout,
            Self::OneOf(choices) => choices.iter().any(|c| c.contains(layout)),
        }
    }

    /// All concrete layouts, depth first.
    pub fn layouts(&self) -> Vec<&ChannelLayout> {
        let mut out = Vec::new();
        self.collect_layouts(&mut out);
        out
    }

    fn collect_layouts<'a>(&'a self, out: &mut Vec<&'a ChannelLayout>) {
        match self {
            Self::Concrete(l) => out.push(l),
            Self::OneOf(choices) => {
                for c in choices {
                    c.collect_layouts(out);
                }
            }
        }
    }

    /// Layouts allowed by both constraints, in `self`'s order.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let mut common: Vec<ChannelLayout> = Vec::new();
        for layout in self.layouts() {
            if other.contains(layout) && !common.contains(layout) {
                common.push(layout.clone());
            }
        }
        match common.len() {
            0 => None,
            1 => common.pop().map(Self::Concrete),
            _ => Some(Self::OneOf(common.into_iter().map(Self::Concrete).collect())),
        }
    }

    /// Whether every layout of `self` is allowed by `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.layouts().into_iter().all(|l| other.contains(l))
    }
}

impl From<ChannelLayout> for LayoutConstraint {
    fn from(layout: ChannelLayout) -> Self {
        Self::Concrete(layout)
    }
}

impl fmt::Display for LayoutConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(layout) => write!(f, "{layout}"),
            Self::OneOf(choices) => {
                f.write_str("{ ")?;
                for (i, c) in choices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo() -> ChannelLayout {
        ChannelLayout::new([FrontLeft, FrontRight])
    }

    #[test]
    fn test_default_layouts() {
        assert_eq!(
            ChannelLayout::default_for(1).unwrap().positions(),
            &[FrontMono]
        );
        assert_eq!(
            ChannelLayout::default_for(6).unwrap().positions(),
            &[FrontLeft, FrontRight, RearLeft, RearRight, FrontCenter, Lfe]
        );
        assert_eq!(ChannelLayout::default_for(8).unwrap().len(), 8);
        assert!(ChannelLayout::default_for(0).is_none());
        assert!(ChannelLayout::default_for(9).is_none());
    }

    #[test]
    fn test_default_layouts_match_their_index() {
        for channels in 1..=MAX_DEFAULT_LAYOUT_CHANNELS {
            let layout = ChannelLayout::default_for(channels).unwrap();
            assert_eq!(layout.len(), channels as usize);
            assert!(!layout.is_unpositioned());
        }
    }

    #[test]
    fn test_unpositioned() {
        let layout = ChannelLayout::unpositioned(5);
        assert_eq!(layout.len(), 5);
        assert!(layout.is_unpositioned());
        assert!(!stereo().is_unpositioned());
    }

    #[test]
    fn test_find_suitable_recurses() {
        let quad = ChannelLayout::default_for(4).unwrap();
        let constraint = LayoutConstraint::OneOf(vec![
            LayoutConstraint::Concrete(stereo()),
            LayoutConstraint::OneOf(vec![
                LayoutConstraint::Concrete(ChannelLayout::new([FrontMono])),
                LayoutConstraint::Concrete(quad.clone()),
            ]),
        ]);
        assert_eq!(constraint.find_suitable(4), Some(&quad));
        assert_eq!(constraint.find_suitable(2), Some(&stereo()));
        assert_eq!(constraint.find_suitable(3), None);
    }

    #[test]
    fn test_contains_and_intersect() {
        let alt = ChannelLayout::new([FrontRight, FrontLeft]);
        let a = LayoutConstraint::OneOf(vec![
            LayoutConstraint::Concrete(alt.clone()),
            LayoutConstraint::Concrete(stereo()),
        ]);
        let b = LayoutConstraint::Concrete(stereo());
        assert!(a.contains(&stereo()));
        assert_eq!(a.intersect(&b), Some(b.clone()));
        assert!(b.is_subset_of(&a));
        assert!(!a.is_subset_of(&b));
        assert_eq!(
            LayoutConstraint::Concrete(alt).intersect(&b),
            None
        );
    }

    #[test]
    fn test_position_nicks_roundtrip() {
        for pos in ChannelPosition::ALL {
            assert_eq!(pos.nick().parse::<ChannelPosition>(), Ok(pos));
        }
        assert!("center-of-the-universe".parse::<ChannelPosition>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(stereo().to_string(), "< front-left, front-right >");
    }
}
