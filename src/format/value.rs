//! Constraint values for a single caps field.

use std::fmt;

/// A scalar type that can appear in a caps field.
///
/// Every scalar maps onto the integer line so that ranges can be enumerated
/// and "nearest value" fixation has a distance to work with.
pub trait CapsScalar: Copy + Ord + fmt::Debug + fmt::Display {
    /// Type annotation used when serializing (`(int)`, `(boolean)`).
    const TYPE_NAME: &'static str;

    /// Position of this value on the integer line.
    fn to_i64(self) -> i64;
}

impl CapsScalar for i32 {
    const TYPE_NAME: &'static str = "int";

    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
}

impl CapsScalar for bool {
    const TYPE_NAME: &'static str = "boolean";

    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
}

/// A value that can be fixed, a range, a list, or absent.
///
/// `Absent` means the field is not constrained (or does not apply to the
/// format kind, like `depth` on float audio). It intersects with anything.
///
/// # Examples
///
/// ```rust
/// use parallax_audioconvert::format::CapsValue;
///
/// let range: CapsValue<i32> = CapsValue::range(16, 32);
/// let list: CapsValue<i32> = CapsValue::from_values([8, 16, 24]);
///
/// assert_eq!(range.intersect(&list), Some(CapsValue::from_values([16, 24])));
/// assert_eq!(range.fixate_nearest(8), Some(16));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum CapsValue<T> {
    /// Exact value (fully constrained).
    Fixed(T),
    /// Range of acceptable values (inclusive).
    Range {
        /// Minimum acceptable value.
        min: T,
        /// Maximum acceptable value.
        max: T,
    },
    /// List of acceptable values (ordered by preference, first is best).
    List(Vec<T>),
    /// Field not present.
    #[default]
    Absent,
}

impl<T: CapsScalar> CapsValue<T> {
    /// Build a value from a list of allowed values.
    ///
    /// Duplicates are dropped (first occurrence wins). One value gives
    /// `Fixed`, none gives `Absent`.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        let mut unique: Vec<T> = Vec::new();
        for v in values {
            if !unique.contains(&v) {
                unique.push(v);
            }
        }
        match unique.len() {
            0 => Self::Absent,
            1 => Self::Fixed(unique[0]),
            _ => Self::List(unique),
        }
    }

    /// Build an inclusive range. A degenerate range collapses to `Fixed`.
    ///
    /// Bounds given in reverse order are swapped, so this never builds a
    /// range with `min > max`.
    pub fn range(a: T, b: T) -> Self {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        if min == max {
            Self::Fixed(min)
        } else {
            Self::Range { min, max }
        }
    }

    /// Check whether no value is accepted (an inverted range or empty list).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Range { min, max } => min > max,
            Self::List(values) => values.is_empty(),
            Self::Fixed(_) | Self::Absent => false,
        }
    }

    /// Check if a value is accepted by this constraint.
    pub fn accepts(&self, value: T) -> bool {
        match self {
            Self::Fixed(v) => *v == value,
            Self::Range { min, max } => value >= *min && value <= *max,
            Self::List(values) => values.contains(&value),
            Self::Absent => true,
        }
    }

    /// Check if this is a fixed value.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Check if the field is present at all.
    #[inline]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Get the fixed value if this is fixed.
    #[inline]
    pub fn as_fixed(&self) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(*v),
            _ => None,
        }
    }

    /// Intersect two constraints, finding common values.
    ///
    /// Returns `None` if there's no overlap. List order follows `self`.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Absent, other) => Some(other.clone()),
            (self_, Self::Absent) => Some(self_.clone()),

            (Self::Fixed(v), other) | (other, Self::Fixed(v)) => {
                other.accepts(*v).then_some(Self::Fixed(*v))
            }

            (
                Self::Range {
                    min: min1,
                    max: max1,
                },
                Self::Range {
                    min: min2,
                    max: max2,
                },
            ) => {
                let new_min = *min1.max(min2);
                let new_max = *max1.min(max2);
                (new_min <= new_max).then(|| Self::range(new_min, new_max))
            }

            (Self::List(list), other @ Self::Range { .. }) => {
                Self::filtered(list.iter().copied().filter(|v| other.accepts(*v)))
            }
            (range @ Self::Range { .. }, Self::List(list)) => {
                Self::filtered(list.iter().copied().filter(|v| range.accepts(*v)))
            }

            (Self::List(list1), Self::List(list2)) => {
                Self::filtered(list1.iter().copied().filter(|v| list2.contains(v)))
            }
        }
    }

    fn filtered(values: impl Iterator<Item = T>) -> Option<Self> {
        match Self::from_values(values) {
            Self::Absent => None,
            v => Some(v),
        }
    }

    /// Check whether every value accepted by `self` is accepted by `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        match (self, other) {
            (_, Self::Absent) => true,
            (Self::Absent, _) => false,
            (Self::Fixed(v), other) => other.accepts(*v),
            (Self::List(values), other) => values.iter().all(|v| other.accepts(*v)),
            (Self::Range { .. }, Self::Fixed(_)) => false,
            (Self::Range { min, max }, Self::Range { min: lo, max: hi }) => {
                min >= lo && max <= hi
            }
            (Self::Range { min, max }, Self::List(list)) => {
                let (lo, hi) = (min.to_i64(), max.to_i64());
                // a list can only cover a range as wide as itself
                if (hi - lo + 1) as usize > list.len() {
                    return false;
                }
                (lo..=hi).all(|i| list.iter().any(|v| v.to_i64() == i))
            }
        }
    }

    /// Fixate to the allowed value nearest to `target`.
    ///
    /// Ties are broken toward the lower value. Returns `None` for `Absent`
    /// and for a constraint that accepts nothing.
    pub fn fixate_nearest(&self, target: T) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(*v),
            Self::Range { min, max } if min > max => None,
            Self::Range { min, max } => Some(target.clamp(*min, *max)),
            Self::List(values) => values.iter().copied().min_by_key(|v| {
                let distance = (v.to_i64() - target.to_i64()).unsigned_abs();
                (distance, *v)
            }),
            Self::Absent => None,
        }
    }

    /// Fixate to the preferred value (first in list, min in range).
    pub fn fixate_first(&self) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(*v),
            Self::Range { min, max } if min > max => None,
            Self::Range { min, .. } => Some(*min),
            Self::List(values) => values.first().copied(),
            Self::Absent => None,
        }
    }
}

impl<T: CapsScalar> From<T> for CapsValue<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T: CapsScalar> From<std::ops::RangeInclusive<T>> for CapsValue<T> {
    fn from(range: std::ops::RangeInclusive<T>) -> Self {
        let (min, max) = range.into_inner();
        Self::range(min, max)
    }
}

impl<T: CapsScalar> From<Vec<T>> for CapsValue<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_values(values)
    }
}

/// Serializes as `(type)value`, `(type)[ min, max ]` or `(type){ a, b }`.
///
/// `Absent` writes nothing; callers skip absent fields.
impl<T: CapsScalar> fmt::Display for CapsValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "({}){}", T::TYPE_NAME, v),
            Self::Range { min, max } => write!(f, "({})[ {}, {} ]", T::TYPE_NAME, min, max),
            Self::List(values) => {
                write!(f, "({}){{ ", T::TYPE_NAME)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(" }")
            }
            Self::Absent => Ok(()),
        }
    }
}
