//! Channel mixing by position.
//!
//! Each output channel is a weighted sum of input channels. Channels with
//! the same position map straight through. An input channel with no match
//! in the output folds onto output channels on the same side of the room;
//! a centered one spreads to both sides. LFE is dropped when the output has
//! none. Rows whose gains add up to more than 1 are scaled down so mixing
//! never clips on its own.

use crate::format::{ChannelLayout, ChannelPosition};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Center,
    Lfe,
}

fn side(position: ChannelPosition) -> Side {
    use ChannelPosition as P;
    match position {
        P::FrontLeft | P::RearLeft | P::FrontLeftOfCenter | P::SideLeft => Side::Left,
        P::FrontRight | P::RearRight | P::FrontRightOfCenter | P::SideRight => Side::Right,
        P::Lfe => Side::Lfe,
        P::None | P::FrontMono | P::FrontCenter | P::RearCenter => Side::Center,
    }
}

/// Indices of the output channels whose side satisfies `pred`.
fn outputs_on(outs: &[ChannelPosition], pred: impl Fn(Side) -> bool) -> Vec<usize> {
    outs.iter()
        .enumerate()
        .filter(|(_, p)| pred(side(**p)))
        .map(|(o, _)| o)
        .collect()
}

/// Gain matrix from input channels to output channels.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ChannelMix {
    in_channels: usize,
    out_channels: usize,
    /// Row-major, one row of `in_channels` gains per output channel.
    gains: Vec<f64>,
}

impl ChannelMix {
    /// Build the matrix between two layouts.
    ///
    /// Returns `None` when the counts differ and either side is
    /// unpositioned, since there is nothing to route by.
    pub(crate) fn new(input: &ChannelLayout, output: &ChannelLayout) -> Option<Self> {
        let (in_channels, out_channels) = (input.len(), output.len());
        let mut mix = Self {
            in_channels,
            out_channels,
            gains: vec![0.0; in_channels * out_channels],
        };

        if input.is_unpositioned() || output.is_unpositioned() {
            if in_channels != out_channels {
                return None;
            }
            for c in 0..in_channels {
                mix.set(c, c, 1.0);
            }
            return Some(mix);
        }

        let ins = input.positions();
        let outs = output.positions();

        let mut routed = vec![false; in_channels];
        for (o, out_pos) in outs.iter().enumerate() {
            for (i, in_pos) in ins.iter().enumerate() {
                if in_pos == out_pos {
                    mix.set(o, i, 1.0);
                    routed[i] = true;
                }
            }
        }

        for (i, in_pos) in ins.iter().enumerate() {
            if routed[i] {
                continue;
            }
            let targets = match side(*in_pos) {
                Side::Lfe => continue,
                Side::Center => {
                    let centers = outputs_on(outs, |s| s == Side::Center);
                    if centers.is_empty() {
                        outputs_on(outs, |s| matches!(s, Side::Left | Side::Right))
                    } else {
                        centers
                    }
                }
                s => {
                    let same = outputs_on(outs, |o| o == s);
                    if same.is_empty() {
                        outputs_on(outs, |o| o == Side::Center)
                    } else {
                        same
                    }
                }
            };
            for o in targets {
                mix.set(o, i, 1.0);
            }
        }

        mix.normalize();
        tracing::trace!(input = %input, output = %output, "channel mix prepared");
        Some(mix)
    }

    fn set(&mut self, out: usize, input: usize, gain: f64) {
        self.gains[out * self.in_channels + input] = gain;
    }

    fn normalize(&mut self) {
        for row in self.gains.chunks_exact_mut(self.in_channels.max(1)) {
            let sum: f64 = row.iter().sum();
            if sum > 1.0 {
                row.iter_mut().for_each(|g| *g /= sum);
            }
        }
    }

    /// Whether every channel maps to itself.
    pub(crate) fn is_identity(&self) -> bool {
        if self.in_channels != self.out_channels {
            return false;
        }
        let rows = self.gains.chunks_exact(self.in_channels.max(1));
        rows.enumerate().all(|(o, row)| {
            let unit = |i: usize| if i == o { 1.0 } else { 0.0 };
            row.iter().enumerate().all(|(i, g)| *g == unit(i))
        })
    }

    /// Mix one frame of `in_channels` values into `out_channels` values.
    pub(crate) fn apply(&self, frame: &[f64], out: &mut [f64]) {
        for (o, row) in self.gains.chunks_exact(self.in_channels).enumerate() {
            out[o] = row.iter().zip(frame).map(|(g, v)| g * v).sum();
        }
    }
}
