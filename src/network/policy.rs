//! Which segment to try next.

use crate::random::RandomSource;
use crate::scene::template::{SegmentTemplate, TemplateSet};
use rand::seq::SliceRandom;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub template: Arc<SegmentTemplate>,
    pub mirror: bool,
}

impl Candidate {
    pub fn new(template: Arc<SegmentTemplate>, mirror: bool) -> Self {
        Self { template, mirror }
    }

    #[inline]
    pub fn direction(&self) -> i8 {
        self.template.direction(self.mirror)
    }
}

/// Candidates in the order they should be tried.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    /// Whether this covers every variant the policy currently deems eligible. If all of them fail,
    /// trying again won't help.
    pub exhaustive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicyKind {
    /// A single template per step, drawn proportional to its weight.
    Weighted,
    /// Every eligible variant per step, in random order.
    DirectionConstrained {
        min_straights_between_curves: u32,
        max_same_direction_run: u32,
    },
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::DirectionConstrained {
            min_straights_between_curves: 1,
            max_same_direction_run: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathGenerationPolicy {
    kind: PolicyKind,
    last_curve_direction: i8,
    same_direction_run: u32,
    straights_since_last_curve: u32,
}

impl PathGenerationPolicy {
    pub fn new(kind: PolicyKind) -> Self {
        Self {
            kind,
            last_curve_direction: 0,
            same_direction_run: 0,
            straights_since_last_curve: 0,
        }
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn last_curve_direction(&self) -> i8 {
        self.last_curve_direction
    }

    pub fn same_direction_run(&self) -> u32 {
        self.same_direction_run
    }

    pub fn straights_since_last_curve(&self) -> u32 {
        self.straights_since_last_curve
    }

    pub fn select_candidates(&self, templates: &TemplateSet, rng: &mut dyn RandomSource) -> CandidateSet {
        match self.kind {
            PolicyKind::Weighted => {
                let pool = templates.chain_segments().cloned().collect::<Vec<_>>();
                let candidates = weighted_pick(&pool, |template| template.weight, rng)
                    .map(|template| {
                        let mirror = template.mirrorable && !template.is_straight() && rng.next_bool();
                        Candidate::new(template.clone(), mirror)
                    })
                    .into_iter()
                    .collect();

                CandidateSet {
                    candidates,
                    exhaustive: false,
                }
            }
            PolicyKind::DirectionConstrained { .. } => {
                let mut candidates = templates
                    .chain_segments()
                    .flat_map(|template| {
                        let mirrored = (template.mirrorable && !template.is_straight())
                            .then(|| Candidate::new(template.clone(), true));
                        std::iter::once(Candidate::new(template.clone(), false)).chain(mirrored)
                    })
                    .filter(|candidate| self.is_eligible(candidate))
                    .collect::<Vec<_>>();
                candidates.shuffle(rng);

                CandidateSet {
                    candidates,
                    exhaustive: true,
                }
            }
        }
    }

    /// Every straight, shuffled. Used to get a stuck chain moving again.
    pub fn straights_only(&self, templates: &TemplateSet, rng: &mut dyn RandomSource) -> CandidateSet {
        let mut candidates = templates
            .straights()
            .map(|template| Candidate::new(template.clone(), false))
            .collect::<Vec<_>>();
        candidates.shuffle(rng);

        CandidateSet {
            candidates,
            exhaustive: false,
        }
    }

    pub fn is_eligible(&self, candidate: &Candidate) -> bool {
        let direction = candidate.direction();
        if direction == 0 {
            return true;
        }

        match self.kind {
            PolicyKind::Weighted => true,
            PolicyKind::DirectionConstrained {
                min_straights_between_curves,
                max_same_direction_run,
            } => {
                self.straights_since_last_curve >= min_straights_between_curves
                    && (direction != self.last_curve_direction || self.same_direction_run < max_same_direction_run)
            }
        }
    }

    /// Only committed candidates count, rejected attempts leave the state alone.
    pub fn commit(&mut self, candidate: &Candidate) {
        let direction = candidate.direction();
        if direction == 0 {
            self.straights_since_last_curve += 1;
            return;
        }

        if direction == self.last_curve_direction {
            self.same_direction_run += 1;
        } else {
            self.last_curve_direction = direction;
            self.same_direction_run = 1;
        }
        self.straights_since_last_curve = 0;
    }

    pub fn reset(&mut self) {
        self.last_curve_direction = 0;
        self.same_direction_run = 0;
        self.straights_since_last_curve = 0;
    }
}

/// Cumulative weight roulette. Negative weights count as zero, `None` if nothing has any weight.
pub fn weighted_pick<'a, T>(items: &'a [T], weight: impl Fn(&T) -> f32, rng: &mut dyn RandomSource) -> Option<&'a T> {
    let total = items.iter().map(|item| weight(item).max(0.0) as f64).sum::<f64>();
    if total <= 0.0 {
        return None;
    }

    let roll = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for item in items {
        cumulative += weight(item).max(0.0) as f64;
        if roll < cumulative {
            return Some(item);
        }
    }

    // rounding, the roll was within the last non-zero weight
    items.iter().rev().find(|item| weight(item) > 0.0)
}
