//! Grows the road network out of segment templates.

use crate::network::collision::{CollisionAdjudicator, Verdict};
use crate::network::grid::GridConfig;
use crate::network::placer::place;
use crate::network::policy::{Candidate, PathGenerationPolicy, PolicyKind};
use crate::network::state::{BranchRequest, BranchSide, NetworkState, PlacedSegment, SegmentId};
use crate::pool::instances::InstancePools;
use crate::random::{Mulberry32, RandomSource};
use crate::scene::node::Pose;
use crate::scene::template::{SegmentTemplate, TemplateSet};
use log::{debug, info, trace, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConfig {
    pub policy: PolicyKind,
    /// Upper bound of placement attempts within one run.
    pub max_attempts: usize,
    /// After this many failed steps in a row, only straights are tried.
    pub straight_fallback_after: usize,
    /// More failed steps in a row than this end the run.
    pub max_consecutive_failures: usize,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            max_attempts: 500,
            straight_fallback_after: 2,
            max_consecutive_failures: 6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub committed: usize,
    pub rejected: usize,
    /// The run ended before reaching its target.
    pub aborted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpineConfig {
    pub seed: u32,
    pub length: usize,
    /// Chance of an interior spine position to become a junction.
    pub junction_probability: f64,
    pub branch_length: usize,
    /// Template ids to use instead of the first straight/junction of the set.
    pub straight: Option<String>,
    pub junction: Option<String>,
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            length: 20,
            junction_probability: 0.25,
            branch_length: 5,
            straight: None,
            junction: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpineReport {
    pub spine_segments: usize,
    pub junction_positions: Vec<usize>,
    pub branch_requests: Vec<BranchRequest>,
    /// Segments built per branch request, in request order.
    pub branch_lengths: Vec<usize>,
}

enum StepOutcome {
    Committed,
    Exhausted { exhaustive: bool },
    Halted,
}

enum Attempt {
    Committed(SegmentId),
    Rejected,
    Degenerate,
}

#[derive(Clone, Copy)]
enum Chain {
    Main,
    Branch(usize),
}

pub struct NetworkBuilder {
    config: LinearConfig,
    adjudicator: CollisionAdjudicator,
    policy: PathGenerationPolicy,
    rng: Box<dyn RandomSource>,
}

impl NetworkBuilder {
    pub fn new(grid: &GridConfig, config: LinearConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            adjudicator: CollisionAdjudicator::new(grid),
            policy: PathGenerationPolicy::new(config.policy),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &LinearConfig {
        &self.config
    }

    pub fn policy(&self) -> &PathGenerationPolicy {
        &self.policy
    }

    /// Forgets the curve history, for a network that starts over.
    pub fn reset(&mut self) {
        self.policy.reset();
    }

    /// Appends up to `target_count` segments to the main chain, retrying on collision.
    pub fn build_linear(
        &mut self,
        state: &mut NetworkState,
        pools: &mut InstancePools,
        templates: &TemplateSet,
        target_count: usize,
    ) -> GenerationReport {
        profiling::scope!("NetworkBuilder::build_linear");
        let mut report = GenerationReport::default();

        if templates.chain_segments().next().is_none() {
            warn!("The template set has no segments to build a chain from");
            report.aborted = target_count > 0;
            return report;
        }

        let mut attempts = 0;
        let mut consecutive_failures = 0;

        while report.committed < target_count {
            let narrowed = consecutive_failures >= self.config.straight_fallback_after;

            match self.step(state, pools, templates, narrowed, &mut attempts, &mut report) {
                StepOutcome::Committed => consecutive_failures = 0,
                StepOutcome::Exhausted { exhaustive } => {
                    consecutive_failures += 1;

                    if exhaustive {
                        warn!(
                            "Every candidate collides at segment {}, stopping after {} of {} segments",
                            state.len(),
                            report.committed,
                            target_count
                        );
                        report.aborted = true;
                        break;
                    }

                    if consecutive_failures > self.config.max_consecutive_failures {
                        warn!(
                            "Giving up after {} failed steps in a row, {} of {} segments placed",
                            consecutive_failures, report.committed, target_count
                        );
                        report.aborted = true;
                        break;
                    }

                    if consecutive_failures == self.config.straight_fallback_after {
                        debug!("{} failed steps in a row, only trying straights", consecutive_failures);
                    }
                }
                StepOutcome::Halted => {
                    report.aborted = true;
                    break;
                }
            }

            if attempts >= self.config.max_attempts && report.committed < target_count {
                warn!(
                    "Reached {} placement attempts, stopping after {} of {} segments",
                    attempts, report.committed, target_count
                );
                report.aborted = true;
                break;
            }
        }

        report
    }

    /// A single segment, as needed when streaming.
    pub fn extend_one(
        &mut self,
        state: &mut NetworkState,
        pools: &mut InstancePools,
        templates: &TemplateSet,
    ) -> GenerationReport {
        self.build_linear(state, pools, templates, 1)
    }

    fn step(
        &mut self,
        state: &mut NetworkState,
        pools: &mut InstancePools,
        templates: &TemplateSet,
        narrowed: bool,
        attempts: &mut usize,
        report: &mut GenerationReport,
    ) -> StepOutcome {
        let Some(target) = state.frontier() else {
            warn!("The newest segment has no exit, the chain can't be extended");
            return StepOutcome::Halted;
        };

        let set = if narrowed {
            self.policy.straights_only(templates, self.rng.as_mut())
        } else {
            self.policy.select_candidates(templates, self.rng.as_mut())
        };

        for candidate in &set.candidates {
            if *attempts >= self.config.max_attempts {
                return StepOutcome::Exhausted { exhaustive: false };
            }
            *attempts += 1;

            match self.attempt(state, pools, candidate, target, Chain::Main) {
                Attempt::Committed(_) => {
                    self.policy.commit(candidate);
                    report.committed += 1;
                    return StepOutcome::Committed;
                }
                Attempt::Rejected => report.rejected += 1,
                Attempt::Degenerate => {
                    warn!(
                        "Template {} has no exit socket, the chain ends here",
                        candidate.template.id
                    );
                    return StepOutcome::Halted;
                }
            }
        }

        StepOutcome::Exhausted {
            exhaustive: set.exhaustive,
        }
    }

    /// Places `candidate` at `target` and commits it into `chain` if it fits. Branch chains skip the
    /// collision check, only their footprint is recorded.
    fn attempt(
        &mut self,
        state: &mut NetworkState,
        pools: &mut InstancePools,
        candidate: &Candidate,
        target: Pose,
        chain: Chain,
    ) -> Attempt {
        let template = &candidate.template;
        let handle = pools.acquire(&template.id, &template.prototype);
        let Some(instance) = pools.node_mut(&template.id, handle) else {
            warn!("Pool {} handed out {:?} without an instance", template.id, handle);
            pools.release(&template.id, handle);
            return Attempt::Degenerate;
        };

        let placement = place(template, instance, target, candidate.mirror);
        let verdict = match chain {
            Chain::Main => self
                .adjudicator
                .evaluate(&placement, &state.grid, &state.recent_ids(self.adjudicator.seam_tolerance())),
            Chain::Branch(_) => match placement.exit {
                Some(_) => Verdict::Accept {
                    cells: self.adjudicator.footprint(&placement, &state.grid),
                },
                None => Verdict::Degenerate { cells: Vec::new() },
            },
        };

        match verdict {
            Verdict::Accept { cells } => {
                instance.set_visible(true);
                let id = state.allocate_id();
                debug!(
                    "Committing {} as {} (mirrored: {}) at {}",
                    template.id, id, candidate.mirror, placement.entry.translation
                );

                let segment = PlacedSegment {
                    id,
                    template: template.clone(),
                    instance: handle,
                    placement,
                    cells,
                };

                match chain {
                    Chain::Main => state.commit(segment),
                    Chain::Branch(index) => state.commit_branch(index, segment),
                }
                Attempt::Committed(id)
            }
            Verdict::Reject { cell, owner } => {
                trace!("Rejected {}, {:?} is claimed by {}", template.id, cell, owner);
                pools.release(&template.id, handle);
                Attempt::Rejected
            }
            Verdict::Degenerate { .. } => {
                pools.release(&template.id, handle);
                Attempt::Degenerate
            }
        }
    }

    /// Builds a straight spine with randomly placed junctions, seeded for reproducibility, then grows
    /// a straight branch chain off every junction socket.
    pub fn build_spine_and_branch(
        &mut self,
        state: &mut NetworkState,
        pools: &mut InstancePools,
        templates: &TemplateSet,
        config: &SpineConfig,
    ) -> SpineReport {
        let mut rng = Mulberry32::new(config.seed);
        self.build_spine_and_branch_with(state, pools, templates, config, &mut rng)
    }

    pub fn build_spine_and_branch_with(
        &mut self,
        state: &mut NetworkState,
        pools: &mut InstancePools,
        templates: &TemplateSet,
        config: &SpineConfig,
        rng: &mut dyn RandomSource,
    ) -> SpineReport {
        profiling::scope!("NetworkBuilder::build_spine_and_branch");
        let mut report = SpineReport::default();

        let Some(straight) = Self::pick_template(templates, config.straight.as_deref(), |set| {
            set.straights().next().cloned()
        }) else {
            warn!("The template set has no straight segment, cannot build a spine");
            return report;
        };

        let junction = Self::pick_template(templates, config.junction.as_deref(), |set| set.junction().cloned());
        if junction.is_none() && config.junction_probability > 0.0 {
            warn!("The template set has no junction, the spine won't branch");
        }

        let mut requests = Vec::new();

        for position in 0..config.length {
            // Only interior positions roll the dice, so the sequence only depends on the length.
            let wants_junction =
                position > 0 && position + 1 < config.length && rng.next_f64() < config.junction_probability;

            let template = match (&junction, wants_junction) {
                (Some(junction), true) => junction.clone(),
                _ => straight.clone(),
            };

            let Some(target) = state.frontier() else {
                warn!("Spine ended at position {}, the previous segment has no exit", position);
                break;
            };

            match self.attempt(state, pools, &Candidate::new(template, false), target, Chain::Main) {
                Attempt::Committed(id) => {
                    report.spine_segments += 1;

                    let Some(segment) = state.segments().back().filter(|_| wants_junction && junction.is_some())
                    else {
                        continue;
                    };

                    report.junction_positions.push(position);
                    let sockets = [
                        (BranchSide::Left, segment.placement.branch_left),
                        (BranchSide::Right, segment.placement.branch_right),
                    ];

                    for (side, transform) in sockets {
                        if let Some(transform) = transform {
                            requests.push(BranchRequest {
                                transform,
                                side,
                                length: config.branch_length,
                                parent: id,
                            });
                        }
                    }
                }
                Attempt::Rejected => {
                    warn!("Spine is blocked at position {}", position);
                    break;
                }
                Attempt::Degenerate => {
                    warn!("Spine ended at position {}, the placed template has no exit socket", position);
                    break;
                }
            }
        }

        report.branch_requests = requests.clone();

        for request in requests {
            let built = self.build_branch(state, pools, &straight, request);
            report.branch_lengths.push(built);
        }

        info!(
            "Built a spine of {} segments with {} junctions and {} branch segments",
            report.spine_segments,
            report.junction_positions.len(),
            state.branch_segment_count()
        );
        report
    }

    fn build_branch(
        &mut self,
        state: &mut NetworkState,
        pools: &mut InstancePools,
        straight: &Arc<SegmentTemplate>,
        request: BranchRequest,
    ) -> usize {
        let length = request.length;
        let parent = request.parent;
        let mut target = request.transform;
        let chain = state.open_branch(request);
        let candidate = Candidate::new(straight.clone(), false);

        for built in 0..length {
            if !matches!(
                self.attempt(state, pools, &candidate, target, Chain::Branch(chain)),
                Attempt::Committed(_)
            ) {
                debug!("Branch off {} stopped after {} segments", parent, built);
                return built;
            }

            let exit = state.branches()[chain]
                .segments
                .last()
                .and_then(PlacedSegment::exit);

            match exit {
                Some(exit) => target = exit,
                None => return built + 1,
            }
        }

        length
    }

    fn pick_template(
        templates: &TemplateSet,
        id: Option<&str>,
        fallback: impl FnOnce(&TemplateSet) -> Option<Arc<SegmentTemplate>>,
    ) -> Option<Arc<SegmentTemplate>> {
        match id {
            Some(id) => {
                let template = templates.segment(id).cloned();
                if template.is_none() {
                    warn!("Unknown segment template {}", id);
                }
                template
            }
            None => fallback(templates),
        }
    }
}
