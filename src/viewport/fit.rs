//! Fit-to-container computation and the poll-until-measurable scheduler
//! that defers it while the host is still laying out diagram content.

use log::{debug, warn};

use crate::document::NodeId;
use crate::geometry::Size;

use super::transform::Transform;

/// Centers `content` in `container`, scaled down to fit but never above 1:1.
///
/// Returns `None` while either box has no measurable size, so a zero or
/// non-finite dimension can never leak NaN into a transform.
pub fn fit_transform(content: Size, container: Size) -> Option<Transform> {
    if !content.is_measurable() || !container.is_measurable() {
        return None;
    }
    let scale = (container.width / content.width)
        .min(container.height / content.height)
        .min(1.0);
    Some(Transform {
        offset_x: (container.width - content.width * scale) / 2.0,
        offset_y: (container.height - content.height * scale) / 2.0,
        scale,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitPolicy {
    /// Host ticks a pending fit may wait for measurable content before it is
    /// abandoned until the next mutation of its subtree.
    pub max_attempts: u32,
}

impl Default for FitPolicy {
    fn default() -> Self {
        Self { max_attempts: 60 }
    }
}

/// Result of one attempt at fitting a pending container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitPoll {
    Ready,
    NotReady,
    /// The container or its diagram is gone; drop the request.
    Gone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingFit {
    container: NodeId,
    attempts: u32,
}

impl PendingFit {
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[derive(Debug, Default)]
pub struct FitScheduler {
    pending: Vec<PendingFit>,
    policy: FitPolicy,
}

impl FitScheduler {
    pub fn new(policy: FitPolicy) -> Self {
        Self {
            pending: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> FitPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: FitPolicy) {
        self.policy = policy;
    }

    /// Queues a fit for `container`; an existing request starts over.
    pub fn schedule(&mut self, container: NodeId) {
        match self.pending.iter_mut().find(|p| p.container == container) {
            Some(existing) => existing.attempts = 0,
            None => self.pending.push(PendingFit {
                container,
                attempts: 0,
            }),
        }
    }

    pub fn cancel(&mut self, container: NodeId) {
        self.pending.retain(|p| p.container != container);
    }

    pub fn is_pending(&self, container: NodeId) -> bool {
        self.pending.iter().any(|p| p.container == container)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Runs `attempt` once for every pending container, keeping the ones that
    /// are not ready yet and still have attempts left. Returns the containers
    /// that were fitted.
    pub fn poll(&mut self, mut attempt: impl FnMut(NodeId) -> FitPoll) -> Vec<NodeId> {
        let mut fitted = Vec::new();
        let max_attempts = self.policy.max_attempts;
        self.pending.retain_mut(|p| match attempt(p.container) {
            FitPoll::Ready => {
                fitted.push(p.container);
                false
            }
            FitPoll::Gone => {
                debug!(container = p.container.to_string(); "Dropping fit for missing container");
                false
            }
            FitPoll::NotReady => {
                p.attempts += 1;
                if p.attempts >= max_attempts {
                    warn!(
                        container = p.container.to_string(),
                        attempts = p.attempts;
                        "Diagram never became measurable, giving up on fit"
                    );
                    false
                } else {
                    true
                }
            }
        });
        fitted
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::document::DocumentTree;

    #[test]
    fn test_fit_wide_content() {
        let t = fit_transform(Size::new(1600.0, 300.0), Size::new(800.0, 600.0)).unwrap();
        assert_approx_eq!(f32, t.scale, 0.5);
        assert_approx_eq!(f32, t.offset_x, 0.0);
        assert_approx_eq!(f32, t.offset_y, 225.0);
    }

    #[test]
    fn test_fit_never_upscales() {
        let t = fit_transform(Size::new(100.0, 50.0), Size::new(800.0, 600.0)).unwrap();
        assert_approx_eq!(f32, t.scale, 1.0);
        assert_approx_eq!(f32, t.offset_x, 350.0);
        assert_approx_eq!(f32, t.offset_y, 275.0);
    }

    #[test]
    fn test_fit_is_idempotent() {
        let content = Size::new(1234.0, 987.0);
        let container = Size::new(640.0, 480.0);
        assert_eq!(
            fit_transform(content, container),
            fit_transform(content, container)
        );
    }

    #[test]
    fn test_fit_refuses_zero_sizes() {
        assert_eq!(fit_transform(Size::ZERO, Size::new(800.0, 600.0)), None);
        assert_eq!(fit_transform(Size::new(10.0, 0.0), Size::new(800.0, 600.0)), None);
        assert_eq!(fit_transform(Size::new(10.0, 10.0), Size::ZERO), None);
    }

    fn ids(n: usize) -> Vec<NodeId> {
        let mut doc = DocumentTree::new();
        (0..n).map(|_| doc.create_element("div")).collect()
    }

    #[test]
    fn test_scheduler_retries_until_ready() {
        let [a] = ids(1)[..] else { unreachable!() };
        let mut scheduler = FitScheduler::new(FitPolicy { max_attempts: 5 });
        scheduler.schedule(a);

        assert!(scheduler.poll(|_| FitPoll::NotReady).is_empty());
        assert!(scheduler.is_pending(a));
        assert_eq!(scheduler.poll(|_| FitPoll::Ready), vec![a]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_scheduler_gives_up_after_max_attempts() {
        let [a] = ids(1)[..] else { unreachable!() };
        let mut scheduler = FitScheduler::new(FitPolicy { max_attempts: 3 });
        scheduler.schedule(a);
        for _ in 0..2 {
            scheduler.poll(|_| FitPoll::NotReady);
            assert!(scheduler.is_pending(a));
        }
        scheduler.poll(|_| FitPoll::NotReady);
        assert!(!scheduler.is_pending(a));
    }

    #[test]
    fn test_rescheduling_resets_attempts() {
        let [a, b] = ids(2)[..] else { unreachable!() };
        let mut scheduler = FitScheduler::new(FitPolicy { max_attempts: 2 });
        scheduler.schedule(a);
        scheduler.schedule(b);
        scheduler.poll(|_| FitPoll::NotReady);
        scheduler.schedule(a);
        assert_eq!(scheduler.len(), 2);

        scheduler.poll(|_| FitPoll::NotReady);
        assert!(scheduler.is_pending(a));
        assert!(!scheduler.is_pending(b));
    }

    #[test]
    fn test_scheduler_drops_gone_containers() {
        let [a, b] = ids(2)[..] else { unreachable!() };
        let mut scheduler = FitScheduler::default();
        scheduler.schedule(a);
        scheduler.schedule(b);
        let fitted = scheduler.poll(|c| if c == a { FitPoll::Gone } else { FitPoll::Ready });
        assert_eq!(fitted, vec![b]);
        assert!(scheduler.is_empty());
    }
}
