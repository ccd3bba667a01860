use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub const DEFAULT_VISIBLE_FRACTION: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Edge-adjacent rectangles intersect with zero area, as layout engines report them.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        if right < left || bottom < top {
            return None;
        }

        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Browsers report threshold crossings with ratios a hair below the threshold.
pub const RATIO_TOLERANCE: f64 = 1e-3;

/// One intersection measurement for an observed region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub ratio: f64,
    pub intersecting: bool,
}

impl Observation {
    pub fn measure(region: Rect, viewport: Rect) -> Self {
        let Some(overlap) = region.intersection(&viewport) else {
            return Self {
                ratio: 0.0,
                intersecting: false,
            };
        };

        let area = region.area();
        let ratio = if area > 0.0 {
            (overlap.area() / area).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            ratio,
            intersecting: true,
        }
    }

    /// Lifts an intersecting ratio that lands just under `threshold` onto it.
    pub fn snapped(self, threshold: f64) -> Self {
        if self.intersecting && self.ratio < threshold && threshold - self.ratio < RATIO_TOLERANCE {
            Self {
                ratio: threshold,
                ..self
            }
        } else {
            self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealConfig {
    pub visible_fraction: f64,
}

impl RevealConfig {
    pub fn new(visible_fraction: f64) -> Self {
        let visible_fraction = if visible_fraction.is_nan() {
            DEFAULT_VISIBLE_FRACTION
        } else {
            visible_fraction.clamp(0.0, 1.0)
        };

        Self { visible_fraction }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBLE_FRACTION)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealState {
    Unarmed,
    Triggered,
}

/// One-shot latch: flips to `Triggered` on the first qualifying observation and stays there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealLatch {
    state: RevealState,
    threshold: f64,
}

impl RevealLatch {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            state: RevealState::Unarmed,
            threshold: config.visible_fraction,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn is_triggered(&self) -> bool {
        self.state == RevealState::Triggered
    }

    /// Returns `true` only for the observation that performs the transition.
    pub fn observe(&mut self, observation: Observation) -> bool {
        if self.is_triggered() || !meets_threshold(observation, self.threshold) {
            return false;
        }

        self.state = RevealState::Triggered;
        true
    }
}

fn meets_threshold(observation: Observation, threshold: f64) -> bool {
    observation.intersecting && observation.ratio >= threshold
}

pub trait Subscription {
    /// Stops delivery. Safe to call any number of times.
    fn cancel(&self);
}

/// Push-based visibility events for a region (viewport intersection in the browser).
///
/// The first observation pass must be delivered without waiting for a scroll.
pub trait VisibilitySource {
    type Region;
    type Subscription: Subscription;

    fn observe<F>(&self, region: &Self::Region, threshold: f64, on_observation: F) -> Self::Subscription
    where
        F: FnMut(Observation) + 'static;
}

struct TrackerCore<Sub> {
    latch: Cell<RevealLatch>,
    subscription: RefCell<Option<Sub>>,
    listeners: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl<Sub: Subscription> TrackerCore<Sub> {
    fn accept(&self, observation: Observation) {
        let mut latch = self.latch.get();
        if !latch.observe(observation) {
            return;
        }
        self.latch.set(latch);
        self.detach();

        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in listeners {
            listener();
        }
    }

    fn detach(&self) {
        if let Some(subscription) = self.subscription.borrow().as_ref() {
            subscription.cancel();
        }
    }
}

pub struct VisibilityTracker<S: VisibilitySource> {
    core: Rc<TrackerCore<S::Subscription>>,
}

impl<S> VisibilityTracker<S>
where
    S: VisibilitySource,
    S::Subscription: 'static,
{
    /// A missing region leaves the tracker permanently untriggered.
    pub fn create(source: &S, region: Option<&S::Region>, config: RevealConfig) -> Self {
        let core = Rc::new(TrackerCore {
            latch: Cell::new(RevealLatch::new(config)),
            subscription: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });

        let Some(region) = region else {
            return Self { core };
        };

        let weak: Weak<TrackerCore<S::Subscription>> = Rc::downgrade(&core);
        let subscription = source.observe(region, config.visible_fraction, move |observation| {
            if let Some(core) = weak.upgrade() {
                core.accept(observation);
            }
        });

        *core.subscription.borrow_mut() = Some(subscription);
        // Sources may deliver the first pass synchronously, before the subscription was stored.
        if core.latch.get().is_triggered() {
            core.detach();
        }

        Self { core }
    }

    pub fn is_triggered(&self) -> bool {
        self.core.latch.get().is_triggered()
    }

    pub fn state(&self) -> RevealState {
        self.core.latch.get().state()
    }

    /// Runs `listener` once when the latch trips, or right away if it already has.
    pub fn on_trigger<F>(&self, listener: F)
    where
        F: FnOnce() + 'static,
    {
        if self.is_triggered() {
            listener();
            return;
        }

        self.core.listeners.borrow_mut().push(Box::new(listener));
    }

    pub fn destroy(self) {}
}

impl<S: VisibilitySource> Drop for VisibilityTracker<S> {
    fn drop(&mut self) {
        let subscription = self.core.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        self.core.listeners.borrow_mut().clear();
    }
}
