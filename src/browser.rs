use devfolio::code_rain::{Entropy, RainSurface, GLYPH_RGB, GLYPH_SIZE, TRAIL_FILL};
use devfolio::reveal::{Observation, Subscription, VisibilitySource};
use devfolio::schedule::Scheduler;
use gloo_timers::callback::{Interval, Timeout};
use std::cell::Cell;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, CanvasRenderingContext2d, Element, HtmlCanvasElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit,
};
use yew::NodeRef;

pub fn viewport_size() -> (f64, f64) {
    let Some(win) = window() else {
        return (1280.0, 720.0);
    };

    let width = win
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(1280.0);
    let height = win
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(720.0);

    (width, height)
}

pub fn scroll_offset() -> f64 {
    window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0)
}

pub fn prefers_reduced_motion() -> bool {
    window()
        .and_then(|w| {
            w.match_media("(prefers-reduced-motion: reduce)")
                .ok()
                .flatten()
        })
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

pub fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

pub enum BrowserTask {
    Once(Timeout),
    Repeating(Interval),
}

#[derive(Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    type Task = BrowserTask;

    fn timeout<F>(&self, millis: u32, callback: F) -> BrowserTask
    where
        F: FnOnce() + 'static,
    {
        BrowserTask::Once(Timeout::new(millis, callback))
    }

    fn interval<F>(&self, millis: u32, callback: F) -> BrowserTask
    where
        F: FnMut() + 'static,
    {
        BrowserTask::Repeating(Interval::new(millis, callback))
    }
}

/// Viewport intersection via `IntersectionObserver`, one observer per region.
#[derive(Clone, Copy, Default)]
pub struct IntersectionSource {
    pub root_margin: Option<&'static str>,
}

impl IntersectionSource {
    pub fn with_root_margin(root_margin: &'static str) -> Self {
        Self {
            root_margin: Some(root_margin),
        }
    }
}

type EntriesCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

pub struct ObserverSubscription {
    observer: Option<IntersectionObserver>,
    // Kept alive for as long as the observer may call back into it.
    _callback: Option<EntriesCallback>,
    cancelled: Cell<bool>,
}

impl ObserverSubscription {
    fn inert() -> Self {
        Self {
            observer: None,
            _callback: None,
            cancelled: Cell::new(true),
        }
    }
}

impl Subscription for ObserverSubscription {
    fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(observer) = self.observer.as_ref() {
            observer.disconnect();
        }
    }
}

impl Drop for ObserverSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl VisibilitySource for IntersectionSource {
    type Region = Element;
    type Subscription = ObserverSubscription;

    fn observe<F>(&self, region: &Element, threshold: f64, on_observation: F) -> ObserverSubscription
    where
        F: FnMut(Observation) + 'static,
    {
        let mut on_observation = on_observation;
        let callback: EntriesCallback = Closure::new(move |entries: js_sys::Array, _: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                let observation = Observation {
                    ratio: entry.intersection_ratio(),
                    intersecting: entry.is_intersecting(),
                };

                on_observation(observation.snapped(threshold));
            }
        });

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(threshold));
        if let Some(root_margin) = self.root_margin {
            options.set_root_margin(root_margin);
        }

        let observer = match IntersectionObserver::new_with_options(
            callback.as_ref().unchecked_ref(),
            &options,
        ) {
            Ok(observer) => observer,
            Err(_) => {
                warn("IntersectionObserver unavailable; element stays hidden");
                return ObserverSubscription::inert();
            }
        };
        observer.observe(region);

        ObserverSubscription {
            observer: Some(observer),
            _callback: Some(callback),
            cancelled: Cell::new(false),
        }
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// `None` if the node is not mounted or has no 2d context.
    pub fn from_node(node: &NodeRef) -> Option<Self> {
        let canvas = node.cast::<HtmlCanvasElement>()?;
        let context = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;

        Some(Self { canvas, context })
    }
}

impl RainSurface for CanvasSurface {
    fn viewport_size(&self) -> (f64, f64) {
        viewport_size()
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.canvas.set_width(width.max(0.0) as u32);
        self.canvas.set_height(height.max(0.0) as u32);
        // Resizing the backing store resets the context state.
        self.context.set_font(&format!("{GLYPH_SIZE}px monospace"));
    }

    fn fade(&mut self, width: f64, height: f64) {
        self.context.set_fill_style_str(TRAIL_FILL);
        self.context.fill_rect(0.0, 0.0, width, height);
    }

    fn draw_glyph(&mut self, glyph: char, x: f64, y: f64, alpha: f64) {
        let (red, green, blue) = GLYPH_RGB;
        self.context
            .set_fill_style_str(&format!("rgba({red}, {green}, {blue}, {alpha:.3})"));
        let _ = self.context.fill_text(&glyph.to_string(), x, y);
    }
}

pub struct MathRandom;

impl Entropy for MathRandom {
    fn next_unit(&mut self) -> f64 {
        js_sys::Math::random()
    }
}
